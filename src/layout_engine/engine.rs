use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::common::config::Config;
use crate::layout_engine::{
    Arrange, Layout, LayoutError, LayoutMods, LayoutSlot, Placement, ResolveContext, Selector,
    TransformKind, TransformMode,
};
use crate::model::{Client, ClientId, ClientStore, FreePolicy, WindowId};
use crate::sys::display::{Display, window_title};
use crate::sys::geometry::Rect;
use crate::sys::rules::{DefaultRules, RuleTable};

/// Requests a caller can make of the engine as data.
///
/// Layout commands act on the active workspace, client commands on its
/// current client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    Run,
    ToggleMod(LayoutMods),
    ToggleOverlay(usize),
    ChangeLayout(i32),
    ResetLayout,
    IncreaseMaster(i32),
    ResizeMaster(f32),
    ChangeWorkspace(usize),

    Manage { window: WindowId, region: Rect },
    Unmanage,
    Kill,
    Focus(Selector),
    Swap(Selector),
    Minimize,
    RestoreLastMinimized,
    Tile,
    Free(FreePolicy),
    ToggleFree(FreePolicy),
    Fullscreen,
    Normal,
    ToggleFullscreen,
    SetUrgent,
    UnsetUrgent,
    MoveToWorkspace(usize),
    Transform { kind: TransformKind, mode: TransformMode },
}

/// Places the clients of every workspace and pushes the result to a display.
///
/// Single threaded: callers serialize access, and [`LayoutEngine::transform`]
/// holds `&mut self` for the whole pointer grab.
pub struct LayoutEngine<D: Display, R: RuleTable = DefaultRules> {
    config: Arc<Config>,
    display: Arc<D>,
    rules: R,
    store: ClientStore,
}

impl<D: Display> LayoutEngine<D, DefaultRules> {
    pub fn new(config: Arc<Config>, display: Arc<D>) -> Result<Self, regex::Error> {
        let rules = DefaultRules::new(&config.rules)?;
        Ok(Self::with_rules(config, display, rules))
    }
}

impl<D: Display, R: RuleTable> LayoutEngine<D, R> {
    pub fn with_rules(config: Arc<Config>, display: Arc<D>, rules: R) -> Self {
        let store = ClientStore::new(&config, display.screen_region());
        info!(workspaces = store.workspace_count(), "layout engine ready");
        Self { config, display, rules, store }
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn display(&self) -> &Arc<D> { &self.display }

    pub fn store(&self) -> &ClientStore { &self.store }

    pub(crate) fn store_mut(&mut self) -> &mut ClientStore { &mut self.store }

    fn client_workspace(&self, id: ClientId) -> Option<usize> {
        self.store.client(id).map(|c| c.workspace)
    }

    /// The current client of the active workspace.
    pub fn focused_client(&self) -> Option<ClientId> {
        self.store.workspace(self.store.active_workspace())?.current()
    }

    // Layout runs

    /// Arranges the tiled clients of `ws` with the layout in `slot`.
    ///
    /// Returns false for an unknown workspace or slot. Allocation failure of
    /// the arrange buffer is the only error.
    pub fn run(&mut self, ws: usize, slot: LayoutSlot) -> Result<bool, LayoutError> {
        let Some(workspace) = self.store.workspace(ws) else {
            warn!(ws, "run on unknown workspace");
            return Ok(false);
        };
        let Some(layout) = workspace.layout(slot) else {
            warn!(ws, ?slot, "run on unknown layout");
            return Ok(false);
        };
        let mut arrange = Arrange::build(&self.store, workspace, layout, &self.rules)?;
        if !arrange.is_empty() {
            arrange.run(layout);
            arrange.commit(&mut self.store);
        }
        Ok(true)
    }

    pub fn run_active(&mut self, ws: usize) -> Result<bool, LayoutError> {
        let Some(slot) = self.store.workspace(ws).map(|w| w.active_slot()) else {
            warn!(ws, "run on unknown workspace");
            return Ok(false);
        };
        self.run(ws, slot)
    }

    /// Runs the active layout, then pushes every client and refocuses.
    fn rearrange(&mut self, ws: usize) -> Result<bool, LayoutError> {
        self.run_active(ws)?;
        self.focus_workspace(ws);
        Ok(true)
    }

    // Layout lifecycle

    #[instrument(skip(self))]
    pub fn toggle_mod(
        &mut self,
        ws: usize,
        slot: LayoutSlot,
        mods: LayoutMods,
    ) -> Result<bool, LayoutError> {
        let Some(layout) = self.store.workspace_mut(ws).and_then(|w| w.layout_mut(slot)) else {
            return Ok(false);
        };
        layout.toggle_mods(mods);
        debug!(mods = ?layout.mods, "layout mods toggled");
        self.run_active(ws)?;
        self.update_workspace(ws);
        Ok(true)
    }

    #[instrument(skip(self))]
    pub fn toggle_overlay(&mut self, ws: usize, index: usize) -> Result<bool, LayoutError> {
        let Some(workspace) = self.store.workspace_mut(ws) else { return Ok(false) };
        if !workspace.toggle(index) {
            debug!("no such toggle layout");
            return Ok(false);
        }
        self.rearrange(ws)
    }

    #[instrument(skip(self))]
    pub fn change_layout(&mut self, ws: usize, step: i32) -> Result<bool, LayoutError> {
        let Some(workspace) = self.store.workspace_mut(ws) else { return Ok(false) };
        workspace.change_layout_index(step);
        debug!(index = workspace.layout_index(), "layout changed");
        self.rearrange(ws)
    }

    /// Restores every layout of `ws` to its configuration, tiles its free
    /// clients and selects the first layout.
    #[instrument(skip(self))]
    pub fn reset_layout(&mut self, ws: usize) -> Result<bool, LayoutError> {
        let Some(workspace) = self.store.workspace_mut(ws) else { return Ok(false) };
        workspace.reset_layouts();
        workspace.reset_layout_index();
        let members = workspace.clients().to_vec();
        for id in members {
            if let Some(client) = self.store.client_mut(id) {
                client.free_policy = FreePolicy::None;
            }
        }
        self.rearrange(ws)
    }

    #[instrument(skip(self))]
    pub fn increase_master(&mut self, ws: usize, step: i32) -> Result<bool, LayoutError> {
        let Some(workspace) = self.store.workspace_mut(ws) else { return Ok(false) };
        if !workspace.active_layout_mut().increase_master(step) {
            return Ok(false);
        }
        self.rearrange(ws)
    }

    #[instrument(skip(self))]
    pub fn resize_master(&mut self, ws: usize, factor: f32) -> Result<bool, LayoutError> {
        let Some(workspace) = self.store.workspace_mut(ws) else { return Ok(false) };
        if !workspace.active_layout_mut().resize_master(factor) {
            return Ok(false);
        }
        self.rearrange(ws)
    }

    /// Hides the active workspace and shows `ws`.
    #[instrument(skip(self))]
    pub fn change_workspace(&mut self, ws: usize) -> Result<bool, LayoutError> {
        let old = self.store.active_workspace();
        if ws == old || !self.store.set_active_workspace(ws) {
            return Ok(false);
        }
        for (_, client) in self.store.workspace_clients(old) {
            self.display.move_offscreen(client.window());
        }
        self.rearrange(ws)
    }

    // Resolution

    fn resolve_context(&self, ws: usize) -> Option<ResolveContextOwned> {
        let workspace = self.store.workspace(ws)?;
        Some(ResolveContextOwned {
            layout: workspace.active_layout().clone(),
            area: workspace.area(),
            stack: workspace.stack_region(),
            current: workspace.current(),
            previous: workspace.previous(),
            has_fixed: self.find_fixed(ws).is_some(),
            members: workspace.clients().to_vec(),
        })
    }

    fn push(display: &D, placement: &Placement) {
        display.set_border(placement.window, placement.border_width, placement.border_color);
        display.move_resize(placement.window, placement.region);
    }

    /// Resolves one client. It is pushed to the display only when its
    /// workspace is the active one.
    pub fn update_client(&mut self, id: ClientId) -> Option<Placement> {
        let ws = self.client_workspace(id)?;
        if !self.store.workspace(ws)?.contains(id) {
            return None;
        }
        let owned = self.resolve_context(ws)?;
        let ctx = owned.borrow(&self.config, &self.rules, self.store.screen());
        let placement = ctx.resolve(id, self.store.client_mut(id)?);
        if ws == self.store.active_workspace() {
            Self::push(&self.display, &placement);
        }
        Some(placement)
    }

    /// Resolves every client of `ws` in list order. Placements of the active
    /// workspace are pushed to the display; hidden workspaces stay off screen.
    pub fn update_workspace(&mut self, ws: usize) -> Vec<Placement> {
        let Some(owned) = self.resolve_context(ws) else { return Vec::new() };
        let visible = ws == self.store.active_workspace();
        let ctx = owned.borrow(&self.config, &self.rules, self.store.screen());
        let mut placements = Vec::with_capacity(owned.members.len());
        for &id in &owned.members {
            let Some(client) = self.store.client_mut(id) else { continue };
            let placement = ctx.resolve(id, client);
            if visible {
                Self::push(&self.display, &placement);
            }
            placements.push(placement);
        }
        trace!(ws, visible, clients = placements.len(), "workspace updated");
        placements
    }

    /// Updates `ws` and, when it is the active workspace, gives input focus to
    /// its current client.
    pub fn focus_workspace(&mut self, ws: usize) -> Vec<Placement> {
        let placements = self.update_workspace(ws);
        if ws == self.store.active_workspace() {
            let window = self
                .store
                .workspace(ws)
                .and_then(|w| w.current())
                .and_then(|id| self.store.client(id))
                .map(|c| c.window());
            self.display.set_input_focus(window);
        }
        placements
    }

    // Finders

    pub fn find_window(&self, window: WindowId) -> Option<ClientId> {
        self.store.find_window(window)
    }

    /// First urgent client that is not minimized.
    pub fn find_urgent(&self) -> Option<ClientId> {
        self.store
            .clients()
            .find(|(id, c)| c.is_urgent && !self.store.is_minimized(*id))
            .map(|(id, _)| id)
    }

    pub fn find_fixed(&self, ws: usize) -> Option<ClientId> {
        self.store.workspace_clients(ws).find(|(_, c)| c.is_fixed()).map(|(id, _)| id)
    }

    /// The client whose window is under the pointer.
    pub fn pointed_client(&self) -> Option<ClientId> {
        let pointer = self.display.query_pointer()?;
        self.find_window(pointer.child?)
    }

    // Client lifecycle

    /// Starts managing `window`, currently shown at `geometry`.
    #[instrument(skip(self))]
    pub fn manage(&mut self, window: WindowId, geometry: Rect) -> Result<ClientId, LayoutError> {
        let mut client = Client::new(window, geometry);
        client.workspace = self.store.active_workspace();
        let hint = self.display.class_hint(window);
        client.set_class_and_name(
            hint.as_ref().map(|h| h.class.as_str()),
            hint.as_ref().map(|h| h.name.as_str()),
        );
        client.set_title(window_title(&*self.display, window).as_deref());
        self.rules.apply(&mut client, self.store.workspace_count());

        let id = self.store.insert(client);
        let Some(ws) = self.client_workspace(id) else { return Ok(id) };
        if let Some(workspace) = self.store.workspace_mut(ws) {
            workspace.set_current(Some(id));
        }
        info!(?id, ws, "client managed");
        if ws != self.store.active_workspace() {
            self.display.move_offscreen(window);
        }
        self.rearrange(ws)?;
        Ok(id)
    }

    #[instrument(skip(self))]
    pub fn unmanage(&mut self, id: ClientId) -> Result<bool, LayoutError> {
        let Some(client) = self.store.remove(id) else { return Ok(false) };
        info!(window = ?client.window(), "client unmanaged");
        self.rearrange(client.workspace)
    }

    /// Asks the client to close, or kills its connection when it does not
    /// take part in the delete protocol.
    #[instrument(skip(self))]
    pub fn kill(&mut self, id: ClientId) -> Result<bool, LayoutError> {
        let Some(window) = self.store.client(id).map(|c| c.window()) else { return Ok(false) };
        if self.display.supports_delete(window) {
            debug!("sending delete request");
            self.display.send_delete(window);
            return Ok(true);
        }
        self.display.kill_client(window);
        self.unmanage(id)
    }

    #[instrument(skip(self))]
    pub fn minimize(&mut self, id: ClientId) -> Result<bool, LayoutError> {
        let Some(client) = self.store.client(id) else { return Ok(false) };
        let (ws, window) = (client.workspace, client.window());
        if !self.store.minimize(id) {
            return Ok(false);
        }
        self.display.move_offscreen(window);
        self.rearrange(ws)
    }

    pub fn restore_last_minimized(&mut self) -> Result<bool, LayoutError> {
        let Some(id) = self.store.restore_last() else { return Ok(false) };
        let Some(ws) = self.client_workspace(id) else { return Ok(false) };
        self.rearrange(ws)
    }

    /// Re-runs the layout of `id`'s workspace after `f` changed the client.
    /// `f` returns false to reject the change.
    fn modify(
        &mut self,
        id: ClientId,
        f: impl FnOnce(&mut Client) -> bool,
    ) -> Result<bool, LayoutError> {
        let Some(client) = self.store.client_mut(id) else { return Ok(false) };
        if !f(client) {
            return Ok(false);
        }
        let ws = client.workspace;
        self.rearrange(ws)
    }

    pub fn tile(&mut self, id: ClientId) -> Result<bool, LayoutError> {
        self.modify(id, |c| {
            if !c.is_free() {
                return false;
            }
            c.free_policy = FreePolicy::None;
            true
        })
    }

    pub fn free(&mut self, id: ClientId, policy: FreePolicy) -> Result<bool, LayoutError> {
        if policy == FreePolicy::None {
            return self.tile(id);
        }
        self.modify(id, |c| {
            if c.is_fixed() {
                debug!("fixed client cannot be freed");
                return false;
            }
            if c.free_policy == policy {
                return false;
            }
            c.free_policy = policy;
            true
        })
    }

    pub fn toggle_free(&mut self, id: ClientId, policy: FreePolicy) -> Result<bool, LayoutError> {
        match self.store.client(id) {
            Some(c) if c.is_free() => self.tile(id),
            Some(_) => self.free(id, policy),
            None => Ok(false),
        }
    }

    pub fn fullscreen(&mut self, id: ClientId) -> Result<bool, LayoutError> {
        self.modify(id, |c| !std::mem::replace(&mut c.is_fullscreen, true))
    }

    pub fn normal(&mut self, id: ClientId) -> Result<bool, LayoutError> {
        self.modify(id, |c| std::mem::replace(&mut c.is_fullscreen, false))
    }

    pub fn toggle_fullscreen(&mut self, id: ClientId) -> Result<bool, LayoutError> {
        self.modify(id, |c| {
            c.is_fullscreen = !c.is_fullscreen;
            true
        })
    }

    pub fn set_urgent(&mut self, id: ClientId) -> bool { self.set_urgency(id, true) }

    pub fn unset_urgent(&mut self, id: ClientId) -> bool { self.set_urgency(id, false) }

    fn set_urgency(&mut self, id: ClientId, urgent: bool) -> bool {
        let Some(client) = self.store.client_mut(id) else { return false };
        client.is_urgent = urgent;
        self.update_client(id);
        true
    }

    pub fn update_class_and_name(&mut self, id: ClientId) -> bool {
        let Some(window) = self.store.client(id).map(|c| c.window()) else { return false };
        let hint = self.display.class_hint(window);
        if hint.is_none() {
            trace!(?window, "window has no class hint");
        }
        let Some(client) = self.store.client_mut(id) else { return false };
        client.set_class_and_name(
            hint.as_ref().map(|h| h.class.as_str()),
            hint.as_ref().map(|h| h.name.as_str()),
        );
        true
    }

    pub fn update_title(&mut self, id: ClientId) -> bool {
        let Some(window) = self.store.client(id).map(|c| c.window()) else { return false };
        let title = window_title(&*self.display, window);
        let Some(client) = self.store.client_mut(id) else { return false };
        client.set_title(title.as_deref());
        true
    }

    #[instrument(skip(self))]
    pub fn move_to_workspace(&mut self, id: ClientId, target: usize) -> Result<bool, LayoutError> {
        let Some(source) = self.client_workspace(id) else { return Ok(false) };
        if !self.store.move_to_workspace(id, target) {
            return Ok(false);
        }
        if target != self.store.active_workspace()
            && let Some(window) = self.store.client(id).map(|c| c.window())
        {
            self.display.move_offscreen(window);
        }
        self.rearrange(target)?;
        self.rearrange(source)
    }

    // Selectors

    /// Makes the client picked by `selector` current on its workspace.
    pub fn focus(&mut self, id: ClientId, selector: Selector) -> bool {
        let Some(target) = selector.select(&self.store, id) else {
            trace!(?selector, "nothing to focus");
            return false;
        };
        let Some(ws) = self.client_workspace(target) else { return false };
        if let Some(workspace) = self.store.workspace_mut(ws) {
            workspace.set_current(Some(target));
        }
        self.focus_workspace(ws);
        true
    }

    /// Swaps `id` with the client picked by `selector` in the list order.
    pub fn swap(&mut self, id: ClientId, selector: Selector) -> Result<bool, LayoutError> {
        let Some(target) = selector.select(&self.store, id) else { return Ok(false) };
        if target == id {
            return Ok(false);
        }
        let Some(ws) = self.client_workspace(id) else { return Ok(false) };
        let Some(workspace) = self.store.workspace_mut(ws) else { return Ok(false) };
        if !workspace.swap(id, target) {
            return Ok(false);
        }
        self.rearrange(ws)
    }

    /// Renders every workspace with its clients, for debugging.
    pub fn draw_tree(&self) -> String {
        let workspaces = self
            .store
            .workspaces()
            .iter()
            .enumerate()
            .map(|(index, workspace)| {
                let marker = if index == self.store.active_workspace() { "☒" } else { "☐" };
                let layout = workspace.active_layout();
                let desc = format!(
                    "{marker} {} [{} {}]",
                    workspace.name,
                    layout.name(),
                    layout.arranger()
                );
                let clients: Vec<_> = self
                    .store
                    .workspace_clients(index)
                    .map(|(id, c)| {
                        let current = if workspace.current() == Some(id) { "* " } else { "" };
                        ascii_tree::Tree::Leaf(vec![format!(
                            "{current}{:?} {:?} {:?}",
                            c.window(),
                            c.tiled_region,
                            c.free_policy
                        )])
                    })
                    .collect();
                if clients.is_empty() {
                    ascii_tree::Tree::Leaf(vec![desc])
                } else {
                    ascii_tree::Tree::Node(desc, clients)
                }
            })
            .collect();
        let tree = ascii_tree::Tree::Node("workspaces".to_string(), workspaces);
        let mut out = String::new();
        if let Err(err) = ascii_tree::write_tree(&mut out, &tree) {
            warn!(%err, "could not render the workspace tree");
        }
        out
    }

    // Commands

    pub fn handle_command(&mut self, command: &LayoutCommand) -> Result<bool, LayoutError> {
        debug!(?command, "command");
        let ws = self.store.active_workspace();
        let focused = self.focused_client();
        let slot = self.store.workspace(ws).map(|w| w.active_slot());
        match *command {
            LayoutCommand::Run => self.run_active(ws),
            LayoutCommand::ToggleMod(mods) => match slot {
                Some(slot) => self.toggle_mod(ws, slot, mods),
                None => Ok(false),
            },
            LayoutCommand::ToggleOverlay(index) => self.toggle_overlay(ws, index),
            LayoutCommand::ChangeLayout(step) => self.change_layout(ws, step),
            LayoutCommand::ResetLayout => self.reset_layout(ws),
            LayoutCommand::IncreaseMaster(step) => self.increase_master(ws, step),
            LayoutCommand::ResizeMaster(factor) => self.resize_master(ws, factor),
            LayoutCommand::ChangeWorkspace(target) => self.change_workspace(target),
            LayoutCommand::Manage { window, region } => self.manage(window, region).map(|_| true),
            LayoutCommand::RestoreLastMinimized => self.restore_last_minimized(),
            _ => {
                let Some(id) = focused else {
                    trace!("no focused client");
                    return Ok(false);
                };
                self.handle_client_command(id, command)
            }
        }
    }

    fn handle_client_command(
        &mut self,
        id: ClientId,
        command: &LayoutCommand,
    ) -> Result<bool, LayoutError> {
        match *command {
            LayoutCommand::Unmanage => self.unmanage(id),
            LayoutCommand::Kill => self.kill(id),
            LayoutCommand::Focus(selector) => Ok(self.focus(id, selector)),
            LayoutCommand::Swap(selector) => self.swap(id, selector),
            LayoutCommand::Minimize => self.minimize(id),
            LayoutCommand::Tile => self.tile(id),
            LayoutCommand::Free(policy) => self.free(id, policy),
            LayoutCommand::ToggleFree(policy) => self.toggle_free(id, policy),
            LayoutCommand::Fullscreen => self.fullscreen(id),
            LayoutCommand::Normal => self.normal(id),
            LayoutCommand::ToggleFullscreen => self.toggle_fullscreen(id),
            LayoutCommand::SetUrgent => Ok(self.set_urgent(id)),
            LayoutCommand::UnsetUrgent => Ok(self.unset_urgent(id)),
            LayoutCommand::MoveToWorkspace(target) => self.move_to_workspace(id, target),
            LayoutCommand::Transform { kind, mode } => {
                Ok(self.transform(id, kind, mode)?.is_some())
            }
            _ => Ok(false),
        }
    }
}

/// Copies taken from a workspace so the store can be borrowed mutably while
/// its clients are resolved.
struct ResolveContextOwned {
    layout: Layout,
    area: Rect,
    stack: Rect,
    current: Option<ClientId>,
    previous: Option<ClientId>,
    has_fixed: bool,
    members: Vec<ClientId>,
}

impl ResolveContextOwned {
    fn borrow<'a, R: RuleTable>(
        &'a self,
        config: &'a Config,
        rules: &'a R,
        screen: Rect,
    ) -> ResolveContext<'a, R> {
        ResolveContext {
            settings: &config.settings,
            rules,
            layout: &self.layout,
            screen,
            area: self.area,
            stack: self.stack,
            current: self.current,
            previous: self.previous,
            has_fixed: self.has_fixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::common::config::RuleSettings;
    use crate::layout_engine::TransformEnd;
    use crate::model::FixedPosition;
    use crate::sys::display::{GrabEvent, TextProperty};
    use crate::sys::headless::HeadlessDisplay;

    const SCREEN: Rect = Rect::new(0, 0, 1000, 500);

    fn engine() -> LayoutEngine<HeadlessDisplay> {
        engine_with(Config::default())
    }

    fn engine_with(config: Config) -> LayoutEngine<HeadlessDisplay> {
        LayoutEngine::new(Arc::new(config), Arc::new(HeadlessDisplay::new(SCREEN))).unwrap()
    }

    fn manage(e: &mut LayoutEngine<HeadlessDisplay>, n: u64) -> Vec<ClientId> {
        let mut ids: Vec<_> = (1..=n)
            .map(|w| e.manage(WindowId(w), Rect::new(10, 10, 200, 100)).unwrap())
            .collect();
        ids.reverse();
        ids
    }

    fn tiled(e: &LayoutEngine<HeadlessDisplay>, ids: &[ClientId]) -> Vec<Rect> {
        ids.iter().map(|id| e.store().client(*id).unwrap().tiled_region).collect()
    }

    fn snapshot(e: &LayoutEngine<HeadlessDisplay>) -> String { format!("{:?}", e.store()) }

    #[test]
    fn manage_tiles_and_pushes_to_the_display() {
        let mut e = engine();
        let ids = manage(&mut e, 3);
        assert_eq!(tiled(&e, &ids), vec![
            Rect::new(0, 0, 500, 500),
            Rect::new(500, 0, 500, 250),
            Rect::new(500, 250, 500, 250),
        ]);
        assert_eq!(e.focused_client(), Some(ids[0]));
        let shown = e.display().window(WindowId(3)).unwrap();
        assert_eq!(shown.region, Rect::new(0, 0, 498, 498));
        assert_eq!(shown.border_width, 1);
        assert_eq!(shown.border_color, Some(e.config().settings.colors.current));
        assert_eq!(e.display().focused(), Some(WindowId(3)));
    }

    #[test]
    fn lone_client_has_no_border() {
        let mut e = engine();
        manage(&mut e, 1);
        let shown = e.display().window(WindowId(1)).unwrap();
        assert_eq!((shown.region, shown.border_width), (SCREEN, 0));
    }

    #[test]
    fn manage_applies_rules_and_reads_properties() {
        let mut config = Config::default();
        config.rules.push(RuleSettings {
            class: Some("^Dialog$".into()),
            free: FreePolicy::Center,
            workspace: Some(2),
            ..Default::default()
        });
        let mut e = engine_with(config);
        e.display().set_class_hint(WindowId(5), "Dialog", "dlg");
        e.display().set_text_property(WindowId(5), TextProperty::WmName, "Open File");

        let id = e.manage(WindowId(5), Rect::new(0, 0, 200, 100)).unwrap();
        let c = e.store().client(id).unwrap();
        assert_eq!((c.class(), c.name(), c.title()), ("Dialog", "dlg", "Open File"));
        assert_eq!(c.free_policy, FreePolicy::Center);
        assert_eq!(c.workspace, 2);
        assert!(e.display().window(WindowId(5)).unwrap().offscreen);
        assert_eq!(e.focused_client(), None);
    }

    #[test]
    fn resolution_precedence_through_the_engine() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        let c = e.store_mut().client_mut(ids[1]).unwrap();
        c.is_fullscreen = true;
        c.free_policy = FreePolicy::Float;
        c.fixed_position = FixedPosition::Right;
        c.fixed_size = 0.25;

        assert_eq!(e.update_client(ids[1]).unwrap().region, SCREEN);

        e.normal(ids[1]).unwrap();
        assert_eq!(e.update_client(ids[1]).unwrap().region, Rect::new(10, 10, 198, 98));

        e.tile(ids[1]).unwrap();
        assert_eq!(e.update_client(ids[1]).unwrap().region, Rect::new(750, 0, 248, 498));
        assert_eq!(tiled(&e, &ids[..1]), vec![Rect::new(0, 0, 750, 500)]);
    }

    #[test]
    fn mirror_toggle_twice_restores_the_arrangement() {
        let mut e = engine();
        let ids = manage(&mut e, 4);
        let before = tiled(&e, &ids);

        e.handle_command(&LayoutCommand::ToggleMod(LayoutMods::MIRROR)).unwrap();
        let mirrored = tiled(&e, &ids);
        assert_ne!(mirrored, before);
        assert_eq!(mirrored[0], Rect::new(0, 0, 1000, 250));

        e.handle_command(&LayoutCommand::ToggleMod(LayoutMods::MIRROR)).unwrap();
        assert_eq!(tiled(&e, &ids), before);
    }

    #[test]
    fn rejected_increase_master_changes_nothing() {
        let mut e = engine();
        manage(&mut e, 3);
        let before = snapshot(&e);
        assert!(!e.increase_master(0, -1).unwrap());
        assert_eq!(snapshot(&e), before);

        assert!(!e.resize_master(0, 100.0).unwrap());
        assert_eq!(snapshot(&e), before);

        assert!(e.increase_master(0, 1).unwrap());
        assert_ne!(snapshot(&e), before);
    }

    #[test]
    fn minimize_and_restore() {
        let mut e = engine();
        let ids = manage(&mut e, 4);
        let order = e.store().workspace(0).unwrap().clients().to_vec();

        assert!(e.minimize(ids[1]).unwrap());
        let ws = e.store().workspace(0).unwrap();
        let arrange =
            Arrange::build(e.store(), ws, ws.active_layout(), &DefaultRules::default()).unwrap();
        assert_eq!(arrange.members().len(), 3);
        assert!(e.display().window(WindowId(3)).unwrap().offscreen);

        assert!(e.restore_last_minimized().unwrap());
        assert_eq!(e.store().workspace(0).unwrap().clients(), order);
        assert_eq!(e.focused_client(), Some(ids[1]));
        assert!(!e.display().window(WindowId(3)).unwrap().offscreen);
    }

    #[test]
    fn overlay_toggle_and_layout_change() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        assert!(e.toggle_overlay(0, 0).unwrap());
        assert_eq!(tiled(&e, &ids), vec![SCREEN, SCREEN]);
        assert!(e.toggle_overlay(0, 0).unwrap());
        assert_eq!(tiled(&e, &ids)[0], Rect::new(0, 0, 500, 500));
        assert!(!e.toggle_overlay(0, 7).unwrap());

        assert!(e.change_layout(0, 1).unwrap());
        assert_eq!(tiled(&e, &ids)[0], Rect::new(0, 0, 1000, 250));
        assert!(e.change_layout(0, -2).unwrap());
        assert_eq!(e.store().workspace(0).unwrap().layout_index(), 2);
    }

    #[test]
    fn reset_tiles_free_clients_and_restores_layouts() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        e.free(ids[0], FreePolicy::Float).unwrap();
        e.increase_master(0, 1).unwrap();
        e.change_layout(0, 1).unwrap();

        assert!(e.reset_layout(0).unwrap());
        let ws = e.store().workspace(0).unwrap();
        assert_eq!(ws.layout_index(), 0);
        assert_eq!(ws.layouts()[0].params.master_count, 1);
        assert!(!e.store().client(ids[0]).unwrap().is_free());
        assert_eq!(tiled(&e, &ids), vec![Rect::new(0, 0, 500, 500), Rect::new(500, 0, 500, 500)]);
    }

    #[test]
    fn fixed_clients_refuse_to_be_freed() {
        let mut e = engine();
        let ids = manage(&mut e, 1);
        e.store_mut().client_mut(ids[0]).unwrap().fixed_position = FixedPosition::Up;
        assert!(!e.free(ids[0], FreePolicy::Float).unwrap());
        assert!(!e.toggle_free(ids[0], FreePolicy::Float).unwrap());
        assert!(!e.store().client(ids[0]).unwrap().is_free());
    }

    #[test]
    fn focus_and_swap_with_selectors() {
        let mut e = engine();
        let ids = manage(&mut e, 3);
        assert!(e.focus(ids[0], Selector::Right));
        assert_eq!(e.focused_client(), Some(ids[1]));
        assert_eq!(e.display().focused(), Some(WindowId(2)));
        assert!(e.handle_command(&LayoutCommand::Focus(Selector::Old)).unwrap());
        assert_eq!(e.focused_client(), Some(ids[0]));

        assert!(e.swap(ids[0], Selector::Last).unwrap());
        assert_eq!(e.store().workspace(0).unwrap().clients(), [ids[2], ids[1], ids[0]]);
        assert_eq!(e.store().client(ids[0]).unwrap().tiled_region, Rect::new(500, 250, 500, 250));
        assert!(!e.swap(ids[0], Selector::SelfClient).unwrap());
    }

    #[test]
    fn kill_prefers_the_delete_protocol() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        e.display().set_supports_delete(WindowId(2), true);

        assert!(e.kill(ids[0]).unwrap());
        assert!(e.display().window(WindowId(2)).unwrap().delete_requested);
        assert!(e.store().client(ids[0]).is_some());

        assert!(e.kill(ids[1]).unwrap());
        assert!(e.display().window(WindowId(1)).unwrap().killed);
        assert!(e.store().client(ids[1]).is_none());
        assert_eq!(tiled(&e, &ids[..1]), vec![SCREEN]);
    }

    #[test]
    fn workspace_moves_and_switches() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        assert!(e.move_to_workspace(ids[0], 1).unwrap());
        assert!(e.display().window(WindowId(2)).unwrap().offscreen);
        assert_eq!(tiled(&e, &ids[1..]), vec![SCREEN]);

        assert!(e.change_workspace(1).unwrap());
        assert!(e.display().window(WindowId(1)).unwrap().offscreen);
        assert!(!e.display().window(WindowId(2)).unwrap().offscreen);
        assert_eq!(e.focused_client(), Some(ids[0]));
        assert!(!e.change_workspace(1).unwrap());
        assert!(!e.change_workspace(42).unwrap());
    }

    #[test]
    fn urgency_and_finders() {
        let mut e = engine();
        let ids = manage(&mut e, 3);
        assert_eq!(e.find_urgent(), None);
        assert!(e.set_urgent(ids[2]));
        assert_eq!(e.find_urgent(), Some(ids[2]));
        assert_eq!(
            e.display().window(WindowId(1)).unwrap().border_color,
            Some(e.config().settings.colors.urgent)
        );
        assert!(e.unset_urgent(ids[2]));
        assert_eq!(e.find_urgent(), None);

        assert_eq!(e.find_fixed(0), None);
        e.display().set_pointer(700, 400, Some(WindowId(1)));
        assert_eq!(e.pointed_client(), Some(ids[2]));
        e.display().set_pointer(700, 400, None);
        assert_eq!(e.pointed_client(), None);
    }

    #[test]
    fn property_updates() {
        let mut e = engine();
        let ids = manage(&mut e, 1);
        e.display().set_class_hint(WindowId(1), "Term", "term");
        e.display().set_text_property(WindowId(1), TextProperty::NetWmName, "shell");
        assert!(e.update_class_and_name(ids[0]));
        assert!(e.update_title(ids[0]));
        let c = e.store().client(ids[0]).unwrap();
        assert_eq!((c.class(), c.name(), c.title()), ("Term", "term", "shell"));
    }

    #[test]
    fn tree_marks_the_active_workspace_and_current_client() {
        let mut e = engine();
        manage(&mut e, 2);
        let tree = e.draw_tree();
        assert!(tree.contains("☒ ws1 [tile tall]"));
        assert!(tree.contains("☐ ws2"));
        assert!(tree.contains("* WindowId(2)"));
        assert_eq!(tree.matches("WindowId(").count(), 2);
    }

    #[test]
    fn interactive_move_follows_motion_and_releases_the_grab() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        e.display().set_pointer(50, 50, Some(WindowId(2)));
        e.display().push_grab_events([
            GrabEvent::Motion { x: 60, y: 55 },
            GrabEvent::ButtonPress,
            GrabEvent::Motion { x: 150, y: 80 },
            GrabEvent::ButtonRelease,
            GrabEvent::Motion { x: 999, y: 999 },
        ]);

        let end = e
            .transform(ids[0], TransformKind::Move, TransformMode::Free(FreePolicy::Float))
            .unwrap();
        assert_eq!(end, Some(TransformEnd::Released));
        let c = e.store().client(ids[0]).unwrap();
        assert_eq!(c.float_region, Rect::new(110, 40, 200, 100));
        assert!(c.is_free());
        assert_eq!(e.display().window(WindowId(2)).unwrap().region, Rect::new(110, 40, 198, 98));
        assert!(!e.display().is_grabbed());
        assert_eq!(e.display().ungrab_count(), 1);
    }

    #[test]
    fn interactive_resize_and_cancel() {
        let mut e = engine();
        let ids = manage(&mut e, 1);
        e.free(ids[0], FreePolicy::Float).unwrap();
        e.display().set_pointer(210, 110, None);
        e.display().push_grab_events([GrabEvent::Motion { x: 400, y: 300 }, GrabEvent::Cancel]);

        let end = e.transform(ids[0], TransformKind::Resize, TransformMode::Float).unwrap();
        assert_eq!(end, Some(TransformEnd::Cancelled));
        assert_eq!(e.store().client(ids[0]).unwrap().float_region, Rect::new(10, 10, 200, 100));
        assert_eq!(e.display().ungrab_count(), 1);

        e.display().push_grab_events([GrabEvent::Motion { x: 400, y: 300 }]);
        let end = e.transform(ids[0], TransformKind::Resize, TransformMode::Float).unwrap();
        assert_eq!(end, Some(TransformEnd::Closed));
        assert_eq!(e.store().client(ids[0]).unwrap().float_region, Rect::new(10, 10, 390, 290));
        assert_eq!(e.display().ungrab_count(), 2);
        assert!(!e.display().is_grabbed());
    }

    #[test]
    fn transform_is_rejected_for_fixed_clients_and_refused_grabs() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        e.store_mut().client_mut(ids[0]).unwrap().fixed_position = FixedPosition::Left;
        let end = e.transform(ids[0], TransformKind::Move, TransformMode::Float).unwrap();
        assert_eq!(end, None);

        e.display().refuse_grabs(true);
        let end = e.transform(ids[1], TransformKind::Move, TransformMode::Float).unwrap();
        assert_eq!(end, None);
        assert_eq!(e.display().ungrab_count(), 0);
    }

    #[test]
    fn refused_grab_leaves_the_client_tiled() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        let before = tiled(&e, &ids);
        e.display().refuse_grabs(true);

        let end = e
            .transform(ids[1], TransformKind::Move, TransformMode::Free(FreePolicy::Float))
            .unwrap();
        assert_eq!(end, None);
        assert!(!e.store().client(ids[1]).unwrap().is_free());
        assert_eq!(tiled(&e, &ids), before);

        e.display().refuse_grabs(false);
        e.display().disconnect();
        let end = e
            .transform(ids[1], TransformKind::Resize, TransformMode::Free(FreePolicy::Float))
            .unwrap();
        assert_eq!(end, None);
        assert!(!e.store().client(ids[1]).unwrap().is_free());
    }

    #[test]
    fn minimized_client_never_becomes_current() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        assert!(e.set_urgent(ids[1]));
        assert_eq!(e.find_urgent(), Some(ids[1]));

        assert!(e.minimize(ids[1]).unwrap());
        assert_eq!(e.find_urgent(), None);
        assert_eq!(e.find_window(WindowId(1)), Some(ids[1]));

        assert!(!e.focus(ids[1], Selector::SelfClient));
        assert!(!e.focus(ids[1], Selector::Next));
        assert_eq!(e.focused_client(), Some(ids[0]));
        assert_eq!(e.display().focused(), Some(WindowId(2)));

        let end = e.transform(ids[1], TransformKind::Move, TransformMode::Float).unwrap();
        assert_eq!(end, None);
        assert!(!e.display().is_grabbed());
        assert_eq!(e.focused_client(), Some(ids[0]));

        assert!(e.handle_command(&LayoutCommand::Minimize).unwrap());
        assert_eq!(e.focused_client(), None);
    }

    #[test]
    fn run_without_tiled_clients_leaves_regions_alone() {
        let mut e = engine();
        let ids = manage(&mut e, 3);
        e.free(ids[1], FreePolicy::Float).unwrap();
        let store = e.store_mut();
        store.client_mut(ids[0]).unwrap().is_fullscreen = true;
        store.client_mut(ids[2]).unwrap().fixed_position = FixedPosition::Left;
        let before = tiled(&e, &ids);

        let ws = e.store().workspace(0).unwrap();
        let arrange =
            Arrange::build(e.store(), ws, ws.active_layout(), &DefaultRules::default()).unwrap();
        assert!(arrange.is_empty());

        assert!(e.run_active(0).unwrap());
        assert_eq!(tiled(&e, &ids), before);
        assert!(e.handle_command(&LayoutCommand::Run).unwrap());
        assert_eq!(tiled(&e, &ids), before);
    }

    #[test]
    fn toggling_an_inactive_slot_keeps_the_active_arrangement() {
        let mut e = engine();
        let ids = manage(&mut e, 2);
        let before = tiled(&e, &ids);

        assert!(e.toggle_mod(0, LayoutSlot::Main(2), LayoutMods::REFLECT_X).unwrap());
        assert_eq!(tiled(&e, &ids), before);
        let ws = e.store().workspace(0).unwrap();
        assert_eq!(ws.layout(LayoutSlot::Main(2)).unwrap().mods, LayoutMods::REFLECT_X);
        assert_eq!(ws.active_layout().mods, LayoutMods::empty());
        assert!(!e.toggle_mod(0, LayoutSlot::Toggle(9), LayoutMods::MIRROR).unwrap());

        assert!(e.change_layout(0, 2).unwrap());
        assert_eq!(tiled(&e, &ids), vec![Rect::new(500, 0, 500, 500), Rect::new(0, 0, 500, 500)]);
    }

    #[test]
    fn transform_is_skipped_without_a_pointer() {
        let mut e = engine();
        let ids = manage(&mut e, 1);
        e.display().disconnect();
        let end = e.transform(ids[0], TransformKind::Resize, TransformMode::Float).unwrap();
        assert_eq!(end, None);
        assert!(!e.display().is_grabbed());
    }

    #[test]
    fn commands_round_trip_through_json() {
        let commands: Vec<LayoutCommand> = serde_json::from_str(
            r#"[
                {"manage": {"window": 1, "region": {"x": 0, "y": 0, "w": 10, "h": 10}}},
                {"manage": {"window": 2, "region": {"x": 0, "y": 0, "w": 10, "h": 10}}},
                {"toggle_mod": "REFLECT_X"},
                {"focus": "next"},
                "toggle_fullscreen",
                {"transform": {"kind": "move", "mode": {"free": "center"}}}
            ]"#,
        )
        .unwrap();
        assert_eq!(commands[2], LayoutCommand::ToggleMod(LayoutMods::REFLECT_X));

        let mut e = engine();
        for command in &commands[..5] {
            assert!(e.handle_command(command).unwrap(), "{command:?}");
        }
        let id = e.find_window(WindowId(1)).unwrap();
        assert!(e.store().client(id).unwrap().is_fullscreen);
        assert_eq!(e.display().window(WindowId(1)).unwrap().region, SCREEN);
        assert_eq!(e.display().window(WindowId(2)).unwrap().region, Rect::new(0, 0, 1000, 500));
    }
}
