use tracing::warn;

use crate::common::collections::HashMap;
use crate::common::config::{LayoutConf, WorkspaceSettings};
use crate::layout_engine::{Layout, LayoutSlot};
use crate::model::ClientId;
use crate::sys::geometry::{Gaps, Rect};

/// An ordered client list with its layouts and focus history.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub name: String,
    gaps: Gaps,
    area: Rect,
    clients: Vec<ClientId>,
    current: Option<ClientId>,
    previous: Option<ClientId>,
    layouts: Vec<Layout>,
    toggle_layouts: Vec<Layout>,
    layout_index: usize,
    toggled: Option<usize>,
}

fn build_layouts(names: &[String], confs: &HashMap<String, LayoutConf>) -> Vec<Layout> {
    names
        .iter()
        .filter_map(|name| match confs.get(name) {
            Some(conf) => Some(Layout::new(name.as_str(), conf.clone())),
            None => {
                warn!(layout = %name, "skipping unknown layout");
                None
            }
        })
        .collect()
}

impl Workspace {
    pub fn new(
        settings: &WorkspaceSettings,
        area: Rect,
        layouts: &HashMap<String, LayoutConf>,
    ) -> Self {
        let mut main = build_layouts(&settings.layouts, layouts);
        if main.is_empty() {
            main.push(Layout::new("tall", LayoutConf::default()));
        }
        Self {
            name: settings.name.clone(),
            gaps: settings.gaps,
            area,
            clients: Vec::new(),
            current: None,
            previous: None,
            layouts: main,
            toggle_layouts: build_layouts(&settings.toggle_layouts, layouts),
            layout_index: 0,
            toggled: None,
        }
    }

    /// Screen area owned by the workspace, gaps included.
    pub fn area(&self) -> Rect { self.area }

    /// Area available to windows once the workspace gaps are removed.
    pub fn stack_region(&self) -> Rect { self.area.shrink_by_gaps(&self.gaps) }

    pub fn clients(&self) -> &[ClientId] { &self.clients }

    pub fn len(&self) -> usize { self.clients.len() }

    pub fn is_empty(&self) -> bool { self.clients.is_empty() }

    pub fn contains(&self, id: ClientId) -> bool { self.clients.contains(&id) }

    pub fn position(&self, id: ClientId) -> Option<usize> {
        self.clients.iter().position(|c| *c == id)
    }

    pub fn head(&self) -> Option<ClientId> { self.clients.first().copied() }

    pub fn last(&self) -> Option<ClientId> { self.clients.last().copied() }

    pub fn current(&self) -> Option<ClientId> { self.current }

    pub fn previous(&self) -> Option<ClientId> { self.previous }

    /// Makes `id` current, remembering the old current client as previous.
    pub fn set_current(&mut self, id: Option<ClientId>) {
        if id == self.current {
            return;
        }
        if self.current.is_some() {
            self.previous = self.current;
        }
        self.current = id;
    }

    pub(crate) fn insert(&mut self, index: usize, id: ClientId) {
        let index = index.min(self.clients.len());
        self.clients.insert(index, id);
    }

    /// Takes `id` out of the list. A removed current client hands focus to
    /// its successor, or the new last client.
    pub(crate) fn remove(&mut self, id: ClientId) -> Option<usize> {
        let index = self.position(id)?;
        self.clients.remove(index);
        if self.previous == Some(id) {
            self.previous = None;
        }
        if self.current == Some(id) {
            self.current = self.clients.get(index).or(self.clients.last()).copied();
        }
        Some(index)
    }

    pub(crate) fn swap(&mut self, a: ClientId, b: ClientId) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(i), Some(j)) => {
                self.clients.swap(i, j);
                true
            }
            _ => false,
        }
    }

    pub fn layouts(&self) -> &[Layout] { &self.layouts }

    pub fn layout_index(&self) -> usize { self.layout_index }

    /// Moves the main layout index by `step`, wrapping in both directions.
    pub fn change_layout_index(&mut self, step: i32) {
        let len = self.layouts.len() as i64;
        self.layout_index = (self.layout_index as i64 + i64::from(step)).rem_euclid(len) as usize;
    }

    pub(crate) fn reset_layout_index(&mut self) { self.layout_index = 0; }

    /// Activates toggle layout `index`, or deactivates it when it is already
    /// active. Returns false for an index outside the toggle list.
    pub fn toggle(&mut self, index: usize) -> bool {
        if index >= self.toggle_layouts.len() {
            return false;
        }
        self.toggled = if self.toggled == Some(index) { None } else { Some(index) };
        true
    }

    /// The slot of the layout currently in effect.
    pub fn active_slot(&self) -> LayoutSlot {
        match self.toggled {
            Some(i) => LayoutSlot::Toggle(i),
            None => LayoutSlot::Main(self.layout_index),
        }
    }

    pub fn layout(&self, slot: LayoutSlot) -> Option<&Layout> {
        match slot {
            LayoutSlot::Main(i) => self.layouts.get(i),
            LayoutSlot::Toggle(i) => self.toggle_layouts.get(i),
        }
    }

    pub fn layout_mut(&mut self, slot: LayoutSlot) -> Option<&mut Layout> {
        match slot {
            LayoutSlot::Main(i) => self.layouts.get_mut(i),
            LayoutSlot::Toggle(i) => self.toggle_layouts.get_mut(i),
        }
    }

    pub fn active_layout(&self) -> &Layout {
        match self.toggled.and_then(|i| self.toggle_layouts.get(i)) {
            Some(layout) => layout,
            None => &self.layouts[self.layout_index],
        }
    }

    pub fn active_layout_mut(&mut self) -> &mut Layout {
        match self.toggled {
            Some(i) if i < self.toggle_layouts.len() => &mut self.toggle_layouts[i],
            _ => &mut self.layouts[self.layout_index],
        }
    }

    pub(crate) fn reset_layouts(&mut self) {
        for layout in self.layouts.iter_mut().chain(&mut self.toggle_layouts) {
            layout.reset();
        }
    }
}
