use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::common::config::Config;
use crate::model::{Client, ClientId, WindowId, Workspace};
use crate::sys::geometry::Rect;

/// A client parked outside every workspace list.
#[derive(Debug, Clone, Copy)]
struct Minimized {
    id: ClientId,
    /// Index in the workspace list at the time of minimizing.
    position: usize,
}

/// Owns every client record and the workspaces that order them.
///
/// A live client id is in exactly one place: one workspace list or the
/// minimized stack.
#[derive(Debug)]
pub struct ClientStore {
    clients: SlotMap<ClientId, Client>,
    workspaces: Vec<Workspace>,
    minimized: Vec<Minimized>,
    active: usize,
    screen: Rect,
}

impl ClientStore {
    pub fn new(config: &Config, screen: Rect) -> Self {
        let area = screen.shrink_by_gaps(&config.settings.reserved);
        let workspaces = config
            .workspaces
            .iter()
            .map(|ws| Workspace::new(ws, area, &config.layouts))
            .collect();
        Self {
            clients: SlotMap::with_key(),
            workspaces,
            minimized: Vec::new(),
            active: 0,
            screen,
        }
    }

    pub fn screen(&self) -> Rect { self.screen }

    pub fn client(&self, id: ClientId) -> Option<&Client> { self.clients.get(id) }

    pub fn client_mut(&mut self, id: ClientId) -> Option<&mut Client> { self.clients.get_mut(id) }

    pub fn clients(&self) -> impl Iterator<Item = (ClientId, &Client)> { self.clients.iter() }

    pub fn workspace(&self, ws: usize) -> Option<&Workspace> { self.workspaces.get(ws) }

    pub fn workspace_mut(&mut self, ws: usize) -> Option<&mut Workspace> {
        self.workspaces.get_mut(ws)
    }

    pub fn workspaces(&self) -> &[Workspace] { &self.workspaces }

    pub fn workspace_count(&self) -> usize { self.workspaces.len() }

    pub fn active_workspace(&self) -> usize { self.active }

    pub fn set_active_workspace(&mut self, ws: usize) -> bool {
        if ws >= self.workspaces.len() {
            return false;
        }
        self.active = ws;
        true
    }

    /// The workspace's clients in list order, paired with their records.
    pub fn workspace_clients(&self, ws: usize) -> impl Iterator<Item = (ClientId, &Client)> {
        self.workspaces
            .get(ws)
            .into_iter()
            .flat_map(|w| w.clients())
            .filter_map(|id| self.clients.get(*id).map(|c| (*id, c)))
    }

    /// Adds a client at the head of its workspace list. The workspace is
    /// clamped to the configured range.
    pub fn insert(&mut self, mut client: Client) -> ClientId {
        client.workspace = client.workspace.min(self.workspaces.len().saturating_sub(1));
        let ws = client.workspace;
        let id = self.clients.insert(client);
        if let Some(workspace) = self.workspaces.get_mut(ws) {
            workspace.insert(0, id);
        }
        trace!(?id, ws, "client attached");
        id
    }

    /// Drops a client from wherever it lives.
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        let client = self.clients.remove(id)?;
        if let Some(ws) = self.workspaces.get_mut(client.workspace) {
            ws.remove(id);
        }
        self.minimized.retain(|m| m.id != id);
        trace!(?id, "client removed");
        Some(client)
    }

    pub fn find_window(&self, window: WindowId) -> Option<ClientId> {
        self.clients.iter().find(|(_, c)| c.window() == window).map(|(id, _)| id)
    }

    pub fn is_minimized(&self, id: ClientId) -> bool { self.minimized.iter().any(|m| m.id == id) }

    pub fn minimized_count(&self) -> usize { self.minimized.len() }

    /// Moves a client from its workspace list onto the minimized stack.
    pub fn minimize(&mut self, id: ClientId) -> bool {
        let Some(ws) = self.clients.get(id).map(|c| c.workspace) else { return false };
        let Some(position) = self.workspaces.get_mut(ws).and_then(|w| w.remove(id)) else {
            return false;
        };
        self.minimized.push(Minimized { id, position });
        debug!(?id, ws, position, "client minimized");
        true
    }

    /// Puts the most recently minimized client back where it was and makes
    /// it current.
    pub fn restore_last(&mut self) -> Option<ClientId> {
        let Minimized { id, position } = self.minimized.pop()?;
        let ws = self.clients.get(id)?.workspace;
        let workspace = self.workspaces.get_mut(ws)?;
        workspace.insert(position, id);
        workspace.set_current(Some(id));
        debug!(?id, ws, position, "client restored");
        Some(id)
    }

    /// Reattaches a client at the head of another workspace, as its current
    /// client.
    pub fn move_to_workspace(&mut self, id: ClientId, target: usize) -> bool {
        if target >= self.workspaces.len() {
            return false;
        }
        let Some(client) = self.clients.get_mut(id) else { return false };
        let source = client.workspace;
        if source == target {
            return false;
        }
        let Some(_) = self.workspaces[source].remove(id) else { return false };
        client.workspace = target;
        self.workspaces[target].insert(0, id);
        self.workspaces[target].set_current(Some(id));
        debug!(?id, source, target, "client moved");
        true
    }
}
