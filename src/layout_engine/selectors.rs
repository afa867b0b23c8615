use serde::{Deserialize, Serialize};

use crate::model::{ClientId, ClientStore};

/// Picks a client relative to another one on the same workspace.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Selector {
    #[default]
    #[serde(rename = "self")]
    #[strum(serialize = "self")]
    SelfClient,
    Next,
    Prev,
    /// The previously focused client.
    Old,
    Head,
    Last,
    Up,
    Down,
    Left,
    Right,
}

impl Selector {
    /// Never mutates; `None` when the client is unknown, minimized, or has
    /// no such neighbor.
    pub fn select(self, store: &ClientStore, id: ClientId) -> Option<ClientId> {
        let client = store.client(id)?;
        let ws = store.workspace(client.workspace)?;
        if !ws.contains(id) {
            return None;
        }
        let r = client.tiled_region;
        match self {
            Selector::SelfClient => Some(id),
            Selector::Next => {
                let i = ws.position(id)?;
                ws.clients().get(i + 1).copied().or_else(|| ws.head())
            }
            Selector::Prev => {
                let i = ws.position(id)?;
                i.checked_sub(1).and_then(|i| ws.clients().get(i).copied()).or_else(|| ws.last())
            }
            Selector::Old => ws.previous(),
            Selector::Head => ws.head(),
            Selector::Last => ws.last(),
            Selector::Up => client_at(store, client.workspace, r.x + 1, r.y - 1),
            Selector::Down => client_at(store, client.workspace, r.x + 1, r.bottom() + 1),
            Selector::Left => client_at(store, client.workspace, r.x - 1, r.y + 1),
            Selector::Right => client_at(store, client.workspace, r.right() + 1, r.y + 1),
        }
    }
}

/// First client in list order whose tiled region contains the point.
pub fn client_at(store: &ClientStore, ws: usize, x: i32, y: i32) -> Option<ClientId> {
    store
        .workspace_clients(ws)
        .find(|(_, c)| c.tiled_region.contains_point(x, y))
        .map(|(id, _)| id)
}
