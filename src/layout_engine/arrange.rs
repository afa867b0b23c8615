use tracing::trace;

use crate::layout_engine::{Layout, LayoutError, LayoutParams, arrange_with_mods};
use crate::model::{ClientId, ClientStore, Workspace};
use crate::sys::geometry::Rect;
use crate::sys::rules::RuleTable;

/// Working set of one layout pass.
///
/// Holds client ids rather than references; results are copied back into the
/// store by [`Arrange::commit`], which also consumes the buffer.
#[derive(Debug)]
pub struct Arrange {
    pub region: Rect,
    members: Vec<ClientId>,
    floats: Vec<Rect>,
    regions: Vec<Rect>,
    params: LayoutParams,
}

fn reserve<T>(v: &mut Vec<T>, clients: usize) -> Result<(), LayoutError> {
    v.try_reserve_exact(clients)
        .map_err(|source| LayoutError::ResourceExhausted { clients, source })
}

impl Arrange {
    /// Collects the tiled clients of `workspace`. Fullscreen and free clients
    /// are left out; fixed clients are left out after carving their space
    /// from the region.
    pub fn build(
        store: &ClientStore,
        workspace: &Workspace,
        layout: &Layout,
        rules: &impl RuleTable,
    ) -> Result<Self, LayoutError> {
        let stack = workspace.stack_region();
        let mut region = stack.relative(&layout.region());
        let capacity = workspace.len();

        let mut members = Vec::new();
        let mut floats = Vec::new();
        let mut regions = Vec::new();
        reserve(&mut members, capacity)?;
        reserve(&mut floats, capacity)?;
        reserve(&mut regions, capacity)?;

        for &id in workspace.clients() {
            let Some(client) = store.client(id) else { continue };
            if client.is_fullscreen || client.is_free() {
                continue;
            }
            if !client.is_tiled() {
                rules.reserve_layout_region(&mut region, client, stack);
                continue;
            }
            members.push(id);
            floats.push(client.float_region);
            regions.push(client.tiled_region);
        }

        Ok(Self {
            region,
            members,
            floats,
            regions,
            params: layout.params,
        })
    }

    pub fn members(&self) -> &[ClientId] { &self.members }

    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    pub fn run(&mut self, layout: &Layout) {
        if self.is_empty() {
            return;
        }
        trace!(
            members = self.members.len(),
            arranger = %layout.arranger(),
            mods = ?layout.mods,
            "arranging"
        );
        arrange_with_mods(
            layout.arranger(),
            layout.mods,
            &mut self.region,
            &self.params,
            &self.floats,
            &mut self.regions,
        );
    }

    pub fn commit(self, store: &mut ClientStore) {
        for (id, region) in self.members.into_iter().zip(self.regions) {
            if let Some(client) = store.client_mut(id) {
                client.tiled_region = region;
            }
        }
    }
}
