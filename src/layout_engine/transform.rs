//! Pointer driven move and resize.
//!
//! [`LayoutEngine::transform`] blocks the calling thread until the button is
//! released. It is not reentrant: a second grab is refused by the display
//! while the first is held.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::layout_engine::{LayoutEngine, LayoutError, Selector};
use crate::model::{ClientId, FreePolicy};
use crate::sys::display::{Display, GrabEvent, PointerGrab};
use crate::sys::geometry::Rect;
use crate::sys::rules::RuleTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransformKind {
    Move,
    Resize,
}

/// Whether the client is freed before the transform starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// Edit the float region in place.
    Float,
    /// Free the client with the given policy first.
    Free(FreePolicy),
}

/// How the grab loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformEnd {
    Released,
    Cancelled,
    /// The event stream closed before a release arrived.
    Closed,
}

/// Rectangle arithmetic for one transform, anchored at grab start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transform {
    pub kind: TransformKind,
    pub origin: Rect,
    pub pointer: (i32, i32),
}

impl Transform {
    /// Region for a pointer at `(x, y)`. Moves translate by the pointer delta;
    /// resizes put the far corner under the pointer.
    pub fn apply(&self, x: i32, y: i32) -> Rect {
        let r = self.origin;
        match self.kind {
            TransformKind::Move => Rect {
                x: r.x + (x - self.pointer.0),
                y: r.y + (y - self.pointer.1),
                ..r
            },
            TransformKind::Resize => Rect {
                w: (x - r.x).max(1),
                h: (y - r.y).max(1),
                ..r
            },
        }
    }
}

impl<D: Display, R: RuleTable> LayoutEngine<D, R> {
    /// Runs an interactive transform on `id`. Returns `Ok(None)` when the
    /// transform was rejected (unknown, minimized or fixed client, no pointer,
    /// grab refused). A rejected transform leaves the placement untouched.
    pub fn transform(
        &mut self,
        id: ClientId,
        kind: TransformKind,
        mode: TransformMode,
    ) -> Result<Option<TransformEnd>, LayoutError> {
        let Some(client) = self.store().client(id) else { return Ok(None) };
        if client.is_fixed() {
            debug!(?id, "fixed client cannot be transformed");
            return Ok(None);
        }
        let ws = client.workspace;
        if !self.focus(id, Selector::SelfClient) {
            return Ok(None);
        }

        let Some(pointer) = self.display().query_pointer() else {
            warn!("pointer query failed, transform skipped");
            return Ok(None);
        };
        let grab = match PointerGrab::acquire(self.display()) {
            Ok(grab) => grab,
            Err(err) => {
                warn!(%err, "could not grab the pointer");
                return Ok(None);
            }
        };
        if let TransformMode::Free(policy) = mode {
            self.free(id, policy)?;
        }

        let Some(origin) = self.store().client(id).map(|c| c.float_region) else {
            return Ok(None);
        };
        let transform = Transform {
            kind,
            origin,
            pointer: (pointer.x, pointer.y),
        };
        debug!(?id, %kind, ?origin, "transform started");

        let end = loop {
            match grab.next_event() {
                Some(GrabEvent::Motion { x, y }) => {
                    let region = transform.apply(x, y);
                    trace!(?region, "transform step");
                    self.set_float_region(id, region);
                    self.run_active(ws)?;
                    self.update_workspace(ws);
                }
                Some(GrabEvent::ButtonPress) => {}
                Some(GrabEvent::ButtonRelease) => break TransformEnd::Released,
                Some(GrabEvent::Cancel) => {
                    self.set_float_region(id, origin);
                    self.run_active(ws)?;
                    self.update_workspace(ws);
                    break TransformEnd::Cancelled;
                }
                None => break TransformEnd::Closed,
            }
        };
        drop(grab);
        debug!(?id, ?end, "transform finished");
        Ok(Some(end))
    }

    fn set_float_region(&mut self, id: ClientId, region: Rect) {
        if let Some(client) = self.store_mut().client_mut(id) {
            client.float_region = region;
        }
    }
}
