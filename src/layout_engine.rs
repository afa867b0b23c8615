mod arrange;
mod arrangers;
mod engine;
mod error;
mod layout;
mod modifiers;
mod resolve;
mod selectors;
mod transform;

pub use arrange::Arrange;
pub use arrangers::{ArrangerKind, Span, grid_columns, partition};
pub use engine::{LayoutCommand, LayoutEngine};
pub use error::LayoutError;
pub use layout::{Layout, LayoutParams, LayoutSlot};
pub use modifiers::{LayoutMods, arrange_with_mods, reflect_x, reflect_y};
pub use resolve::{BorderColorPolicy, BorderGapPolicy, BorderWidthPolicy, Placement, ResolveContext};
pub use selectors::{Selector, client_at};
pub use transform::{Transform, TransformEnd, TransformKind, TransformMode};
