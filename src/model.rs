pub mod client;
pub mod store;
pub mod workspace;

pub use client::{Client, ClientId, FixedPosition, FreePolicy, MAX_PROPERTY_LEN, WindowId};
pub use store::ClientStore;
pub use workspace::Workspace;
