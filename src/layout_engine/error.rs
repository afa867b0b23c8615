use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("could not allocate the arrange buffer for {clients} clients: {source}")]
    ResourceExhausted {
        clients: usize,
        #[source]
        source: TryReserveError,
    },
}
