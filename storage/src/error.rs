//! Storage error mapping.
//!
//! Every sqlx failure (connect, pool closed, query, I/O) means the backing service could not
//! serve the request, so it surfaces as [`StoreError::StoreUnavailable`].

use mirror_core::StoreError;

pub(crate) fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::StoreUnavailable(e.to_string())
}
