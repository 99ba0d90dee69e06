//! Unifying error type for the engine's lifecycle, query, and validation
//! API. Internal crates keep their own narrow, `#[non_exhaustive]` error
//! enums; callers at this boundary match on one type instead.

use thiserror::Error;

use heptad_query::QueryError;
use heptad_store::StoreError;
use heptad_validate::ValidateError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error("shape {0} is already registered")]
    AlreadyExists(u32),
}
