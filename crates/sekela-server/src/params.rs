//! Request parameter structs, deserialized from query strings.

use serde::Deserialize;

/// Query parameters for `GET /universities/`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    /// Number of institutions to skip (default: 0)
    pub(crate) skip: Option<usize>,
    /// Maximum number of institutions to return (default: catalog.default_limit)
    pub(crate) limit: Option<usize>,
}
