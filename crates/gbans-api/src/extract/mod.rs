//! Custom [extractors].
//!
//! Rejections produced by these turn into [`ErrorResponse`]s with problem details instead of
//! axum's plain-text defaults.
//!
//! [extractors]: axum::extract
//! [`ErrorResponse`]: crate::response::ErrorResponse

pub mod header;
pub use header::Header;

pub mod path;
pub use path::Path;

pub mod query;
pub use query::Query;

pub mod json;
pub use json::Json;
