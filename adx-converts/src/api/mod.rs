//! HTTP API handlers for adx-converts

pub mod buildinfo;
pub mod converts;
pub mod health;

pub use buildinfo::get_build_info;
pub use converts::{list_converts, resolve_file, ApiError};
pub use health::health_routes;
