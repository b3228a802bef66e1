//! Google Drive folder access without the Drive API
//!
//! Folder contents are read from the public "embedded folder view" page:
//! [`fetch`] retrieves the markup, [`parse`] turns it into [`FolderItem`]s
//! (with [`date`] normalizing the modification labels), and [`cache`] keeps
//! parsed listings for a fixed time so repeated lookups skip both steps.

use chrono::{DateTime, Utc};

pub mod cache;
pub mod date;
pub mod fetch;
pub mod parse;

pub use cache::{FolderCache, FolderError, FOLDER_CACHE_TTL};
pub use fetch::{EmbeddedViewFetcher, FetchError, FolderViewSource};
pub use parse::ParseError;

/// Whether an entry links to a file or a subfolder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
}

/// One entry of a folder view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderItem {
    /// Drive id of the file or folder
    pub id: String,
    /// Display name as rendered
    pub name: String,
    pub kind: ItemKind,
    pub last_modified: DateTime<Utc>,
}
