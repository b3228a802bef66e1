//! Asset resolution: convert folder + file role to a direct download URL

use std::fmt;

use thiserror::Error;

use crate::gdrive::{FolderCache, FolderError};

/// Drive ids are always 33 characters long and start with '1'
pub const FOLDER_ID_LEN: usize = 33;
const FOLDER_ID_FIRST_CHAR: char = '1';

/// Logical file kinds stored in every convert folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    Track,
    Chart,
    Image,
    Video,
}

impl FileRole {
    pub const ALL: [FileRole; 4] = [
        FileRole::Track,
        FileRole::Chart,
        FileRole::Image,
        FileRole::Video,
    ];

    /// URL path segment for this role
    pub fn as_str(self) -> &'static str {
        match self {
            FileRole::Track => "track",
            FileRole::Chart => "chart",
            FileRole::Image => "image",
            FileRole::Video => "video",
        }
    }

    /// File names accepted for this role
    pub fn file_names(self) -> &'static [&'static str] {
        match self {
            FileRole::Track => &["track.mp3"],
            FileRole::Chart => &["maidata.txt"],
            FileRole::Image => &["bg.png", "bg.jpg"],
            FileRole::Video => &["pv.mp4"],
        }
    }

    /// Whether an entry named `name` fills this role
    ///
    /// An entry matches when its name is a substring of an accepted name.
    pub fn matches(self, name: &str) -> bool {
        !name.is_empty() && self.file_names().iter().any(|accepted| accepted.contains(name))
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset resolution errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("id is missing or is malformed: {0:?}")]
    MalformedId(String),

    #[error("could not find a {} file for this song", .role.file_names().join("/"))]
    NotFound { role: FileRole },

    #[error(transparent)]
    Folder(#[from] FolderError),
}

/// Check the structural shape of a Drive folder id
pub fn validate_folder_id(folder_id: &str) -> Result<(), ResolveError> {
    if folder_id.chars().count() != FOLDER_ID_LEN || !folder_id.starts_with(FOLDER_ID_FIRST_CHAR) {
        return Err(ResolveError::MalformedId(folder_id.to_string()));
    }
    Ok(())
}

/// Resolves convert files to download URLs through the folder cache
pub struct AssetResolver {
    cache: FolderCache,
    download_host: String,
}

impl AssetResolver {
    pub fn new(cache: FolderCache, download_host: impl Into<String>) -> Self {
        Self {
            cache,
            download_host: download_host.into(),
        }
    }

    pub fn cache(&self) -> &FolderCache {
        &self.cache
    }

    /// Direct download URL for a Drive file id
    pub fn download_url(&self, file_id: &str) -> String {
        format!("https://{}/download?id={}", self.download_host, file_id)
    }

    /// Resolve the download URL of `role`'s file inside `folder_id`
    pub async fn resolve(&self, folder_id: &str, role: FileRole) -> Result<String, ResolveError> {
        validate_folder_id(folder_id)?;

        let items = self.cache.get(folder_id).await?;
        let item = items
            .iter()
            .find(|item| role.matches(&item.name))
            .ok_or(ResolveError::NotFound { role })?;

        tracing::debug!(
            folder_id = %folder_id,
            role = %role,
            file_id = %item.id,
            name = %item.name,
            "Resolved convert file"
        );

        Ok(self.download_url(&item.id))
    }
}
