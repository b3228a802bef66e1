//! Song catalog of available converts
//!
//! Loaded once at startup from a JSON file. When the file does not exist
//! yet it is downloaded from the catalog URL and written to disk first.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{url} -> {status} {reason}")]
    Download {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("Network error: {0}")]
    Network(String),
}

/// One convert in the catalog
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertSong {
    /// Drive folder id holding the convert's files
    pub id: String,
    /// Song id on zetaraku's maimai database
    pub zetaraku_id: String,
    pub title: String,
    pub artist: String,
    /// Only present when `title` is not in Latin script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanized_title: Option<String>,
    /// Only present when `artist` is not in Latin script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanized_artist: Option<String>,
    /// Aliases the community uses for the song
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_names: Option<Vec<String>>,
}

impl ConvertSong {
    /// Lowercased text searched by [`Catalog::search`]
    fn haystack(&self) -> String {
        let mut fields: Vec<&str> = vec![self.title.as_str(), self.artist.as_str()];
        fields.extend(self.romanized_title.as_deref());
        fields.extend(self.romanized_artist.as_deref());
        fields.push(self.zetaraku_id.as_str());
        if let Some(names) = &self.community_names {
            fields.extend(names.iter().map(String::as_str));
        }
        fields
            .into_iter()
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// Immutable list of converts
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    songs: Vec<ConvertSong>,
}

impl Catalog {
    pub fn new(songs: Vec<ConvertSong>) -> Self {
        Self { songs }
    }

    /// Load the catalog from `path`, bootstrapping it from `url` if missing
    pub async fn load(path: &Path, url: &str) -> Result<Self, CatalogError> {
        if path.exists() {
            return Self::from_file(path).await;
        }

        info!("Catalog file {} not found, downloading {}", path.display(), url);
        let body = download(url).await?;
        // Write only a body that parses
        let songs: Vec<ConvertSong> = serde_json::from_str(&body)?;
        tokio::fs::write(path, body).await?;
        info!("Saved {} converts to {}", songs.len(), path.display());
        Ok(Self::new(songs))
    }

    /// Read a catalog JSON file
    pub async fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = tokio::fs::read_to_string(path).await?;
        let songs: Vec<ConvertSong> = serde_json::from_str(&content)?;
        info!("Loaded {} converts from {}", songs.len(), path.display());
        Ok(Self::new(songs))
    }

    pub fn songs(&self) -> &[ConvertSong] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Songs matching every whitespace-separated term of `query`
    ///
    /// Matching is case-insensitive substring search over title, artist,
    /// romanizations, zetaraku id and community names. A blank query
    /// matches everything.
    pub fn search(&self, query: Option<&str>) -> Vec<&ConvertSong> {
        let query = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
        let terms: Vec<&str> = query.split_whitespace().collect();

        if terms.is_empty() {
            return self.songs.iter().collect();
        }

        self.songs
            .iter()
            .filter(|song| {
                let haystack = song.haystack();
                terms.iter().all(|term| haystack.contains(term))
            })
            .collect()
    }
}

async fn download(url: &str) -> Result<String, CatalogError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| CatalogError::Network(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CatalogError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Download {
            url: url.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| CatalogError::Network(e.to_string()))
}
