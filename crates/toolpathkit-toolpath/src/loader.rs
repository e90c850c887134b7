//! Artifact loading: fetch a result file, then parse it.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use toolpathkit_core::ItemError;
use tracing::debug;

use crate::artifact::{Artifact, ToolpathFile};

/// Source of raw result-file bytes
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, file: &str) -> Result<Vec<u8>, ItemError>;
}

/// Turns raw result-file bytes into an artifact
pub trait ArtifactParser: Send + Sync {
    fn parse(&self, file: &str, bytes: &[u8]) -> Result<Artifact, ItemError>;
}

/// Reads result files from a data directory
#[derive(Debug, Clone)]
pub struct FsArtifactFetcher {
    data_dir: PathBuf,
}

impl FsArtifactFetcher {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve a file reference inside the data directory
    ///
    /// References must be relative and must not climb out of the directory.
    fn resolve(&self, file: &str) -> Result<PathBuf, ItemError> {
        let relative = Path::new(file);
        let plain = !file.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !plain {
            return Err(ItemError::ArtifactFetchFailure {
                file: file.to_string(),
                reason: "file reference must be a relative path inside the data directory"
                    .to_string(),
            });
        }
        Ok(self.data_dir.join(relative))
    }
}

#[async_trait]
impl ArtifactFetcher for FsArtifactFetcher {
    async fn fetch(&self, file: &str) -> Result<Vec<u8>, ItemError> {
        let path = self.resolve(file)?;
        debug!(file, path = %path.display(), "Fetching tool path file");
        tokio::fs::read(&path)
            .await
            .map_err(|e| ItemError::ArtifactFetchFailure {
                file: file.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Parser for the JSON toolpath format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonToolpathParser;

impl ArtifactParser for JsonToolpathParser {
    fn parse(&self, file: &str, bytes: &[u8]) -> Result<Artifact, ItemError> {
        let parse_failure = |reason: String| ItemError::ArtifactParseFailure {
            file: file.to_string(),
            reason,
        };
        let document: ToolpathFile =
            serde_json::from_slice(bytes).map_err(|e| parse_failure(e.to_string()))?;
        let geometry = document
            .to_geometry()
            .map_err(|e| parse_failure(e.to_string()))?;
        Ok(Artifact {
            file: file.to_string(),
            geometry,
        })
    }
}

/// Fetch-then-parse pipeline
///
/// Resolves only with a fully parsed artifact.
#[derive(Clone)]
pub struct ArtifactLoader {
    fetcher: Arc<dyn ArtifactFetcher>,
    parser: Arc<dyn ArtifactParser>,
}

impl ArtifactLoader {
    pub fn new(fetcher: Arc<dyn ArtifactFetcher>, parser: Arc<dyn ArtifactParser>) -> Self {
        Self { fetcher, parser }
    }

    /// Filesystem fetcher under `data_dir` with the JSON parser
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(FsArtifactFetcher::new(data_dir)),
            Arc::new(JsonToolpathParser),
        )
    }

    pub async fn load(&self, file: &str) -> Result<Artifact, ItemError> {
        let bytes = self.fetcher.fetch(file).await?;
        let artifact = self.parser.parse(file, &bytes)?;
        debug!(
            file,
            segments = artifact.geometry.segments.len(),
            "Tool path file loaded"
        );
        Ok(artifact)
    }
}

impl std::fmt::Debug for ArtifactLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactLoader").finish_non_exhaustive()
    }
}
