//! Content-addressed artifact stores.
//!
//! Both stores key artifacts by the SHA-256 of their bytes, so putting the
//! same content twice yields [`ArtifactPut::Existing`] with the original
//! reference.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use uplink_core::hashing::sha256_hex;
use uuid::Uuid;

use crate::collaborators::{ArtifactPut, ArtifactRef, ArtifactStore};
use crate::error::ArtifactError;

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

struct StoredArtifact {
    name: String,
    bytes: Vec<u8>,
}

/// Artifact store that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<String, StoredArtifact>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch stored bytes by reference.
    pub async fn get(&self, reference: &ArtifactRef) -> Option<Vec<u8>> {
        self.artifacts
            .read()
            .await
            .get(&reference.0)
            .map(|a| a.bytes.clone())
    }

    /// Name the artifact was first stored under.
    pub async fn name_of(&self, reference: &ArtifactRef) -> Option<String> {
        self.artifacts
            .read()
            .await
            .get(&reference.0)
            .map(|a| a.name.clone())
    }

    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, bytes: Vec<u8>, name: &str) -> Result<ArtifactPut, ArtifactError> {
        let hash = sha256_hex(&bytes);
        let mut artifacts = self.artifacts.write().await;

        if artifacts.contains_key(&hash) {
            return Ok(ArtifactPut::Existing(ArtifactRef(hash)));
        }

        artifacts.insert(
            hash.clone(),
            StoredArtifact {
                name: name.to_string(),
                bytes,
            },
        );
        Ok(ArtifactPut::Created(ArtifactRef(hash)))
    }
}

// ---------------------------------------------------------------------------
// Filesystem store
// ---------------------------------------------------------------------------

/// Artifact store writing one file per artifact, named by its hash.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn path_of(&self, reference: &ArtifactRef) -> PathBuf {
        self.root.join(&reference.0)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    /// Content is written to a temporary sibling and renamed into place, so a
    /// file at `<sha256>` is always complete. A file whose bytes no longer
    /// match its name is rewritten instead of being reported as `Existing`.
    async fn put(&self, bytes: Vec<u8>, name: &str) -> Result<ArtifactPut, ArtifactError> {
        let reference = ArtifactRef(sha256_hex(&bytes));
        let path = self.path_of(&reference);

        if let Ok(existing) = tokio::fs::read(&path).await {
            if sha256_hex(&existing) == reference.0 {
                return Ok(ArtifactPut::Existing(reference));
            }
            tracing::warn!(artifact = %reference, "Stored artifact does not match its digest, rewriting");
        }

        let tmp = self
            .root
            .join(format!(".{}.{}.tmp", reference.0, Uuid::new_v4()));
        let written = match write_file(&tmp, &bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(artifact = %reference, name, "Artifact written");
        Ok(ArtifactPut::Created(reference))
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}
