//! Local token storage
//!
//! Where a provider session survives between application loads. In a
//! browser this is the identity client's own storage; here it is a trait so
//! the runtime can keep tokens in memory or in a file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::client::AuthError;
use super::types::TokenSet;

/// Trait for token persistence
///
/// Implementations hold at most one token set.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored token set, if any
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be read.
    async fn load(&self) -> Result<Option<TokenSet>, AuthError>;

    /// Replace the stored token set
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be written.
    async fn save(&self, tokens: &TokenSet) -> Result<(), AuthError>;

    /// Remove the stored token set
    ///
    /// # Errors
    /// Returns error if the backing storage cannot be cleared.
    async fn clear(&self) -> Result<(), AuthError>;
}

/// In-memory token store; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenSet>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session
    #[must_use]
    pub fn with_tokens(tokens: TokenSet) -> Self {
        Self { tokens: RwLock::new(Some(tokens)) }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        Ok(self.tokens.read().clone())
    }

    async fn save(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        *self.tokens.write() = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        *self.tokens.write() = None;
        Ok(())
    }
}

/// JSON file token store
///
/// A missing file means "no session". A file that does not parse is an
/// error rather than an empty session.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store tokens at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the token file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AuthError::Storage(format!("corrupt token file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored session");
                Ok(None)
            }
            Err(e) => Err(AuthError::Storage(format!("failed to read token file: {e}"))),
        }
    }

    async fn save(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Storage(format!("failed to create token dir: {e}")))?;
        }
        let bytes = serde_json::to_vec(tokens)
            .map_err(|e| AuthError::Storage(format!("failed to encode tokens: {e}")))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| AuthError::Storage(format!("failed to write token file: {e}")))
    }

    async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(format!("failed to remove token file: {e}"))),
        }
    }
}
