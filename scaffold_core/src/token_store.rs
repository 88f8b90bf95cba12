//! # Token Storage
//!
//! The access token outlives a session: it is written when acquired, read
//! once at mount, and deleted only when the server says it has expired.
//!
//! [`TokenStore`] is the seam between the view state and the platform:
//! - [`FileTokenStore`] - JSON file in the config directory (native)
//! - [`MemoryTokenStore`] - in-process, for tests and one-shot CLI runs
//! - the GUI adds a `localStorage` store for browser builds

use crate::errors::CalcResult;

/// Key the token is stored under (file field / localStorage key)
pub const TOKEN_STORAGE_KEY: &str = "scaffold_access_token";

/// File name of the native token file
pub const TOKEN_FILE_NAME: &str = "token.json";

/// Persistent single-key store for the access token.
pub trait TokenStore {
    /// Stored token, if any. Unreadable storage counts as empty.
    fn load(&self) -> Option<String>;

    fn save(&mut self, token: &str) -> CalcResult<()>;

    fn clear(&mut self) -> CalcResult<()>;
}

/// Store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
    writes: usize,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        MemoryTokenStore {
            token: Some(token.into()),
            writes: 0,
        }
    }

    /// Number of save/clear calls so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) -> CalcResult<()> {
        self.token = Some(token.to_string());
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> CalcResult<()> {
        self.token = None;
        self.writes += 1;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileTokenStore;

#[cfg(not(target_arch = "wasm32"))]
mod file_store {
    use std::path::{Path, PathBuf};

    use serde::{Deserialize, Serialize};

    use super::TokenStore;
    use crate::errors::{CalcError, CalcResult};
    use crate::file_io;

    /// On-disk layout of the token file
    #[derive(Debug, Serialize, Deserialize)]
    struct TokenFile {
        #[serde(rename = "scaffold_access_token")]
        token: String,
    }

    /// Token persisted as a small JSON file
    #[derive(Debug, Clone)]
    pub struct FileTokenStore {
        path: PathBuf,
    }

    impl FileTokenStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            FileTokenStore { path: path.into() }
        }

        /// Store in the platform config directory
        pub fn default_location() -> CalcResult<Self> {
            crate::paths::token_file()
                .map(FileTokenStore::new)
                .ok_or_else(|| CalcError::Config {
                    reason: "no home directory to keep the access token in".to_string(),
                })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl TokenStore for FileTokenStore {
        fn load(&self) -> Option<String> {
            if !self.path.exists() {
                return None;
            }

            let parsed = file_io::read_to_string(&self.path).and_then(|json| {
                serde_json::from_str::<TokenFile>(&json).map_err(|e| CalcError::SerializationError {
                    reason: e.to_string(),
                })
            });

            match parsed {
                Ok(file) if !file.token.trim().is_empty() => Some(file.token),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable token file: {}", e);
                    None
                }
            }
        }

        fn save(&mut self, token: &str) -> CalcResult<()> {
            let json = serde_json::to_string_pretty(&TokenFile {
                token: token.to_string(),
            })
            .map_err(|e| CalcError::SerializationError {
                reason: e.to_string(),
            })?;

            file_io::write_atomic(&self.path, json.as_bytes())?;
            tracing::debug!("Access token saved to {}", self.path.display());
            Ok(())
        }

        fn clear(&mut self) -> CalcResult<()> {
            file_io::remove_if_exists(&self.path)?;
            tracing::debug!("Access token removed from {}", self.path.display());
            Ok(())
        }
    }
}
