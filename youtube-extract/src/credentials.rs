//! On-disk persistence of the OAuth token between runs.
//!
//! Exactly one [`Token`] is cached per store. The store never talks to the network; it only
//! knows how to find, read and atomically replace its token file.

use crate::error::{Error, Result};
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// File name of the cached token inside the credential directory.
const TOKEN_FILE: &str = "youtube-extract.json";

/// Refreshable tokens are treated as expired this long before their actual expiry.
const EXPIRY_BUFFER: SignedDuration = SignedDuration::from_secs(300);

/// An OAuth access credential, optionally refreshable.
///
/// A token without an `expiry` is never considered expired. A token without a
/// `refresh_token` stays usable up to its actual expiry and not a moment longer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Timestamp>,
}

impl Token {
    /// Whether the access credential should be refreshed before use at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match self.expiry {
            None => false,
            Some(at) => at
                .checked_sub(EXPIRY_BUFFER)
                .map_or(true, |deadline| now >= deadline),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// Whether the access credential is past its expiry at `now`, ignoring the safety buffer.
    pub fn has_lapsed_at(&self, now: Timestamp) -> bool {
        self.expiry.is_some_and(|at| now >= at)
    }

    pub fn has_lapsed(&self) -> bool {
        self.has_lapsed_at(Timestamp::now())
    }
}

/// File-backed store for a single [`Token`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Creates a store that keeps its token file in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a store under `~/.credentials`.
    pub fn in_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| Error::StorageUnavailable {
            reason: "could not determine home directory".into(),
            source: None,
        })?;
        Ok(Self::new(home.join(".credentials")))
    }

    /// Returns the token file path, creating the credential directory (owner-only) if needed.
    pub fn locate(&self) -> Result<PathBuf> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.dir).map_err(|e| {
            Error::storage(
                format!("create credential directory {}", self.dir.display()),
                e,
            )
        })?;
        Ok(self.dir.join(TOKEN_FILE))
    }

    /// Loads the cached token.
    ///
    /// Returns `Ok(None)` if nothing has been cached yet.
    pub fn load(&self) -> Result<Option<Token>> {
        let path = self.locate()?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::storage(format!("read {}", path.display()), e)),
        };
        let token =
            serde_json::from_str(&json).map_err(|source| Error::CorruptToken { path, source })?;
        Ok(Some(token))
    }

    /// Replaces the cached token.
    ///
    /// The token is written to a fresh owner-only temporary file next to the token file and then
    /// renamed over the previous one, so readers never observe a partially written token. The
    /// temporary file is removed if any step fails.
    pub fn save(&self, token: &Token) -> Result<()> {
        let path = self.locate()?;
        let json = serde_json::to_vec_pretty(token)
            .map_err(|e| Error::storage("serialize token", std::io::Error::other(e)))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{TOKEN_FILE}"))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| {
                Error::storage(
                    format!("create temporary file in {}", self.dir.display()),
                    e,
                )
            })?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Error::storage(format!("write {}", tmp.path().display()), e))?;
        tmp.persist(&path)
            .map_err(|e| Error::storage(format!("replace {}", path.display()), e.error))?;

        tracing::info!(path = %path.display(), "saved credential file");
        Ok(())
    }

    /// Removes the cached token, if any.
    pub fn clear(&self) -> Result<()> {
        let path = self.locate()?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed cached credential");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!("remove {}", path.display()), e)),
        }
    }
}
