use std::path::{Path, PathBuf};

use crate::error::OauthError;
use crate::record::AuthRecord;

/// Filesystem persistence for [`AuthRecord`]s, one JSON file per provider
///
/// Records are read at the start of every authenticated request and fully
/// rewritten on every update. There is no cross-process lock: concurrent
/// logins are kept apart by the device-code cooldown window only, which
/// is a best-effort discipline, not a linearizable one.
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    /// Store rooted at `dir`, or at `prism/oauth` under the user's config
    /// home when `dir` is `None`
    #[must_use]
    pub fn new(dir: Option<PathBuf>) -> Self {
        let dir = dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("prism")
                .join("oauth")
        });
        Self { dir }
    }

    /// Path of the record file for a provider slug
    #[must_use]
    pub fn path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.json"))
    }

    /// Directory holding all records
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the persisted record for `slug`, if any
    ///
    /// A missing file is `Ok(None)`; an unreadable or unparseable file is
    /// treated the same way, since a corrupt record should trigger a fresh
    /// login rather than wedge every request.
    pub async fn load(&self, slug: &str) -> Option<AuthRecord> {
        let path = self.path(slug);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unparseable token record");
                None
            }
        }
    }

    /// Persist the record for `slug`, rewriting the whole file
    ///
    /// # Errors
    ///
    /// Returns [`OauthError::Store`] if the directory cannot be created or
    /// the file cannot be written.
    pub async fn save(&self, slug: &str, record: &AuthRecord) -> Result<(), OauthError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| OauthError::Store(format!("creating {}: {e}", self.dir.display())))?;

        let path = self.path(slug);
        let raw = serde_json::to_string_pretty(record).map_err(|e| OauthError::Store(e.to_string()))?;

        tokio::fs::write(&path, raw)
            .await
            .map_err(|e| OauthError::Store(format!("writing {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Some(dir.path().to_path_buf()));

        let record = AuthRecord {
            access_token: Some("tok".to_owned()),
            refresh_token: Some("ref".to_owned()),
            expires_at: Some(1_234),
            ..AuthRecord::default()
        };

        store.save("chatgpt", &record).await.unwrap();
        let loaded = store.load("chatgpt").await.unwrap();

        assert_eq!(loaded.access_token.as_deref(), Some("tok"));
        assert_eq!(loaded.refresh_token.as_deref(), Some("ref"));
        assert_eq!(loaded.expires_at, Some(1_234));
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Some(dir.path().to_path_buf()));
        assert!(store.load("nobody").await.is_none());
    }

    #[tokio::test]
    async fn corrupt_record_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Some(dir.path().to_path_buf()));

        tokio::fs::create_dir_all(store.dir()).await.unwrap();
        tokio::fs::write(store.path("bad"), "{not json").await.unwrap();

        assert!(store.load("bad").await.is_none());
    }
}
