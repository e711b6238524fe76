use crate::entity::{AuthBlob, ClientError};
use anyhow::Result;
use log::info;
use std::path::{Path, PathBuf};

/// Reads the auth token blob written by the login flow.
/// Read once when a screen opens; refreshing it is owned elsewhere.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub async fn load(&self) -> Result<AuthBlob> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            ClientError::Session(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let blob: AuthBlob = serde_json::from_slice(&raw)
            .map_err(|e| ClientError::Session(format!("invalid auth blob: {}", e)))?;

        if blob.token.is_empty() {
            return Err(ClientError::Session("auth token is empty".to_string()).into());
        }

        info!("Loaded session for {}", blob.user.username);
        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("p2p-session-{}-{}.json", name, std::process::id()))
    }

    #[tokio::test]
    async fn loads_persisted_user() {
        let path = temp_path("ok");
        tokio::fs::write(
            &path,
            r#"{ "token": "abc", "user": { "_id": "u1", "username": "alice" } }"#,
        )
        .await
        .unwrap();

        let blob = SessionStore::new(&path).load().await.unwrap();
        assert_eq!(blob.user.id, "u1");
        assert_eq!(blob.token, "abc");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_file_is_a_session_error() {
        let err = SessionStore::new(temp_path("missing")).load().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::Session(_))
        ));
    }
}
