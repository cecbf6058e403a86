use ::anyhow::{Context, Result};
use ::std::path::PathBuf;
use async_trait::async_trait;

/// Where the bearer token for the signed-in user lives.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn token(&self) -> Result<Option<String>>;

    async fn set_token(&self, token: Option<String>) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    token: ::tokio::sync::RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        MemorySessionStore {
            token: ::tokio::sync::RwLock::new(Some(token.to_string())),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn token(&self) -> Result<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn set_token(&self, token: Option<String>) -> Result<()> {
        *self.token.write().await = token;
        Ok(())
    }
}

/// Keeps the token in a single file so it survives restarts.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn token(&self) -> Result<Option<String>> {
        match ::tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(err) if err.kind() == ::std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| {
                format!("reading session token from {}", self.path.display())
            }),
        }
    }

    async fn set_token(&self, token: Option<String>) -> Result<()> {
        match token {
            Some(token) => ::tokio::fs::write(&self.path, token)
                .await
                .with_context(|| {
                    format!("writing session token to {}", self.path.display())
                }),
            None => match ::tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ::std::io::ErrorKind::NotFound => {
                    Ok(())
                }
                Err(err) => Err(err).with_context(|| {
                    format!("removing session token {}", self.path.display())
                }),
            },
        }
    }
}
