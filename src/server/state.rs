//! Server state and configuration.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::compositor::PreviewSession;
use crate::error::CertigenError;
use crate::fonts::FontRegistry;
use crate::image_source::ImageSource;
use crate::storage::{FileStore, Store, Workspace};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Directory holding the workspace JSON files
    pub data_dir: PathBuf,
    /// Let requests name http(s) template URLs for the server to fetch
    pub allow_remote_templates: bool,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub workspace: Workspace,
    pub fonts: Arc<RwLock<FontRegistry>>,
    pub http_client: reqwest::Client,
    /// Guards the live preview against out-of-order template loads.
    pub preview: PreviewSession,
}

impl AppState {
    /// Open the file-backed workspace under `config.data_dir`.
    pub fn new(config: ServerConfig) -> Result<Self, CertigenError> {
        let store = FileStore::open(&config.data_dir)?;
        Self::with_store(config, Arc::new(store))
    }

    /// Build state over any store, re-registering persisted fonts.
    pub fn with_store(config: ServerConfig, store: Arc<dyn Store>) -> Result<Self, CertigenError> {
        let workspace = Workspace::new(store);

        let mut fonts = FontRegistry::new();
        let restored = fonts.restore(&workspace.font_uploads()?);
        if restored > 0 {
            tracing::info!(count = restored, "restored uploaded fonts");
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("certigen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CertigenError::InvalidInput(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            config,
            workspace,
            fonts: Arc::new(RwLock::new(fonts)),
            http_client,
            preview: PreviewSession::new(),
        })
    }
}

impl AppState {
    /// Check a template source named by a client.
    ///
    /// Inline images are always accepted. File paths must resolve inside
    /// `data_dir` (relative paths are taken from there). URLs are accepted
    /// only with `allow_remote_templates`.
    pub async fn admit_template(&self, source: ImageSource) -> Result<ImageSource, CertigenError> {
        match source {
            ImageSource::DataUri(_) | ImageSource::Bytes(_) => Ok(source),
            ImageSource::Url(url) if self.config.allow_remote_templates => Ok(ImageSource::Url(url)),
            ImageSource::Url(url) => Err(CertigenError::InvalidInput(format!(
                "Remote templates are disabled on this server: {}",
                url
            ))),
            ImageSource::Path(path) => {
                let root = tokio::fs::canonicalize(&self.config.data_dir)
                    .await
                    .map_err(|e| {
                        CertigenError::Storage(format!(
                            "Failed to resolve data directory {}: {}",
                            self.config.data_dir.display(),
                            e
                        ))
                    })?;
                let resolved = tokio::fs::canonicalize(root.join(&path)).await.map_err(|_| {
                    CertigenError::InvalidInput(format!(
                        "Template {} not found in the data directory",
                        path.display()
                    ))
                })?;
                if !resolved.starts_with(&root) {
                    tracing::warn!(path = %path.display(), "template path outside data directory rejected");
                    return Err(CertigenError::InvalidInput(format!(
                        "Template {} is outside the data directory",
                        path.display()
                    )));
                }
                Ok(ImageSource::Path(resolved))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn state(data_dir: PathBuf, allow_remote_templates: bool) -> AppState {
        let config = ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            data_dir,
            allow_remote_templates,
        };
        AppState::with_store(config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn test_admit_inline_templates() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_path_buf(), false);
        let uri = ImageSource::DataUri("data:image/png;base64,AAAA".to_string());
        assert_eq!(state.admit_template(uri.clone()).await.unwrap(), uri);
    }

    #[tokio::test]
    async fn test_admit_paths_only_inside_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates/award.png"), b"png").unwrap();
        let outside = tempfile::NamedTempFile::new().unwrap();
        let state = state(dir.path().to_path_buf(), false);

        let admitted = state
            .admit_template(ImageSource::parse("templates/award.png"))
            .await
            .unwrap();
        assert!(matches!(admitted, ImageSource::Path(p) if p.ends_with("templates/award.png")));

        for rejected in [
            "../../../../etc/passwd".to_string(),
            outside.path().display().to_string(),
            "templates/missing.png".to_string(),
        ] {
            let result = state.admit_template(ImageSource::parse(&rejected)).await;
            assert!(
                matches!(result, Err(CertigenError::InvalidInput(_))),
                "{} was admitted",
                rejected
            );
        }
    }

    #[tokio::test]
    async fn test_remote_templates_need_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let url = ImageSource::parse("http://169.254.169.254/latest/meta-data");

        let closed = state(dir.path().to_path_buf(), false);
        assert!(closed.admit_template(url.clone()).await.is_err());

        let open = state(dir.path().to_path_buf(), true);
        assert_eq!(open.admit_template(url.clone()).await.unwrap(), url);
    }
}
