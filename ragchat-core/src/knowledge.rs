//! Knowledge base management
//!
//! Upload, listing and deletion of the text files the service retrieves from.
//! These are single request/response calls; uploads are checked locally
//! against [`UploadConfig`] first so obviously bad files never leave the
//! machine.

use crate::config::{ClientConfig, UploadConfig};
use crate::http::{CallKind, CallOptions, ClientError, ClientResult, HttpClient};
use crate::notify::{Notifier, TracingNotifier};
use crate::protocol::{KnowledgeBaseListing, KnowledgeFile, ServerMessage, UploadReceipt};
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client for the `/api/upload` and `/api/knowledge-base` endpoints
#[derive(Clone)]
pub struct KnowledgeBaseClient {
    http: HttpClient,
    upload: UploadConfig,
    notifier: Arc<dyn Notifier>,
}

impl KnowledgeBaseClient {
    /// Create a client with default upload rules that logs its notices
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            upload: UploadConfig::default(),
            notifier: Arc::new(TracingNotifier::new()),
        }
    }

    /// Create a client from configuration
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let http = HttpClient::from_config(config)?;
        Ok(Self::new(http).with_upload_config(config.upload.clone()))
    }

    /// Replace the upload rules
    pub fn with_upload_config(mut self, upload: UploadConfig) -> Self {
        self.upload = upload;
        self
    }

    /// Report to another notification surface
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Upload a file from disk
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> ClientResult<UploadReceipt> {
        let path = path.as_ref();
        let io_err = |source| ClientError::Io {
            path: path.display().to_string(),
            source,
        };

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::InvalidUpload {
                filename: path.display().to_string(),
                reason: "path has no UTF-8 file name".to_string(),
            })?;

        // Reject by size before reading the whole file
        let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
        self.check_upload(filename, metadata.len())?;

        let data = tokio::fs::read(path).await.map_err(io_err)?;
        self.upload_bytes(filename, data).await
    }

    /// Upload in-memory content under `filename`
    pub async fn upload_bytes(
        &self,
        filename: &str,
        data: Vec<u8>,
    ) -> ClientResult<UploadReceipt> {
        self.check_upload(filename, data.len() as u64)?;

        let options = CallOptions::new(CallKind::Upload);
        let url = self.http.build_url(CallKind::Upload, &[])?;
        let size = data.len();
        let form = Form::new().part("file", Part::bytes(data).file_name(filename.to_string()));

        info!(
            "Uploading '{}' ({} bytes) [request_id: {}]",
            filename, size, options.request_id
        );
        let notice = self.notifier.info(&format!("Uploading {}...", filename));

        let result = self
            .http
            .post_multipart::<UploadReceipt>(url, form, &options)
            .await;
        self.notifier.dismiss(notice);

        match &result {
            Ok(receipt) => {
                info!(
                    "Stored '{}' as '{}' [request_id: {}]",
                    filename, receipt.filename, options.request_id
                );
                self.notifier.success(&format!("Uploaded {}", receipt.filename));
            }
            Err(e) => {
                warn!("Upload of '{}' failed [request_id: {}]: {}", filename, options.request_id, e);
                self.notifier.error(&format!("Upload of {} failed", filename));
            }
        }

        result
    }

    /// List the files currently in the knowledge base
    pub async fn list_files(&self) -> ClientResult<Vec<KnowledgeFile>> {
        let options = CallOptions::new(CallKind::ListKnowledgeBase);
        let url = self.http.build_url(CallKind::ListKnowledgeBase, &[])?;

        match self.http.get_json::<KnowledgeBaseListing>(url, &options).await {
            Ok(listing) => {
                debug!(
                    "Knowledge base holds {} files [request_id: {}]",
                    listing.files.len(),
                    options.request_id
                );
                Ok(listing.files)
            }
            Err(e) => {
                warn!("Listing knowledge base failed [request_id: {}]: {}", options.request_id, e);
                self.notifier.error("Failed to load the knowledge base");
                Err(e)
            }
        }
    }

    /// Delete one file from the knowledge base
    pub async fn delete_file(&self, filename: &str) -> ClientResult<ServerMessage> {
        if filename.is_empty() {
            return Err(ClientError::InvalidUpload {
                filename: String::new(),
                reason: "file name is empty".to_string(),
            });
        }

        let options = CallOptions::new(CallKind::DeleteKnowledgeFile);
        let url = self.http.build_url(CallKind::DeleteKnowledgeFile, &[filename])?;

        let notice = self.notifier.info(&format!("Deleting {}...", filename));
        let result = self.http.delete_json::<ServerMessage>(url, &options).await;
        self.notifier.dismiss(notice);

        match &result {
            Ok(_) => {
                info!("Deleted '{}' [request_id: {}]", filename, options.request_id);
                self.notifier.success(&format!("Deleted {}", filename));
            }
            Err(e) => {
                warn!("Deleting '{}' failed [request_id: {}]: {}", filename, options.request_id, e);
                self.notifier.error(&format!("Failed to delete {}", filename));
            }
        }

        result
    }

    /// Apply the local upload rules
    fn check_upload(&self, filename: &str, size: u64) -> ClientResult<()> {
        let reject = |reason: String| {
            Err(ClientError::InvalidUpload {
                filename: filename.to_string(),
                reason,
            })
        };

        if filename.trim().is_empty() {
            return reject("file name is empty".to_string());
        }

        if !self.upload.is_allowed(filename) {
            return reject(format!(
                "only {} files are accepted",
                self.upload.allowed_extensions.join(", ")
            ));
        }

        if size > self.upload.max_file_size_bytes {
            return reject(format!(
                "{} bytes exceeds the {} byte limit",
                size, self.upload.max_file_size_bytes
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for KnowledgeBaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseClient")
            .field("base_url", &self.http.base_url().as_str())
            .field("upload", &self.upload)
            .finish_non_exhaustive()
    }
}
