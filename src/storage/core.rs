use super::object::{ListResponse, StorageObject, UploadFile};
use crate::infrastructure::{ensure_success, project_url};
use crate::types::constants::PROJECT_TOKEN_HEADER;
use crate::types::{DabblebaseError, Result};
use reqwest::multipart::{Form, Part};
use url::Url;

/// HTTP client for the project's file storage.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    project_token: String,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        project_id: impl Into<String>,
        project_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url,
            project_id: project_id.into(),
            project_token: project_token.into(),
        }
    }

    /// Uploads `file` to `path`, replacing whatever is stored there.
    ///
    /// # Errors
    ///
    /// [`DabblebaseError::MissingPath`], [`DabblebaseError::InvalidPath`]
    /// and [`DabblebaseError::MissingFile`] are returned before any request
    /// is made.
    pub async fn upload(&self, path: &str, file: UploadFile) -> Result<()> {
        let path = normalize_path(path)?;
        if file.is_empty() {
            return Err(DabblebaseError::MissingFile);
        }

        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);

        let mut url = self.storage_url(["upload"])?;
        url.query_pairs_mut().append_pair("path", path);

        tracing::debug!("Uploading to {}", path);
        let response = self
            .http
            .post(url)
            .header(PROJECT_TOKEN_HEADER, &self.project_token)
            .multipart(form)
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::info!("Uploaded {}", path);
        Ok(())
    }

    /// Every file stored for the project.
    pub async fn list(&self) -> Result<Vec<StorageObject>> {
        let url = self.storage_url(["list"])?;

        let response = self
            .http
            .get(url)
            .header(PROJECT_TOKEN_HEADER, &self.project_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let list: ListResponse = response.json().await?;
        tracing::debug!("Listed {} files", list.files.len());
        Ok(list.files)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let path = normalize_path(path)?;

        let mut url = self.storage_url(["delete"])?;
        url.query_pairs_mut().append_pair("path", path);

        let response = self
            .http
            .delete(url)
            .header(PROJECT_TOKEN_HEADER, &self.project_token)
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::info!("Deleted {}", path);
        Ok(())
    }

    /// Public view URL for `path`. No request is made.
    ///
    /// Each segment of `path` is percent-encoded on its own, so `/` keeps
    /// separating directories.
    pub fn get_url(&self, path: &str) -> Result<Url> {
        let path = normalize_path(path)?;

        let segments = ["view"].into_iter().chain(path.split('/'));
        let mut url = self.storage_url(segments)?;
        url.query_pairs_mut()
            .append_pair("token", &self.project_token);
        Ok(url)
    }

    fn storage_url<'a, I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        project_url(
            &self.base_url,
            &self.project_id,
            ["storage"].into_iter().chain(segments),
        )
    }
}

/// Strips leading slashes; nothing left means no path. Dot segments are
/// refused since URL normalization would drop them from the view URL.
fn normalize_path(path: &str) -> Result<&str> {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Err(DabblebaseError::MissingPath);
    }
    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(DabblebaseError::InvalidPath(path.to_string()));
    }
    Ok(path)
}
