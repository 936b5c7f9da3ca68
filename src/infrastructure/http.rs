use crate::types::constants::DEFAULT_SOCKET_PATH;
use crate::types::{DabblebaseError, Result};
use url::Url;

/// Builds `{base}/api/project/{project_id}/{segments...}`, encoding each
/// segment on its own.
pub fn project_url<'a, I>(base: &Url, project_id: &str, segments: I) -> Result<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| DabblebaseError::Config(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(["api", "project", project_id])
        .extend(segments);
    Ok(url)
}

/// Converts the backend's HTTP URL into the default realtime socket endpoint
pub fn http_to_ws_endpoint(base: &Url) -> Result<Url> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(DabblebaseError::Config(format!(
                "Unsupported URL scheme '{other}'"
            )));
        }
    };

    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|()| DabblebaseError::Config(format!("Cannot use {scheme} for {base}")))?;
    url.set_query(None);
    url.set_fragment(None);
    let path = format!("{}{}", url.path().trim_end_matches('/'), DEFAULT_SOCKET_PATH);
    url.set_path(&path);
    Ok(url)
}

/// Turns a non-success response into [`DabblebaseError::Http`], reading the
/// body text first.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|e| {
        tracing::debug!("Failed to read error response body: {}", e);
        String::new()
    });
    tracing::debug!("Request failed with status {}: {}", status, body);
    Err(DabblebaseError::Http {
        status: status.as_u16(),
        body,
    })
}
