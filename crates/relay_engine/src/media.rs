//! Media classification and gallery resolution.
use relay_logging::{relay_debug, relay_warn};
use reqwest::header::USER_AGENT;
use serde_json::Value;
use url::Url;

use crate::types::map_reqwest_error;
use crate::{FailureKind, RelayError};

/// Second-to-last path segment of a gallery post url.
pub const GALLERY_MARKER: &str = "gallery";
/// Replaces [`GALLERY_MARKER`] in the metadata request url.
pub const COMMENTS_MARKER: &str = "comments";

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "webp"];
const ANIMATED_EXTENSIONS: [&str; 2] = ["gif", "webm"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Gif,
    Gallery,
    Unsupported(String),
}

impl MediaKind {
    pub fn is_supported(&self) -> bool {
        !matches!(self, MediaKind::Unsupported(_))
    }
}

fn path_segments(url: &str) -> Vec<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query.split('/').collect()
}

/// Classify a post url by its shape. Extension matching is case-sensitive.
pub fn classify(url: &str) -> MediaKind {
    let segments = path_segments(url);
    let last = segments.last().copied().unwrap_or_default();

    if let Some((_, extension)) = last.rsplit_once('.') {
        if IMAGE_EXTENSIONS.contains(&extension) {
            return MediaKind::Image;
        }
        if ANIMATED_EXTENSIONS.contains(&extension) {
            return MediaKind::Gif;
        }
    }

    if segments.len() >= 2 && segments[segments.len() - 2] == GALLERY_MARKER {
        return MediaKind::Gallery;
    }

    MediaKind::Unsupported("no recognized media extension".to_string())
}

/// Metadata request url for a gallery post: `/gallery/<id>` becomes `/comments/<id>.json`.
pub fn gallery_metadata_url(gallery_url: &str) -> Option<String> {
    let mut url = Url::parse(gallery_url).ok()?;
    let mut segments: Vec<String> = url.path_segments()?.map(str::to_owned).collect();
    let len = segments.len();
    if len < 2 || segments[len - 2] != GALLERY_MARKER || segments[len - 1].is_empty() {
        return None;
    }
    segments[len - 2] = COMMENTS_MARKER.to_string();
    segments[len - 1] = format!("{}.json", segments[len - 1]);
    url.set_path(&format!("/{}", segments.join("/")));
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Strip the query string and point a preview CDN url at the direct image host.
pub fn direct_image_url(raw: &str) -> String {
    let stripped = raw.split('?').next().unwrap_or(raw);
    match Url::parse(stripped) {
        Ok(mut url) => {
            let direct_host = url
                .host_str()
                .and_then(|host| host.strip_prefix("preview."))
                .map(|rest| format!("i.{rest}"));
            if let Some(host) = direct_host {
                if url.set_host(Some(&host)).is_err() {
                    return stripped.to_string();
                }
            }
            url.to_string()
        }
        Err(_) => stripped.replacen("preview", "i", 1),
    }
}

/// Pull per-item preview urls out of a gallery metadata document.
///
/// Returns `None` when the expected structure is missing.
pub fn extract_gallery_images(document: &Value) -> Option<Vec<String>> {
    let post = document
        .get(0)?
        .get("data")?
        .get("children")?
        .get(0)?
        .get("data")?;
    let metadata = post.get("media_metadata")?.as_object()?;

    let ordered: Vec<&Value> = match post.pointer("/gallery_data/items").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(|item| item.get("media_id").and_then(Value::as_str))
            .filter_map(|id| metadata.get(id))
            .collect(),
        None => metadata.values().collect(),
    };

    Some(
        ordered
            .into_iter()
            .filter_map(|entry| entry.pointer("/p/0/u").and_then(Value::as_str))
            .map(direct_image_url)
            .collect(),
    )
}

/// Resolves a gallery post into its image urls.
#[async_trait::async_trait]
pub trait GalleryResolver: Send + Sync {
    /// Transport failures are errors; a malformed document yields an empty list.
    async fn resolve(&self, gallery_url: &str) -> Result<Vec<String>, RelayError>;
}

pub struct HttpGalleryResolver {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpGalleryResolver {
    pub fn new(client: reqwest::Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait::async_trait]
impl GalleryResolver for HttpGalleryResolver {
    async fn resolve(&self, gallery_url: &str) -> Result<Vec<String>, RelayError> {
        let Some(url) = gallery_metadata_url(gallery_url) else {
            relay_warn!("Not a gallery url: {}", gallery_url);
            return Ok(Vec::new());
        };
        relay_debug!("Resolving gallery {} via {}", gallery_url, url);

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("gallery metadata {url}"),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let images = serde_json::from_slice::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(extract_gallery_images);
        match images {
            Some(images) => Ok(images),
            None => {
                relay_warn!("Gallery metadata for {} has unexpected shape", gallery_url);
                Ok(Vec::new())
            }
        }
    }
}
