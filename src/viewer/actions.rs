use crate::{errors::ActionError, models::MemeRecord};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing;
use url::Url;
use uuid::Uuid;

const PREFERRED_EXTENSIONS: [&str; 6] = ["jpg", "png", "gif", "webp", "bmp", "svg"];

/// Saves the current meme's image into a directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: reqwest::Client,
    dir: PathBuf,
}

impl Downloader {
    pub fn new(http: reqwest::Client, dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            dir: dir.into(),
        }
    }

    /// Fetches the image bytes and writes them as `meme-<id>.<ext>`.
    ///
    /// Bytes land in a `.part` file unique to this call, which is renamed
    /// into place; the partial file is removed whenever the write fails.
    pub async fn save(&self, meme: &MemeRecord) -> Result<PathBuf, ActionError> {
        if !meme.has_image() {
            return Err(ActionError::NothingSelected);
        }
        tracing::debug!(image = %meme.image, dir = %self.dir.display(), "Downloading meme image");

        let resp = self.http.get(&meme.image).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ActionError::Status(status));
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?;

        let file_name = download_file_name(meme, content_type.as_deref());
        let target = self.dir.join(&file_name);
        let partial = self.dir.join(format!("{file_name}.{}.part", Uuid::new_v4()));

        if let Err(e) = write_then_rename(&partial, &target, &bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                tracing::debug!(path = %partial.display(), error = %cleanup, "No partial download to remove");
            }
            return Err(e.into());
        }

        tracing::info!(path = %target.display(), bytes = bytes.len(), "Meme image saved");
        Ok(target)
    }
}

async fn write_then_rename(partial: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(partial, bytes).await?;
    tokio::fs::rename(partial, target).await
}

/// `meme-<id>.<ext>`, or `meme-<uuid>.<ext>` when the record has no id.
pub fn download_file_name(meme: &MemeRecord, content_type: Option<&str>) -> String {
    let stem = meme
        .id
        .as_deref()
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    format!("meme-{}.{}", stem, image_extension(content_type, &meme.image))
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Extension from the Content-Type, then the URL path, else `jpg`.
fn image_extension(content_type: Option<&str>, image_url: &str) -> String {
    let from_header = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| ct.starts_with("image/"))
        .and_then(|ct| mime_guess::get_mime_extensions_str(&ct))
        .and_then(|exts| {
            exts.iter()
                .find(|ext| PREFERRED_EXTENSIONS.contains(*ext))
                .or_else(|| exts.first())
        })
        .map(|ext| ext.to_string());
    if let Some(ext) = from_header {
        return ext;
    }

    Url::parse(image_url)
        .ok()
        .and_then(|url| {
            Path::new(url.path())
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
        })
        .filter(|ext| {
            mime_guess::from_ext(ext)
                .first()
                .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE)
        })
        .unwrap_or_else(|| "jpg".to_string())
}

// --- Sharing ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_meme(meme: &MemeRecord) -> Self {
        Self {
            title: meme.name.clone(),
            text: format!("From r/{}", meme.subreddit),
            url: meme.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Copied,
}

/// A platform share sheet.
#[async_trait]
pub trait ShareTarget: Send + Sync + 'static {
    fn is_available(&self) -> bool;

    async fn share(&self, payload: &SharePayload) -> Result<(), ActionError>;
}

pub trait Clipboard: Send + Sync + 'static {
    fn set_text(&self, text: &str) -> Result<(), ActionError>;
}

/// Used where the platform offers no share sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShareTarget;

#[async_trait]
impl ShareTarget for NoShareTarget {
    fn is_available(&self) -> bool {
        false
    }

    async fn share(&self, _payload: &SharePayload) -> Result<(), ActionError> {
        Err(ActionError::Share("no share target on this platform".into()))
    }
}

/// System clipboard; the handle is opened per copy and dropped right after.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ActionError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ActionError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ActionError::Clipboard(e.to_string()))
    }
}

/// Native share when available, clipboard copy of the image URL otherwise.
#[derive(Clone)]
pub struct Sharer {
    target: Arc<dyn ShareTarget>,
    clipboard: Arc<dyn Clipboard>,
}

impl Sharer {
    pub fn new(target: Arc<dyn ShareTarget>, clipboard: Arc<dyn Clipboard>) -> Self {
        Self { target, clipboard }
    }

    pub async fn share(&self, meme: &MemeRecord) -> Result<ShareOutcome, ActionError> {
        if self.target.is_available() {
            let payload = SharePayload::for_meme(meme);
            self.target.share(&payload).await?;
            tracing::debug!(url = %payload.url, "Meme shared");
            return Ok(ShareOutcome::Shared);
        }
        self.clipboard.set_text(&meme.image)?;
        tracing::debug!(url = %meme.image, "Meme URL copied to clipboard");
        Ok(ShareOutcome::Copied)
    }
}
