use crate::{
    domain::{MemeSource, Picker},
    errors::SourceError,
    models::MemeRecord,
};
use async_trait::async_trait;
use mime_guess::mime;
use serde::{de::DeserializeOwned, Deserialize};
use std::{fmt, str::FromStr, sync::Arc};
use tracing;
use url::Url;

pub const MEME_API_URL: &str = "https://meme-api.com/gimme";
pub const IMGFLIP_URL: &str = "https://api.imgflip.com/get_memes";
pub const REDDIT_URL: &str = "https://www.reddit.com/r/{subreddit}/hot.json?limit=50";
pub const RANDOM_DUCK_URL: &str = "https://random-d.uk/api/random";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    MemeApi,
    Imgflip,
    Reddit,
    RandomDuck,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::MemeApi => "meme-api",
            SourceKind::Imgflip => "imgflip",
            SourceKind::Reddit => "reddit",
            SourceKind::RandomDuck => "random-duck",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            SourceKind::MemeApi => MEME_API_URL,
            SourceKind::Imgflip => IMGFLIP_URL,
            SourceKind::Reddit => REDDIT_URL,
            SourceKind::RandomDuck => RANDOM_DUCK_URL,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meme-api" | "memeapi" => Ok(SourceKind::MemeApi),
            "imgflip" => Ok(SourceKind::Imgflip),
            "reddit" => Ok(SourceKind::Reddit),
            "random-duck" | "random" => Ok(SourceKind::RandomDuck),
            other => Err(format!("unknown meme source '{other}'")),
        }
    }
}

/// Descriptor for one entry of the source chain.
///
/// `url` may contain a `{subreddit}` placeholder (reddit). For meme-api a
/// non-empty `subreddits` list appends a random one as a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub kind: SourceKind,
    pub url: String,
    pub subreddits: Vec<String>,
}

impl SourceSpec {
    pub fn new(kind: SourceKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            subreddits: Vec::new(),
        }
    }

    pub fn with_subreddits(mut self, subreddits: &[String]) -> Self {
        self.subreddits = subreddits.to_vec();
        self
    }

    pub fn default_for(kind: SourceKind, subreddits: &[String]) -> Self {
        let spec = SourceSpec::new(kind, kind.default_url());
        match kind {
            SourceKind::Reddit => spec.with_subreddits(subreddits),
            _ => spec,
        }
    }
}

/// Turns the configured chain into source strategies sharing one HTTP client.
pub fn build_sources(
    specs: &[SourceSpec],
    http: reqwest::Client,
    picker: Arc<dyn Picker>,
) -> Vec<Arc<dyn MemeSource>> {
    specs
        .iter()
        .map(|spec| -> Arc<dyn MemeSource> {
            let http = http.clone();
            let picker = picker.clone();
            match spec.kind {
                SourceKind::MemeApi => Arc::new(MemeApiSource {
                    http,
                    url: spec.url.clone(),
                    subreddits: spec.subreddits.clone(),
                    picker,
                }),
                SourceKind::Imgflip => Arc::new(ImgflipSource {
                    http,
                    url: spec.url.clone(),
                    picker,
                }),
                SourceKind::Reddit => Arc::new(RedditSource {
                    http,
                    url_template: spec.url.clone(),
                    subreddits: spec.subreddits.clone(),
                    picker,
                }),
                SourceKind::RandomDuck => Arc::new(RandomDuckSource {
                    http,
                    url: spec.url.clone(),
                }),
            }
        })
        .collect()
}

async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
) -> Result<T, SourceError> {
    tracing::debug!(%url, "Requesting upstream");
    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status(status));
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// True for absolute http(s) URLs whose path looks like an image file.
pub fn is_image_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    mime_guess::from_path(url.path())
        .first()
        .is_some_and(|m| m.type_() == mime::IMAGE)
}

fn pick<'a, T>(picker: &dyn Picker, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(picker.pick(items.len()))
}

// --- meme-api.com ---

#[derive(Deserialize, Debug, Default)]
pub struct GimmeResponse {
    #[serde(rename = "postLink", default)]
    pub post_link: Option<String>,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub nsfw: bool,
}

pub fn project_gimme(resp: GimmeResponse) -> Result<MemeRecord, SourceError> {
    if resp.nsfw {
        return Err(SourceError::Unusable("post is flagged nsfw".into()));
    }
    if resp.url.trim().is_empty() {
        return Err(SourceError::Unusable("response has no url".into()));
    }
    let id = resp.post_link.as_deref().and_then(|link| {
        link.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|seg| !seg.is_empty() && !seg.contains(':'))
            .map(str::to_string)
    });
    Ok(MemeRecord {
        id,
        name: resp.title,
        image: resp.url,
        subreddit: resp.subreddit,
    })
}

pub struct MemeApiSource {
    http: reqwest::Client,
    url: String,
    subreddits: Vec<String>,
    picker: Arc<dyn Picker>,
}

#[async_trait]
impl MemeSource for MemeApiSource {
    fn name(&self) -> &str {
        SourceKind::MemeApi.as_str()
    }

    async fn fetch(&self) -> Result<MemeRecord, SourceError> {
        let url = match pick(self.picker.as_ref(), &self.subreddits) {
            Some(sub) => format!("{}/{}", self.url.trim_end_matches('/'), sub),
            None => self.url.clone(),
        };
        let resp: GimmeResponse = get_json(&self.http, &url).await?;
        project_gimme(resp)
    }
}

// --- imgflip ---

#[derive(Deserialize, Debug, Default)]
pub struct ImgflipResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<ImgflipData>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ImgflipData {
    #[serde(default)]
    pub memes: Vec<ImgflipMeme>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ImgflipMeme {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

pub fn project_imgflip(
    resp: ImgflipResponse,
    picker: &dyn Picker,
) -> Result<MemeRecord, SourceError> {
    if !resp.success {
        return Err(SourceError::Unusable("imgflip reported success=false".into()));
    }
    let memes = resp.data.map(|d| d.memes).unwrap_or_default();
    let meme = pick(picker, &memes)
        .cloned()
        .ok_or_else(|| SourceError::Unusable("imgflip returned no memes".into()))?;
    Ok(MemeRecord {
        id: Some(meme.id)
            .filter(|id| !id.is_empty())
            .map(|id| format!("imgflip-{id}")),
        name: meme.name,
        image: meme.url,
        subreddit: "imgflip".to_string(),
    })
}

pub struct ImgflipSource {
    http: reqwest::Client,
    url: String,
    picker: Arc<dyn Picker>,
}

#[async_trait]
impl MemeSource for ImgflipSource {
    fn name(&self) -> &str {
        SourceKind::Imgflip.as_str()
    }

    async fn fetch(&self) -> Result<MemeRecord, SourceError> {
        let resp: ImgflipResponse = get_json(&self.http, &self.url).await?;
        project_imgflip(resp, self.picker.as_ref())
    }
}

// --- reddit listing JSON ---

#[derive(Deserialize, Debug, Default)]
pub struct RedditListing {
    #[serde(default)]
    pub data: RedditListingData,
}

#[derive(Deserialize, Debug, Default)]
pub struct RedditListingData {
    #[serde(default)]
    pub children: Vec<RedditChild>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RedditChild {
    #[serde(default)]
    pub data: RedditPost,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct RedditPost {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub is_video: bool,
}

/// Keeps SFW still-image posts and picks one of them.
pub fn project_reddit(
    listing: RedditListing,
    picker: &dyn Picker,
) -> Result<MemeRecord, SourceError> {
    let candidates: Vec<RedditPost> = listing
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .filter(|post| !post.over_18 && !post.is_video && is_image_url(&post.url))
        .collect();
    let post = pick(picker, &candidates)
        .cloned()
        .ok_or_else(|| SourceError::Unusable("listing has no image posts".into()))?;
    Ok(MemeRecord {
        id: Some(post.name).filter(|name| !name.is_empty()),
        name: post.title,
        image: post.url,
        subreddit: post.subreddit,
    })
}

pub struct RedditSource {
    http: reqwest::Client,
    url_template: String,
    subreddits: Vec<String>,
    picker: Arc<dyn Picker>,
}

#[async_trait]
impl MemeSource for RedditSource {
    fn name(&self) -> &str {
        SourceKind::Reddit.as_str()
    }

    async fn fetch(&self) -> Result<MemeRecord, SourceError> {
        let subreddit = pick(self.picker.as_ref(), &self.subreddits)
            .ok_or_else(|| SourceError::Unusable("no subreddits configured".into()))?;
        let url = self.url_template.replace("{subreddit}", subreddit);
        let listing: RedditListing = get_json(&self.http, &url).await?;
        project_reddit(listing, self.picker.as_ref())
    }
}

// --- random-d.uk ---

#[derive(Deserialize, Debug, Default)]
pub struct DuckResponse {
    #[serde(default)]
    pub url: String,
}

pub fn project_duck(resp: DuckResponse) -> Result<MemeRecord, SourceError> {
    if resp.url.trim().is_empty() {
        return Err(SourceError::Unusable("response has no url".into()));
    }
    Ok(MemeRecord {
        id: None,
        name: "Random Meme".to_string(),
        image: resp.url,
        subreddit: "random".to_string(),
    })
}

pub struct RandomDuckSource {
    http: reqwest::Client,
    url: String,
}

#[async_trait]
impl MemeSource for RandomDuckSource {
    fn name(&self) -> &str {
        SourceKind::RandomDuck.as_str()
    }

    async fn fetch(&self) -> Result<MemeRecord, SourceError> {
        let resp: DuckResponse = get_json(&self.http, &self.url).await?;
        project_duck(resp)
    }
}
