use serde::{Deserialize, Serialize};
use url::Url;

/// A single meme as returned by the resolver and kept by the viewer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub subreddit: String,
}

impl MemeRecord {
    /// A record is only usable when `image` is an absolute http(s) URL.
    pub fn has_image(&self) -> bool {
        let image = self.image.trim();
        if image.is_empty() {
            return false;
        }
        Url::parse(image).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_id_is_not_serialized() {
        let meme = MemeRecord {
            id: None,
            name: "A".into(),
            image: "http://x/a.jpg".into(),
            subreddit: "memes".into(),
        };
        let value = serde_json::to_value(&meme).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "name": "A", "image": "http://x/a.jpg", "subreddit": "memes" })
        );
    }

    #[test]
    fn whitespace_image_is_unusable() {
        let meme = MemeRecord {
            id: Some("1".into()),
            name: String::new(),
            image: "  ".into(),
            subreddit: String::new(),
        };
        assert!(!meme.has_image());
    }

    #[test]
    fn image_must_be_an_absolute_http_url() {
        let with_image = |image: &str| MemeRecord {
            id: None,
            name: String::new(),
            image: image.into(),
            subreddit: String::new(),
        };
        assert!(with_image("https://i.redd.it/a.png").has_image());
        assert!(with_image("http://x/a.jpg").has_image());
        assert!(!with_image("not a url").has_image());
        assert!(!with_image("/relative/path.jpg").has_image());
        assert!(!with_image("ftp://x/a.jpg").has_image());
        assert!(!with_image("data:image/png;base64,AAAA").has_image());
    }
}
