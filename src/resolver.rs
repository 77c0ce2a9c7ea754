use crate::{domain::MemeSource, errors::ResolveError, errors::SourceError, models::MemeRecord};
use std::sync::Arc;
use tracing;

/// Walks the source chain in priority order; the first record with an image wins.
#[derive(Clone)]
pub struct Resolver {
    sources: Vec<Arc<dyn MemeSource>>,
}

impl Resolver {
    pub fn new(sources: Vec<Arc<dyn MemeSource>>) -> Self {
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        tracing::info!(sources = ?names, "Initializing meme resolver");
        Self { sources }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// One resolution: every source is tried at most once.
    pub async fn resolve(&self) -> Result<MemeRecord, ResolveError> {
        let mut last_failure: Option<String> = None;

        for (attempt, source) in self.sources.iter().enumerate() {
            let name = source.name();
            tracing::debug!(source = %name, attempt, "Trying meme source");

            let miss = match source.fetch().await {
                Ok(meme) if meme.has_image() => {
                    tracing::info!(source = %name, meme_id = ?meme.id, "Meme resolved");
                    return Ok(meme);
                }
                Ok(_) => SourceError::Unusable("record has no usable image URL".into()),
                Err(e) => e,
            };

            tracing::warn!(source = %name, error = %miss, "Meme source missed, falling back");
            last_failure = Some(format!("{name}: {miss}"));
        }

        tracing::error!(tried = self.sources.len(), last_failure = ?last_failure, "All meme sources failed");
        Err(ResolveError::Exhausted {
            details: last_failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: returns a canned outcome and counts calls.
    struct Scripted {
        name: &'static str,
        image: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn hit(name: &'static str, image: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                image: Some(image),
                calls: AtomicUsize::new(0),
            })
        }

        fn miss(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                image: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MemeSource for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<MemeRecord, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.image {
                Some(image) => Ok(MemeRecord {
                    id: Some(self.name.to_string()),
                    name: self.name.to_string(),
                    image: image.to_string(),
                    subreddit: "test".to_string(),
                }),
                None => Err(SourceError::Unusable(format!("{} is down", self.name))),
            }
        }
    }

    fn chain(sources: &[Arc<Scripted>]) -> Resolver {
        Resolver::new(sources.iter().map(|s| s.clone() as Arc<dyn MemeSource>).collect())
    }

    #[tokio::test]
    async fn first_usable_source_wins_for_every_availability_pattern() {
        // Each bit of `mask` decides whether that source is available.
        for mask in 0u8..8 {
            let sources: Vec<Arc<Scripted>> = (0..3)
                .map(|i| {
                    let name = ["a", "b", "c"][i];
                    if mask & (1 << i) != 0 {
                        Scripted::hit(name, "http://x/img.jpg")
                    } else {
                        Scripted::miss(name)
                    }
                })
                .collect();
            let result = chain(&sources).resolve().await;

            match (0..3).find(|i| mask & (1 << i) != 0) {
                Some(first) => {
                    let meme = result.unwrap();
                    assert_eq!(meme.name, ["a", "b", "c"][first]);
                    assert!(meme.has_image());
                    // Sources after the winner are never called.
                    for later in &sources[first + 1..] {
                        assert_eq!(later.calls(), 0);
                    }
                }
                None => assert!(result.is_err()),
            }
            for source in &sources {
                assert!(source.calls() <= 1);
            }
        }
    }

    #[tokio::test]
    async fn empty_image_counts_as_miss() {
        let blank = Scripted::hit("blank", "");
        let good = Scripted::hit("good", "http://x/good.png");
        let meme = chain(&[blank.clone(), good]).resolve().await.unwrap();
        assert_eq!(meme.name, "good");
        assert_eq!(blank.calls(), 1);
    }

    #[tokio::test]
    async fn non_url_image_counts_as_miss() {
        let text = Scripted::hit("text", "not a url");
        let relative = Scripted::hit("relative", "/relative/path.jpg");
        let good = Scripted::hit("good", "https://x/good.png");
        let meme = chain(&[text.clone(), relative.clone(), good])
            .resolve()
            .await
            .unwrap();
        assert_eq!(meme.name, "good");
        assert_eq!(text.calls(), 1);
        assert_eq!(relative.calls(), 1);
    }

    #[tokio::test]
    async fn non_url_image_alone_exhausts_with_its_reason() {
        let err = chain(&[Scripted::hit("text", "not a url")])
            .resolve()
            .await
            .unwrap_err();
        let ResolveError::Exhausted { details } = err;
        let details = details.unwrap();
        assert!(details.starts_with("text:"), "details were {details}");
        assert!(details.contains("usable image URL"), "details were {details}");
    }

    #[tokio::test]
    async fn exhaustion_reports_last_failure() {
        let err = chain(&[Scripted::miss("first"), Scripted::miss("last")])
            .resolve()
            .await
            .unwrap_err();
        let ResolveError::Exhausted { details } = err;
        let details = details.unwrap();
        assert!(details.starts_with("last:"), "details were {details}");
    }

    #[tokio::test]
    async fn empty_chain_is_exhausted() {
        let err = Resolver::new(Vec::new()).resolve().await.unwrap_err();
        assert!(matches!(err, ResolveError::Exhausted { details: None }));
    }
}
