use crate::errors::{FeedError, SourceError};
use crate::models::MemeRecord;
use async_trait::async_trait;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One upstream meme API: a network call plus a projection into `MemeRecord`.
#[async_trait]
pub trait MemeSource: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Short label used in logs and failure details.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<MemeRecord, SourceError>;
}

/// Where the viewer gets new memes from (normally the resolver endpoint).
#[async_trait]
pub trait MemeFeed: Send + Sync + 'static {
    async fn fetch(&self) -> Result<MemeRecord, FeedError>;
}

/// Source of randomness for sources that pick a subreddit or a post.
pub trait Picker: Send + Sync + 'static {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngPicker;

impl Picker for ThreadRngPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Replays a fixed sequence of indices, wrapping each into range.
/// Once the sequence runs out it keeps returning 0.
#[derive(Debug, Default)]
pub struct SequencePicker {
    values: Mutex<VecDeque<usize>>,
}

impl SequencePicker {
    pub fn new(values: impl IntoIterator<Item = usize>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }
}

impl Picker for SequencePicker {
    fn pick(&self, len: usize) -> usize {
        let next = self
            .values
            .lock()
            .map(|mut values| values.pop_front().unwrap_or(0))
            .unwrap_or(0);
        next % len.max(1)
    }
}
