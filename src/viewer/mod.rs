//! Client side: a slideshow over memes pulled from the resolver endpoint.

pub mod actions;
pub mod feed;
pub mod session;
pub mod state;

pub use actions::{Downloader, NoShareTarget, Sharer, SystemClipboard};
pub use feed::HttpMemeFeed;
pub use session::{Session, SessionHandle};
pub use state::{Command, Effect, Key, Presentation, Status, Viewer, ViewerSnapshot};
