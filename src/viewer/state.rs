use crate::errors::{ActionError, FeedError};
use crate::models::MemeRecord;
use crate::viewer::actions::ShareOutcome;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const DEFAULT_SWIPE_THRESHOLD: f32 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    #[default]
    Normal,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Other,
}

/// Input the viewer reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Refresh,
    Previous,
    Next,
    Key(Key),
    TouchStart(f32),
    TouchEnd(f32),
    ToggleFullscreen,
    Download,
    Share,
}

/// Work the driver has to perform on the viewer's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Resolve,
    Download(MemeRecord),
    Share(MemeRecord),
}

/// What a UI needs to render one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewerSnapshot {
    pub len: usize,
    pub cursor: usize,
    pub current: Option<MemeRecord>,
    pub status: Status,
    pub presentation: Presentation,
    pub notice: Option<String>,
}

/// Slideshow over an append-only list of memes.
///
/// `cursor` is always `0` for an empty list and within `0..len` otherwise.
/// At most one resolution is in flight at a time.
#[derive(Debug, Clone)]
pub struct Viewer {
    items: Vec<MemeRecord>,
    cursor: usize,
    status: Status,
    touch_origin: Option<f32>,
    presentation: Presentation,
    in_flight: bool,
    notice: Option<String>,
    swipe_threshold: f32,
}

impl Default for Viewer {
    fn default() -> Self {
        Viewer::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl Viewer {
    pub fn new(swipe_threshold: f32) -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            status: Status::Idle,
            touch_origin: None,
            presentation: Presentation::Normal,
            in_flight: false,
            notice: None,
            swipe_threshold,
        }
    }

    pub fn items(&self) -> &[MemeRecord] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn touch_origin(&self) -> Option<f32> {
        self.touch_origin
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn current(&self) -> Option<&MemeRecord> {
        self.items.get(self.cursor)
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            len: self.items.len(),
            cursor: self.cursor,
            current: self.current().cloned(),
            status: self.status.clone(),
            presentation: self.presentation,
            notice: self.notice.clone(),
        }
    }

    /// Handles one input. Any pending notice is dropped so the next outcome
    /// always shows up as a change.
    pub fn apply(&mut self, command: Command) -> Option<Effect> {
        self.notice = None;
        match command {
            Command::Refresh => self.begin_refresh().then_some(Effect::Resolve),
            Command::Previous => {
                self.previous();
                None
            }
            Command::Next => {
                self.next();
                None
            }
            Command::Key(key) => {
                self.key(key);
                None
            }
            Command::TouchStart(x) => {
                self.touch_start(x);
                None
            }
            Command::TouchEnd(x) => {
                self.touch_end(x);
                None
            }
            Command::ToggleFullscreen => {
                self.toggle_fullscreen();
                None
            }
            Command::Download => self.current_with_image().map(Effect::Download),
            Command::Share => self.current_with_image().map(Effect::Share),
        }
    }

    /// Marks a resolution as started. Returns false while one is already pending.
    pub fn begin_refresh(&mut self) -> bool {
        if self.in_flight {
            debug!("viewer: refresh skipped, resolution already in flight");
            return false;
        }
        self.in_flight = true;
        self.status = Status::Loading;
        true
    }

    /// Applies a resolution result. Returns true when a new item was appended.
    pub fn finish_refresh(&mut self, result: Result<MemeRecord, FeedError>) -> bool {
        match result {
            Ok(meme) => {
                self.in_flight = false;
                self.status = Status::Idle;
                self.push(meme)
            }
            Err(e) => {
                warn!(error = %e, "viewer: resolution failed");
                self.fail_refresh(e.to_string());
                false
            }
        }
    }

    pub fn fail_refresh(&mut self, message: String) {
        self.in_flight = false;
        self.status = Status::Error(message);
    }

    fn push(&mut self, meme: MemeRecord) -> bool {
        let duplicate = meme.id.as_ref().is_some_and(|id| {
            self.items
                .iter()
                .any(|existing| existing.id.as_ref() == Some(id))
        });
        if duplicate {
            debug!(meme_id = ?meme.id, "viewer: duplicate meme ignored");
            return false;
        }
        self.items.push(meme);
        info!(len = self.items.len(), cursor = self.cursor, "viewer: meme appended");
        true
    }

    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn next(&mut self) {
        let last = self.items.len().saturating_sub(1);
        self.cursor = (self.cursor + 1).min(last);
    }

    pub fn key(&mut self, key: Key) {
        match key {
            Key::Left => self.previous(),
            Key::Right => self.next(),
            Key::Other => {}
        }
    }

    pub fn touch_start(&mut self, x: f32) {
        self.touch_origin = Some(x);
    }

    /// Leftward swipes (origin right of the end point) go forward.
    pub fn touch_end(&mut self, x: f32) {
        let Some(origin) = self.touch_origin.take() else {
            return;
        };
        let delta = origin - x;
        if delta.abs() < self.swipe_threshold {
            return;
        }
        if delta > 0.0 {
            self.next();
        } else {
            self.previous();
        }
    }

    pub fn toggle_fullscreen(&mut self) {
        self.presentation = match self.presentation {
            Presentation::Normal => Presentation::Fullscreen,
            Presentation::Fullscreen => Presentation::Normal,
        };
    }

    pub fn download_finished(&mut self, result: Result<PathBuf, ActionError>) {
        match result {
            Ok(path) => {
                info!(path = %path.display(), "viewer: meme downloaded");
                self.notice = Some(format!("Saved to {}", path.display()));
            }
            Err(e) => {
                warn!(error = %e, "viewer: download failed");
                self.status = Status::Error(e.to_string());
            }
        }
    }

    pub fn share_finished(&mut self, result: Result<ShareOutcome, ActionError>) {
        match result {
            Ok(ShareOutcome::Shared) => self.notice = Some("Shared!".to_string()),
            Ok(ShareOutcome::Copied) => {
                self.notice = Some("Image URL copied to clipboard!".to_string())
            }
            Err(e) => {
                warn!(error = %e, "viewer: share failed");
                self.notice = Some(e.to_string());
            }
        }
    }

    fn current_with_image(&self) -> Option<MemeRecord> {
        self.current().filter(|meme| meme.has_image()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meme(id: Option<&str>) -> MemeRecord {
        MemeRecord {
            id: id.map(str::to_string),
            name: "title".into(),
            image: "http://x/a.jpg".into(),
            subreddit: "memes".into(),
        }
    }

    fn with_items(n: usize) -> Viewer {
        let mut viewer = Viewer::default();
        for i in 0..n {
            assert!(viewer.begin_refresh());
            viewer.finish_refresh(Ok(meme(Some(&i.to_string()))));
        }
        viewer
    }

    #[test]
    fn initial_state() {
        let viewer = Viewer::default();
        assert!(viewer.items().is_empty());
        assert_eq!(viewer.cursor(), 0);
        assert_eq!(viewer.status(), &Status::Idle);
        assert_eq!(viewer.presentation(), Presentation::Normal);
        assert!(viewer.current().is_none());
    }

    #[test]
    fn same_id_is_deduplicated() {
        let mut viewer = Viewer::default();
        viewer.begin_refresh();
        assert!(viewer.finish_refresh(Ok(meme(Some("a")))));
        viewer.begin_refresh();
        assert!(!viewer.finish_refresh(Ok(meme(Some("a")))));
        assert_eq!(viewer.items().len(), 1);
        assert_eq!(viewer.status(), &Status::Idle);
    }

    #[test]
    fn absent_or_distinct_ids_always_append() {
        let mut viewer = Viewer::default();
        for id in [None, None, Some("a"), Some("b")] {
            viewer.begin_refresh();
            assert!(viewer.finish_refresh(Ok(meme(id))));
        }
        assert_eq!(viewer.items().len(), 4);
    }

    #[test]
    fn failure_sets_error_and_keeps_items() {
        let mut viewer = with_items(2);
        viewer.next();
        viewer.begin_refresh();
        viewer.finish_refresh(Err(FeedError::Rejected {
            status: 500,
            error: "Failed to fetch meme".into(),
            details: None,
        }));
        assert_eq!(viewer.status(), &Status::Error("Failed to fetch meme".into()));
        assert_eq!(viewer.items().len(), 2);
        assert_eq!(viewer.cursor(), 1);
        assert!(!viewer.is_in_flight());
    }

    #[test]
    fn refresh_is_skipped_while_in_flight() {
        let mut viewer = Viewer::default();
        assert_eq!(viewer.apply(Command::Refresh), Some(Effect::Resolve));
        assert_eq!(viewer.status(), &Status::Loading);
        assert_eq!(viewer.apply(Command::Refresh), None);
        viewer.finish_refresh(Ok(meme(None)));
        assert_eq!(viewer.apply(Command::Refresh), Some(Effect::Resolve));
    }

    #[test]
    fn boundaries_are_no_ops() {
        let mut viewer = with_items(3);
        viewer.previous();
        assert_eq!(viewer.cursor(), 0);
        viewer.next();
        viewer.next();
        viewer.next();
        assert_eq!(viewer.cursor(), 2);
    }

    #[test]
    fn cursor_stays_in_range_for_any_action_sequence() {
        let actions = [
            Command::Next,
            Command::Key(Key::Right),
            Command::Previous,
            Command::Key(Key::Left),
            Command::TouchStart(200.0),
            Command::TouchEnd(100.0),
            Command::TouchStart(0.0),
            Command::TouchEnd(120.0),
            Command::Key(Key::Other),
        ];
        for len in 0..4 {
            let mut viewer = with_items(len);
            // Deterministic pseudo-random walk over the action list.
            let mut seed = 7usize;
            for _ in 0..200 {
                seed = seed.wrapping_mul(31).wrapping_add(17) % 1009;
                viewer.apply(actions[seed % actions.len()].clone());
                if len == 0 {
                    assert_eq!(viewer.cursor(), 0);
                } else {
                    assert!(viewer.cursor() < len);
                }
            }
        }
    }

    #[test]
    fn short_swipe_is_ignored() {
        let mut viewer = with_items(3);
        viewer.touch_start(100.0);
        viewer.touch_end(70.0);
        assert_eq!(viewer.cursor(), 0);
        assert_eq!(viewer.touch_origin(), None);
    }

    #[test]
    fn leftward_swipe_goes_forward() {
        let mut viewer = with_items(3);
        viewer.apply(Command::TouchStart(180.0));
        viewer.apply(Command::TouchEnd(100.0));
        assert_eq!(viewer.cursor(), 1);
        assert_eq!(viewer.touch_origin(), None);

        viewer.touch_start(100.0);
        viewer.touch_end(180.0);
        assert_eq!(viewer.cursor(), 0);
    }

    #[test]
    fn touch_end_without_origin_is_ignored() {
        let mut viewer = with_items(2);
        viewer.touch_end(0.0);
        assert_eq!(viewer.cursor(), 0);
    }

    #[test]
    fn fullscreen_toggles() {
        let mut viewer = Viewer::default();
        viewer.apply(Command::ToggleFullscreen);
        assert_eq!(viewer.presentation(), Presentation::Fullscreen);
        viewer.apply(Command::ToggleFullscreen);
        assert_eq!(viewer.presentation(), Presentation::Normal);
    }

    #[test]
    fn download_and_share_need_a_current_image() {
        let mut empty = Viewer::default();
        assert_eq!(empty.apply(Command::Download), None);
        assert_eq!(empty.apply(Command::Share), None);

        let mut viewer = with_items(1);
        assert!(matches!(
            viewer.apply(Command::Download),
            Some(Effect::Download(m)) if m.id.as_deref() == Some("0")
        ));
        assert!(matches!(viewer.apply(Command::Share), Some(Effect::Share(_))));
    }

    #[test]
    fn download_failure_sets_error_without_touching_items() {
        let mut viewer = with_items(2);
        viewer.next();
        viewer.download_finished(Err(ActionError::NothingSelected));
        assert!(matches!(viewer.status(), Status::Error(_)));
        assert_eq!(viewer.items().len(), 2);
        assert_eq!(viewer.cursor(), 1);
    }

    #[test]
    fn share_failure_is_only_a_notice() {
        let mut viewer = with_items(1);
        viewer.share_finished(Err(ActionError::Share("denied".into())));
        assert_eq!(viewer.status(), &Status::Idle);
        assert!(viewer.notice().is_some());

        viewer.share_finished(Ok(ShareOutcome::Copied));
        assert_eq!(viewer.notice(), Some("Image URL copied to clipboard!"));
    }

    #[test]
    fn notice_is_cleared_by_the_next_command() {
        let mut viewer = with_items(1);
        viewer.share_finished(Ok(ShareOutcome::Copied));
        let shown = viewer.snapshot();

        assert!(matches!(viewer.apply(Command::Share), Some(Effect::Share(_))));
        assert_eq!(viewer.notice(), None);
        viewer.share_finished(Ok(ShareOutcome::Copied));
        assert_eq!(viewer.snapshot(), shown);

        viewer.apply(Command::Refresh);
        assert_eq!(viewer.notice(), None);
    }
}
