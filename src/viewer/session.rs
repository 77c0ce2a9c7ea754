use crate::{
    domain::MemeFeed,
    errors::{ActionError, FeedError},
    models::MemeRecord,
    viewer::{
        actions::{Downloader, ShareOutcome, Sharer},
        state::{Command, Effect, Viewer, ViewerSnapshot},
    },
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::{JoinHandle, JoinSet},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

enum ActionDone {
    Downloaded(Result<PathBuf, ActionError>),
    Shared(Result<ShareOutcome, ActionError>),
}

/// Owns a `Viewer` and every subscription feeding it: the refresh timer,
/// UI commands and completions of spawned work.
pub struct Session {
    feed: Arc<dyn MemeFeed>,
    downloader: Downloader,
    sharer: Sharer,
    refresh_interval: Duration,
    swipe_threshold: f32,
}

impl Session {
    pub fn new(
        feed: Arc<dyn MemeFeed>,
        downloader: Downloader,
        sharer: Sharer,
        refresh_interval: Duration,
        swipe_threshold: f32,
    ) -> Self {
        Self {
            feed,
            downloader,
            sharer,
            refresh_interval,
            swipe_threshold,
        }
    }

    /// Starts the session task. The first refresh fires immediately.
    pub fn spawn(self) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let viewer = Viewer::new(self.swipe_threshold);
        let (snapshot_tx, snapshot_rx) = watch::channel(viewer.snapshot());
        let task = tokio::spawn(self.run(viewer, commands_rx, snapshot_tx));
        SessionHandle {
            commands: commands_tx,
            snapshot: snapshot_rx,
            task,
        }
    }

    async fn run(
        self,
        mut viewer: Viewer,
        mut commands: mpsc::Receiver<Command>,
        snapshot: watch::Sender<ViewerSnapshot>,
    ) {
        info!(interval_ms = (self.refresh_interval.as_millis() as u64), "viewer session started");
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Dropping these sets (session end or abort) cancels whatever is still running.
        let mut resolving: JoinSet<Result<MemeRecord, FeedError>> = JoinSet::new();
        let mut actions: JoinSet<ActionDone> = JoinSet::new();

        loop {
            let effect = tokio::select! {
                _ = ticker.tick() => viewer.apply(Command::Refresh),
                command = commands.recv() => match command {
                    Some(command) => {
                        debug!(?command, "viewer command");
                        viewer.apply(command)
                    }
                    None => break,
                },
                Some(joined) = resolving.join_next() => {
                    match joined {
                        Ok(result) => {
                            viewer.finish_refresh(result);
                        }
                        Err(e) => {
                            warn!(error = %e, "resolution task ended abnormally");
                            viewer.fail_refresh("Failed to fetch meme. Try again.".to_string());
                        }
                    }
                    None
                }
                Some(joined) = actions.join_next() => {
                    match joined {
                        Ok(ActionDone::Downloaded(result)) => viewer.download_finished(result),
                        Ok(ActionDone::Shared(result)) => viewer.share_finished(result),
                        Err(e) => warn!(error = %e, "action task ended abnormally"),
                    }
                    None
                }
            };

            match effect {
                Some(Effect::Resolve) => {
                    let feed = self.feed.clone();
                    resolving.spawn(async move { feed.fetch().await });
                }
                Some(Effect::Download(meme)) => {
                    let downloader = self.downloader.clone();
                    actions.spawn(async move {
                        ActionDone::Downloaded(downloader.save(&meme).await)
                    });
                }
                Some(Effect::Share(meme)) => {
                    let sharer = self.sharer.clone();
                    actions.spawn(async move { ActionDone::Shared(sharer.share(&meme).await) });
                }
                None => {}
            }

            snapshot.send_if_modified(|current| {
                let next = viewer.snapshot();
                if *current == next {
                    return false;
                }
                *current = next;
                true
            });
        }

        info!("viewer session stopped");
    }
}

/// Handle to a running session. Dropping it tears the session down,
/// including the refresh timer.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<ViewerSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Returns false once the session has stopped.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewerSnapshot> {
        self.snapshot.clone()
    }

    pub async fn shutdown(mut self) {
        self.task.abort();
        if let Err(e) = (&mut self.task).await {
            if !e.is_cancelled() {
                warn!(error = %e, "viewer session ended abnormally");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
