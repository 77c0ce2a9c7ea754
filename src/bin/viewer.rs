//! Terminal front end for the meme viewer session.
//!
//! Commands (one per line): `p`/`left`, `n`/`right`, `swipe <dx>`, `f`, `d`,
//! `s`, `r`, `q`.

use anyhow::{Context, Result};
use meme_viewer::{
    config::ViewerConfig,
    viewer::{
        Command, Downloader, HttpMemeFeed, Key, NoShareTarget, Session, Sharer, Status,
        SystemClipboard, ViewerSnapshot,
    },
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

enum Input {
    Command(Vec<Command>),
    Quit,
    Unknown,
}

fn parse_line(line: &str) -> Input {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Input::Unknown;
    };
    let commands = match word {
        "p" | "prev" | "left" => vec![Command::Key(Key::Left)],
        "n" | "next" | "right" => vec![Command::Key(Key::Right)],
        "f" | "fullscreen" => vec![Command::ToggleFullscreen],
        "d" | "download" => vec![Command::Download],
        "s" | "share" => vec![Command::Share],
        "r" | "refresh" => vec![Command::Refresh],
        "q" | "quit" => return Input::Quit,
        "swipe" => match parts.next().and_then(|dx| dx.parse::<f32>().ok()) {
            // Positive dx moves the finger right, like dragging back to the previous meme.
            Some(dx) => vec![Command::TouchStart(0.0), Command::TouchEnd(dx)],
            None => return Input::Unknown,
        },
        _ => return Input::Unknown,
    };
    Input::Command(commands)
}

fn render(snapshot: &ViewerSnapshot) {
    match &snapshot.current {
        Some(meme) => println!(
            "[{}/{}] {} (r/{})\n    {}",
            snapshot.cursor + 1,
            snapshot.len,
            if meme.name.is_empty() { "(untitled)" } else { meme.name.as_str() },
            meme.subreddit,
            meme.image
        ),
        None => println!("[0/0] waiting for memes..."),
    }
    match &snapshot.status {
        Status::Idle => {}
        Status::Loading => println!("    fetching..."),
        Status::Error(msg) => println!("    error: {msg}"),
    }
    if let Some(notice) = &snapshot.notice {
        println!("    {notice}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "meme_viewer=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ViewerConfig::load().context("loading viewer configuration")?;
    let feed = HttpMemeFeed::with_defaults(config.endpoint.clone(), &config.user_agent)
        .context("building resolver client")?;
    let http = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()
        .context("building download client")?;

    let handle = Session::new(
        Arc::new(feed),
        Downloader::new(http, config.download_dir.clone()),
        Sharer::new(Arc::new(NoShareTarget), Arc::new(SystemClipboard)),
        config.refresh_interval,
        config.swipe_threshold,
    )
    .spawn();

    let mut updates = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("commands: p n swipe <dx> f d s r q");

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                render(&snapshot);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match parse_line(&line) {
                    Input::Command(commands) => {
                        for command in commands {
                            if !handle.send(command).await {
                                break;
                            }
                        }
                    }
                    Input::Quit => break,
                    Input::Unknown => println!("unknown command: {}", line.trim()),
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
