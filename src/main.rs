//! roomwire - terminal client for real-time chat rooms.
//!
//! Joins a room, prints events as plain text, and sends stdin lines as
//! chat messages. `/reconnect` forces a fresh connection, `/leave` (or
//! EOF) ends the session.

use roomwire::{Config, EntryKind, RoomId, Session, SessionEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut args = std::env::args().skip(1);
    let (participant, room) = match (args.next(), args.next()) {
        (Some(participant), Some(room)) => (participant, room),
        _ => {
            eprintln!("usage: roomwire <name> <room> [config.toml]");
            std::process::exit(2);
        }
    };
    let config = match args.next() {
        Some(path) => Config::load(&path).map_err(|e| {
            error!(path = %path, error = %e, "Failed to load config");
            e
        })?,
        None => Config::default(),
    };

    let room = RoomId::normalize(&room);
    info!(participant = %participant, room = %room, "starting roomwire");

    let (session, mut events) = Session::spawn(config, &participant, room);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => render(event),
                // The session is gone; nothing more will arrive.
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match line.trim() {
                    "" => {}
                    "/leave" => session.leave(),
                    "/reconnect" => session.reconnect(),
                    text => session.send(text),
                },
                None => {
                    stdin_open = false;
                    session.leave();
                }
            },
        }
    }

    Ok(())
}

fn render(event: SessionEvent) {
    match event {
        SessionEvent::StateChanged(state) => println!("* {state}"),
        SessionEvent::Entry(entry) => match entry.kind {
            EntryKind::System => println!("-- {}", entry.text),
            EntryKind::Message => {
                let marker = if entry.is_backlog { "(history) " } else { "" };
                let origin = entry.origin.as_deref().unwrap_or("?");
                println!("{marker}<{origin}> {}", entry.text);
            }
        },
        SessionEvent::RosterChanged(names) => println!("* online: {}", names.join(", ")),
        SessionEvent::Error(error) => eprintln!("! {error}"),
    }
}
