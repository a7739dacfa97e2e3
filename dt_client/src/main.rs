//! A terminal client for dev_trumps matches.
//!
//! Reads commands from stdin, forwards them to a match session and prints
//! what the session reports. Play the computer, or host and share your peer
//! id with a friend who connects to it.

use std::sync::Arc;

use anyhow::{Context, Error};
use dev_trumps::{
    DeckSelection, MatchSession, RosterDeckGenerator, SessionCommand, SessionEvent,
    TemplateCommentary,
};
use dt_client::{
    commands::{HELP as COMMANDS, Input, parse_command},
    config::{ClientConfig, Overrides},
    logging,
    render::Transcript,
};
use pico_args::Arguments;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Play dev_trumps in the terminal

USAGE:
  dt_client [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Listener address when hosting  [default: env DT_BIND or 127.0.0.1:0]
  --deck       NAME        Deck for matches you deal      [default: env DT_DECK or standard]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DT_BIND                  Listener address when hosting
  DT_DECK                  standard, legends, frontend or systems
  DT_SOLO_HAND_SIZE        Cards per side against the computer
  DT_DUEL_HAND_SIZE        Cards per side against a peer
  DT_REVEAL_DWELL_MS       Pause after the opponent's card is shown
  DT_POST_RESULT_MS        Pause after a round result
  DT_THINK_MS              Computer opponent's thinking time
  DT_CONNECT_TIMEOUT_SECS  Give up connecting after this long
  RUST_LOG                 Log filter  [default: info]
  (A .env file in the working directory is read too)
";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        deck: pargs.opt_value_from_fn("--deck", |s| s.parse::<DeckSelection>())?,
    };

    logging::init();

    let config = ClientConfig::from_env(overrides).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    run(config).await
}

async fn run(config: ClientConfig) -> Result<(), Error> {
    let (session, handle, mut events) = MatchSession::new(
        config.session_config(),
        Arc::new(RosterDeckGenerator::new()),
        Arc::new(TemplateCommentary),
    )
    .context("Invalid session configuration")?;
    let session = session.spawn();
    tracing::info!("client started with the {} deck", config.deck);

    println!("Welcome to dev_trumps!\n\n{COMMANDS}");
    let mut transcript = Transcript::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    // EOF behaves like quit
                    stdin_open = false;
                    handle.send(SessionCommand::Quit).await?;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Input::Session(command)) => handle.send(command).await?,
                    Ok(Input::Help) => print!("{COMMANDS}"),
                    Ok(Input::Decks) => {
                        for deck in DeckSelection::ALL {
                            println!("  {deck:<10} {}", deck.description());
                        }
                    }
                    Err(error) => println!("{error}"),
                }
            }

            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let closed = event == SessionEvent::Closed;
                for line in transcript.apply(event) {
                    println!("{line}");
                }
                if closed {
                    break;
                }
            }
        }
    }

    session.await.context("Session task failed")?;
    tracing::info!("{} log entries this session", transcript.entries().len());
    Ok(())
}
