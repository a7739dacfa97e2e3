use dev_trumps::{
    DeckSelection, SessionCommand, Stat,
    entities::{UnknownDeck, UnknownStat},
    net::transport::PeerId,
};
use std::fmt;

/// Something the player typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Forward to the session.
    Session(SessionCommand),
    /// Print the command reference.
    Help,
    /// List the available decks.
    Decks,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `connect` without a peer id.
    ConnectMissingPeer,
    /// Peer id that isn't `host:port`.
    InvalidPeerId(String),
    /// `deck` without a deck name.
    DeckMissingName,
    UnknownDeck(String),
    /// `pick` without a stat.
    PickMissingStat,
    UnknownStat(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectMissingPeer => {
                write!(f, "Connect requires a peer id (e.g., 'connect 127.0.0.1:7000')")
            }
            Self::InvalidPeerId(value) => {
                write!(f, "Invalid peer id '{value}'. Use the HOST:PORT your opponent shared")
            }
            Self::DeckMissingName => write!(f, "Deck requires a name. Type 'decks' to list them"),
            Self::UnknownDeck(value) => {
                write!(f, "Unknown deck '{value}'. Type 'decks' to list them")
            }
            Self::PickMissingStat => write!(f, "Pick requires a stat (e.g., 'pick followers')"),
            Self::UnknownStat(value) => write!(
                f,
                "Unknown stat '{value}'. Use one of: {}",
                Stat::ALL.map(Stat::token).join(", ")
            ),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{cmd}'. Type 'help' to see available commands"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<UnknownStat> for ParseError {
    fn from(value: UnknownStat) -> Self {
        Self::UnknownStat(value.0)
    }
}

impl From<UnknownDeck> for ParseError {
    fn from(value: UnknownDeck) -> Self {
        Self::UnknownDeck(value.0)
    }
}

pub const HELP: &str = "\
COMMANDS:
  solo                  Play against the computer
  host                  Wait for an opponent and print your peer id
  connect HOST:PORT     Join a hosting opponent
  deck NAME             Deck for matches you deal (see 'decks')
  pick STAT             Lead the round with a stat (or just type the stat)
  restart               Ask for a rematch once the match is over
  leave                 Abandon the match and go back to the lobby
  decks                 List the available decks
  help                  Show this message
  quit                  Exit

STATS:
  followers, repos, influence, activity, tech, seniority
";

/// Parse a command string into an [`Input`].
///
/// # Examples
///
/// ```
/// use dev_trumps::{SessionCommand, Stat};
/// use dt_client::commands::{Input, parse_command};
///
/// assert_eq!(parse_command("solo"), Ok(Input::Session(SessionCommand::StartSolo)));
/// assert_eq!(
///     parse_command("pick tech"),
///     Ok(Input::Session(SessionCommand::SelectStat(Stat::TechBreadth)))
/// );
/// assert_eq!(
///     parse_command("followers"),
///     Ok(Input::Session(SessionCommand::SelectStat(Stat::Followers)))
/// );
/// ```
pub fn parse_command(input: &str) -> Result<Input, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    match trimmed {
        "solo" => return Ok(Input::Session(SessionCommand::StartSolo)),
        "host" => return Ok(Input::Session(SessionCommand::Host)),
        "restart" | "rematch" => return Ok(Input::Session(SessionCommand::Restart)),
        "leave" => return Ok(Input::Session(SessionCommand::Leave)),
        "quit" | "exit" => return Ok(Input::Session(SessionCommand::Quit)),
        "help" | "?" => return Ok(Input::Help),
        "decks" => return Ok(Input::Decks),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.as_slice() {
        ["connect"] => Err(ParseError::ConnectMissingPeer),
        ["connect", peer, ..] => {
            let peer = peer
                .parse::<PeerId>()
                .map_err(|_| ParseError::InvalidPeerId(peer.to_string()))?;
            Ok(Input::Session(SessionCommand::Connect(peer)))
        }
        ["deck"] => Err(ParseError::DeckMissingName),
        ["deck", name, ..] => Ok(Input::Session(SessionCommand::SelectDeck(
            name.parse::<DeckSelection>()?,
        ))),
        ["pick"] => Err(ParseError::PickMissingStat),
        ["pick", stat @ ..] => Ok(Input::Session(SessionCommand::SelectStat(
            stat.join("").parse::<Stat>()?,
        ))),
        // A bare stat name picks it
        _ => trimmed
            .parse::<Stat>()
            .map(|stat| Input::Session(SessionCommand::SelectStat(stat)))
            .map_err(|_| ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}
