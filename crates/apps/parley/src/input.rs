//! Command-line input parsing
//!
//! Every line read from stdin becomes at most one `Command`. Parsing never
//! touches the network; receiver ids for `/send` are passed through raw so
//! the sync client can validate them.

use social::{Conversation, NotificationId, UserId};

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send `content` to the raw `receiver` id
    Send { receiver: String, content: String },
    /// Acknowledge a notification
    Read(NotificationId),
    /// List unread notifications
    Unread,
    /// Run one poll cycle now
    Refresh,
    Follow { user: UserId, username: String },
    Unfollow { user: UserId, username: String },
    Search(String),
    Help,
    Quit,
}

/// Usage text shown by `/help`
pub const HELP: &str = "\
Commands:
  /send <receiver> <text>       send to a user (chat room)
  <text>                        send to the peer (direct conversation)
  /read <id>                    mark a notification read
  /unread                       list unread notifications
  /refresh                      poll now
  /follow <id> <username>       follow a user
  /unfollow <id> <username>     stop following a user
  /search <query>               search users by name
  /help                         show this help
  /quit                         exit";

/// Parse one input line
///
/// Returns `Ok(None)` for a blank line. Plain text is a message to the peer
/// in a direct conversation and an error in the chat room, where the
/// receiver must be named.
pub fn parse(line: &str, conversation: Conversation) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return match conversation {
            Conversation::Direct { peer } => Ok(Some(Command::Send {
                receiver: peer.to_string(),
                content: line.to_string(),
            })),
            Conversation::Room => Err("Use /send <receiver> <text> in the chat room".to_string()),
        };
    };

    let (name, args) = split_word(rest);
    let command = match name {
        "send" => {
            let (receiver, content) = split_word(args);
            if receiver.is_empty() {
                return Err("Usage: /send <receiver> <text>".to_string());
            }
            Command::Send {
                receiver: receiver.to_string(),
                content: content.to_string(),
            }
        }
        "read" => {
            let id = args
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not a notification id", args))?;
            Command::Read(NotificationId(id))
        }
        "unread" => Command::Unread,
        "refresh" => Command::Refresh,
        "follow" => {
            let (user, username) = parse_user(args, "follow")?;
            Command::Follow { user, username }
        }
        "unfollow" => {
            let (user, username) = parse_user(args, "unfollow")?;
            Command::Unfollow { user, username }
        }
        "search" => {
            if args.is_empty() {
                return Err("Usage: /search <query>".to_string());
            }
            Command::Search(args.to_string())
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command /{} (try /help)", other)),
    };
    Ok(Some(command))
}

/// Split off the first whitespace-delimited word
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn parse_user(args: &str, command: &str) -> Result<(UserId, String), String> {
    let (id, username) = split_word(args);
    if id.is_empty() || username.is_empty() {
        return Err(format!("Usage: /{} <id> <username>", command));
    }
    let user = UserId::parse(id).map_err(|e| e.to_string())?;
    Ok((user, username.to_string()))
}
