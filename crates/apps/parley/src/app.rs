//! Terminal chat session
//!
//! Owns the sync client and action handlers for one signed-in user, reads
//! commands from stdin and redraws whenever the sync state changes.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use log::{debug, warn};
use social::{
    ApiClient, ClientError, Conversation, FollowHandler, Message, ProfileHandler, SessionContext,
    SyncClient, SyncOptions, UserId,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, MissedTickBehavior};

use crate::input::{self, Command, HELP};

/// How often the render loop checks for changes
const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Root application state
pub struct ParleyApp {
    session: Arc<SessionContext>,
    sync: Arc<SyncClient>,
    follows: Arc<FollowHandler>,
    profiles: Arc<ProfileHandler>,
    me: UserId,
}

impl ParleyApp {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionContext>, options: SyncOptions) -> Result<Self> {
        let me = session.require()?.user_id;
        Ok(Self {
            sync: Arc::new(SyncClient::new(api.clone(), session.clone(), options)),
            follows: Arc::new(FollowHandler::new(api.clone(), session.clone())),
            profiles: Arc::new(ProfileHandler::new(api, session.clone())),
            session,
            me,
        })
    }

    fn conversation(&self) -> Conversation {
        self.sync.options().conversation
    }

    /// Run until `/quit` or end of input
    pub async fn run(self) -> Result<()> {
        match self.conversation() {
            Conversation::Room => println!("Chat room. Type /help for commands."),
            Conversation::Direct { peer } => {
                println!("Direct conversation with user {}. Type /help for commands.", peer)
            }
        }

        let follows = self.follows.clone();
        match tokio::task::spawn_blocking(move || follows.load_following()).await? {
            Ok(count) => debug!("Following {} users", count),
            Err(e) => warn!("Could not load follows: {}", e),
        }

        self.sync.start();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ticker = time::interval(REFRESH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut view = View::default();

        loop {
            tokio::select! {
                _ = ticker.tick() => self.render(&mut view),
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match input::parse(&line, self.conversation()) {
                        Ok(Some(Command::Quit)) => break,
                        Ok(Some(command)) => {
                            self.execute(command).await;
                            self.render(&mut view);
                        }
                        Ok(None) => {}
                        Err(usage) => println!("{}", usage),
                    }
                }
            }
        }

        self.sync.stop();
        self.session.logout();
        Ok(())
    }

    /// Run a command on the blocking pool and print its output
    async fn execute(&self, command: Command) {
        let services = Services {
            sync: self.sync.clone(),
            follows: self.follows.clone(),
            profiles: self.profiles.clone(),
        };

        match tokio::task::spawn_blocking(move || services.execute(command)).await {
            Ok(Ok(output)) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Ok(Err(e)) => println!("! {}", e),
            Err(e) => warn!("Command task failed: {}", e),
        }
    }

    /// Print whatever changed since the last render
    fn render(&self, view: &mut View) {
        let status = self.sync.status();
        if view.revision == Some(status.revision) {
            return;
        }
        view.revision = Some(status.revision);

        let messages = self.sync.messages();
        match diff_log(&view.printed, &messages) {
            LogUpdate::Unchanged => {}
            LogUpdate::Append(start) => {
                for message in &messages[start..] {
                    println!("{}", format_message(message, self.me));
                }
            }
            LogUpdate::Redraw => {
                println!("--- conversation reloaded ---");
                for message in &messages {
                    println!("{}", format_message(message, self.me));
                }
            }
        }
        view.printed = messages;

        if status.unread_count != view.unread_count {
            if status.unread_count > 0 {
                println!("* {} unread notifications (/unread to list)", status.unread_count);
            }
            view.unread_count = status.unread_count;
        }

        if status.last_error != view.error {
            if let Some(error) = &status.last_error {
                let synced = status
                    .last_synced_at
                    .map(format_relative_time)
                    .unwrap_or_else(|| "never".to_string());
                println!("! {} (last synced: {})", error, synced);
            }
            view.error = status.last_error;
        }
    }
}

/// Handles shared with the blocking pool
struct Services {
    sync: Arc<SyncClient>,
    follows: Arc<FollowHandler>,
    profiles: Arc<ProfileHandler>,
}

impl Services {
    fn execute(&self, command: Command) -> Result<String, ClientError> {
        match command {
            Command::Send { receiver, content } => {
                self.sync.send_message(&content, &receiver)?;
                Ok(String::new())
            }
            Command::Read(id) => {
                self.sync.mark_read(id)?;
                Ok(format!("Notification {} marked read", id))
            }
            Command::Unread => {
                self.sync.fetch_unread_notifications()?;
                let unread = self.sync.unread_notifications();
                if unread.is_empty() {
                    return Ok("No unread notifications".to_string());
                }
                Ok(unread
                    .iter()
                    .map(|n| format!("  [{}] {}", n.id, n.message))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Command::Refresh => {
                self.sync.poll_once();
                Ok(String::new())
            }
            Command::Follow { user, username } => {
                self.follows.follow(user, &username)?;
                Ok(format!("Following {}", username))
            }
            Command::Unfollow { user, username } => {
                self.follows.unfollow(user, &username)?;
                Ok(format!("Unfollowed {}", username))
            }
            Command::Search(query) => {
                let users = self.profiles.search(&query)?;
                if users.is_empty() {
                    return Ok(format!("No users match '{}'", query));
                }
                Ok(users
                    .iter()
                    .map(|user| {
                        let id = user
                            .user_id
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| "?".to_string());
                        let marker = if self.follows.is_following(&user.username) {
                            " (following)"
                        } else {
                            ""
                        };
                        format!("  [{}] {}{}", id, user.username, marker)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }
}

/// What the terminal currently shows
#[derive(Default)]
struct View {
    revision: Option<u64>,
    printed: Vec<Message>,
    unread_count: usize,
    error: Option<String>,
}

/// How the printed log relates to the current one
#[derive(Debug, PartialEq)]
enum LogUpdate {
    Unchanged,
    /// Print entries from this index on
    Append(usize),
    /// Earlier entries changed; print everything again
    Redraw,
}

fn diff_log(printed: &[Message], current: &[Message]) -> LogUpdate {
    if current.len() >= printed.len() && current[..printed.len()] == *printed {
        if current.len() == printed.len() {
            LogUpdate::Unchanged
        } else {
            LogUpdate::Append(printed.len())
        }
    } else {
        LogUpdate::Redraw
    }
}

fn format_message(message: &Message, me: UserId) -> String {
    let time = message
        .timestamp
        .map(|ts| ts.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    let sender = if message.is_from(me) {
        "me".to_string()
    } else {
        message.sender.display()
    };
    format!("[{}] {} -> {}: {}", time, sender, message.receiver.display(), message.content)
}

/// Format timestamp as relative time (e.g., "2 minutes ago")
fn format_relative_time(ts: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(ts);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        match duration.num_minutes() {
            1 => "1 minute ago".to_string(),
            mins => format!("{} minutes ago", mins),
        }
    } else if duration.num_hours() < 24 {
        match duration.num_hours() {
            1 => "1 hour ago".to_string(),
            hours => format!("{} hours ago", hours),
        }
    } else {
        let local: DateTime<Local> = ts.into();
        local.format("%b %d at %H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social::UserRef;

    fn msg(id: i64, sender: i64) -> Message {
        Message::builder(UserRef::with_name(UserId(sender), "ada"), UserRef::id(UserId(2)))
            .id(id)
            .content("hello")
            .build()
    }

    #[test]
    fn test_diff_log() {
        let printed = vec![msg(1, 1), msg(2, 1)];

        assert_eq!(diff_log(&printed, &printed), LogUpdate::Unchanged);
        assert_eq!(
            diff_log(&printed, &[msg(1, 1), msg(2, 1), msg(3, 1)]),
            LogUpdate::Append(2)
        );
        assert_eq!(diff_log(&printed, &[msg(2, 1)]), LogUpdate::Redraw);
        assert_eq!(diff_log(&[], &printed), LogUpdate::Append(0));
    }

    #[test]
    fn test_format_message() {
        assert_eq!(format_message(&msg(1, 1), UserId(1)), "[--:--] me -> user 2: hello");
        assert_eq!(format_message(&msg(1, 3), UserId(1)), "[--:--] ada -> user 2: hello");
    }

    #[test]
    fn test_format_relative_time() {
        assert_eq!(format_relative_time(Utc::now()), "just now");
        assert_eq!(
            format_relative_time(Utc::now() - chrono::Duration::minutes(5)),
            "5 minutes ago"
        );
        assert_eq!(
            format_relative_time(Utc::now() - chrono::Duration::hours(1)),
            "1 hour ago"
        );
    }
}
