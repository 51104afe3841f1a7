//! Terminal notification drawer.
//!
//! A pure consumer of `NotificationCenter`: it renders snapshots and turns
//! typed commands into store operations.

use std::fmt::Write as _;
use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

use crate::notifications::{DrawerSnapshot, NotificationCenter, StoreChange};
use crate::transport::ConnectionState;

pub const HELP: &str = "commands: list | read <id> | read-all | delete <id> | clear | toggle | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawerCommand {
    List,
    Read(String),
    ReadAll,
    Delete(String),
    Clear,
    Toggle,
    Help,
    Quit,
}

impl DrawerCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err("empty command".to_string());
        };
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{verb}'"));
        }

        let needs_id = |ctor: fn(String) -> DrawerCommand| match arg {
            Some(id) => Ok(ctor(id.to_string())),
            None => Err(format!("'{verb}' needs a notification id")),
        };
        let no_arg = |cmd: DrawerCommand| match arg {
            None => Ok(cmd),
            Some(_) => Err(format!("'{verb}' takes no arguments")),
        };

        match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => no_arg(DrawerCommand::List),
            "read" => needs_id(DrawerCommand::Read),
            "read-all" => no_arg(DrawerCommand::ReadAll),
            "delete" | "rm" => needs_id(DrawerCommand::Delete),
            "clear" => no_arg(DrawerCommand::Clear),
            "toggle" => no_arg(DrawerCommand::Toggle),
            "help" | "?" => no_arg(DrawerCommand::Help),
            "quit" | "exit" => no_arg(DrawerCommand::Quit),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

/// Apply a command and return the text to show the user.
pub fn execute(center: &NotificationCenter, command: &DrawerCommand) -> String {
    match command {
        DrawerCommand::List => render(&center.snapshot()),
        DrawerCommand::Read(id) => {
            if center.mark_as_read(id) {
                format!("marked {id} as read ({} unread)", center.unread_count())
            } else {
                format!("nothing to mark for {id}")
            }
        }
        DrawerCommand::ReadAll => {
            let count = center.mark_all_as_read();
            format!("marked {count} notifications as read")
        }
        DrawerCommand::Delete(id) => {
            if center.delete_notification(id) {
                format!("deleted {id} ({} unread)", center.unread_count())
            } else {
                format!("no notification {id}")
            }
        }
        DrawerCommand::Clear => {
            let count = center.clear_all_notifications();
            format!("cleared {count} notifications")
        }
        DrawerCommand::Toggle => {
            if center.toggle_notification_drawer() {
                render(&center.snapshot())
            } else {
                "drawer hidden".to_string()
            }
        }
        DrawerCommand::Help => HELP.to_string(),
        DrawerCommand::Quit => "bye".to_string(),
    }
}

/// One line per notification, newest first, preceded by an unread summary.
pub fn render(snapshot: &DrawerSnapshot) -> String {
    let mut out = format!(
        "{} notifications, {} unread",
        snapshot.notifications.len(),
        snapshot.unread_count
    );
    for n in &snapshot.notifications {
        let presentation = n.presentation();
        let _ = write!(
            out,
            "\n{marker} [{icon} {bg}] {id} {time} {title}",
            marker = if n.is_read() { ' ' } else { '*' },
            icon = presentation.icon,
            bg = presentation.bg_color,
            id = n.id,
            time = n.timestamp.format("%H:%M:%S"),
            title = n.title,
        );
        if !n.message.is_empty() {
            let _ = write!(out, ": {}", n.message);
        }
    }
    out
}

/// Why an interactive drawer session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Quit,
    EndOfInput,
    Interrupted,
}

/// Drive the drawer: commands from `input`, new arrivals and connection
/// changes to stdout, until quit, end of input or `shutdown` resolves.
pub async fn run_session<R, F>(
    center: &NotificationCenter,
    mut state: watch::Receiver<ConnectionState>,
    input: R,
    shutdown: F,
) -> SessionExit
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let mut changes = center.subscribe();
    let mut lines = input.lines();
    let mut watching_state = true;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return SessionExit::Interrupted,
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match DrawerCommand::parse(&line) {
                    Ok(DrawerCommand::Quit) => return SessionExit::Quit,
                    Ok(command) => println!("{}", execute(center, &command)),
                    Err(e) => println!("{e}\n{HELP}"),
                },
                Ok(None) => return SessionExit::EndOfInput,
                Err(e) => {
                    tracing::error!("failed to read drawer input: {e}");
                    return SessionExit::EndOfInput;
                }
            },
            change = changes.recv() => match change {
                Ok(StoreChange::Added { id }) => {
                    if let Some(n) = center.get(id.as_str()) {
                        let p = n.presentation();
                        println!(
                            "new [{} {}] {} {} ({} unread)",
                            p.icon,
                            p.bg_color,
                            n.id,
                            n.title,
                            center.unread_count()
                        );
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => tracing::warn!("drawer lagged, skipped {n} changes"),
                Err(RecvError::Closed) => return SessionExit::EndOfInput,
            },
            changed = state.changed(), if watching_state => {
                if changed.is_err() {
                    // Client task finished; notifications already received stay browsable.
                    watching_state = false;
                    continue;
                }
                let current = *state.borrow_and_update();
                println!("connection: {current}");
            },
        }
    }
}
