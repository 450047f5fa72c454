use anyhow::Result;
use clap::{Parser, Subcommand};

use pandora::bridge::{LocalFileSystem, LocalProcessRunner, MockFileSystem};
use pandora::command::{Dispatcher, ResultKind};
use pandora::config::{self, Config};
use pandora::store::{CommandStatus, Store};
use pandora::terminal::{Outcome, Terminal};
use pandora::tui;

#[derive(Parser)]
#[command(
    name = "pandora",
    version = env!("PANDORA_VERSION"),
    about = "A tabbed terminal shell with command correction, prediction and shared sessions"
)]
struct Cli {
    /// Use an in-memory filesystem instead of the real one
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal UI (default)
    Run {
        /// Broadcast commands into a shared session and follow it
        #[arg(long)]
        share: Option<String>,
    },
    /// Initialize the ~/.pandora config directory
    Init,
    /// Run a single command line and print its result
    Exec {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// The command line, e.g. `pandora exec git status`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
    /// Show recorded command history
    History {
        /// Only commands containing this text
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Delete all recorded history
        #[arg(long)]
        clear: bool,
    },
    /// Manage favorite commands
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },
    /// Shared terminal sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Command snippets shared inside a session
    Snippet {
        #[command(subcommand)]
        action: SnippetAction,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorites (default)
    List,
    /// Add a command to favorites
    Add {
        command: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Remove a favorite by id
    Remove { id: String },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Create a session and join it
    Create { name: String },
    Join { id: String },
    Leave { id: String },
    /// List session members
    Members { id: String },
    /// Show commands shared into a session
    Log { id: String },
}

#[derive(Subcommand)]
enum SnippetAction {
    /// Save a snippet into a session
    Add {
        session: String,
        name: String,
        command: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// List a session's snippets
    List { session: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load()?;

    match cli.command.unwrap_or(Commands::Run { share: None }) {
        Commands::Run { share } => {
            config::init_logging(&cfg.log_level)?;
            let store = open_store()?;
            if let Some(id) = &share {
                store.join_session(id, &cfg.user)?;
            }
            tracing::info!(mock = cli.mock, "starting pandora");
            let terminal = Terminal::new(dispatcher(cli.mock), cfg.terminal_settings());
            tui::run(
                terminal,
                Box::new(store),
                cfg.theme.build(),
                cfg.record_history,
                share.as_deref(),
            )
        }
        Commands::Init => {
            config::ensure_dirs()?;
            open_store()?;
            println!("pandora initialized at ~/.pandora/");
            Ok(())
        }
        Commands::Exec { json, line } => run_exec(&cfg, cli.mock, &line.join(" "), json),
        Commands::History {
            search,
            limit,
            clear,
        } => {
            let store = open_store()?;
            if clear {
                store.clear_history()?;
                println!("History cleared.");
                return Ok(());
            }
            let entries = store.history(search.as_deref(), limit)?;
            if entries.is_empty() {
                println!("No history.");
            }
            for e in entries.iter().rev() {
                println!(
                    "  {} {}  {} ({})",
                    e.status.symbol(),
                    e.created_at,
                    e.command,
                    e.directory
                );
            }
            Ok(())
        }
        Commands::Favorites { action } => {
            let store = open_store()?;
            match action.unwrap_or(FavoritesAction::List) {
                FavoritesAction::List => {
                    let favorites = store.favorites()?;
                    if favorites.is_empty() {
                        println!("No favorites. Use `pandora favorites add <command>`.");
                    }
                    for f in &favorites {
                        if f.description.is_empty() {
                            println!("  {}  {}", f.id, f.command);
                        } else {
                            println!("  {}  {}  # {}", f.id, f.command, f.description);
                        }
                    }
                }
                FavoritesAction::Add {
                    command,
                    description,
                } => {
                    let f = store.add_favorite(&command, &description)?;
                    println!("Added favorite '{}' ({})", f.command, f.id);
                }
                FavoritesAction::Remove { id } => {
                    store.remove_favorite(&id)?;
                    println!("Removed favorite {id}");
                }
            }
            Ok(())
        }
        Commands::Session { action } => {
            let store = open_store()?;
            match action {
                SessionAction::Create { name } => {
                    let s = store.create_session(&name, &cfg.user)?;
                    println!("Created session '{}' ({})", s.name, s.id);
                    println!("Others can join with: pandora session join {}", s.id);
                }
                SessionAction::Join { id } => {
                    store.join_session(&id, &cfg.user)?;
                    println!("Joined session {id} as {}", cfg.user);
                }
                SessionAction::Leave { id } => {
                    store.leave_session(&id, &cfg.user)?;
                    println!("Left session {id}");
                }
                SessionAction::Members { id } => {
                    let session = store.get_session(&id)?;
                    println!("Members of '{}':", session.name);
                    for m in store.members(&id)? {
                        let owner = if m.user == session.owner { " (owner)" } else { "" };
                        println!("  {}{owner}  joined {}", m.user, m.joined_at);
                    }
                }
                SessionAction::Log { id } => {
                    for c in store.shared_commands(&id)? {
                        println!("  [{}] {}: {}", c.created_at, c.user, c.command);
                    }
                }
            }
            Ok(())
        }
        Commands::Snippet { action } => {
            let store = open_store()?;
            match action {
                SnippetAction::Add {
                    session,
                    name,
                    command,
                    description,
                    tag,
                } => {
                    let s =
                        store.save_snippet(&session, &name, &command, &description, &tag, &cfg.user)?;
                    println!("Saved snippet '{}'", s.name);
                }
                SnippetAction::List { session } => {
                    for s in store.snippets(&session)? {
                        let tags = if s.tags.is_empty() {
                            String::new()
                        } else {
                            format!(" [{}]", s.tags.join(", "))
                        };
                        println!("  {}: {}{tags}", s.name, s.command);
                        if !s.description.is_empty() {
                            println!("      {}", s.description);
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

fn open_store() -> Result<Store> {
    config::ensure_dirs()?;
    let store = Store::open()?;
    store.migrate()?;
    Ok(store)
}

fn dispatcher(mock: bool) -> Dispatcher {
    if mock {
        Dispatcher::new(Box::new(MockFileSystem::new()), Box::new(LocalProcessRunner))
    } else {
        Dispatcher::new(Box::new(LocalFileSystem::new()), Box::new(LocalProcessRunner))
    }
}

fn run_exec(cfg: &Config, mock: bool, line: &str, json: bool) -> Result<()> {
    let mut terminal = Terminal::new(dispatcher(mock), cfg.terminal_settings());
    let Some(submission) = terminal.submit_command(line) else {
        return Ok(());
    };

    let (kind, content) = match &submission.outcome {
        Outcome::Cleared => (ResultKind::Output, ""),
        Outcome::Completed(result) => (result.kind, result.content.as_str()),
    };

    if cfg.record_history {
        let status = match kind {
            ResultKind::Output => CommandStatus::Success,
            ResultKind::Error => CommandStatus::Error,
        };
        let command = submission.corrected.as_deref().unwrap_or(&submission.command);
        let recorded = open_store()
            .and_then(|store| store.record_history(command, content, status, &submission.directory));
        if let Err(e) = recorded {
            eprintln!("warning: history not saved: {e:#}");
        }
    }

    if json {
        let out = serde_json::json!({
            "command": submission.command,
            "corrected": submission.corrected,
            "directory": submission.directory,
            "kind": kind.as_str(),
            "content": content,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        if let Some(corrected) = &submission.corrected {
            eprintln!("(corrected to: {corrected})");
        }
        if kind == ResultKind::Error {
            eprintln!("{content}");
        } else if !content.is_empty() {
            println!("{}", content.trim_end_matches('\n'));
        }
    }

    if kind == ResultKind::Error {
        std::process::exit(1);
    }
    Ok(())
}
