//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to the command handlers.

use crate::commands;
use crate::config::get_config_path;
use crate::logging;
use crate::recording::QualityPreset;
use crate::storage::SortKey;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// Creates the config file on first run and keeps its version stamp current.
fn check_and_run_setup() -> anyhow::Result<()> {
    let config_path = get_config_path()?;
    crate::setup::run_setup(&config_path).map_err(|e| {
        tracing::error!("Setup failed: {e:#}");
        e.context("Setup failed")
    })
}

/// A terminal voice recorder with pause/resume, instant preview and a recoverable trash
#[derive(Parser)]
#[command(name = "voicerec")]
#[command(version)]
#[command(about = "A terminal voice recorder with pause/resume, instant preview and a recoverable trash")]
#[command(long_about = "A terminal voice recorder with pause/resume, instant preview and a recoverable trash.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n    Record options (-p, -n) can be used without explicitly saying 'record'.\n\nEXAMPLES:\n    # Record with the configured preset, choose a name when done\n    $ voicerec\n\n    # Record in mono and save as 'standup'\n    $ voicerec -p low -n standup\n\n    # Browse recordings and the trash\n    $ voicerec browse\n\n    # Finish a running recording from a key binding\n    $ pkill -USR1 voicerec")]
#[command(
    after_help = "FILES:\n    Config file:        ~/.config/voicerec/voicerec.toml\n    Recordings:         ~/.local/share/voicerec/recordings\n    Trash:              ~/.local/share/voicerec/trash\n    Logs:               ~/.local/state/voicerec/voicerec.log.*"
)]
struct Cli {
    /// Quality preset (record default command)
    #[arg(short, long, value_enum, global = true)]
    preset: Option<QualityPreset>,

    /// Name to save under (record default command)
    #[arg(short, long, global = true)]
    name: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record audio with a live level meter (default)
    ///
    /// Space pauses and resumes, Enter stops. After stopping: l listens,
    /// s/Enter saves, d discards.
    #[command(visible_alias = "r")]
    Record,

    /// List saved recordings
    #[command(visible_alias = "ls")]
    List {
        /// List the trash instead of the recordings
        #[arg(short, long)]
        trash: bool,

        /// Sort key (defaults to the configured one)
        #[arg(short, long, value_enum)]
        sort: Option<SortKey>,

        /// Newest, longest or last-by-name first
        #[arg(long, conflicts_with = "asc")]
        desc: bool,

        /// Oldest, shortest or first-by-name first
        #[arg(long)]
        asc: bool,
    },

    /// Browse, play and manage recordings interactively
    #[command(visible_alias = "b")]
    Browse,

    /// Move a recording to the trash
    Trash {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Move a recording from the trash back to the recordings
    Restore {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Permanently delete a recording that is in the trash
    Purge {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Rename a recording
    Rename {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(value_name = "NEW_NAME")]
        new_name: String,

        /// Rename inside the trash
        #[arg(short, long)]
        trash: bool,
    },

    /// Permanently delete everything in the trash
    #[command(name = "empty-trash")]
    EmptyTrash,

    /// Play a saved recording
    #[command(visible_alias = "p")]
    Play {
        #[arg(value_name = "ID")]
        id: String,

        /// Play from the trash
        #[arg(short, long)]
        trash: bool,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $VISUAL or $EDITOR, falling back to nano or vi.
    #[command(visible_alias = "c")]
    Config,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   voicerec completions bash > voicerec.bash
    ///   voicerec completions zsh > _voicerec
    ///   voicerec completions fish > voicerec.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that need neither logging nor config
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "voicerec", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Logs) => {
            if let Err(e) = commands::handle_logs() {
                eprintln!("Error: {e:#}");
                process::exit(1);
            }
            return Ok(());
        }
        _ => {}
    }

    logging::init_logging()?;
    check_and_run_setup()?;

    match cli.command {
        None | Some(Commands::Record) => commands::handle_record(cli.preset, cli.name).await?,
        Some(Commands::List {
            trash,
            sort,
            desc,
            asc,
        }) => {
            let descending = match (desc, asc) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::handle_list(trash, sort, descending)?;
        }
        Some(Commands::Browse) => commands::handle_browse().await?,
        Some(Commands::Trash { id }) => commands::handle_trash(&id)?,
        Some(Commands::Restore { id }) => commands::handle_restore(&id)?,
        Some(Commands::Purge { id }) => commands::handle_purge(&id)?,
        Some(Commands::Rename {
            id,
            new_name,
            trash,
        }) => commands::handle_rename(&id, &new_name, trash)?,
        Some(Commands::EmptyTrash) => commands::handle_empty_trash()?,
        Some(Commands::Play { id, trash }) => commands::handle_play(&id, trash).await?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
