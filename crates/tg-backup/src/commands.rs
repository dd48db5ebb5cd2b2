use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
pub use clap_complete::Shell;

const LONG_ABOUT: &str = r#"tg-backup delivers local files to a chat conversation as document attachments.

WORKFLOW:
    1. Authenticate once, interactively: tg-backup login
    2. Send files unattended:            tg-backup send <chat-id> <file>...

The backend keeps credentials in a session directory, so step 1 is only
needed again when the session expires or is terminated remotely.

EXAMPLES:
    tg-backup login
    tg-backup send -1001234567890 backup.tar.gz
    tg-backup send 777000 db.sqlite logs.txt
    tg-backup --session-dir /var/lib/tg-backup send 777000 nightly.tar"#;

#[derive(Parser)]
#[command(name = "tg-backup")]
#[command(author, version)]
#[command(about = "Sends local files to a chat conversation as document attachments")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the backend session storage directory
    #[arg(long, global = true, env = "TG_BACKUP_SESSION_DIR")]
    pub session_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send one or more files to a chat
    Send {
        /// Destination chat identifier
        chat_id: i64,

        /// Files to send as document attachments
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Run the interactive login flow and exit
    Login,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
