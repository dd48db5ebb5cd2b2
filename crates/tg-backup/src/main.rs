use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;

use tg_backup::commands::Cli;
use tg_backup::commands::Commands;
use tg_backup::config::SessionConfig;
use tg_backup::error::CliError;
use tg_backup::handlers;
use tg_backup::telemetry;

fn main() {
    if let Err(e) = run() {
        if let Some(cli_error) = e.downcast_ref::<CliError>() {
            eprintln!("Error: {cli_error}");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _telemetry = telemetry::init_tracing("info");

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "tg-backup", &mut std::io::stdout());
        return Ok(());
    }

    let config = SessionConfig::load(cli.session_dir);

    match cli.command {
        Commands::Completions { .. } => unreachable!(),
        Commands::Login => handlers::handle_login(config)?,
        Commands::Send { chat_id, files } => handlers::handle_send(config, chat_id, files)?,
    }

    Ok(())
}
