pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::settings::SettingsAction;

#[derive(Debug, Parser)]
#[command(
    name = "boa",
    about = "BOA request portal CLI",
    long_about = "Inspect BOA requests and their dual approvals, manage local preferences, and check runtime readiness.",
    after_help = "Examples:\n  boa requests --roll-no 21CS001\n  boa show --id BOA-101\n  boa settings set theme dark\n  boa doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List BOA requests for a roll number with their overall status")]
    Requests {
        #[arg(long = "roll-no", help = "Roll number; defaults to the last one used")]
        roll_no: Option<String>,
    },
    #[command(about = "Show one BOA request with per-approver details and event photos")]
    Show {
        #[arg(long, help = "BOA request id")]
        id: String,
        #[arg(long = "roll-no", help = "Roll number; defaults to the last one used")]
        roll_no: Option<String>,
    },
    #[command(about = "Read and change stored preferences")]
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    #[command(about = "Apply pending settings-database migrations")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, backend reachability, and settings database readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    #[command(about = "List every setting with its effective value")]
    List,
    #[command(about = "Print one setting's effective value")]
    Get { key: String },
    #[command(about = "Validate and store a setting")]
    Set { key: String, value: String },
    #[command(about = "Remove a stored setting so its default applies")]
    Reset { key: String },
}

impl From<SettingsCommand> for SettingsAction {
    fn from(command: SettingsCommand) -> Self {
        match command {
            SettingsCommand::List => Self::List,
            SettingsCommand::Get { key } => Self::Get { key },
            SettingsCommand::Set { key, value } => Self::Set { key, value },
            SettingsCommand::Reset { key } => Self::Reset { key },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Requests { roll_no } => commands::requests::run(roll_no.as_deref()),
        Command::Show { id, roll_no } => commands::show::run(&id, roll_no.as_deref()),
        Command::Settings { action } => commands::settings::run(action.into()),
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
