pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::panel::PanelError;

#[derive(Parser)]
#[command(name = "school-admin")]
#[command(about = "School admin CLI - manage staff, students and staff permissions")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, logout and session status")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Student records (subject to staff permissions)")]
    Student {
        #[command(subcommand)]
        cmd: commands::student::StudentCommands,
    },

    #[command(about = "Staff accounts and their permissions (admin only)")]
    Staff {
        #[command(subcommand)]
        cmd: commands::staff::StaffCommands,
    },

    #[command(about = "Navigation menu and route access checks")]
    Nav {
        #[command(subcommand)]
        cmd: commands::nav::NavCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let panel = config::open_panel()?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &panel, output_format).await,
        Commands::Student { cmd } => commands::student::handle(cmd, &panel, output_format).await,
        Commands::Staff { cmd } => commands::staff::handle(cmd, &panel, output_format).await,
        Commands::Nav { cmd } => commands::nav::handle(cmd, &panel, output_format).await,
    }
}

/// Print a command failure, with a stable code when it came from the panel
pub fn report_error(output_format: &OutputFormat, error: &anyhow::Error) -> anyhow::Result<()> {
    let code = error.downcast_ref::<PanelError>().map(PanelError::error_code);
    utils::output_error(output_format, &error.to_string(), code)
}
