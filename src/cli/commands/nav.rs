use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_json;
use crate::cli::OutputFormat;
use crate::guard::route::{menu, GuardOutcome, Route};
use crate::panel::{AdminPanel, PanelError};

#[derive(Subcommand)]
pub enum NavCommands {
    #[command(about = "Show the sidebar menu for the current account")]
    Menu,

    #[command(about = "Check where navigating to a path would land")]
    Open {
        #[arg(help = "Route path, e.g. /dashboard/staff")]
        path: String,
    },
}

pub async fn handle(cmd: NavCommands, panel: &AdminPanel, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        NavCommands::Menu => {
            let identity = panel.current().identity().cloned().ok_or(PanelError::NotAuthenticated)?;
            let items = menu(identity.role);

            match output_format {
                OutputFormat::Json => output_json(&json!({ "menu": items }))?,
                OutputFormat::Text => {
                    for item in &items {
                        println!("{:<12} {}", item.label, item.route);
                    }
                }
            }
            Ok(())
        }
        NavCommands::Open { path } => {
            let route = Route::parse(&path).ok_or_else(|| anyhow::anyhow!("Unknown route '{}'", path))?;
            let navigation = panel.navigate(route);

            match output_format {
                OutputFormat::Json => output_json(&navigation)?,
                OutputFormat::Text => match navigation.outcome {
                    None => println!("{} is public", route),
                    Some(GuardOutcome::Admitted) => println!("{} admitted", route),
                    Some(GuardOutcome::Unauthenticated { redirect }) => {
                        println!("{} requires login; redirecting to {}", route, redirect)
                    }
                    Some(GuardOutcome::RoleRejected { redirect }) => {
                        println!("{} is not available to this account; redirecting to {}", route, redirect)
                    }
                },
            }
            Ok(())
        }
    }
}
