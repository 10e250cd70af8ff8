use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_json, output_success};
use crate::cli::OutputFormat;
use crate::guard::route::menu;
use crate::panel::AdminPanel;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the school backend")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current identity, menu and effective permissions")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, panel: &AdminPanel, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };

            let identity = panel.login(&email, &password).await?;

            output_success(
                &output_format,
                &format!("Logged in as {} ({})", email, identity.role),
                Some(json!({ "identity": identity })),
            )?;
            Ok(())
        }
        AuthCommands::Logout => {
            panel.logout()?;
            output_success(&output_format, "Logged out", None)?;
            Ok(())
        }
        AuthCommands::Status => {
            let session = panel.current();
            let now = chrono::Utc::now();

            match output_format {
                OutputFormat::Json => {
                    let identity = session.identity();
                    output_json(&json!({
                        "authenticated": session.is_authenticated(),
                        "identity": identity,
                        "expired": identity.map(|claims| claims.is_expired(now)),
                    }))?;
                }
                OutputFormat::Text => match session.identity() {
                    Some(identity) => {
                        println!("Logged in: {} ({})", identity.id, identity.role);
                        if let Some(issued) = identity.issued_at {
                            println!("Issued: {}", issued.format("%Y-%m-%d %H:%M:%S UTC"));
                        }
                        if let Some(expires) = identity.expires_at {
                            let note = if identity.is_expired(now) { " (expired)" } else { "" };
                            println!("Expires: {}{}", expires.format("%Y-%m-%d %H:%M:%S UTC"), note);
                        }
                    }
                    None => println!("Not logged in"),
                },
            }
            Ok(())
        }
        AuthCommands::Whoami => {
            let identity = panel
                .current()
                .identity()
                .cloned()
                .ok_or(crate::panel::PanelError::NotAuthenticated)?;
            let permissions = panel.my_permissions().await?;
            let items = menu(identity.role);

            match output_format {
                OutputFormat::Json => {
                    output_json(&json!({
                        "identity": identity,
                        "permissions": permissions,
                        "menu": items,
                    }))?;
                }
                OutputFormat::Text => {
                    println!("ID: {}", identity.id);
                    println!("Role: {}", identity.role);
                    let granted: Vec<String> = permissions.granted().iter().map(ToString::to_string).collect();
                    println!(
                        "Student permissions: {}",
                        if granted.is_empty() { "none".to_string() } else { granted.join(", ") }
                    );
                    let labels: Vec<&str> = items.iter().map(|item| item.label).collect();
                    println!("Menu: {}", labels.join(" | "));
                }
            }
            Ok(())
        }
    }
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();

    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
