use clap::{Args, Subcommand};
use serde_json::json;

use crate::api::models::StaffInput;
use crate::cli::utils::{output_empty_collection, output_json, output_success, yes_no};
use crate::cli::OutputFormat;
use crate::panel::AdminPanel;
use crate::permissions::PermissionSet;

#[derive(Subcommand)]
pub enum StaffCommands {
    #[command(about = "List staff members")]
    List,

    #[command(about = "Add a staff member")]
    Create {
        #[command(flatten)]
        fields: StaffFields,
        #[arg(long, help = "Initial password")]
        password: String,
    },

    #[command(about = "Edit a staff member")]
    Update {
        #[arg(help = "Staff id")]
        id: String,
        #[command(flatten)]
        fields: StaffFields,
        #[arg(long, help = "New password (unchanged if omitted)")]
        password: Option<String>,
    },

    #[command(about = "Delete a staff member")]
    Delete {
        #[arg(help = "Staff id")]
        id: String,
    },

    #[command(about = "Show a staff member's student permissions")]
    Permissions {
        #[arg(help = "Staff user id")]
        id: String,
    },

    #[command(about = "Replace a staff member's student permissions; omitted flags are revoked")]
    Grant {
        #[arg(help = "Staff user id")]
        id: String,
        #[arg(long, help = "Allow adding students")]
        create: bool,
        #[arg(long, help = "Allow viewing the student list")]
        read: bool,
        #[arg(long, help = "Allow editing students")]
        update: bool,
        #[arg(long, help = "Allow deleting students")]
        delete: bool,
    },
}

#[derive(Args)]
pub struct StaffFields {
    #[arg(long, help = "Full name")]
    pub name: String,
    #[arg(long, help = "Login email")]
    pub email: String,
    #[arg(long, help = "Phone number")]
    pub phone: String,
}

impl StaffFields {
    fn into_input(self, password: Option<String>) -> StaffInput {
        StaffInput {
            name: self.name,
            email: self.email,
            phone: self.phone,
            password,
        }
    }
}

pub async fn handle(cmd: StaffCommands, panel: &AdminPanel, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        StaffCommands::List => {
            let staff = panel.staff().await?;

            if staff.is_empty() {
                return output_empty_collection(&output_format, "staff", "No staff members found");
            }

            match output_format {
                OutputFormat::Json => output_json(&json!({ "staff": staff }))?,
                OutputFormat::Text => {
                    println!("{:<26} {:<20} {:<30} {}", "ID", "NAME", "EMAIL", "PHONE");
                    println!("{}", "-".repeat(90));
                    for member in &staff {
                        println!("{:<26} {:<20} {:<30} {}", member.id, member.name, member.email, member.phone);
                    }
                }
            }
            Ok(())
        }
        StaffCommands::Create { fields, password } => {
            let input = fields.into_input(Some(password));
            let created = panel.create_staff(&input).await?;
            output_success(
                &output_format,
                &format!("Staff member '{}' created", input.email),
                Some(json!({ "staff": created })),
            )?;
            Ok(())
        }
        StaffCommands::Update { id, fields, password } => {
            let input = fields.into_input(password);
            let updated = panel.update_staff(&id, &input).await?;
            output_success(
                &output_format,
                &format!("Staff member '{}' updated", id),
                Some(json!({ "staff": updated })),
            )?;
            Ok(())
        }
        StaffCommands::Delete { id } => {
            panel.delete_staff(&id).await?;
            output_success(&output_format, &format!("Staff member '{}' deleted", id), Some(json!({ "id": id })))?;
            Ok(())
        }
        StaffCommands::Permissions { id } => {
            let permissions = panel.staff_permissions(&id).await?;

            match output_format {
                OutputFormat::Json => output_json(&json!({ "id": id, "permissions": permissions }))?,
                OutputFormat::Text => {
                    println!("Student permissions for {}", id);
                    println!("  Create: {}", yes_no(permissions.can_create));
                    println!("  Read:   {}", yes_no(permissions.can_read));
                    println!("  Update: {}", yes_no(permissions.can_update));
                    println!("  Delete: {}", yes_no(permissions.can_delete));
                }
            }
            Ok(())
        }
        StaffCommands::Grant { id, create, read, update, delete } => {
            let permissions = PermissionSet {
                can_create: create,
                can_read: read,
                can_update: update,
                can_delete: delete,
            };
            panel.set_staff_permissions(&id, permissions).await?;
            output_success(
                &output_format,
                &format!("Permissions updated for '{}'", id),
                Some(json!({ "id": id, "permissions": permissions })),
            )?;
            Ok(())
        }
    }
}
