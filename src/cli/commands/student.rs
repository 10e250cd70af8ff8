use clap::{Args, Subcommand};
use serde_json::json;

use crate::api::models::StudentInput;
use crate::cli::utils::{output_empty_collection, output_json, output_success};
use crate::cli::OutputFormat;
use crate::guard::action::StudentListView;
use crate::panel::AdminPanel;
use crate::types::StudentAction;

#[derive(Subcommand)]
pub enum StudentCommands {
    #[command(about = "List students")]
    List,

    #[command(about = "Add a new student")]
    Create(StudentFields),

    #[command(about = "Edit an existing student")]
    Update {
        #[arg(help = "Student id")]
        id: String,
        #[command(flatten)]
        fields: StudentFields,
    },

    #[command(about = "Delete a student")]
    Delete {
        #[arg(help = "Student id")]
        id: String,
    },
}

#[derive(Args)]
pub struct StudentFields {
    #[arg(long, help = "Student name")]
    pub name: String,
    #[arg(long, help = "Guardian name")]
    pub guardian_name: String,
    #[arg(long, help = "Guardian phone")]
    pub guardian_phone: String,
    #[arg(long, help = "Standard (LKG, UKG, 1-12)")]
    pub standard: String,
    #[arg(long, help = "Age in years")]
    pub age: u32,
}

impl From<StudentFields> for StudentInput {
    fn from(fields: StudentFields) -> Self {
        Self {
            name: fields.name,
            guardian_name: fields.guardian_name,
            guardian_phone: fields.guardian_phone,
            standard: fields.standard,
            age: fields.age,
        }
    }
}

pub async fn handle(cmd: StudentCommands, panel: &AdminPanel, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        StudentCommands::List => {
            let page = panel.students().await?;

            if let OutputFormat::Json = output_format {
                return output_json(&page);
            }

            if let Some(reason) = &page.permission_error {
                eprintln!("Warning: could not load your permissions ({})", reason);
            }

            match &page.view {
                StudentListView::AccessDenied { denial } => {
                    println!("Access Denied");
                    println!("{}", denial);
                    println!("Please contact your administrator to request access.");
                }
                StudentListView::Empty => {
                    output_empty_collection(&output_format, "students", "No students found")?;
                }
                StudentListView::Students { students } => {
                    println!(
                        "{:<26} {:<20} {:<8} {:<4} {:<20} {:<14} {}",
                        "ID", "NAME", "STANDARD", "AGE", "GUARDIAN", "PHONE", "ACTIONS"
                    );
                    println!("{}", "-".repeat(104));

                    let actions = if page.row_actions.is_empty() {
                        "No actions available".to_string()
                    } else {
                        page.row_actions
                            .iter()
                            .map(StudentAction::label)
                            .collect::<Vec<_>>()
                            .join(", ")
                    };

                    for student in students {
                        println!(
                            "{:<26} {:<20} {:<8} {:<4} {:<20} {:<14} {}",
                            student.id,
                            student.name,
                            student.standard,
                            student.age,
                            student.guardian_name,
                            student.guardian_phone,
                            actions
                        );
                    }
                }
            }
            Ok(())
        }
        StudentCommands::Create(fields) => {
            let input = StudentInput::from(fields);
            let created = panel.create_student(&input).await?;
            output_success(
                &output_format,
                &format!("Student '{}' created", input.name),
                Some(json!({ "student": created })),
            )?;
            Ok(())
        }
        StudentCommands::Update { id, fields } => {
            let input = StudentInput::from(fields);
            let updated = panel.update_student(&id, &input).await?;
            output_success(
                &output_format,
                &format!("Student '{}' updated", id),
                Some(json!({ "student": updated })),
            )?;
            Ok(())
        }
        StudentCommands::Delete { id } => {
            panel.delete_student(&id).await?;
            output_success(
                &output_format,
                &format!("Student '{}' deleted", id),
                Some(json!({ "id": id })),
            )?;
            Ok(())
        }
    }
}
