use crate::app::App;
use anyhow::{Result, bail};
use clap::Subcommand;
use promptwright_core::project::{NewProject, ProjectPatch, ProjectRepository};
use promptwright_core::time::format_millis;

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Create a project
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List projects, most recently updated first
    List,
    /// Show one project
    Show { project_id: String },
    /// Rename a project
    Rename { project_id: String, name: String },
    /// Delete a project and everything it owns
    Delete { project_id: String },
}

pub async fn run(app: &App, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::Create { name, description } => {
            let project = app.projects.create(NewProject { name, description }).await?;
            println!("{}", project.id);
        }
        ProjectAction::List => {
            for project in app.projects.list().await? {
                println!(
                    "{}  {}  {}",
                    project.id,
                    format_millis(project.updated_at),
                    project.name
                );
            }
        }
        ProjectAction::Show { project_id } => {
            let project = app.projects.require(&project_id).await?;
            println!("id:          {}", project.id);
            println!("name:        {}", project.name);
            if let Some(description) = &project.description {
                println!("description: {}", description);
            }
            println!("created:     {}", format_millis(project.created_at));
            println!("updated:     {}", format_millis(project.updated_at));
            println!(
                "current:     {}",
                project.current_session_id.as_deref().unwrap_or("-")
            );
        }
        ProjectAction::Rename { project_id, name } => {
            let patch = ProjectPatch {
                name: Some(name),
                ..ProjectPatch::default()
            };
            if app.projects.update(&project_id, patch).await?.is_none() {
                bail!("Project '{}' not found", project_id);
            }
        }
        ProjectAction::Delete { project_id } => {
            if !app.projects.delete(&project_id).await? {
                bail!("Project '{}' not found", project_id);
            }
        }
    }
    Ok(())
}
