use crate::app::App;
use anyhow::{Result, anyhow, bail};
use clap::Subcommand;
use promptwright_core::artifact::{ArtifactRepository, ArtifactVariable, NewArtifact};
use promptwright_core::time::format_millis;

#[derive(Subcommand, Debug)]
pub enum ArtifactAction {
    /// Create an artifact from a prompt template
    Create {
        project_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        prompt: String,
        #[arg(long, default_value = "")]
        problem: String,
        /// Template variable as KEY or KEY=LABEL (repeatable)
        #[arg(long = "var", value_name = "KEY[=LABEL]")]
        variables: Vec<String>,
    },
    /// List a project's artifacts, newest first
    List { project_id: String },
    /// Delete an artifact and its sessions
    Delete {
        project_id: String,
        artifact_id: String,
    },
}

pub async fn run(app: &App, action: ArtifactAction) -> Result<()> {
    match action {
        ArtifactAction::Create {
            project_id,
            title,
            prompt,
            problem,
            variables,
        } => {
            let variables = variables
                .iter()
                .map(|arg| parse_variable(arg))
                .collect::<Result<Vec<_>>>()?;
            let artifact = app
                .artifacts
                .create(
                    &project_id,
                    NewArtifact {
                        title,
                        problem,
                        prompt_content: prompt,
                        variables,
                    },
                )
                .await?;
            println!("{}", artifact.id);
        }
        ArtifactAction::List { project_id } => {
            for artifact in app.artifacts.list(&project_id).await? {
                let keys: Vec<&str> = artifact.variables.iter().map(|v| v.key.as_str()).collect();
                println!(
                    "{}  {}  {}  [{}]",
                    artifact.id,
                    format_millis(artifact.created_at),
                    artifact.title,
                    keys.join(", ")
                );
            }
        }
        ArtifactAction::Delete {
            project_id,
            artifact_id,
        } => {
            if !app.artifacts.delete(&project_id, &artifact_id).await? {
                bail!("Artifact '{}' not found in project '{}'", artifact_id, project_id);
            }
        }
    }
    Ok(())
}

fn parse_variable(arg: &str) -> Result<ArtifactVariable> {
    let (key, label) = match arg.split_once('=') {
        Some((key, label)) => (key.trim(), label.trim()),
        None => (arg.trim(), arg.trim()),
    };
    if key.is_empty() {
        return Err(anyhow!("Variable '{}' has no key", arg));
    }
    Ok(ArtifactVariable::text(key, label))
}
