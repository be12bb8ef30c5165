use crate::app::App;
use anyhow::Result;
use clap::Subcommand;
use promptwright_core::session::HistoryItem;

#[derive(Subcommand, Debug)]
pub enum ContextAction {
    /// Show a project's current wizard session
    Project { project_id: String },
    /// Show an artifact's current session
    Artifact {
        project_id: String,
        artifact_id: String,
    },
}

pub async fn run(app: &App, action: ContextAction) -> Result<()> {
    match action {
        ContextAction::Project { project_id } => {
            let context = app.project_contexts.load_project_context(&project_id).await?;
            println!("{} ({})", context.project.name, context.project.id);
            super::print_sessions(&context.sessions, Some(&context.current_session_id));
            print_history(&context.history);
            if let Some(state) = &context.state {
                println!(
                    "state: {} question(s), {} answer(s), finished: {}",
                    state.questions.len(),
                    state.answers.len(),
                    state.finished
                );
                if let Some(prompt) = &state.final_prompt {
                    println!("final prompt:\n{}", prompt);
                }
            }
        }
        ContextAction::Artifact {
            project_id,
            artifact_id,
        } => {
            let context = app
                .artifact_contexts
                .load_artifact_context(&project_id, &artifact_id)
                .await?;
            let artifact = &context.artifact;
            println!("{} ({})", artifact.title, artifact.id);
            if !artifact.problem.is_empty() {
                println!("problem: {}", artifact.problem);
            }
            println!("template:\n{}", artifact.prompt_content);
            for variable in &artifact.variables {
                println!(
                    "  {{{{{}}}}}  {}{}",
                    variable.key,
                    variable.label,
                    if variable.required { " (required)" } else { "" }
                );
            }
            super::print_sessions(&context.sessions, Some(&context.current_session_id));
            print_history(&context.history);
        }
    }
    Ok(())
}

fn print_history(history: &[HistoryItem]) {
    for item in history {
        println!("[{}] {}", item.role, item.content);
    }
}
