use anyhow::{Context, bail};
use clap::Subcommand;
use promptdock_engine::executor::preview;
use promptdock_engine::protocol::{PromptInput, PromptPatch, PromptRecord};
use promptdock_engine::store::{self, PromptOrder, PromptStore};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum PromptAction {
    /// List prompts
    List {
        /// Only prompts whose name or content contains this text
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "newest")]
        sort: PromptOrder,
    },
    /// Save a new prompt
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Change fields of a saved prompt
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Delete a prompt
    Rm { id: u64 },
    /// Print one prompt in full
    Show { id: u64 },
    /// Write every prompt to a JSON file
    Export { path: PathBuf },
    /// Add every prompt from an exported JSON file
    Import { path: PathBuf },
}

pub async fn run<S: PromptStore + ?Sized>(store: &S, action: PromptAction) -> anyhow::Result<()> {
    match action {
        PromptAction::List { search, sort } => {
            let mut prompts = store::search(store.list().await?, search.as_deref().unwrap_or(""));
            store::sort(&mut prompts, sort);
            if prompts.is_empty() {
                println!("No prompts");
            }
            for prompt in &prompts {
                println!("{}", list_line(prompt));
            }
        }
        PromptAction::Add {
            name,
            content,
            category,
            model,
        } => {
            let id = store
                .create(PromptInput {
                    name,
                    content,
                    category,
                    model,
                })
                .await?;
            println!("Saved prompt {}", id);
        }
        PromptAction::Edit {
            id,
            name,
            content,
            category,
            model,
        } => {
            let patch = PromptPatch {
                name,
                content,
                category,
                model,
            };
            if patch.is_empty() {
                bail!("nothing to change; pass --name, --content, --category or --model");
            }
            let updated = store.update(id, patch).await?;
            println!("Updated prompt {}", updated.id);
        }
        PromptAction::Rm { id } => {
            if !store.delete(id).await? {
                bail!("prompt {} not found", id);
            }
            println!("Deleted prompt {}", id);
        }
        PromptAction::Show { id } => {
            let prompt = store
                .get(id)
                .await?
                .with_context(|| format!("prompt {} not found", id))?;
            println!("{}", serde_json::to_string_pretty(&prompt)?);
        }
        PromptAction::Export { path } => {
            let json = store::export_json(store).await?;
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        PromptAction::Import { path } => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let ids = store::import_json(store, &json).await?;
            println!("Imported {} prompts", ids.len());
        }
    }
    Ok(())
}

fn list_line(prompt: &PromptRecord) -> String {
    let mut line = format!("[{}] {}", prompt.id, prompt.name);
    if let Some(category) = &prompt.category {
        line.push_str(&format!(" ({})", category));
    }
    line.push_str(": ");
    line.push_str(&preview(&prompt.content, 60));
    line
}
