//! Models and actions commands - show what the provider offers the host

use aireview_core::provider::catalog;
use clap::Args;

/// Arguments for the models command
#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Print the raw JSON answer
    #[arg(long)]
    pub json: bool,
}

impl ModelsArgs {
    /// Execute the models command
    pub fn execute(&self, default_model: &str) -> anyhow::Result<()> {
        let models = catalog::models_for(default_model);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&models)?);
            return Ok(());
        }

        println!("Models");
        println!("======");
        for model in &models.models {
            let marker = if model.model_id == models.default_model_id {
                " (default)"
            } else {
                ""
            };
            println!("  {}{}", model.full_display_text, marker);
        }
        println!();
        println!("Documentation: {}", models.documentation_url);

        Ok(())
    }
}

/// Arguments for the actions command
#[derive(Args, Debug)]
pub struct ActionsArgs {
    /// Print the raw JSON answer
    #[arg(long)]
    pub json: bool,

    /// Also print each action's canned prompt
    #[arg(long)]
    pub prompts: bool,
}

impl ActionsArgs {
    /// Execute the actions command
    pub fn execute(&self) -> anyhow::Result<()> {
        let actions = catalog::actions();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&actions)?);
            return Ok(());
        }

        println!("Actions");
        println!("=======");
        for action in &actions.actions {
            println!("  {:<16} {}", action.id, action.display_text);
            if self.prompts {
                println!();
                for line in action.initial_user_prompt.lines() {
                    println!("      {}", line);
                }
                println!();
            }
        }

        Ok(())
    }
}
