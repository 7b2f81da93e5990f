//! Token commands - provision the Gemini key on the Gerrit account

use aireview_core::{Config, Secrets};
use aireview_gerrit::GerritClient;
use clap::{Args, Subcommand};

/// Token management commands
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Store a Gemini API key on your Gerrit account
    Set {
        /// The Gemini API key
        token: String,
    },

    /// Check whether a key is stored on your Gerrit account
    Show {
        /// Print the key itself instead of a masked form
        #[arg(long)]
        reveal: bool,
    },

    /// Create a local secrets file template
    Init,
}

impl TokenArgs {
    /// Execute the token command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        match &self.command {
            TokenCommand::Init => {
                let path = Secrets::create_template()?;
                println!("Created secrets template at {}", path.display());
                println!("Edit it and keep its permissions at 0600.");
            }
            TokenCommand::Set { token } => {
                let gerrit = gerrit_client(config)?;
                gerrit.set_token(token).await?;
                println!("Gemini token stored on {}", gerrit.base_url());
            }
            TokenCommand::Show { reveal } => {
                let gerrit = gerrit_client(config)?;
                match gerrit.get_token().await? {
                    Some(token) if *reveal => println!("{}", token),
                    Some(token) => println!("Gemini token is set ({})", mask(&token)),
                    None => println!("No Gemini token stored on {}", gerrit.base_url()),
                }
            }
        }

        Ok(())
    }
}

fn gerrit_client(config: &Config) -> anyhow::Result<GerritClient> {
    let secrets = Secrets::load()?;
    Ok(GerritClient::from_config(config, &secrets)?)
}

/// Keep the last four characters of a secret
fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
