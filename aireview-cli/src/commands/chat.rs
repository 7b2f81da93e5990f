//! Chat command - run one review action against a Gerrit change

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aireview_core::provider::catalog;
use aireview_core::{
    ChangedFile, ChatResponse, ChatResponseListener, Config, ReviewProvider, ReviewRequest,
    Secrets,
};
use aireview_gerrit::GerritClient;
use clap::Args;

use super::build_provider;

/// Action used when neither --action nor --prompt is given
const DEFAULT_ACTION: &str = "review-change";

/// Arguments for the chat command
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Change number to review
    #[arg(required = true)]
    pub change: u64,

    /// Canned action to run (see `aireview actions`)
    #[arg(short, long, conflicts_with = "prompt")]
    pub action: Option<String>,

    /// Free-text instruction; `{{patch}}` marks where the code goes
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Files to include instead of the change's own file list (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<String>,

    /// Print response envelopes as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatArgs {
    /// Execute the chat command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let prompt = self.resolve_prompt()?;
        let secrets = Secrets::load()?;
        let gerrit = Arc::new(GerritClient::from_config(config, &secrets)?);

        let change = gerrit.get_change(self.change).await?;
        let files = if self.files.is_empty() {
            gerrit.list_files(self.change).await?
        } else {
            self.files.iter().map(ChangedFile::new).collect()
        };

        if verbose {
            tracing::info!(
                change = change.number,
                subject = ?change.subject,
                files = files.len(),
                "Starting review request"
            );
        }

        let provider = build_provider(config, &secrets, gerrit)?;
        let request = ReviewRequest::new(prompt, change).with_files(files);

        let listener = Arc::new(PrintListener::new(self.json, verbose));
        provider.chat(request, listener.clone()).await?;

        if listener.failed() {
            anyhow::bail!("review request failed");
        }
        Ok(())
    }

    fn resolve_prompt(&self) -> anyhow::Result<String> {
        if let Some(prompt) = &self.prompt {
            return Ok(prompt.clone());
        }

        let id = self.action.as_deref().unwrap_or(DEFAULT_ACTION);
        let actions = catalog::actions();
        let action = actions.find(id).ok_or_else(|| {
            let known: Vec<&str> = actions.actions.iter().map(|a| a.id.as_str()).collect();
            anyhow::anyhow!("Unknown action '{}'. Available: {}", id, known.join(", "))
        })?;
        Ok(action.initial_user_prompt.clone())
    }
}

/// Listener that writes responses to stdout and errors to stderr
pub struct PrintListener {
    json: bool,
    verbose: bool,
    failed: AtomicBool,
}

impl PrintListener {
    /// Create a print listener
    pub fn new(json: bool, verbose: bool) -> Self {
        Self {
            json,
            verbose,
            failed: AtomicBool::new(false),
        }
    }

    /// Whether an error was reported
    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

impl ChatResponseListener for PrintListener {
    fn emit_response(&self, response: ChatResponse) {
        if self.json {
            match serde_json::to_string(&response) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("Failed to encode response: {}", e),
            }
            return;
        }

        if self.verbose {
            if let Some(at) = chrono::DateTime::from_timestamp_millis(response.timestamp_millis) {
                eprintln!("[{}]", at.format("%H:%M:%S%.3f"));
            }
        }
        println!("{}", response.full_text());
        println!();
    }

    fn emit_error(&self, message: String) {
        self.failed.store(true, Ordering::SeqCst);
        eprintln!("Error: {}", message);
    }

    fn done(&self) {
        if self.verbose {
            eprintln!("[done]");
        }
    }
}
