use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use predica_cli::api::OpenAiClient;
use predica_cli::config::Config;
use predica_cli::mailer::{Mailer, SmtpMailer};
use predica_cli::output::OutputHandler;
use predica_cli::wizard::Wizard;
use predica_cli::workflow::Workflow;

#[derive(Parser)]
#[command(name = "predica")]
#[command(about = "Predica - guided homily drafting assistant", long_about = None)]
struct Cli {
    /// Run in verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Path to an alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load_or_default(),
    };

    let mut output = OutputHandler::new().with_debug(cli.debug);

    if cli.verbose {
        output.print_system(&format!(
            "Using model {} at {}",
            config.ai.model, config.ai.api_url
        ))?;
    }
    if config.ai.api_key.is_empty() {
        output.print_error("OPENAI_API_KEY is not set in the environment variables.")?;
    }

    let client = Arc::new(OpenAiClient::new(&config.ai));

    // Email credentials are optional until the share step actually runs;
    // fall back to a mailer that reports the missing configuration.
    let mailer: Arc<dyn Mailer> = match SmtpMailer::new(&config.email) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            output.print_debug(&format!("SMTP not configured: {e}"))?;
            Arc::new(UnconfiguredMailer(e.to_string()))
        }
    };

    let workflow = Workflow::new(client, mailer);
    let mut wizard = Wizard::new(workflow, output);
    wizard.run().await
}

/// Stand-in mailer used when SMTP credentials are absent at startup, so the
/// wizard can still run the first three steps.
struct UnconfiguredMailer(String);

#[async_trait::async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> predica_cli::error::Result<()> {
        Err(predica_cli::error::PredicaError::config(self.0.clone()))
    }
}
