//! echocrypt - audio watermarking client
//!
//! Embeds an encrypted message into a WAV file through the watermarking
//! service, or extracts and decrypts one, then prints the result together
//! with waveforms of the original and watermarked audio.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use echocrypt_client::api::HttpWatermarkApi;
use echocrypt_client::workflow::{ParameterField, SubmitStatus};
use echocrypt_client::{AudioFile, Shell, SuggestionClient};
use echocrypt_common::config::{ConfigResolver, LoggingConfig};
use echocrypt_common::{AssetSlot, WorkflowMode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "echocrypt", version, about = "Secure audio watermarking client")]
struct Cli {
    /// Watermarking service base URL (overrides env and config file)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a message and embed it into a WAV file
    Embed {
        #[command(flatten)]
        keys: KeyArgs,

        /// Message to hide
        #[arg(long)]
        message: String,

        /// Save the watermarked file here
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Extract and decrypt a message from a WAV file
    Extract {
        #[command(flatten)]
        keys: KeyArgs,
    },

    /// Ask the service for a recommended bit depth
    Suggest {
        /// WAV file to size
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// WAV file to process
    #[arg(long)]
    file: PathBuf,

    /// Playfair keyword
    #[arg(long)]
    keyword: String,

    /// Rail fence depth
    #[arg(long, default_value = "2")]
    depth: String,

    /// Least-significant bits per sample (1-8)
    #[arg(long, default_value = "1")]
    bits: String,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigResolver::new()
        .with_cli_api_base(cli.api_base.clone())
        .with_config_path(cli.config.clone())
        .resolve()?;

    init_tracing(&config.logging)?;

    info!(
        "Starting EchoCrypt client v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Service: {}", config.api_base);

    let api = Arc::new(HttpWatermarkApi::new(config.clone())?);

    if let Command::Suggest { file } = &cli.command {
        let file = AudioFile::from_path(file).await?;
        let bits = SuggestionClient::new(api).fetch(file.size()).await?;
        println!("Recommended bit depth for {}: {}", file.name(), bits);
        return Ok(());
    }

    let mut shell = Shell::new(config, api);
    let result = run(&shell, &cli.command).await;
    shell.pump_events().await;
    println!("{}", shell.render().await);
    shell.shutdown().await;
    result
}

async fn run(shell: &Shell, command: &Command) -> Result<()> {
    let (mode, keys, message, save) = match command {
        Command::Embed {
            keys,
            message,
            save,
        } => (WorkflowMode::Embed, keys, Some(message), save.as_deref()),
        Command::Extract { keys } => (WorkflowMode::Extract, keys, None, None),
        Command::Suggest { .. } => return Ok(()),
    };

    let workflow = shell.workflow().clone();
    workflow.set_mode(mode).await;

    let file = AudioFile::from_path(&keys.file).await?;
    let suggestion = workflow.select_file(file).await?;

    workflow
        .update_parameter(ParameterField::CipherKeyword, &keys.keyword)
        .await?;
    workflow
        .update_parameter(ParameterField::TranspositionDepth, &keys.depth)
        .await?;
    workflow
        .update_parameter(ParameterField::BitDepth, &keys.bits)
        .await?;
    if let Some(message) = message {
        workflow
            .update_parameter(ParameterField::SecretMessage, message)
            .await?;
    }

    // Suggestion is advisory; wait so it shows up in the output
    let _ = suggestion.await;

    let status = workflow.submit().await?;
    if status != SubmitStatus::Completed {
        anyhow::bail!("Submit did not complete: {:?}", status);
    }

    if let Some(path) = save {
        save_processed(shell, path).await?;
    }
    Ok(())
}

async fn save_processed(shell: &Shell, path: &Path) -> Result<()> {
    let asset = shell
        .workflow()
        .asset(AssetSlot::Processed)
        .await
        .context("No watermarked audio to save")?;

    let bytes = shell.api().download(asset.locator().as_str()).await?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), bytes = bytes.len(), "Watermarked audio saved");
    Ok(())
}
