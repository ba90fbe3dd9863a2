//! straico - command-line client for the Straico API gateway
//!
//! Loads `~/.straico/config.toml` and the API key, opens a gateway
//! session, runs one command and prints the JSON answer.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use straico_gateway::config::{Config, Secrets};
use straico_gateway::{ApiGateway, ConversationTurn, ImageSize};

#[derive(Parser)]
#[command(name = "straico", about = "Straico API command-line client", version)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter directive (overrides RUST_LOG, LOG_LEVEL and the config file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List models available to the account
    Models,

    /// Show account details
    User,

    /// Send a single chat message
    Chat {
        /// User message (or omit to read from stdin)
        message: Option<String>,
        /// Model to use (default: from config)
        #[arg(short, long)]
        model: Option<String>,
        /// Completion token limit
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Generate images from a prompt
    Image {
        prompt: String,
        /// Model to use (default: from config)
        #[arg(short, long)]
        model: Option<String>,
        /// square, portrait or landscape
        #[arg(short, long, default_value = "square")]
        size: ImageSize,
        /// Number of images (1-4)
        #[arg(short, long, default_value_t = 1)]
        variations: u8,
    },

    /// Start a video generation
    Video {
        prompt: String,
        /// Model to use (default: from config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Poll an asynchronous generation job
    Status { generation_id: String },

    /// Print version information
    Version,
}

/// Filter precedence: `--log-level`, then `RUST_LOG`, then `LOG_LEVEL` or
/// the config file.
fn log_filter(cli_level: Option<&str>, config: &Config) -> EnvFilter {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.logging.level)),
    };
    filter.unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(filter: EnvFilter, config: &Config) -> Result<(), Box<dyn std::error::Error>> {

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn resolve_text(text: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match text {
        Some(t) => Ok(t),
        None => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
            Ok(buf.trim().to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Command::Version = args.command {
        println!("straico {}", straico_gateway::version_string());
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;
    init_tracing(log_filter(args.log_level.as_deref(), &config), &config)?;

    let api_key = Secrets::load()?.api_key()?;
    let gateway = config.gateway_builder(api_key).build()?;
    gateway.open()?;

    let outcome = run(&gateway, &config, args.command).await;
    gateway.close().await?;

    let value = outcome?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn run(
    gateway: &impl ApiGateway,
    config: &Config,
    command: Command,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let value = match command {
        Command::Models => gateway.models().await?,
        Command::User => gateway.user_info().await?,
        Command::Chat {
            message,
            model,
            max_tokens,
        } => {
            let message = resolve_text(message)?;
            let model = model.unwrap_or_else(|| config.api.default_chat_model.clone());
            let reply = gateway
                .chat(&model, &[ConversationTurn::user(message)], max_tokens)
                .await?;
            json!({ "model": reply.model, "content": reply.content })
        }
        Command::Image {
            prompt,
            model,
            size,
            variations,
        } => {
            let model = model.unwrap_or_else(|| config.api.default_image_model.clone());
            let result = gateway
                .generate_image(&model, &prompt, size, variations)
                .await?;
            json!({ "urls": result.urls, "generation_id": result.generation_id, "status": result.status })
        }
        Command::Video { prompt, model } => {
            let model = model.unwrap_or_else(|| config.api.default_video_model.clone());
            let result = gateway.generate_video(&prompt, Some(&model)).await?;
            json!({ "urls": result.urls, "generation_id": result.generation_id, "status": result.status })
        }
        Command::Status { generation_id } => {
            let result = gateway.generation_status(&generation_id).await?;
            json!({ "urls": result.urls, "generation_id": result.generation_id, "status": result.status })
        }
        Command::Version => json!({ "version": straico_gateway::version_string() }),
    };
    Ok(value)
}
