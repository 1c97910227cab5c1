//! Product chat binary
//!
//! Run with: cargo run -p product-chat --bin product-chat -- serve

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use product_chat::{
    chatbot::Chatbot, config::ChatbotConfig, generation::API_KEY_ENV, server::ChatServer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Product support chatbot
#[derive(Parser, Debug)]
#[command(name = "product-chat")]
#[command(version)]
#[command(about = "Retrieval-grounded product support chatbot", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP chat server
    Serve,

    /// Answer a single question from the command line
    Ask {
        /// The question to answer
        message: String,

        /// Product to answer for (defaults to the configured product)
        #[arg(long)]
        product: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "product_chat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => ChatbotConfig::from_toml_file(path)?,
        None => ChatbotConfig::default(),
    };

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Ask { message, product } => ask(config, message, product).await,
    }
}

async fn serve(config: ChatbotConfig) -> anyhow::Result<()> {
    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                    Product Chat Server                    ║
║             Retrieval-grounded product support            ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    tracing::info!("Configuration loaded");
    tracing::info!("  - Data root: {}", config.store.data_root.display());
    tracing::info!("  - Default product: {}", config.store.default_product);
    tracing::info!("  - Completion model: {}", config.completion.model);
    tracing::info!("  - Top-k passages: {}", config.retrieval.top_k);

    // Check credentials
    if std::env::var(API_KEY_ENV).map(|v| v.is_empty()).unwrap_or(true) {
        tracing::warn!("{} is not set", API_KEY_ENV);
        tracing::warn!("Grounded answers will fall back to the apology message");
        tracing::warn!("  Set it with: export {}=<your key>", API_KEY_ENV);
    }

    // Create and start server
    let server = ChatServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/chat      - Ask about a product");
    println!("  GET  /api/products  - List products");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}

async fn ask(config: ChatbotConfig, message: String, product: Option<String>) -> anyhow::Result<()> {
    let chatbot = Chatbot::new(&config).await?;

    let answer = match product {
        Some(product) => chatbot.answer(&message, &product).await,
        None => chatbot.answer_default(&message).await,
    };

    println!("{answer}");

    Ok(())
}
