//! Tabletalk - line-oriented command interpreter.
//!
//! Reads chat lines from stdin and writes one JSON reply per line to stdout.
//! Lines starting with `?` ask for completions instead of running a command.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tabletalk_engine::{
    infrastructure::{
        config::RunnerConfig,
        context_loader::{demo_context, load_context},
    },
    App,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // stdout carries replies, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabletalk_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Tabletalk");

    let config = RunnerConfig::from_env()?;
    let context = match &config.context_path {
        Some(path) => load_context(path).await?,
        None => {
            tracing::info!("TABLETALK_CONTEXT_PATH not set, using the demo table");
            demo_context(chrono::Utc::now())
        }
    };

    let app = App::with_system_ports(config, context);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(reply) = app.handle_line(&line).await else {
            continue;
        };
        println!("{}", serde_json::to_string(&reply)?);
    }

    let stats = app.with_runner(|runner| runner.history_stats()).await;
    tracing::info!(
        total = stats.total,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "Input closed, shutting down"
    );
    Ok(())
}

/// Load `.env.local` then `.env` from the workspace root.
fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
