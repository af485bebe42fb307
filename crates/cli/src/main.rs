//! `newsrelay` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: start the API server and the schedule runner.
//! - `init-db`: create the database file and tables.
//! - `parse`: run the envelope parser over a saved webhook payload.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::{Ingestor, Scheduler, SystemClock};
use webhook::HttpWebhookClient;

const DEFAULT_DATABASE_URL: &str = "sqlite://newsrelay.db";

#[derive(Parser)]
#[command(
    name = "newsrelay",
    about = "Webhook-backed asset news relay with scheduled ingestion",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server and the schedule runner.
    Serve {
        /// Workflow webhook that generates the news.
        #[arg(long, env = "N8N_WEBHOOK_URL")]
        webhook_url: String,
        #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
        bind: String,
        /// UTC offset schedule times are written in.
        #[arg(long, env = "SCHEDULE_UTC_OFFSET", default_value = "+01:00")]
        utc_offset: FixedOffset,
        /// Seconds between scheduler ticks.
        #[arg(long, env = "SCHEDULER_TICK_SECS", default_value_t = 20)]
        tick_secs: u64,
    },
    /// Create the database and its tables if they are missing.
    InitDb {
        #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },
    /// Print the news drafts a saved webhook payload would produce.
    Parse {
        /// Path to the payload JSON file.
        path: std::path::PathBuf,
        /// Language for drafts that name none.
        #[arg(long, default_value = "en")]
        language: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            webhook_url,
            database_url,
            bind,
            utc_offset,
            tick_secs,
        } => {
            let pool = db::pool::create_pool(&database_url, 5)
                .await
                .context("failed to connect to database")?;
            db::pool::init_schema(&pool).await.context("schema setup failed")?;

            let client = HttpWebhookClient::new(webhook_url).context("cannot build webhook client")?;
            info!("Forwarding to webhook {}", client.url());

            let ingestor = Ingestor::new(pool.clone(), Arc::new(client));
            let scheduler = Arc::new(Scheduler::new(
                ingestor.clone(),
                Arc::new(SystemClock),
                utc_offset,
            ));

            let active = db::repository::schedules::list_active_schedules(&pool)
                .await
                .context("cannot load schedules")?;
            scheduler.restore(&active).await;
            Arc::clone(&scheduler).spawn(Duration::from_secs(tick_secs.max(1)));

            info!("Starting API server on {bind}");
            let state = api::AppState {
                pool,
                ingestor,
                scheduler,
            };
            api::serve(&bind, state).await.context("API server failed")?;
        }
        Command::InitDb { database_url } => {
            info!("Initialising database at {database_url}");
            let pool = db::pool::create_pool(&database_url, 1)
                .await
                .context("failed to connect to database")?;
            db::pool::init_schema(&pool).await.context("schema setup failed")?;
            info!("Database ready");
        }
        Command::Parse { path, language } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read file {}", path.display()))?;
            let payload: serde_json::Value =
                serde_json::from_str(&content).context("payload is not valid JSON")?;

            let drafts = engine::parse_payload(&payload, &language);
            println!("{}", serde_json::to_string_pretty(&drafts)?);
            eprintln!("{} draft(s) parsed", drafts.len());
        }
    }

    Ok(())
}
