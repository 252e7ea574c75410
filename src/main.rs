use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tweetlake::accumulate::{FetchCycle, FetchRequest};
use tweetlake::config::AppConfig;
use tweetlake::container::ResultFile;
use tweetlake::models::{FetchOutcome, QueryKind};
use tweetlake::paginate::{Credentials, HttpApiClient};

#[derive(Parser)]
#[command(name = "tweetlake")]
#[command(about = "Incremental Twitter fetcher with accumulating local storage")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./tweetlake.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one fetch cycle
    Fetch {
        /// Query type: user_timeline, search or lists_statuses
        #[arg(long)]
        querytype: String,

        /// The query: a username, search terms, or a list URL/id
        #[arg(long)]
        query: String,

        /// Keep previously fetched tweets and only fetch newer ones
        #[arg(long)]
        accumulate: bool,

        /// Container written by the previous cycle
        #[arg(long)]
        last: Option<PathBuf>,

        /// Where to write this cycle's container
        #[arg(long)]
        output: PathBuf,

        /// Row budget override
        #[arg(long)]
        max_rows: Option<u32>,
    },

    /// List the parts stored in a container
    Inspect {
        /// Container path
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::load(cli.config.as_ref())?;

    match cli.command {
        Commands::Fetch {
            querytype,
            query,
            accumulate,
            last,
            output,
            max_rows,
        } => {
            let kind: QueryKind = querytype
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let credentials = std::env::var("TWITTER_BEARER_TOKEN")
                .ok()
                .filter(|token| !token.is_empty())
                .map(Credentials::new);
            let client = HttpApiClient::new(
                Duration::from_secs(config.api.timeout_seconds),
                &config.api.user_agent,
            )
            .context("failed to build HTTP client")?;

            let request = FetchRequest {
                kind,
                query,
                accumulate,
            };
            let prior = last.map(FetchOutcome::ok);
            let outcome = FetchCycle::new(&client)
                .with_api_base(config.api.base_url)
                .with_max_rows(max_rows.unwrap_or(config.storage.max_rows_per_table))
                .run(&request, credentials.as_ref(), prior.as_ref(), &output)
                .await?;

            println!("wrote {}", outcome.path.display());
            for error in &outcome.errors {
                println!("error: {}", error.id);
            }
        }
        Commands::Inspect { path } => {
            let file = ResultFile::new(&path);
            println!("kind: {:?}", file.kind()?);
            if let Some(identity) = file.query_identity()? {
                println!("query: {} {:?}", identity.endpoint, identity.params);
            }
            if let Some(newest) = file.newest_id()? {
                println!("newest tweet: {}", newest);
            }
            for part in file.parts()? {
                let part = part?;
                println!(
                    "{:<28} {:>7} tweets  status {:<4} {}",
                    part.name,
                    part.n_tweets.map(|n| n.to_string()).unwrap_or_default(),
                    part.http_status.as_deref().unwrap_or("-"),
                    part.mtime.to_rfc3339(),
                );
            }
        }
    }

    Ok(())
}
