//! Query the live cafeteria endpoints once and print the normalized JSON.
//! Handy for checking whether the upstream format has drifted.
//!
//! Usage: probe menu | probe servings | probe users CODE [CODE ...]

use std::sync::Arc;

use clap::{Parser, Subcommand};

use uncmorfi_api::{
    config::Config,
    services::{comedor::ComedorService, fetcher::HttpFetcher},
};

#[derive(Parser)]
#[command(name = "probe", about = "Fetch one normalized view from the cafeteria and print it")]
struct Args {
    #[command(subcommand)]
    view: View,
}

#[derive(Subcommand)]
enum View {
    /// This week's menu
    Menu,
    /// Today's serving counts
    Servings,
    /// Account records for the given codes
    Users {
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let fetcher = HttpFetcher::new(config.upstream.timeout)?;
    let comedor = ComedorService::new(Arc::new(fetcher), config.upstream);

    let output = match args.view {
        View::Menu => serde_json::to_string_pretty(&comedor.fetch_menu().await?)?,
        View::Servings => serde_json::to_string_pretty(&comedor.fetch_servings().await?)?,
        View::Users { codes } => {
            let requested = codes.len();
            let users = comedor.fetch_users(codes).await;
            if users.len() < requested {
                tracing::warn!("{} of {} code(s) could not be fetched", requested - users.len(), requested);
            }
            serde_json::to_string_pretty(&users)?
        }
    };
    println!("{output}");

    Ok(())
}
