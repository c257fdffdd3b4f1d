//! Bulk recipe import.
//!
//! Reads a JSON array of recipes from a file and posts them to the backend
//! in one request, using the token from the saved session.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use bitebot::api::ApiClient;
use bitebot::config::Config;
use bitebot::models::Recipe;
use bitebot::session::Session;

#[derive(Parser)]
#[command(name = "import-recipes")]
#[command(about = "Bulk-insert recipes into the BiteBot backend", long_about = None)]
struct Cli {
    /// Path to a JSON file containing an array of recipes
    #[arg(long)]
    file: PathBuf,

    /// Backend base URL (overrides BITEBOT_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let api_url = config.resolve_api_url(cli.api_url);

    let session = Session::load()?;
    if !session.is_authenticated() {
        bail!("No saved session. Sign up in the bitebot TUI first.");
    }

    let content = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("could not read {}", cli.file.display()))?;
    let recipes: Vec<Recipe> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of recipes", cli.file.display()))?;

    if recipes.is_empty() {
        println!("Nothing to import: {} contains no recipes", cli.file.display());
        return Ok(());
    }

    let mut api = ApiClient::new(&api_url);
    api.set_token(session.token.clone());

    let inserted = api.insert_recipes(&recipes).await?;
    println!("Inserted {} of {} recipes", inserted, recipes.len());
    Ok(())
}
