use anyhow::Result;
use clap::Parser;

use bitebot::app::App;
use bitebot::config::Config;
use bitebot::handler;
use bitebot::tui;
use bitebot::ui;

#[derive(Parser)]
#[command(name = "bitebot")]
#[command(about = "Terminal client for the BiteBot nutrition tracker", long_about = None)]
struct Cli {
    /// Backend base URL (overrides BITEBOT_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let api_url = config.resolve_api_url(cli.api_url);

    let mut app = App::new(&api_url)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    handler::bootstrap(&mut app).await;

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event).await?;
        } else {
            break;
        }
    }

    tui::restore()?;
    Ok(())
}
