use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use flashdeck::api::ApiClient;
use flashdeck::config::DEFAULT_CONFIG_FILE;
use flashdeck::tts::Pronouncer;
use flashdeck::{Config, DeckGenerator, Difficulty, StudyApp, TOPIC_PRESETS, logging, ui};

#[derive(Parser, Debug)]
#[command(name = "flashdeck", about = "Burmese and Chinese vocabulary flashcards")]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Prefill the topic field
    #[arg(short, long)]
    topic: Option<String>,

    /// Beginner, Intermediate or Advanced
    #[arg(short, long)]
    difficulty: Option<Difficulty>,

    /// Print the suggested topics and exit
    #[arg(long)]
    list_topics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_topics {
        for topic in TOPIC_PRESETS {
            println!("{}", topic);
        }
        return Ok(());
    }

    let config = Config::load_from(&cli.config)?;
    let _log_guard = logging::init_tracing(&config.logging)?;
    info!(model = %config.api.model, "starting flashdeck");

    let api_client = ApiClient::new(config.api.clone())?;
    let generator = Arc::new(DeckGenerator::new(api_client));
    let pronouncer = Pronouncer::new(config.tts.clone());

    let mut app = StudyApp::new();
    if let Some(topic) = cli.topic {
        app.form.free_text = topic;
    }
    if let Some(difficulty) = cli.difficulty {
        app.form.difficulty = difficulty;
    }

    ui::run(&mut app, generator, pronouncer)
}
