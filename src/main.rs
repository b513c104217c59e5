// Weather Widget v0.1
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod errors;
mod models;
mod services;
mod store;
mod units;
mod view;

use config::AppConfig;
use services::openweather::OpenWeatherClient;
use services::pipeline::WeatherPipeline;
use store::kv::{JsonFileStore, SharedStore};
use store::preferences::{load_last_location, DisplayPreferences};
use units::TemperatureUnit;

/// Display preferences shared between the input loop and submission tasks.
type SharedPreferences = Arc<RwLock<DisplayPreferences>>;

/// One line of user input.
#[derive(Debug, PartialEq)]
enum Command {
    SelectUnit(TemperatureUnit),
    ToggleTheme,
    Quit,
    Submit(String),
    Blank,
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        "" => Command::Blank,
        ":c" => Command::SelectUnit(TemperatureUnit::Celsius),
        ":f" => Command::SelectUnit(TemperatureUnit::Fahrenheit),
        ":k" => Command::SelectUnit(TemperatureUnit::Kelvin),
        ":theme" => Command::ToggleTheme,
        ":q" | ":quit" => Command::Quit,
        query => Command::Submit(query.to_string()),
    }
}

async fn redraw(pipeline: &WeatherPipeline, prefs: &SharedPreferences) {
    let state = pipeline.snapshot().await;
    let prefs = *prefs.read().await;
    println!("\n{}", view::render(&state, &prefs));
}

/// Run a submission in its own task so input stays responsive.
fn spawn_submission(pipeline: &WeatherPipeline, prefs: &SharedPreferences, query: String) {
    let pipeline = pipeline.clone();
    let prefs = prefs.clone();
    tokio::spawn(async move {
        pipeline.submit(&query).await;
        redraw(&pipeline, &prefs).await;
    });
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the widget
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_widget=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let store: SharedStore = Arc::new(JsonFileStore::new(&config.prefs_path));
    tracing::info!("Preferences stored in {}", config.prefs_path);

    let client = match OpenWeatherClient::new(&config.base_url, &config.api_key, &config.user_agent)
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let pipeline = WeatherPipeline::new(client, store.clone());
    let prefs: SharedPreferences = Arc::new(RwLock::new(DisplayPreferences::load(store.as_ref())));

    redraw(&pipeline, &prefs).await;

    if let Some(last) = load_last_location(store.as_ref()) {
        tracing::info!("Restoring last location '{}'", last);
        spawn_submission(&pipeline, &prefs, last);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };

        match parse_command(&line) {
            Command::Blank => continue,
            Command::Quit => break,
            Command::SelectUnit(unit) => {
                prefs.write().await.select_unit(unit);
                redraw(&pipeline, &prefs).await;
            }
            Command::ToggleTheme => {
                let result = prefs.write().await.toggle_theme(store.as_ref());
                if let Err(e) = result {
                    tracing::warn!("Failed to persist theme: {}", e);
                }
                redraw(&pipeline, &prefs).await;
            }
            Command::Submit(query) => {
                println!("Loading...");
                spawn_submission(&pipeline, &prefs, query);
            }
        }
    }

    tracing::info!("Bye");
}
