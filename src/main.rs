use osu_mirror_dl::{Config, Event, Pipeline};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::broadcast::error::RecvError;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming an optional JSON config file
const CONFIG_ENV: &str = "OSU_MIRROR_DL_CONFIG";

/// Used when the config does not name a download directory
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()?;

    let config = load_config()?;
    let input = inquire::Text::new("Enter Username/ID:").prompt()?;
    let start = Instant::now();

    let pipeline = Pipeline::new(config)?;
    let mut events = pipeline.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let summary = pipeline.run(&input).await;
    // Dropping the pipeline closes the event channel so the printer exits.
    drop(pipeline);
    printer.await.ok();
    let summary = summary?;

    println!(
        "{} downloaded, {} already present, {} failed ({})",
        summary.downloaded.len(),
        summary.skipped,
        summary.failed,
        summary.directory.path().display()
    );
    println!("{:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn load_config() -> Result<Config, osu_mirror_dl::Error> {
    let mut config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => Config::from_json_file(&PathBuf::from(path))?,
        None => Config::default(),
    };
    if config.download.download_dir.is_none() {
        config.download.download_dir = Some(PathBuf::from(DEFAULT_DOWNLOAD_DIR));
    }
    Ok(config)
}

fn print_event(event: &Event) {
    match event {
        Event::Started { total, directory } => {
            println!("Downloading {} beatmaps into {}", total, directory.display());
        }
        Event::Downloaded { id, title, .. } => println!("Downloaded {} - {}", id, title),
        Event::Skipped { id } => println!("Skipped {} (already downloaded)", id),
        Event::Failed { id, reason } => println!("Failed {}: {}", id, reason),
        Event::Finished { .. } => println!("Finished downloading!"),
    }
}
