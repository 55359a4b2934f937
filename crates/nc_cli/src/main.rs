use chrono::Utc;
use clap::Parser;
use nc_core::{DocumentStore, Result, Settings, SpeechSynthesizer};
use nc_feeds::{
    init_logging, FeedArgs, FeedConfig, HttpFeedSource, IngestManager, IngestOptions, IngestReport,
};
use nc_inference::{
    create_model, write_audio, Briefer, Briefing, BriefingConfig, BriefingMode, CachedEmbedder,
    EmbeddingCache, ModelKind,
};
use nc_storage::{BackendConfig, StorageKind};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                match c {
                    's' => total_seconds += num,
                    'm' => total_seconds += num * 60,
                    'h' => total_seconds += num * 3600,
                    'd' => total_seconds += num * 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                }
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing bare number counts as seconds
        if !current_number.is_empty() {
            match current_number.parse::<u64>() {
                Ok(num) => {
                    total_seconds += num;
                    has_unit = true;
                }
                Err(_) => return Err("Invalid number in duration".to_string()),
            }
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be positive".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Turn news feeds into a daily podcast briefing",
    long_about = None
)]
struct Cli {
    #[arg(
        long,
        default_value = "memory",
        help = "Document store. Available: memory (default), chroma"
    )]
    storage: StorageKind,
    #[arg(
        long,
        default_value = "openai",
        help = "Model for embeddings, scripts and speech. Available: openai (default), dummy"
    )]
    model: ModelKind,
    /// Directory holding seen-state, caches, the memory store and output
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch feeds and store new articles
    Ingest {
        #[arg(long)]
        user: Option<String>,
        /// Run in periodic mode with the specified interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Write a briefing script, and its audio when speech is enabled, from
    /// what the store already holds
    Brief {
        #[arg(long, default_value_t = 5)]
        minutes: u32,
        #[arg(long)]
        topic: Option<String>,
        /// Write a recap instead of a daily script
        #[arg(long)]
        recap: bool,
    },
    /// Ingest, then brief: daily mode when something new came in, recap otherwise
    Run {
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 5)]
        minutes: u32,
        #[arg(long)]
        topic: Option<String>,
    },
    /// Inspect feed configuration
    Feeds(FeedArgs),
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

struct Pipeline {
    settings: Settings,
    manager: Arc<IngestManager>,
    briefer: Arc<Briefer>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

async fn check_storage(store: &Arc<dyn DocumentStore>, kind: StorageKind) -> Result<()> {
    let count = store.count().await?;
    info!("🏦 Storage backend ready (using {}, {} documents)", kind, count);
    Ok(())
}

async fn check_storage_with_retry(
    store: &Arc<dyn DocumentStore>,
    kind: StorageKind,
    max_retries: u32,
    timeout: Duration,
) -> Result<()> {
    let mut retries = 0;
    loop {
        let error = match tokio::time::timeout(timeout, check_storage(store, kind)).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e,
            Err(elapsed) => {
                nc_core::Error::Storage(format!("Storage health check timed out: {}", elapsed))
            }
        };
        retries += 1;
        if retries >= max_retries {
            return Err(error);
        }
        info!(
            "Storage health check failed ({}), retrying {}/{}...",
            error, retries, max_retries
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}

async fn build_pipeline(
    storage: StorageKind,
    model: ModelKind,
    backend_url: Option<&str>,
    settings: Settings,
) -> Result<Pipeline> {
    let models = create_model(model, &settings)?;
    info!("🧠 Model initialized (using {})", models.embedder.name());
    if models.speech.is_none() {
        info!("🔇 Speech disabled; briefings produce a script only");
    }

    let cache = Arc::new(EmbeddingCache::open(settings.embedding_cache_path()).await);
    let embedder = Arc::new(CachedEmbedder::new(models.embedder.clone(), cache));

    let mut backend = BackendConfig::from_settings(storage, &settings);
    if let Some(url) = backend_url {
        backend.with_url(url);
    }
    let store = nc_storage::create_storage(storage, backend, embedder.clone()).await?;
    check_storage_with_retry(&store, storage, 3, Duration::from_secs(10)).await?;

    let feeds = FeedConfig::from_settings(&settings)?;
    let manager = IngestManager::new(
        Arc::new(HttpFeedSource::new()?),
        store.clone(),
        feeds,
        settings.seen_path(),
        IngestOptions::from(&settings),
    );
    let config = BriefingConfig::from(&settings);
    let briefer = Briefer::new(store, embedder, Some(models.writer), config);

    Ok(Pipeline {
        settings,
        manager: Arc::new(manager),
        briefer: Arc::new(briefer),
        speech: models.speech,
    })
}

fn print_report(report: &IngestReport) {
    for feed in &report.feeds {
        match &feed.failed {
            Some(e) => println!("❌ {} - {}", feed.url, e),
            None => println!(
                "📡 {} - {} fetched, 🆕 {} new, 📝 {} updated, ⏭️ {} unchanged, 🕰️ {} stale, \
                 🔁 {} repeated",
                feed.url,
                feed.fetched,
                feed.new,
                feed.updated,
                feed.unchanged,
                feed.stale,
                feed.duplicates
            ),
        }
    }
    let accepted = report.accepted();
    println!(
        "Stored {} articles ({} tracked links)",
        accepted.len(),
        report.seen_records
    );
    for article in accepted.iter().take(5) {
        println!("  - {} ({})", article.title, article.source);
    }
}

async fn write_briefing(output_dir: &Path, stamp: &str, briefing: &Briefing) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let json_path = output_dir.join(format!("briefing_{}.json", stamp));
    tokio::fs::write(&json_path, serde_json::to_vec_pretty(briefing)?).await?;

    let script_path = output_dir.join(format!("podcast_script_{}.txt", stamp));
    let script = briefing.script.as_deref().unwrap_or_default();
    tokio::fs::write(&script_path, script).await?;
    Ok(script_path)
}

/// Read the briefing's script aloud into `path`. Returns the path when audio
/// was written.
async fn speak_briefing(
    speech: Option<&dyn SpeechSynthesizer>,
    briefing: &Briefing,
    path: &Path,
) -> Result<Option<PathBuf>> {
    let (Some(speech), Some(script)) = (speech, briefing.script.as_deref()) else {
        return Ok(None);
    };
    if write_audio(speech, script, path).await? {
        Ok(Some(path.to_path_buf()))
    } else {
        Ok(None)
    }
}

async fn brief(
    pipeline: &Pipeline,
    mode: BriefingMode,
    minutes: u32,
    topic: Option<&str>,
) -> Result<()> {
    let briefing = pipeline.briefer.brief(mode, minutes, topic).await?;
    if briefing.stories.is_empty() {
        warn!("The store holds no articles to brief on");
    }
    let stamp = Utc::now().format("%Y-%m-%d").to_string();
    let settings = &pipeline.settings;
    let path = write_briefing(&settings.output_dir(), &stamp, &briefing).await?;
    println!(
        "🎙️ {} stories, script written to {}",
        briefing.stories.len(),
        path.display()
    );

    let audio_path = settings.audio_path(&stamp);
    if let Some(audio) = speak_briefing(pipeline.speech.as_deref(), &briefing, &audio_path).await? {
        println!("🔊 Podcast saved to {}", audio.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let logger = init_logging();
    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    if let Some(dir) = cli.data_dir {
        settings.set_data_dir(dir);
    }

    let command = match cli.command {
        Commands::Feeds(args) => return nc_feeds::handle_command(args, &settings).await,
        command => command,
    };

    let backend_url = cli.backend_url.as_deref();
    let pipeline = build_pipeline(cli.storage, cli.model, backend_url, settings).await?;

    match command {
        Commands::Ingest { user, interval } => {
            let user = user.as_deref();
            if let Some(interval) = interval {
                let logger = logger.with_prefix("[periodic]".to_string());
                logger.info(&format!(
                    "Running in periodic mode with {}s interval",
                    interval.0.as_secs()
                ));
                loop {
                    logger.info("Starting ingest cycle");
                    match pipeline.manager.ingest(user).await {
                        Ok(report) => print_report(&report),
                        Err(e) => error!("Error during ingest: {}", e),
                    }
                    logger.info(&format!("Waiting {}s before next ingest", interval.0.as_secs()));
                    tokio::time::sleep(interval.0).await;
                }
            } else {
                let report = pipeline.manager.ingest(user).await?;
                print_report(&report);
            }
        }
        Commands::Brief { minutes, topic, recap } => {
            let mode = if recap {
                BriefingMode::Recap
            } else {
                BriefingMode::Daily
            };
            brief(&pipeline, mode, minutes, topic.as_deref()).await?;
        }
        Commands::Run { user, minutes, topic } => {
            info!("🗞️ Daily briefing run started");
            let report = pipeline.manager.ingest(user.as_deref()).await?;
            print_report(&report);
            let mode = if report.has_new_content() {
                BriefingMode::Daily
            } else {
                info!("No new articles; recapping stored coverage");
                BriefingMode::Recap
            };
            brief(&pipeline, mode, minutes, topic.as_deref()).await?;
        }
        Commands::Serve { addr } => {
            let state = nc_web::AppState::new(pipeline.manager.clone(), pipeline.briefer.clone());
            nc_web::serve(addr, state).await?;
        }
        Commands::Feeds(_) => {}
    }

    Ok(())
}
