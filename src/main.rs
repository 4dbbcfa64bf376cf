use clap::Parser;
use listentube::{Config, Error, Result, TaskManager, run_with_shutdown};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "listentube=info,tower_http=info";

/// Turn media URLs into downloadable audio files over HTTP
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(long, short, env = "LISTENTUBE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:9000
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Directory holding per-task work directories
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Path to the yt-dlp binary
    #[arg(long = "yt-dlp")]
    yt_dlp: Option<PathBuf>,

    /// Directory with the browser frontend
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "listentube=trace" (takes precedence over RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(dir) = &self.work_dir {
            config.tasks.work_dir = dir.clone();
        }
        if let Some(path) = &self.yt_dlp {
            config.extractor.ytdlp_path = Some(path.clone());
        }
        if let Some(dir) = &self.static_dir {
            config.server.static_dir = Some(dir.clone());
        }
    }
}

fn init_tracing(log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| Error::Config {
            message: format!("invalid log filter '{level}': {e}"),
            key: None,
        })?,
        None => match std::env::var("RUST_LOG") {
            Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
            _ => EnvFilter::new(DEFAULT_LOG_FILTER),
        },
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!(path = ?path, "loading config file");
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    args.apply(&mut config);

    let manager = TaskManager::new(config).await?;
    let janitor = manager.start_janitor();
    let server = manager.spawn_api_server();

    let signal_manager = manager.clone();
    tokio::spawn(async move { run_with_shutdown(&signal_manager).await });

    let result = server.await;

    // The server may also stop on its own, e.g. when binding fails
    manager.shutdown();
    let _ = janitor.await;

    match result {
        Ok(outcome) => outcome,
        Err(e) => Err(Error::ApiServerError(format!("server task failed: {e}"))),
    }
}
