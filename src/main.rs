use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use yt_sheet_sync::{
    config, AppConfig, Destination, GoogleSheetsStore, KeywordMode, ResponseCache, SyncConfig,
    SyncOrchestrator, YouTubeDataApi,
};

#[derive(Parser, Debug)]
#[command(
    name = "yt-sheet-sync",
    about = "Sync YouTube channel videos into a Google Sheets tab"
)]
struct Args {
    /// Channel ids to sync (UC...)
    #[arg(required = true)]
    channels: Vec<String>,

    /// Target spreadsheet id
    #[arg(short, long)]
    spreadsheet: String,

    /// Target tab name
    #[arg(short, long, default_value = "Videos")]
    tab: String,

    /// Max videos to collect per channel
    #[arg(long, default_value_t = config::DEFAULT_MAX_VIDEOS)]
    max: usize,

    /// Keep only videos at least this long, in seconds
    #[arg(long)]
    min_duration: Option<i64>,

    /// Keep only videos at most this long, in seconds
    #[arg(long)]
    max_duration: Option<i64>,

    /// Comma-separated title keywords
    #[arg(long, value_delimiter = ',')]
    keywords: Vec<String>,

    #[arg(long, value_enum, default_value = "include")]
    keyword_mode: KeywordMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_environment();
    config::init_logger();

    let args = Args::parse();
    let app_config = AppConfig::from_env()?;

    let sync_config = SyncConfig {
        min_duration: args.min_duration,
        max_duration: args.max_duration,
        keywords: args.keywords,
        keyword_mode: args.keyword_mode,
        max_videos: args.max,
    };
    sync_config.validate()?;

    let cache = Arc::new(ResponseCache::new());
    let source = Arc::new(YouTubeDataApi::new(
        app_config.youtube_api_key.clone(),
        cache.clone(),
    ));
    let store = Arc::new(GoogleSheetsStore::new(
        app_config.sheets_access_token.clone(),
    ));
    let orchestrator =
        SyncOrchestrator::new(source, store, cache, app_config.daily_quota_limit);

    let destination = Destination::new(&args.spreadsheet, &args.tab);
    let report = orchestrator
        .sync_many(&args.channels, &destination, &sync_config)
        .await;

    println!("Sync finished in {:.1}s", report.elapsed_secs);
    for (channel, ok) in &report.results {
        println!("  {channel}: {}", if *ok { "ok" } else { "FAILED" });
    }
    println!(
        "{} videos written, {} quota units used",
        report.videos_written, report.quota_used
    );

    let optimization = orchestrator.optimization_report();
    println!(
        "Quota: {}/{} units ({:.1}%)",
        optimization.quota.used, optimization.quota.limit, optimization.quota.usage_percent
    );
    println!(
        "Cache: {} hits / {} requests ({:.1}% hit rate)",
        optimization.cache.hits,
        optimization.cache.total_requests,
        optimization.cache.hit_rate
    );
    println!(
        "Dedup: {} known videos, {} duplicate fetches prevented",
        optimization.dedup.total_seen, optimization.dedup.duplicates_prevented
    );

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
