pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod sheets;
pub mod sources;
pub mod utils;

pub use config::{AppConfig, KeywordMode, SyncConfig};
pub use error::SyncError;
pub use services::cache::ResponseCache;
pub use services::sync::{BatchReport, ChannelOutcome, OptimizationReport, SyncOrchestrator};
pub use sheets::google::GoogleSheetsStore;
pub use sheets::Destination;
pub use sources::youtube::YouTubeDataApi;
