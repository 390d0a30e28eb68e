use crate::config::{KeywordMode, SyncConfig};
use crate::models::VideoRecord;

/// Inclusive duration bounds; either side may be absent.
pub fn duration_within(duration_secs: i64, min: Option<i64>, max: Option<i64>) -> bool {
    if min.is_some_and(|min| duration_secs < min) {
        return false;
    }
    if max.is_some_and(|max| duration_secs > max) {
        return false;
    }
    true
}

/// Case-insensitive keyword match against the title only.
/// An empty keyword list keeps everything regardless of mode.
pub fn title_matches(title: &str, keywords: &[String], mode: KeywordMode) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let title_lower = title.to_lowercase();
    let any_keyword = keywords
        .iter()
        .any(|keyword| title_lower.contains(&keyword.to_lowercase()));
    match mode {
        KeywordMode::Include => any_keyword,
        KeywordMode::Exclude => !any_keyword,
    }
}

/// Duration filter first, then keyword filter, over the collected list.
pub fn apply(records: Vec<VideoRecord>, config: &SyncConfig) -> Vec<VideoRecord> {
    records
        .into_iter()
        .filter(|record| {
            duration_within(record.duration_secs, config.min_duration, config.max_duration)
        })
        .filter(|record| title_matches(&record.title, &config.keywords, config.keyword_mode))
        .collect()
}
