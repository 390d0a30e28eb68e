use chrono::{DateTime, Utc};

/// Parse an ISO8601 duration string (PT1H2M3S) to total seconds.
/// Returns `None` for anything that is not a PT-format duration.
pub fn parse_iso8601_duration(duration_str: &str) -> Option<i64> {
    if !duration_str.starts_with("PT") {
        return None;
    }

    let duration_part = &duration_str[2..];
    let mut total_seconds = 0.0;
    let mut current_number = String::new();

    for ch in duration_part.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            current_number.push(ch);
        } else {
            let num = current_number.parse::<f64>().ok()?;
            match ch {
                'H' => total_seconds += num * 3600.0,
                'M' => total_seconds += num * 60.0,
                'S' => total_seconds += num,
                _ => return None,
            }
            current_number.clear();
        }
    }

    // Trailing digits without a unit letter mean a malformed string.
    if !current_number.is_empty() {
        return None;
    }

    Some(total_seconds as i64)
}

/// Render a duration in seconds as `H:MM:SS`, or `M:SS` under an hour.
pub fn format_duration(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Parse an RFC3339 date string (YouTube's publishedAt format).
pub fn parse_rfc3339(date_str: &str) -> Option<DateTime<Utc>> {
    if date_str.is_empty() {
        return None;
    }
    date_str.parse::<DateTime<Utc>>().ok()
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Pull the 11-character video id out of a YouTube watch URL.
/// Used to rebuild dedup state from the URL column of existing sheet rows.
pub fn extract_video_id(url: &str) -> Option<String> {
    use url::Url;

    let parsed_url = Url::parse(url).ok()?;
    let host = parsed_url.host_str()?;

    match host {
        "www.youtube.com" | "youtube.com" | "m.youtube.com" => {
            // Standard YouTube URLs: https://www.youtube.com/watch?v=VIDEO_ID
            if parsed_url.path() == "/watch" {
                parsed_url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.to_string())
            } else {
                None
            }
        }
        "youtu.be" => {
            // Short YouTube URLs: https://youtu.be/VIDEO_ID
            parsed_url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(|id| id.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration("PT15S"), Some(15));
        assert_eq!(parse_iso8601_duration("PT3M"), Some(180));
        assert_eq!(parse_iso8601_duration("PT2H"), Some(7200));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_iso8601_duration(""), None);
        assert_eq!(parse_iso8601_duration("1H2M"), None);
        assert_eq!(parse_iso8601_duration("PT1X"), None);
        assert_eq!(parse_iso8601_duration("PT90"), None);
    }

    #[test]
    fn formats_durations_for_display() {
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(61), "1:01");
        assert_eq!(format_duration(3723), "1:02:03");
        assert_eq!(format_duration(36000), "10:00:00");
    }

    #[test]
    fn extracts_video_id_from_watch_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?v=abc123DEF45&t=17s"),
            Some("abc123DEF45".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn ignores_non_video_urls() {
        assert_eq!(extract_video_id("URL"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=zzz"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/playlist?list=PL1"), None);
    }

    #[test]
    fn parses_published_dates() {
        let dt = parse_rfc3339("2024-03-01T12:30:00Z").expect("valid date");
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-03-01");
        assert_eq!(parse_rfc3339("yesterday"), None);
        assert_eq!(parse_rfc3339(""), None);
    }
}
