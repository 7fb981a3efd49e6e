use std::cmp::Ordering;

/// Stop words dropped by [`extract_keywords`] (Korean and English).
const STOP_WORDS: &[&str] = &[
    "그리고", "하지만", "그래서", "그런데", "그러나",
    "또한", "그냥", "정말", "진짜", "너무",
    "and", "but", "the", "for", "are", "with", "this", "that", "from", "they", "have", "been",
    "will", "what", "when", "where", "how", "why", "can", "could", "would", "should", "may",
    "might", "must", "shall", "need", "want", "like", "know", "think",
];

/// Parse an ISO8601 duration string (P1DT2H3M4S) to total seconds.
///
/// Fractional seconds are truncated. Anything malformed, including the
/// calendar designators `Y` and the date-part `M` which have no fixed length,
/// yields 0.
pub fn parse_iso8601_duration_to_seconds(duration_str: &str) -> u64 {
    let Some(rest) = duration_str.trim().strip_prefix('P') else {
        return 0;
    };

    let mut total_seconds = 0.0;
    let mut current_number = String::new();
    let mut in_time_part = false;

    for ch in rest.chars() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            current_number.push(if ch == ',' { '.' } else { ch });
            continue;
        }

        if ch == 'T' {
            if in_time_part || !current_number.is_empty() {
                return 0;
            }
            in_time_part = true;
            continue;
        }

        let Ok(num) = current_number.parse::<f64>() else {
            return 0;
        };
        current_number.clear();

        let factor = match (in_time_part, ch) {
            (false, 'W') => 7.0 * 86_400.0,
            (false, 'D') => 86_400.0,
            (true, 'H') => 3_600.0,
            (true, 'M') => 60.0,
            (true, 'S') => 1.0,
            _ => return 0,
        };
        total_seconds += num * factor;
    }

    // Dangling digits without a designator
    if !current_number.is_empty() {
        return 0;
    }

    total_seconds as u64
}

/// Format seconds as `45s`, `1m 5s` or `1h 2m 3s`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3_600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!(
            "{}h {}m {}s",
            seconds / 3_600,
            (seconds % 3_600) / 60,
            seconds % 60
        )
    }
}

/// Render seconds the way the Data API does (`PT1H2M3S`, `P1DT3S`, `PT0S`).
pub fn to_iso8601_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    let mut out = String::from("P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours == 0 && minutes == 0 && secs == 0 {
        if days == 0 {
            out.push_str("T0S");
        }
        return out;
    }
    out.push('T');
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if secs > 0 {
        out.push_str(&format!("{secs}S"));
    }
    out
}

/// Lowercase, strip punctuation, split and drop short tokens and stop words.
pub fn extract_keywords(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .filter(|word| !STOP_WORDS.contains(word))
        .map(String::from)
        .collect()
}

// Formats each x1000 step
pub fn format_number(number: i64) -> String {
    let num_str = number.unsigned_abs().to_string();
    let mut result = String::new();
    let len = num_str.len();

    if number < 0 {
        result.push('-');
    }
    for (i, c) in num_str.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

pub fn format_float_number(number: f64) -> String {
    format_number(number.round() as i64)
}

/// Descending comparison for floats, NaN treated as equal.
pub fn compare_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Linearly interpolated quantile, `q` in `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Most frequent value; ties go to the smallest value.
pub fn mode<T: Ord + Clone>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts = std::collections::BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0usize) += 1;
    }
    let best = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, count)| *count == best)
        .map(|(value, _)| value)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_durations() {
        assert_eq!(parse_iso8601_duration_to_seconds("PT1M5S"), 65);
        assert_eq!(parse_iso8601_duration_to_seconds("PT1H2M3S"), 3_723);
        assert_eq!(parse_iso8601_duration_to_seconds("PT45S"), 45);
        assert_eq!(parse_iso8601_duration_to_seconds("PT2H"), 7_200);
        assert_eq!(parse_iso8601_duration_to_seconds("P1DT1S"), 86_401);
        assert_eq!(parse_iso8601_duration_to_seconds("P0D"), 0);
        assert_eq!(parse_iso8601_duration_to_seconds("PT1.9S"), 1);
    }

    #[test]
    fn malformed_durations_are_zero() {
        for input in ["", "1M5S", "PT", "PTXS", "PT5", "P1Y", "P1M", "PT1H2X", "PTT1S", "garbage"] {
            assert_eq!(parse_iso8601_duration_to_seconds(input), 0, "{input}");
        }
    }

    #[test]
    fn iso_representation_round_trips() {
        for seconds in [0, 1, 59, 60, 65, 3_599, 3_600, 3_723, 86_399, 86_400, 90_061, 1_000_000] {
            let iso = to_iso8601_duration(seconds);
            assert_eq!(parse_iso8601_duration_to_seconds(&iso), seconds, "{iso}");
        }
    }

    #[test]
    fn formats_by_magnitude() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(65), "1m 5s");
        assert_eq!(format_duration(3_600), "1h 0m 0s");
        assert_eq!(format_duration(3_723), "1h 2m 3s");
    }

    #[test]
    fn keywords_drop_short_tokens_and_stop_words() {
        let words = extract_keywords("The BEST cat video, with 10 cats! #shorts");
        assert_eq!(words, vec!["best", "cat", "video", "cats", "shorts"]);
    }

    #[test]
    fn keywords_keep_hangul() {
        let words = extract_keywords("그리고 오늘의 브이로그!! 정말 재밌는 하루");
        assert_eq!(words, vec!["오늘의", "브이로그", "재밌는"]);
    }

    #[test]
    fn keywords_of_empty_text() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("?! ...").is_empty());
    }

    #[test]
    fn number_grouping() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_number(-1_234), "-1,234");
        assert_eq!(format_float_number(1_499.6), "1,500");
    }

    #[test]
    fn descriptive_statistics() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.75), 4.0);
        assert_eq!(quantile(&[10.0, 20.0, 30.0, 40.0], 0.75), 32.5);
        assert_eq!(mode(vec![3, 1, 3, 1, 2]), Some(1));
        assert_eq!(mode(Vec::<i32>::new()), None);
    }
}
