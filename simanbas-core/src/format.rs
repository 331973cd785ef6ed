use chrono::{DateTime, Local, Utc};

/// Cuts `text` to `max_len` characters and appends `...` when it was longer.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_owned();
    }
    let cut: String = text.chars().take(max_len).collect();
    format!("{cut}...")
}

/// `8 June 2025, 07:47` in local time.
pub fn format_datetime(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%-d %B %Y, %H:%M").to_string()
}

pub fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".into(), |v| format!("{v:.3}"))
}
