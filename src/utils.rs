// src/utils.rs

/// Format of the timestamp that prefixes every log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time, formatted the way log lines are stamped.
pub fn get_current_time() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Compact timestamp used in generated file names, e.g. `20261019_142501`.
pub fn file_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Last `n` lines of `text`, in their original order.
pub fn tail_lines(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}

/// First `n` lines of `text`.
pub fn head_lines(text: &str, n: usize) -> Vec<&str> {
    text.lines().take(n).collect()
}

/// Seconds of uptime as `3d 4h 12m`, `4h 12m` or `12m`.
pub fn format_uptime(uptime_secs: u64) -> String {
    let days = uptime_secs / 86400;
    let hours = (uptime_secs % 86400) / 3600;
    let minutes = (uptime_secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
