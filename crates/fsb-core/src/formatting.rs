//! Formatting utilities (Telegram HTML, sizes, durations, progress bars).

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Binary size with IEC units and one decimal: `1.5 MiB`, `532 Bytes`.
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    if size == 1 {
        return "1 Byte".to_string();
    }
    if size < 1024 {
        return format!("{size} Bytes");
    }

    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Compact size with two decimals, used on the web pages: `1.50 MB`.
pub fn get_readable_file_size(size: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if size == 0 {
        return "0B".to_string();
    }

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Short duration: `45s`, `3m 20s`, `2h 5m`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 3600 {
        return format!("{}m {}s", seconds / 60, seconds % 60);
    }
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

/// Uptime-style duration: `1d 2h 3m 4s`, zero units skipped (seconds always shown).
pub fn get_readable_time(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut out = String::new();
    if days != 0 {
        out.push_str(&format!("{days}d "));
    }
    if hours != 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes != 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{secs}s"));
    out
}

/// `[████░░░░░░] 40.0%`. A zero total renders as complete.
pub fn create_progress_bar(current: u64, total: u64, length: usize) -> String {
    let (current, total) = if total == 0 { (1, 1) } else { (current.min(total), total) };
    let filled = (length as u64 * current / total) as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(length - filled));
    let pct = current as f64 * 100.0 / total as f64;
    format!("[{bar}] {pct:.1}%")
}

/// Thousands separators: `1234567` → `1,234,567`.
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

/// Success percentage with one decimal; 0.0 when nothing was attempted.
pub fn success_rate(success: u64, total: u64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", success as f64 * 100.0 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn format_size_uses_binary_units() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(1), "1 Byte");
        assert_eq!(format_size(1023), "1023 Bytes");
        assert_eq!(format_size(1024), "1.0 KiB");
        assert_eq!(format_size(1536 * 1024), "1.5 MiB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.0 GiB");
    }

    #[test]
    fn readable_file_size() {
        assert_eq!(get_readable_file_size(0), "0B");
        assert_eq!(get_readable_file_size(512), "512.00 B");
        assert_eq!(get_readable_file_size(1024 * 1024 * 3 / 2), "1.50 MB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(5), "5s");
        assert_eq!(format_duration(200), "3m 20s");
        assert_eq!(format_duration(7500), "2h 5m");

        assert_eq!(get_readable_time(0), "0s");
        assert_eq!(get_readable_time(61), "1m 1s");
        assert_eq!(get_readable_time(86_400 + 7200 + 4), "1d 2h 4s");
    }

    #[test]
    fn progress_bar() {
        assert_eq!(create_progress_bar(0, 10, 10), "[░░░░░░░░░░] 0.0%");
        assert_eq!(create_progress_bar(4, 10, 10), "[████░░░░░░] 40.0%");
        assert_eq!(create_progress_bar(10, 10, 5), "[█████] 100.0%");
        assert_eq!(create_progress_bar(0, 0, 4), "[████] 100.0%");
    }

    #[test]
    fn counts_and_rates() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(-4200), "-4,200");

        assert_eq!(success_rate(0, 0), "0.0%");
        assert_eq!(success_rate(1, 3), "33.3%");
        assert_eq!(success_rate(5, 5), "100.0%");
    }
}
