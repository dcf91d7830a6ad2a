use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::Path;

/// Characters and whole-line device names that are unsafe in a file name or an object key.
static UNSAFE_TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?im)[<>:"/\\|?*\x00-\x1f\x7f]|^(?:COM[0-9]|LPT[0-9]|CON|PRN|AUX|NUL)$"#)
        .expect("title pattern is valid")
});

/// Longest sanitized title in bytes. Leaves room for an extension under the
/// usual 255-byte file name limit.
pub const MAX_TITLE_BYTES: usize = 200;

/// Replace every unsafe character or reserved device name in a title with `-`,
/// then cut the result to at most [`MAX_TITLE_BYTES`] on a character boundary
pub fn sanitize_title(title: &str) -> String {
    let sanitized = UNSAFE_TITLE_PATTERN.replace_all(title, "-");

    if sanitized.is_empty() {
        return "untitled".to_string();
    }

    let mut end = sanitized.len().min(MAX_TITLE_BYTES);
    while !sanitized.is_char_boundary(end) {
        end -= 1;
    }
    sanitized[..end].to_string()
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp: &Path, encoder: &Path) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp, "--version").await {
        missing.push(format!("{} - required to resolve video links", yt_dlp.display()));
    }

    // ffmpeg prints its banner for -version, not --version
    if !check_command_available(encoder, "-version").await {
        missing.push(format!("{} - required to encode mp3 files", encoder.display()));
    }

    missing
}

/// Check if a command can be spawned and exits cleanly
async fn check_command_available(command: &Path, version_flag: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
