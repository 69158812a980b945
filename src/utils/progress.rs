use std::time::Duration;
use crate::core::{ChunkProgress, CompletedUpload};

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// 按 1024 进位的字节数
pub fn human_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let exponent = ((63 - bytes.leading_zeros()) / 10).min(UNITS.len() as u32 - 1);
    let value = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    format!("{:.1} {}", value, UNITS[exponent as usize])
}

/// 耗时，一分钟以内保留一位小数
pub fn human_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    match (secs / 3600, secs % 3600 / 60, secs % 60) {
        (0, 0, _) => format!("{:.1}s", elapsed.as_secs_f64()),
        (0, minutes, seconds) => format!("{}m {:02}s", minutes, seconds),
        (hours, minutes, _) => format!("{}h {:02}m", hours, minutes),
    }
}

/// 单个分片往返后的进度行
pub fn progress_line(progress: &ChunkProgress) -> String {
    format!(
        "chunk {}/{} {:.1}% ({} / {})",
        progress.current_chunk,
        progress.total_chunks,
        progress.percentage,
        human_bytes(progress.bytes_sent),
        human_bytes(progress.total_bytes),
    )
}

/// 上传完成摘要
pub fn completion_summary(upload: &CompletedUpload, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        format!("{}/s", human_bytes((upload.size as f64 / secs) as u64))
    } else {
        "n/a".to_string()
    };

    format!(
        "{} uploaded to {} ({}, {}, {})",
        upload.filename,
        upload.url,
        human_bytes(upload.size),
        human_duration(elapsed),
        rate,
    )
}
