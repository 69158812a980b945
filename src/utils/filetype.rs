use std::path::Path;

/// 无扩展名时使用的文件类型
pub const FALLBACK_FILETYPE: &str = "unknown";

/// 文件扩展名即文件类型，保持原样
pub fn infer_filetype(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(FALLBACK_FILETYPE)
        .to_string()
}
