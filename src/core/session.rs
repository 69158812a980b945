use chrono::{DateTime, Utc};
use crate::utils::filetype::infer_filetype;
use super::errors::{Result, UploadError};
use super::types::{ChunkInfo, UploadId};

/// 单个文件的上传会话，只在上传循环期间存在
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: UploadId,
    pub filename: String,
    pub filetype: String,
    pub file_size: u64,
    pub chunk_size: usize,
    pub total_chunks: usize,
    pub created_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(filename: &str, file_size: u64, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(UploadError::InvalidChunkSize(chunk_size));
        }

        Ok(Self {
            id: UploadId::new(),
            filename: filename.to_string(),
            filetype: infer_filetype(filename),
            file_size,
            chunk_size,
            total_chunks: total_chunks(file_size, chunk_size),
            created_at: Utc::now(),
        })
    }

    /// 计算分片信息
    pub fn chunks(&self) -> impl Iterator<Item = ChunkInfo> + '_ {
        let chunk_size = self.chunk_size as u64;

        (0..self.total_chunks).map(move |index| {
            let offset = index as u64 * chunk_size;
            let size = std::cmp::min(chunk_size, self.file_size - offset) as usize;
            ChunkInfo { index, offset, size }
        })
    }

    /// 第 `ordinal` 个分片确认后的百分比
    pub fn percentage(&self, ordinal: usize) -> f64 {
        if self.total_chunks == 0 {
            return 100.0;
        }
        ordinal as f64 * 100.0 / self.total_chunks as f64
    }
}

/// `ceil(file_size / chunk_size)`
pub fn total_chunks(file_size: u64, chunk_size: usize) -> usize {
    file_size.div_ceil(chunk_size as u64) as usize
}
