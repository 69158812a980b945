use std::sync::Arc;
use async_trait::async_trait;
use bytes::Bytes;
use super::types::{ChunkProgress, ChunkRecord, UploadResponse};
use super::errors::Result;

/// 可按字节偏移切片的数据源
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// 文件名，用于推断文件类型
    fn name(&self) -> &str;

    /// 总字节数
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 从 `offset` 开始读取恰好 `len` 字节
    async fn read_range(&self, offset: u64, len: usize) -> Result<Bytes>;
}

/// 分片接收端
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    /// 提交单个分片并等待应答，非成功状态返回错误
    async fn send_chunk(&self, chunk: &ChunkRecord) -> Result<UploadResponse>;
}

#[async_trait]
impl<T: ChunkTransport + ?Sized> ChunkTransport for Arc<T> {
    async fn send_chunk(&self, chunk: &ChunkRecord) -> Result<UploadResponse> {
        (**self).send_chunk(chunk).await
    }
}

#[async_trait]
impl<S: ChunkSource + ?Sized> ChunkSource for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn len(&self) -> u64 {
        (**self).len()
    }

    async fn read_range(&self, offset: u64, len: usize) -> Result<Bytes> {
        (**self).read_range(offset, len).await
    }
}

/// 进度回调，每个分片往返结束后调用一次
pub type ProgressCallback = Arc<dyn Fn(ChunkProgress) + Send + Sync>;
