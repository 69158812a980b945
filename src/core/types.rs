use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// 默认分片大小 5MB
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// 上传会话唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct UploadId(pub Uuid);

impl UploadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 分片上传配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkedConfig {
    pub chunk_size: usize,
}

impl Default for ChunkedConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// 分片信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    pub index: usize,
    pub offset: u64,
    pub size: usize,
}

impl ChunkInfo {
    /// 从 1 开始的分片序号
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }

    /// 字节范围的结束位置（不含）
    pub fn end(&self) -> u64 {
        self.offset + self.size as u64
    }
}

/// 提交给接收端的分片请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub id: UploadId,
    pub chunk_index: usize,
    pub current_chunk: usize,
    pub total_chunks: usize,
    pub filetype: String,
    /// base64 编码后的分片数据
    pub data: String,
}

/// 接收端确认收到分片，但尚未完成
///
/// 只有 `complete` 决定流程，确认字段缺失时取 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkAck {
    #[serde(default)]
    pub received: usize,
    #[serde(default)]
    pub total: usize,
}

/// 所有分片到齐后接收端返回的最终对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedUpload {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub filetype: String,
    pub url: String,
}

/// 接收端对单个分片的应答，按 `complete` 区分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResponse {
    Pending(ChunkAck),
    Complete(CompletedUpload),
}

impl UploadResponse {
    pub fn is_complete(&self) -> bool {
        matches!(self, UploadResponse::Complete(_))
    }
}

impl<'de> Deserialize<'de> for UploadResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            complete: bool,
            #[serde(flatten)]
            body: serde_json::Map<String, serde_json::Value>,
        }

        let envelope = Envelope::deserialize(deserializer)?;
        let body = serde_json::Value::Object(envelope.body);
        if envelope.complete {
            serde_json::from_value(body)
                .map(UploadResponse::Complete)
                .map_err(<D::Error as serde::de::Error>::custom)
        } else {
            serde_json::from_value(body)
                .map(UploadResponse::Pending)
                .map_err(<D::Error as serde::de::Error>::custom)
        }
    }
}

/// 单个分片往返结束后的进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkProgress {
    /// 完成百分比
    pub percentage: f64,
    pub current_chunk: usize,
    pub total_chunks: usize,
    /// 已发送字节数
    pub bytes_sent: u64,
    /// 总字节数
    pub total_bytes: u64,
}

/// 上传事件
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// 会话已创建
    Started {
        upload_id: UploadId,
        filename: String,
        total_bytes: u64,
        total_chunks: usize,
        started_at: DateTime<Utc>,
    },
    /// 接收端确认了一个分片
    ChunkAccepted {
        upload_id: UploadId,
        chunk_index: usize,
        ack: ChunkAck,
    },
    /// 进度更新
    Progress {
        upload_id: UploadId,
        progress: ChunkProgress,
    },
    /// 接收端报告完成
    Completed {
        upload_id: UploadId,
        upload: CompletedUpload,
    },
    /// 上传失败
    Failed {
        upload_id: UploadId,
        error: String,
    },
    /// 所有分片已发送
    Finished {
        upload_id: UploadId,
        completed: bool,
    },
}

impl UploadEvent {
    pub fn upload_id(&self) -> UploadId {
        match self {
            UploadEvent::Started { upload_id, .. }
            | UploadEvent::ChunkAccepted { upload_id, .. }
            | UploadEvent::Progress { upload_id, .. }
            | UploadEvent::Completed { upload_id, .. }
            | UploadEvent::Failed { upload_id, .. }
            | UploadEvent::Finished { upload_id, .. } => *upload_id,
        }
    }
}

// 静态断言确保类型是 Send的
const _: () = {
    fn assert_send<T: Send>() {}
    fn assert_types() {
        assert_send::<UploadEvent>();
        assert_send::<ChunkRecord>();
        assert_send::<UploadResponse>();
    }
};
