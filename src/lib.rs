pub mod core;
pub mod config;
pub mod source;
pub mod transport;
pub mod uploaders;
pub mod utils;

// 重新导出核心类型
pub use crate::core::{
    ChunkAck,
    ChunkProgress,
    ChunkRecord,
    ChunkSource,
    ChunkTransport,
    ChunkedConfig,
    CompletedUpload,
    ProgressCallback,
    UploadError,
    UploadEvent,
    UploadId,
    UploadResponse,
    UploadSession,
    Result,
};

pub use config::Config;
pub use source::{FileSource, MemorySource};
pub use transport::HttpTransport;
pub use uploaders::{ChunkedUploader, EventStream, upload_file};
