mod errors;
mod session;
mod traits;
mod types;

pub use errors::{Result, UploadError};
pub use session::{UploadSession, total_chunks};
pub use traits::{ChunkSource, ChunkTransport, ProgressCallback};
pub use types::{
    ChunkAck,
    ChunkInfo,
    ChunkProgress,
    ChunkRecord,
    ChunkedConfig,
    CompletedUpload,
    DEFAULT_CHUNK_SIZE,
    UploadEvent,
    UploadId,
    UploadResponse,
};
