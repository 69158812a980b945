pub mod chunked;
pub mod events;

pub use chunked::{ChunkedUploader, upload_file};
pub use events::EventStream;
