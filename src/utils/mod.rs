pub mod filetype;
pub mod progress;

pub use filetype::{infer_filetype, FALLBACK_FILETYPE};
pub use progress::{completion_summary, human_bytes, human_duration, progress_line};
