mod files;
pub use files::{FileId, JackFiles, LineError, LineOffsets};
