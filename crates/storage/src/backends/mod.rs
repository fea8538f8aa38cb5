//! Storage backend implementations.

mod filesystem;
mod memory;
mod s3;

pub use filesystem::FilesystemBackend;
pub use memory::MemoryBackend;
pub use s3::S3Backend;
