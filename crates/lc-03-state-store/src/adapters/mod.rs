//! # Adapters
//!
//! - `checksum` - SHA-256 content checksums
//! - `lock` - `fs2` directory lock
//! - `time` - wall clock
//! - `fs` - atomic file replacement helpers

pub mod checksum;
pub mod fs;
pub mod lock;
pub mod time;
