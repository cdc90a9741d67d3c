//! # Ports Layer
//!
//! - `backend` - storage backend contract shared by every adapter

pub mod backend;
