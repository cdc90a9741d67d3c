//! Cross-crate integration tests.

#[cfg(test)]
mod fixtures;

pub mod commit;
pub mod recovery;
pub mod scenarios;
