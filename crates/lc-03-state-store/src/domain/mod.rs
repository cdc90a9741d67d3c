pub mod envelope;
pub mod errors;
