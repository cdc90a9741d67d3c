//! # Ledger-Core Test Suite
//!
//! Cross-crate tests that need more than one component at a time.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── fixtures.rs     # Clocks, actors, block and transaction builders
//! │   ├── scenarios.rs    # The five reference scenarios
//! │   ├── commit.rs       # Commit pipeline against the durable store
//! │   └── recovery.rs     # Crash and corruption recovery
//! └── benches/            # Criterion benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lc-tests
//! cargo test -p lc-tests integration::recovery::
//! cargo bench -p lc-tests
//! ```

pub mod integration;
