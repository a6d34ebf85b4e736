pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::FlakyRepository;
#[allow(unused_imports)]
pub use setup::{result, seeded_player, submission, TestSetup, TestSetupBuilder};
