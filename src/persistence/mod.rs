//! Persistence + seed collaborators: plain-text encode/decode of the
//! vocabulary, association map, and observation log, plus `PATH`-scan vocabulary
//! seeding.

pub mod seed;
pub mod store;

pub use seed::{seed, SeedReport};
pub use store::{load, save, LoadReport};
