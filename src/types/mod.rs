//! Core domain types for the cherry-pick bot.

pub mod ids;

pub use ids::{PrNumber, RepoId};
