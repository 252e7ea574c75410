//! Core data structures shared across the crate.

pub mod message;
pub mod outcome;
pub mod part;
pub mod query;

pub use message::{I18nArgument, I18nMessage};
pub use outcome::FetchOutcome;
pub use part::ResultPart;
pub use query::{QueryIdentity, QueryKind};
