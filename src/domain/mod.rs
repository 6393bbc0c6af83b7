//! Domain models for the acquisition and synchronization engine

pub mod artifact;
pub mod author;
pub mod record;
pub mod validation;

pub use artifact::{Artifact, AttemptOutcome, FetchAttempt, Resolution};
pub use author::Author;
pub use record::PaperRecord;
pub use validation::{classify, FieldIssue, ValidationVerdict};
