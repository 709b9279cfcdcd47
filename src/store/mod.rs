//! # Store Module
//!
//! This module owns the candidate declarations that searches run against.
//!
//! ## Key Components
//!
//! - [`types`] - The `Candidate` record (name plus optional metadata)
//! - [`name_store`] - Immutable, ordered candidate set
//! - [`source`] - File, HTTP and in-memory candidate sources and payload formats
//! - [`loader`] - Single-flight memoized store construction
//! - [`error`] - Store error types

pub mod error;
pub mod loader;
pub mod name_store;
pub mod source;
pub mod types;

pub use error::StoreError;
pub use loader::StoreLoader;
pub use name_store::NameStore;
pub use source::{CandidateSource, FileSource, HttpSource, MemorySource, SourceFormat};
pub use types::Candidate;
