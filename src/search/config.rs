//! # Search Configuration Module
//!
//! Provides configuration constants for matching, ranking and full-text indexing.

/// Weight applied to skipped characters when a plain character is matched
pub const SKIP_WEIGHT: f64 = 1.0;

/// Weight applied to skipped characters absorbed by a separator
pub const SEPARATOR_WEIGHT: f64 = 0.125;

/// Fixed penalty when a match only succeeds after case folding
pub const CASE_MISMATCH_PENALTY: f64 = 0.5;

/// Characters delimiting namespace segments in declaration names
pub const SEPARATORS: [char; 2] = ['.', '_'];

/// Number of results returned when the caller does not ask for a count
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Maximum allowed query length in characters
pub const MAX_QUERY_LENGTH: usize = 1000;

/// Buffer size for the full-text index writer (50MB)
pub const INDEX_WRITER_BUFFER_SIZE: usize = 50_000_000;

/// Full-text field boosts
pub const MODULE_BOOST: f32 = 1.0;
pub const DESCRIPTION_BOOST: f32 = 2.0;
pub const NAME_BOOST: f32 = 3.0;

/// Named sessions kept by the tool layer before idle ones are evicted
pub const MAX_SESSIONS: usize = 256;
