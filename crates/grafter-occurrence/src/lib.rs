//! Grafeas occurrence records for in-toto link metadata.
//!
//! `grafter-occurrence` models the Grafeas "occurrence" record with an
//! in-toto payload and provides the bidirectional translator between link
//! metadata and occurrences. The translation is a pure, stateless mapping:
//! converting a link to an occurrence and back is loss-free for every field
//! the link schema defines, modulo one documented cast — the integer
//! `return-value` byproduct travels as a string inside the occurrence's
//! string-only `custom_values`.

pub mod error;
pub mod occurrence;
pub mod translate;

pub use error::TranslateError;
pub use occurrence::Occurrence;
pub use translate::{from_link, to_link};
