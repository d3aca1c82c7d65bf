//! Reversible PII redaction.
//!
//! Outbound text is scanned with an ordered catalog of pattern categories and
//! every match is replaced by a freshly generated mock value of the same shape.
//! The [`RedactionSession`] remembers each `mock -> original` pair so that text
//! coming back from the model can be [refilled](RedactionSession::refill).
//!
//! A session belongs to exactly one request. Create it, pass it by reference to
//! both `redact` and `refill`, and drop it when the request ends.
//!
//! ```
//! use rig_guard_redact::RedactionSession;
//!
//! let mut session = RedactionSession::new();
//! let masked = session.redact("Mail brandon@happydata.org or call 315-444-3211.").unwrap();
//! assert!(!masked.contains("brandon@happydata.org"));
//! assert!(!masked.contains("315-444-3211"));
//! assert_eq!(session.count(), 2);
//!
//! let restored = session.refill(&masked);
//! assert_eq!(restored, "Mail brandon@happydata.org or call 315-444-3211.");
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod generators;
pub mod session;

pub use catalog::{Generator, PiiCatalog, PiiCategory, PiiRule};
pub use config::RedactionConfig;
pub use error::RedactError;
pub use session::{Redaction, RedactionSession};
