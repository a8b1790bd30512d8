//! Emoji sequence recognition backed by the Unicode emoji test list.
//!
//! The catalogue is fetched from unicode.org, parsed into a group → subgroup
//! → emoji tree, and cached locally in a compact binary format so later runs
//! work offline. [`EmojiService`] ties the pieces together and answers
//! lookups.

pub mod cache;
pub mod codec;
pub mod error;
pub mod model;
pub mod parser;
pub mod service;
pub mod settings;
pub mod transport;

pub use cache::{CacheEntry, CacheKind, CacheLocations};
pub use error::EmojiError;
pub use model::{Catalogue, EmojiInfo, Group, Qualifier, Subgroup};
pub use parser::{ParseReport, parse, parse_with_report};
pub use service::{EmojiService, InitOutcome};
pub use settings::Settings;
pub use transport::{HttpTransport, Transport, TransportResponse};
