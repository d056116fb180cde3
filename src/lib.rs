//! Section-level synchronization of a source document and its translation.
//!
//! The pieces compose as: [`section::parse`] both source revisions,
//! [`diff::detect_changes`] between them, translate what changed, then
//! [`reconstruct::reconstruct`] the target document against its
//! [`heading_map::HeadingMap`]. [`pipeline`] wires that flow to the
//! translation and storage collaborators.

pub mod diff;
pub mod error;
pub mod front_matter;
pub mod heading_map;
pub mod ledger;
pub mod model;
pub mod pipeline;
pub mod reconstruct;
pub mod section;
pub mod translate;
pub mod util;

pub use diff::{ChangeKind, ChangeRecord, ChangeSummary, detect_changes};
pub use error::{FileError, MatchWarning, ParseWarning, TranslationError};
pub use heading_map::HeadingMap;
pub use reconstruct::{Reconstruction, reconstruct};
pub use section::{Document, Section, parse};
