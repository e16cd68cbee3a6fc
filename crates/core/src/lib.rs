//! Core types shared by the grid extensions.
//!
//! Plain data only: no IO, no host access, no timers.

pub mod bounds;
pub mod cells;
pub mod mutation;
pub mod selection;
pub mod snapshot;
pub mod template;

pub use bounds::{EdgeProbe, GridBounds, SheetRef};
pub use cells::{display_string, CellData, CellValueMap};
pub use mutation::{History, Mutation, MutationKind};
pub use selection::{CellRange, Selection};
pub use snapshot::{normalize_snapshot, SnapshotDefaults};
pub use template::{TemplateData, TemplateDraft};
