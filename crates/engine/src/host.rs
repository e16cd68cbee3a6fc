//! Capability interface to the host grid.
//!
//! Everything the extensions need from the spreadsheet host goes through
//! [`HostGridFacade`]. Reads return `None` when the host has nothing active;
//! callers treat that as a no-op, not an error.

use gridext_core::{CellData, GridBounds, History, Mutation, Selection, SheetRef};
use serde_json::Value;

use crate::events::{Subscription, Topic};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("no active sheet")]
    NoActiveSheet,
    #[error("unknown sheet '{0}'")]
    UnknownSheet(String),
    #[error("mutation {0} rejected: {1}")]
    Rejected(String, String),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub trait HostGridFacade {
    /// The sheet the user is looking at.
    fn active_sheet(&self) -> Option<SheetRef>;

    fn bounds(&self, sheet: &SheetRef) -> Option<GridBounds>;

    fn selection(&self, sheet: &SheetRef) -> Option<Selection>;

    fn cell(&self, sheet: &SheetRef, row: usize, col: usize) -> Option<CellData>;

    /// Run a mutation through the host bus.
    fn execute(&mut self, mutation: Mutation, history: History) -> Result<(), HostError>;

    fn subscribe(&mut self, topic: Topic) -> Subscription;

    /// Snapshot of the active document.
    fn export_snapshot(&self) -> Option<Value>;

    /// Dispose the active document and load `snapshot` in its place.
    fn replace_document(&mut self, snapshot: Value) -> Result<(), HostError>;
}

/// Source of scroll events that may mount after the extensions start.
pub trait ViewportProvider {
    /// `None` while the viewport is not mounted yet.
    fn attach(&mut self) -> Option<Subscription>;
}
