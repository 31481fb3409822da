//! Bulk operations over selections of course modules
//!
//! [`BulkExecutor`] applies one verb to a selection from a single course.
//! The selection is first put in course display order
//! ([`resolve_order`]), policies are consulted once per batch through the
//! [`HookRegistry`](crate::hooks::HookRegistry), sections are created on
//! demand by [`SectionCapacity`], and per-module results are collected in
//! a [`BatchOutcome`].

pub mod capacity;
pub mod core;
mod delete;
mod description;
mod duplicate;
pub mod error;
pub mod executor;
mod indent;
mod moveto;
mod notify;
pub mod order;
mod transfer;
mod visibility;


pub use capacity::SectionCapacity;
pub use self::core::{BatchOutcome, BulkSettings, BulkVerb};
pub use error::{BulkError, BulkResult};
pub use executor::{BulkExecutor, Services, TaskReport, batch_scope};
pub use order::{Placement, Snapshot, resolve_order};
pub use transfer::TargetSection;
