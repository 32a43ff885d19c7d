//! Typed work-item records and the structured query expression used by
//! intent services against the tracker capability.

mod filter;
mod items;

pub use filter::WorkItemFilter;
pub use items::{ProjectRef, WorkItemKind, WorkItemRecord, WorkItemState};
