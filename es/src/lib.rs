//! EntityStore - Task/Project entities and the in-process entity store
//!
//! This crate owns the data model shared by the TaskPilot core and its
//! entity gateway implementations:
//!
//! - [`TaskSnapshot`] / [`ProjectSnapshot`] - read-time snapshots of the
//!   durable Task and Project records
//! - [`TaskDraft`] - a partial task record used when proposing new tasks,
//!   including the inherit-project sentinel ([`ProjectRef::Inherit`])
//! - [`TaskStore`] - a thread-safe in-memory store used by the direct
//!   (in-process) gateway path and by tests, seedable from a JSON file

mod project;
mod store;
mod task;

pub use project::{ProjectId, ProjectSnapshot, ProjectStatus};
pub use store::{SeedData, StoreError, TaskStore};
pub use task::{
    EnergyLevel, INHERIT_PROJECT_SENTINEL, Priority, ProjectRef, TaskDraft, TaskId, TaskSnapshot, TaskStatus,
    TaskUpdate,
};

/// Default time estimate for tasks created without one, in minutes
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 15;
