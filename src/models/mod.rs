//! Scheduling domain models.
//!
//! Core data types for representing resource-constrained project
//! scheduling problems and their solutions.
//!
//! | Type | Role |
//! |------|------|
//! | [`Task`] | unit of work with duration, dependencies, allocations |
//! | [`Resource`] | renewable capacity consumed by running tasks |
//! | [`DependencyKind`] | SS / SF / FS / FF precedence relations |
//! | [`TaskSchedule`] | solution: start times plus makespan |
//! | [`Violation`] | consistency-check finding |

mod dependency;
mod resource;
mod schedule;
mod task;

pub use dependency::{DependencyKind, ParseDependencyKindError};
pub use resource::Resource;
pub use schedule::{TaskSchedule, Violation, ViolationKind};
pub use task::{Task, TaskWindow};
