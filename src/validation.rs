//! Model-definition errors.
//!
//! Structural problems detected while a project is being defined:
//! duplicate ids, dangling references, out-of-range numbers. Each add
//! operation on [`Project`](crate::project::Project) rejects bad input
//! immediately with one of these.
//!
//! Infeasibility is deliberately not represented here: a model that is
//! well-formed but admits no schedule is a solver outcome, not an error.

use thiserror::Error;

/// An error in the definition of a scheduling model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A task with this id already exists.
    #[error("duplicate task '{0}'")]
    DuplicateTask(String),

    /// A resource with this id already exists.
    #[error("duplicate resource '{0}'")]
    DuplicateResource(String),

    /// A referenced task id was never defined.
    #[error("undefined task '{0}'")]
    UndefinedTask(String),

    /// A referenced resource id was never defined.
    #[error("undefined resource '{0}'")]
    UndefinedResource(String),

    /// Task durations must be at least 1.
    #[error("task '{0}' has non-positive duration {1}")]
    InvalidDuration(String, i64),

    /// Resource capacities must be non-negative.
    #[error("resource '{0}' has negative capacity")]
    NegativeCapacity(String),

    /// A task cannot depend on itself.
    #[error("dependency between the same task '{0}'")]
    SelfDependency(String),

    /// At most one dependency may link a pair of tasks, in either order.
    #[error("dependency already defined between '{0}' and '{1}'")]
    DuplicateDependency(String, String),

    /// An allocation level cannot be negative.
    #[error("resource '{1}' has negative allocation for task '{0}'")]
    NegativeAllocation(String, String),

    /// An allocation level cannot exceed the resource capacity.
    #[error("resource '{1}' allocation for task '{0}' exceeds resource capacity")]
    AllocationOverCapacity(String, String),

    /// At most one allocation may link a task to a resource.
    #[error("duplicated allocation of resource '{1}' to task '{0}'")]
    DuplicateAllocation(String, String),
}
