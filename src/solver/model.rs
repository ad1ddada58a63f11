//! Solver input model.
//!
//! A [`ConstraintModel`] is the frozen description of one scheduling
//! instance: task definitions with their critical-path windows, resource
//! capacities, dependency triples, allocation triples, and the minimum
//! makespan lower bound. It is a plain container with no validation;
//! [`Project`](crate::project::Project) performs integrity checks while
//! building, and callers driving the solver directly must hand it a
//! coherent model (every referenced id defined).

use serde::{Deserialize, Serialize};

use crate::models::DependencyKind;

/// A task definition as the solver consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task identifier.
    pub id: String,
    /// Processing duration in time steps.
    pub duration: i64,
    /// Earliest start per critical-path analysis.
    pub earliest_start: i64,
    /// Latest start per critical-path analysis.
    pub latest_start: i64,
}

/// A resource definition as the solver consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Resource identifier.
    pub id: String,
    /// Units available at every time step.
    pub capacity: i64,
}

/// A dependency between two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDefinition {
    /// The constraining task.
    pub first: String,
    /// The constrained task.
    pub second: String,
    /// Relation kind.
    pub kind: DependencyKind,
}

/// An allocation of a resource level to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDefinition {
    /// Consuming task.
    pub task: String,
    /// Consumed resource.
    pub resource: String,
    /// Units consumed during the whole task duration.
    pub level: i64,
}

/// The immutable input handed to the solver.
///
/// Definition order is preserved and determines the solver's internal
/// variable and constraint indexing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintModel {
    tasks: Vec<TaskDefinition>,
    resources: Vec<ResourceDefinition>,
    dependencies: Vec<DependencyDefinition>,
    allocations: Vec<AllocationDefinition>,
    min_makespan: i64,
}

impl ConstraintModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task definition.
    pub fn add_task(
        &mut self,
        id: impl Into<String>,
        duration: i64,
        earliest_start: i64,
        latest_start: i64,
    ) {
        self.tasks.push(TaskDefinition {
            id: id.into(),
            duration,
            earliest_start,
            latest_start,
        });
    }

    /// Appends a resource definition.
    pub fn add_resource(&mut self, id: impl Into<String>, capacity: i64) {
        self.resources.push(ResourceDefinition {
            id: id.into(),
            capacity,
        });
    }

    /// Appends a dependency `(first, second, kind)`.
    pub fn add_dependency(
        &mut self,
        first: impl Into<String>,
        second: impl Into<String>,
        kind: DependencyKind,
    ) {
        self.dependencies.push(DependencyDefinition {
            first: first.into(),
            second: second.into(),
            kind,
        });
    }

    /// Appends an allocation of `level` units of `resource` to `task`.
    pub fn add_allocation(
        &mut self,
        task: impl Into<String>,
        resource: impl Into<String>,
        level: i64,
    ) {
        self.allocations.push(AllocationDefinition {
            task: task.into(),
            resource: resource.into(),
            level,
        });
    }

    /// Sets the critical-path lower bound on the makespan.
    pub fn set_min_makespan(&mut self, min_makespan: i64) {
        self.min_makespan = min_makespan;
    }

    /// Task definitions in insertion order.
    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    /// Resource definitions in insertion order.
    pub fn resources(&self) -> &[ResourceDefinition] {
        &self.resources
    }

    /// Dependency definitions in insertion order.
    pub fn dependencies(&self) -> &[DependencyDefinition] {
        &self.dependencies
    }

    /// Allocation definitions in insertion order.
    pub fn allocations(&self) -> &[AllocationDefinition] {
        &self.allocations
    }

    /// Critical-path lower bound on the makespan.
    pub fn min_makespan(&self) -> i64 {
        self.min_makespan
    }
}
