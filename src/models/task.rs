//! Task model.
//!
//! A task is the unit of scheduling: an opaque identifier, an integer
//! duration, outgoing dependencies, and resource allocations. Scheduling
//! annotates it with a critical-path window and finally a committed start.
//!
//! # Time Representation
//! All times are integer offsets from a project epoch (t=0). Mapping
//! offsets to calendar dates is the consumer's concern.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::DependencyKind;

/// A task to be scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Processing duration in time steps (at least 1).
    pub duration: i64,
    /// Outgoing dependencies: successor task id to relation kind.
    pub(crate) dependencies: HashMap<String, DependencyKind>,
    /// Resource allocations: resource id to consumed level.
    pub(crate) allocations: HashMap<String, i64>,
    /// Critical-path window, set by analysis.
    pub(crate) window: Option<TaskWindow>,
    /// Committed start time, set by a successful solve.
    pub(crate) start: Option<i64>,
}

/// Earliest/latest start and finish per critical-path analysis.
///
/// Finish times here follow the exclusive convention
/// (`earliest_finish = earliest_start + duration`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWindow {
    /// Earliest possible start.
    pub earliest_start: i64,
    /// Earliest possible finish.
    pub earliest_finish: i64,
    /// Latest start that does not delay the project.
    pub latest_start: i64,
    /// Latest finish that does not delay the project.
    pub latest_finish: i64,
}

impl Task {
    /// Creates a new task with the given id and duration.
    pub fn new(id: impl Into<String>, duration: i64) -> Self {
        Self {
            id: id.into(),
            duration,
            dependencies: HashMap::new(),
            allocations: HashMap::new(),
            window: None,
            start: None,
        }
    }

    /// Committed start time, if the task has been scheduled.
    pub fn start(&self) -> Option<i64> {
        self.start
    }

    /// Committed finish time (inclusive last busy step), if scheduled.
    pub fn finish(&self) -> Option<i64> {
        self.start.map(|s| s + self.duration - 1)
    }

    /// Critical-path window, if analysis has run.
    pub fn window(&self) -> Option<&TaskWindow> {
        self.window.as_ref()
    }

    /// The dependency kind toward a successor task, if declared.
    pub fn dependency_on(&self, task_id: &str) -> Option<DependencyKind> {
        self.dependencies.get(task_id).copied()
    }

    /// The level allocated from a resource, if declared.
    pub fn allocation_of(&self, resource_id: &str) -> Option<i64> {
        self.allocations.get(resource_id).copied()
    }

    /// Whether this task sits on the critical path (zero slack).
    pub fn is_critical(&self) -> bool {
        self.window
            .is_some_and(|w| w.earliest_start == w.latest_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_new() {
        let t = Task::new("T1", 5);
        assert_eq!(t.id, "T1");
        assert_eq!(t.duration, 5);
        assert_eq!(t.start(), None);
        assert_eq!(t.finish(), None);
        assert!(t.window().is_none());
        assert!(!t.is_critical());
    }

    #[test]
    fn test_task_finish_inclusive() {
        let mut t = Task::new("T1", 5);
        t.start = Some(10);
        assert_eq!(t.finish(), Some(14));
    }

    #[test]
    fn test_task_critical() {
        let mut t = Task::new("T1", 3);
        t.window = Some(TaskWindow {
            earliest_start: 2,
            earliest_finish: 5,
            latest_start: 2,
            latest_finish: 5,
        });
        assert!(t.is_critical());

        t.window = Some(TaskWindow {
            earliest_start: 2,
            earliest_finish: 5,
            latest_start: 4,
            latest_finish: 7,
        });
        assert!(!t.is_critical());
    }
}
