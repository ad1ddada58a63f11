//! Schedule (solution) model.
//!
//! A task schedule maps every task id to an integer start time and
//! carries the project makespan. Violations describe why a committed
//! schedule fails the independent consistency check.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A complete solution: task start times plus the project makespan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSchedule {
    starts: HashMap<String, i64>,
    makespan: i64,
}

impl TaskSchedule {
    /// Creates an empty schedule with the given makespan.
    pub fn new(makespan: i64) -> Self {
        Self {
            starts: HashMap::new(),
            makespan,
        }
    }

    /// Records the start time of a task.
    pub fn set_start(&mut self, task_id: impl Into<String>, start: i64) {
        self.starts.insert(task_id.into(), start);
    }

    /// Start time of a task, if present.
    pub fn start_of(&self, task_id: &str) -> Option<i64> {
        self.starts.get(task_id).copied()
    }

    /// Project completion time.
    pub fn makespan(&self) -> i64 {
        self.makespan
    }

    /// Number of scheduled tasks.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Whether no task is scheduled.
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Iterates over `(task id, start)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.starts.iter().map(|(id, &start)| (id.as_str(), start))
    }
}

/// A consistency violation found in a committed schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule consistency violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// A task has no committed start time.
    MissingSchedule,
    /// A task finishes at or beyond the project makespan.
    MakespanExceeded,
    /// A dependency relation between two tasks does not hold.
    DependencyViolated,
    /// A resource is allocated beyond its capacity at some time step.
    CapacityExceeded,
}

impl Violation {
    /// Creates a missing-schedule violation.
    pub fn missing_schedule(message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::MissingSchedule,
            message: message.into(),
        }
    }

    /// Creates a makespan-exceeded violation.
    pub fn makespan_exceeded(message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::MakespanExceeded,
            message: message.into(),
        }
    }

    /// Creates a dependency violation.
    pub fn dependency_violated(message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::DependencyViolated,
            message: message.into(),
        }
    }

    /// Creates a capacity violation.
    pub fn capacity_exceeded(message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::CapacityExceeded,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_starts() {
        let mut s = TaskSchedule::new(20);
        s.set_start("T1", 0);
        s.set_start("T2", 5);

        assert_eq!(s.makespan(), 20);
        assert_eq!(s.start_of("T1"), Some(0));
        assert_eq!(s.start_of("T2"), Some(5));
        assert_eq!(s.start_of("T3"), None);
        assert_eq!(s.len(), 2);
        assert!(!s.is_empty());
    }

    #[test]
    fn test_schedule_empty() {
        let s = TaskSchedule::new(0);
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert_eq!(s.makespan(), 0);
    }

    #[test]
    fn test_schedule_iter() {
        let mut s = TaskSchedule::new(10);
        s.set_start("A", 1);
        s.set_start("B", 2);
        let mut pairs: Vec<_> = s.iter().collect();
        pairs.sort();
        assert_eq!(pairs, vec![("A", 1), ("B", 2)]);
    }

    #[test]
    fn test_violation_factories() {
        let v = Violation::capacity_exceeded("over");
        assert_eq!(v.kind, ViolationKind::CapacityExceeded);
        assert_eq!(v.message, "over");

        let v = Violation::dependency_violated("broken");
        assert_eq!(v.kind, ViolationKind::DependencyViolated);

        let v = Violation::missing_schedule("unset");
        assert_eq!(v.kind, ViolationKind::MissingSchedule);

        let v = Violation::makespan_exceeded("late");
        assert_eq!(v.kind, ViolationKind::MakespanExceeded);
    }
}
