//! Project facade.
//!
//! A [`Project`] collects tasks, resources, dependencies, and
//! allocations with immediate integrity validation, then drives the
//! whole pipeline: critical-path analysis annotates every task with its
//! start window, the solver searches for start times, and the committed
//! schedule can be independently re-verified by the consistency
//! checker.
//!
//! Time is expressed in integer offsets from a project epoch; mapping
//! offsets to calendar dates is left to the consumer.

use std::collections::HashMap;

use log::debug;

use crate::cpath::{self, CriticalPath};
use crate::models::{DependencyKind, Resource, Task, TaskSchedule, Violation};
use crate::solver::{ConstraintModel, Solver, SolverParams, Statistics};
use crate::validation::ModelError;

/// A project scheduling problem and, after solving, its solution.
#[derive(Debug, Clone, Default)]
pub struct Project {
    tasks: Vec<Task>,
    task_index: HashMap<String, usize>,
    resources: Vec<Resource>,
    resource_index: HashMap<String, usize>,
    makespan: Option<i64>,
    min_makespan: Option<i64>,
    params: SolverParams,
    stats: Option<Statistics>,
}

impl Project {
    /// Creates an empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task with the given duration.
    ///
    /// Rejects duplicate ids and non-positive durations.
    pub fn add_task(&mut self, id: impl Into<String>, duration: i64) -> Result<(), ModelError> {
        let id = id.into();
        if self.task_index.contains_key(&id) {
            return Err(ModelError::DuplicateTask(id));
        }
        if duration < 1 {
            return Err(ModelError::InvalidDuration(id, duration));
        }
        self.task_index.insert(id.clone(), self.tasks.len());
        self.tasks.push(Task::new(id, duration));
        Ok(())
    }

    /// Adds a resource with the given capacity.
    ///
    /// Rejects duplicate ids and negative capacities.
    pub fn add_resource(
        &mut self,
        id: impl Into<String>,
        capacity: i64,
    ) -> Result<(), ModelError> {
        let id = id.into();
        if capacity < 0 {
            return Err(ModelError::NegativeCapacity(id));
        }
        if self.resource_index.contains_key(&id) {
            return Err(ModelError::DuplicateResource(id));
        }
        self.resource_index.insert(id.clone(), self.resources.len());
        self.resources.push(Resource::new(id, capacity));
        Ok(())
    }

    /// Adds a dependency `(first, second, kind)`.
    ///
    /// Rejects self-dependencies, undefined task ids, and a second
    /// dependency between the same pair of tasks in either order.
    pub fn add_dependency(
        &mut self,
        first: &str,
        second: &str,
        kind: DependencyKind,
    ) -> Result<(), ModelError> {
        if first == second {
            return Err(ModelError::SelfDependency(first.to_string()));
        }
        let Some(&a) = self.task_index.get(first) else {
            return Err(ModelError::UndefinedTask(first.to_string()));
        };
        let Some(&b) = self.task_index.get(second) else {
            return Err(ModelError::UndefinedTask(second.to_string()));
        };
        if self.tasks[a].dependencies.contains_key(second)
            || self.tasks[b].dependencies.contains_key(first)
        {
            return Err(ModelError::DuplicateDependency(
                first.to_string(),
                second.to_string(),
            ));
        }
        self.tasks[a].dependencies.insert(second.to_string(), kind);
        Ok(())
    }

    /// Allocates `level` units of a resource to a task for its whole
    /// duration.
    ///
    /// Rejects undefined ids, levels above the resource capacity,
    /// negative levels, and duplicate allocations.
    pub fn add_allocation(
        &mut self,
        task_id: &str,
        resource_id: &str,
        level: i64,
    ) -> Result<(), ModelError> {
        let Some(&t) = self.task_index.get(task_id) else {
            return Err(ModelError::UndefinedTask(task_id.to_string()));
        };
        let Some(&r) = self.resource_index.get(resource_id) else {
            return Err(ModelError::UndefinedResource(resource_id.to_string()));
        };
        if level > self.resources[r].capacity {
            return Err(ModelError::AllocationOverCapacity(
                task_id.to_string(),
                resource_id.to_string(),
            ));
        }
        if level < 0 {
            return Err(ModelError::NegativeAllocation(
                task_id.to_string(),
                resource_id.to_string(),
            ));
        }
        if self.tasks[t].allocations.contains_key(resource_id) {
            return Err(ModelError::DuplicateAllocation(
                task_id.to_string(),
                resource_id.to_string(),
            ));
        }
        self.tasks[t]
            .allocations
            .insert(resource_id.to_string(), level);
        Ok(())
    }

    /// Replaces the solver parameters used by the schedule calls.
    pub fn set_solver_params(&mut self, params: SolverParams) {
        self.params = params;
    }

    /// Solver parameters used by the schedule calls.
    pub fn solver_params(&self) -> &SolverParams {
        &self.params
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.task_index.get(id).map(|&i| &self.tasks[i])
    }

    /// Resources in insertion order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Makespan of the last successful schedule.
    pub fn makespan(&self) -> Option<i64> {
        self.makespan
    }

    /// Solver statistics of the last schedule call.
    pub fn statistics(&self) -> Option<&Statistics> {
        self.stats.as_ref()
    }

    /// Computes the critical-path lower bound on the makespan and
    /// annotates every task with its start window.
    ///
    /// Returns `None` when the finish-to-start dependencies are cyclic.
    pub fn min_makespan(&mut self) -> Option<i64> {
        self.annotate_critical_path()?;
        self.min_makespan
    }

    /// Ids of the tasks on the critical path (zero slack), valid after
    /// critical-path analysis has run.
    pub fn critical_tasks(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|t| t.is_critical())
            .map(|t| t.id.as_str())
            .collect()
    }

    /// Schedules the project with the smallest feasible makespan.
    ///
    /// On success the tasks carry committed start times and
    /// [`makespan`](Self::makespan) is set. Returns `false` when the
    /// dependencies are inconsistent or the search exhausts its budget.
    pub fn schedule(&mut self) -> bool {
        self.run_solver(None)
    }

    /// Schedules the project with exactly the given makespan.
    pub fn schedule_fixed(&mut self, makespan: i64) -> bool {
        self.run_solver(Some(makespan))
    }

    /// Exports the committed schedule, if the project has been solved.
    pub fn task_schedule(&self) -> Option<TaskSchedule> {
        let makespan = self.makespan?;
        let mut schedule = TaskSchedule::new(makespan);
        for task in &self.tasks {
            schedule.set_start(task.id.clone(), task.start?);
        }
        Some(schedule)
    }

    /// Independently re-verifies the committed schedule.
    ///
    /// Checks that every task is placed, finishes inside the makespan,
    /// honors its dependencies, and that no resource is oversubscribed
    /// at any time step. Returns an empty vector for a clean schedule.
    pub fn check_consistency(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.tasks.is_empty() {
            return violations;
        }
        let Some(makespan) = self.makespan else {
            violations.push(Violation::missing_schedule(
                "missing makespan, probably empty schedule",
            ));
            return violations;
        };

        for task in &self.tasks {
            match (task.start(), task.finish()) {
                (Some(_), Some(finish)) => {
                    if finish >= makespan {
                        violations.push(Violation::makespan_exceeded(format!(
                            "task '{}' overflows the project makespan (finish {finish}, makespan {makespan})",
                            task.id
                        )));
                    }
                }
                _ => {
                    violations.push(Violation::missing_schedule(format!(
                        "task '{}' missing schedule",
                        task.id
                    )));
                }
            }
            self.check_task_dependencies(task, &mut violations);
        }
        for resource in &self.resources {
            self.check_resource_allocations(resource, makespan, &mut violations);
        }
        violations
    }

    /// The consistency findings as a multi-line diagnostic, one line
    /// per violation; empty for a clean schedule.
    pub fn consistency_report(&self) -> String {
        self.check_consistency()
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn check_task_dependencies(&self, task: &Task, violations: &mut Vec<Violation>) {
        let (Some(start_a), Some(finish_a)) = (task.start(), task.finish()) else {
            return;
        };
        for (succ_id, &kind) in &task.dependencies {
            let Some(succ) = self.task(succ_id) else {
                continue;
            };
            let (Some(start_b), Some(finish_b)) = (succ.start(), succ.finish()) else {
                continue;
            };
            let violated = match kind {
                DependencyKind::StartToStart => start_b < start_a,
                DependencyKind::StartToFinish => finish_b <= start_a,
                DependencyKind::FinishToStart => start_b <= finish_a,
                DependencyKind::FinishToFinish => finish_b < finish_a,
            };
            if violated {
                violations.push(Violation::dependency_violated(format!(
                    "tasks '{}' and '{}' violate dependency rule {}",
                    task.id, succ_id, kind
                )));
            }
        }
    }

    fn check_resource_allocations(
        &self,
        resource: &Resource,
        makespan: i64,
        violations: &mut Vec<Violation>,
    ) {
        let mut demand = vec![0i64; makespan.max(0) as usize];
        for task in &self.tasks {
            let (Some(start), Some(finish)) = (task.start(), task.finish()) else {
                continue;
            };
            let Some(level) = task.allocation_of(&resource.id) else {
                continue;
            };
            // Clamp to the horizon; an overflowing task is already
            // reported as a makespan violation.
            let last = finish.min(makespan - 1);
            for t in start..=last {
                demand[t as usize] += level;
            }
        }
        for (t, &used) in demand.iter().enumerate() {
            if used > resource.capacity {
                violations.push(Violation::capacity_exceeded(format!(
                    "resource '{}' overflows at time={t} ({used} > {})",
                    resource.id, resource.capacity
                )));
            }
        }
    }

    fn annotate_critical_path(&mut self) -> Option<CriticalPath> {
        let cp = cpath::analyze(&self.tasks)?;
        for (task, window) in self.tasks.iter_mut().zip(&cp.windows) {
            task.window = Some(*window);
        }
        self.min_makespan = Some(cp.min_makespan);
        Some(cp)
    }

    fn build_model(&self, cp: &CriticalPath) -> ConstraintModel {
        let mut model = ConstraintModel::new();
        for (task, window) in self.tasks.iter().zip(&cp.windows) {
            model.add_task(
                &task.id,
                task.duration,
                window.earliest_start,
                window.latest_start,
            );
        }
        for resource in &self.resources {
            model.add_resource(&resource.id, resource.capacity);
        }
        for task in &self.tasks {
            for (succ, &kind) in &task.dependencies {
                model.add_dependency(&task.id, succ, kind);
            }
            for (resource, &level) in &task.allocations {
                model.add_allocation(&task.id, resource, level);
            }
        }
        model.set_min_makespan(cp.min_makespan);
        model
    }

    fn import_schedule(&mut self, schedule: &TaskSchedule) {
        for (id, start) in schedule.iter() {
            if let Some(&t) = self.task_index.get(id) {
                self.tasks[t].start = Some(start);
            }
        }
    }

    fn run_solver(&mut self, fixed: Option<i64>) -> bool {
        let Some(cp) = self.annotate_critical_path() else {
            debug!("critical-path analysis failed, dependencies are inconsistent");
            return false;
        };
        let model = self.build_model(&cp);
        let mut solver = Solver::new(&model);
        solver.set_params(self.params.clone());

        let result = match fixed {
            None => solver.solve_optimal(),
            Some(makespan) => solver.solve_fixed(makespan),
        };
        self.stats = Some(*solver.statistics());

        match result {
            Some(schedule) => {
                self.import_schedule(&schedule);
                self.makespan = Some(schedule.makespan());
                true
            }
            None => false,
        }
    }
}
