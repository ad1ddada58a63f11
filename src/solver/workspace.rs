//! Solver workspace: variables, stock tensor, and constraint scoring.
//!
//! The workspace is rebuilt for every candidate makespan. During one
//! search iteration it is a frozen snapshot that worker threads read;
//! all mutation (value commits, stock maintenance, score patching)
//! happens in the single-threaded coordinator between iterations.

use std::collections::HashMap;

use crate::matrix::Matrix;
use crate::models::DependencyKind;
use crate::solver::ConstraintModel;

/// Sentinel for a variable that has not been assigned a start yet.
pub(crate) const UNSET: i64 = -1;

/// One decision variable: the start time of a task.
#[derive(Debug, Clone)]
pub(crate) struct Variable {
    /// Current start time, `UNSET` before randomization.
    pub value: i64,
    /// Earliest admissible start.
    pub lbound: i64,
    /// Current latest admissible start, widened by the project slack.
    pub ubound: i64,
    /// Latest start at the minimum makespan.
    pub min_ubound: i64,
    /// Indices of every constraint this variable participates in:
    /// its dependencies first, then the resource cells it may occupy.
    pub constraints: Vec<usize>,
}

/// A dependency constraint over variable indices.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DependencyConstraint {
    pub a: usize,
    pub b: usize,
    pub kind: DependencyKind,
}

/// Violation score and penalty weight of one constraint.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConstraintState {
    pub score: i64,
    pub weight: i64,
}

/// The solver's working state for one makespan attempt.
///
/// The constraint vector holds the dependency constraints in insertion
/// order followed by one capacity constraint per `(resource, time)`
/// cell in row-major order; `resources_offset` marks the boundary.
#[derive(Debug)]
pub(crate) struct Workspace {
    pub durations: Vec<i64>,
    pub dependencies: Vec<DependencyConstraint>,
    pub capacities: Vec<i64>,
    /// Allocation levels, `variables x resources`.
    pub allocations: Matrix,
    pub variables: Vec<Variable>,
    /// Remaining capacity, `resources x makespan`. Negative means
    /// over-allocated.
    pub stocks: Matrix,
    pub constraints: Vec<ConstraintState>,
    pub resources_offset: usize,
    pub makespan: i64,
    pub min_makespan: i64,
}

impl Workspace {
    /// Compiles a constraint model into indexed form.
    ///
    /// Variable indices follow the model's task order, resource indices
    /// its resource order.
    pub fn from_model(model: &ConstraintModel) -> Self {
        let task_index: HashMap<&str, usize> = model
            .tasks()
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();
        let resource_index: HashMap<&str, usize> = model
            .resources()
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        let durations: Vec<i64> = model.tasks().iter().map(|t| t.duration).collect();
        let variables: Vec<Variable> = model
            .tasks()
            .iter()
            .map(|t| Variable {
                value: UNSET,
                lbound: t.earliest_start,
                ubound: t.latest_start,
                min_ubound: t.latest_start,
                constraints: Vec::new(),
            })
            .collect();
        let capacities: Vec<i64> = model.resources().iter().map(|r| r.capacity).collect();

        let dependencies: Vec<DependencyConstraint> = model
            .dependencies()
            .iter()
            .map(|d| DependencyConstraint {
                a: task_index[d.first.as_str()],
                b: task_index[d.second.as_str()],
                kind: d.kind,
            })
            .collect();

        let mut allocations = Matrix::new(variables.len(), capacities.len());
        for a in model.allocations() {
            allocations.set(
                task_index[a.task.as_str()],
                resource_index[a.resource.as_str()],
                a.level,
            );
        }

        Self {
            durations,
            dependencies,
            capacities,
            allocations,
            variables,
            stocks: Matrix::new(0, 0),
            constraints: Vec::new(),
            resources_offset: 0,
            makespan: UNSET,
            min_makespan: model.min_makespan(),
        }
    }

    /// Number of decision variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Builds the stock tensor, constraint vector, and per-variable
    /// incident lists for a candidate makespan.
    pub fn build(&mut self, makespan: i64) {
        let columns = makespan.max(0) as usize;
        self.stocks = Matrix::new(self.capacities.len(), columns);
        for (r, &capacity) in self.capacities.iter().enumerate() {
            for t in 0..columns {
                self.stocks.set(r, t, capacity);
            }
        }

        self.constraints = vec![
            ConstraintState { score: 0, weight: 1 };
            self.dependencies.len() + self.capacities.len() * columns
        ];
        for variable in self.variables.iter_mut() {
            variable.constraints.clear();
        }
        let mut id = 0;
        for dependency in &self.dependencies {
            self.variables[dependency.a].constraints.push(id);
            self.variables[dependency.b].constraints.push(id);
            id += 1;
        }
        for r in 0..self.capacities.len() {
            for _t in 0..columns {
                for v in 0..self.variables.len() {
                    if self.allocations.get(v, r) > 0 {
                        self.variables[v].constraints.push(id);
                    }
                }
                id += 1;
            }
        }
        self.resources_offset = self.dependencies.len();
        self.makespan = makespan;
    }

    /// Clears all assignments: values unset, stocks back to capacity,
    /// scores to zero, weights to one.
    pub fn reset(&mut self) {
        for variable in self.variables.iter_mut() {
            variable.value = UNSET;
        }
        for (r, &capacity) in self.capacities.iter().enumerate() {
            for t in 0..self.stocks.columns() {
                self.stocks.set(r, t, capacity);
            }
        }
        for constraint in self.constraints.iter_mut() {
            constraint.score = 0;
            constraint.weight = 1;
        }
    }

    /// Adds (`sign = 1`) or removes (`sign = -1`) the variable's demand
    /// from the stock cells it occupies when starting at `start`.
    fn update_stock(&mut self, var: usize, start: i64, sign: i64) {
        for r in 0..self.allocations.columns() {
            let demand = self.allocations.get(var, r);
            if demand == 0 {
                continue;
            }
            let mut pos = self.stocks.offset(r, start as usize);
            for _ in 0..self.durations[var] {
                self.stocks.cells_mut()[pos] += sign * demand;
                pos += 1;
            }
        }
    }

    /// Commits a new start time for a variable, incrementally
    /// maintaining the stock tensor. This is the only mutation path for
    /// stocks and must never be called concurrently with workers.
    pub fn set_variable(&mut self, var: usize, value: i64) {
        let previous = self.variables[var].value;
        if previous != UNSET {
            self.update_stock(var, previous, 1);
        }
        self.variables[var].value = value;
        self.update_stock(var, value, -1);
    }

    /// The value variable `var` holds under a hypothetical move.
    #[inline]
    fn value_for_eval(&self, var: usize, attempted: Option<(usize, i64)>) -> i64 {
        match attempted {
            Some((attempted_var, attempted_value)) if attempted_var == var => attempted_value,
            _ => self.variables[var].value,
        }
    }

    /// Violation magnitude of dependency constraint `index` as if the
    /// attempted variable held the attempted value.
    fn eval_dependency(&self, index: usize, attempted: Option<(usize, i64)>) -> i64 {
        let c = self.dependencies[index];
        let start_a = self.value_for_eval(c.a, attempted);
        let finish_a = start_a + self.durations[c.a] - 1;
        let start_b = self.value_for_eval(c.b, attempted);
        let finish_b = start_b + self.durations[c.b] - 1;
        let violation = match c.kind {
            DependencyKind::StartToStart => start_a - start_b,
            DependencyKind::StartToFinish => start_a - finish_b + 1,
            DependencyKind::FinishToStart => finish_a - start_b + 1,
            DependencyKind::FinishToFinish => finish_a - finish_b,
        };
        violation.max(0)
    }

    /// Violation magnitude of the resource cell behind constraint
    /// `index`, with the stock adjusted for a hypothetical move of the
    /// attempted variable from its current value.
    fn eval_resource(&self, index: usize, attempted: Option<(usize, i64)>) -> i64 {
        let offset = index - self.resources_offset;
        let mut stock = self.stocks.cells()[offset];
        if let Some((var, attempted_value)) = attempted {
            let columns = self.stocks.columns();
            let time = (offset % columns) as i64;
            let resource = offset / columns;
            let current = self.variables[var].value;
            if time >= current && time < current + self.durations[var] {
                stock += self.allocations.get(var, resource);
            }
            if time >= attempted_value && time < attempted_value + self.durations[var] {
                stock -= self.allocations.get(var, resource);
            }
        }
        (-stock).max(0)
    }

    /// Violation magnitude of constraint `index`, hypothetically moving
    /// `attempted.0` to `attempted.1` (or scoring the current
    /// assignment when `attempted` is `None`).
    pub fn evaluate(&self, index: usize, attempted: Option<(usize, i64)>) -> i64 {
        if index < self.resources_offset {
            self.eval_dependency(index, attempted)
        } else {
            self.eval_resource(index, attempted)
        }
    }

    /// Bumps the weight of every violated constraint by one and returns
    /// the resulting increase of the weighted global score.
    pub fn escalate_weights(&mut self) -> i64 {
        let mut added = 0;
        for constraint in self.constraints.iter_mut() {
            if constraint.score > 0 {
                constraint.weight += 1;
                added += constraint.score;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tasks sharing one capacity-1 resource, FS-linked.
    fn sample_workspace() -> Workspace {
        let mut model = ConstraintModel::new();
        model.add_task("T1", 3, 0, 0);
        model.add_task("T2", 2, 3, 3);
        model.add_resource("R1", 1);
        model.add_dependency("T1", "T2", DependencyKind::FinishToStart);
        model.add_allocation("T1", "R1", 1);
        model.add_allocation("T2", "R1", 1);
        model.set_min_makespan(5);
        Workspace::from_model(&model)
    }

    #[test]
    fn test_build_layout() {
        let mut ws = sample_workspace();
        ws.build(6);

        // 1 dependency + 1 resource x 6 cells
        assert_eq!(ws.constraints.len(), 7);
        assert_eq!(ws.resources_offset, 1);
        assert_eq!(ws.stocks.rows(), 1);
        assert_eq!(ws.stocks.columns(), 6);
        assert!(ws.stocks.cells().iter().all(|&s| s == 1));

        // Both variables: the dependency plus all 6 cells of R1
        assert_eq!(ws.variables[0].constraints, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(ws.variables[1].constraints, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_set_variable_maintains_stock() {
        let mut ws = sample_workspace();
        ws.build(6);
        ws.reset();

        ws.set_variable(0, 0);
        assert_eq!(ws.stocks.cells(), &[0, 0, 0, 1, 1, 1]);

        ws.set_variable(1, 2);
        assert_eq!(ws.stocks.cells(), &[0, 0, -1, 0, 1, 1]);

        // Moving T2 restores its old cells before claiming new ones
        ws.set_variable(1, 4);
        assert_eq!(ws.stocks.cells(), &[0, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_stock_matches_definition_after_moves() {
        let mut ws = sample_workspace();
        ws.build(6);
        ws.reset();
        ws.set_variable(0, 1);
        ws.set_variable(1, 3);
        ws.set_variable(0, 2);
        ws.set_variable(1, 0);

        // stock[r][t] == capacity - sum of levels of occupying tasks
        for t in 0..6i64 {
            let mut expected = ws.capacities[0];
            for v in 0..2 {
                let value = ws.variables[v].value;
                if t >= value && t < value + ws.durations[v] {
                    expected -= ws.allocations.get(v, 0);
                }
            }
            assert_eq!(ws.stocks.get(0, t as usize), expected);
        }
    }

    #[test]
    fn test_eval_dependency_kinds() {
        let mut model = ConstraintModel::new();
        model.add_task("A", 3, 0, 10);
        model.add_task("B", 2, 0, 10);
        model.add_dependency("A", "B", DependencyKind::StartToStart);
        model.add_dependency("A", "B", DependencyKind::StartToFinish);
        model.add_dependency("A", "B", DependencyKind::FinishToStart);
        model.add_dependency("A", "B", DependencyKind::FinishToFinish);
        model.set_min_makespan(5);
        let mut ws = Workspace::from_model(&model);
        ws.build(12);
        ws.reset();

        // A at 4 (finish 6), B at 2 (finish 3)
        ws.set_variable(0, 4);
        ws.set_variable(1, 2);

        // SS: start(a) - start(b) = 2
        assert_eq!(ws.evaluate(0, None), 2);
        // SF: start(a) - finish(b) + 1 = 4 - 3 + 1 = 2
        assert_eq!(ws.evaluate(1, None), 2);
        // FS: finish(a) - start(b) + 1 = 6 - 2 + 1 = 5
        assert_eq!(ws.evaluate(2, None), 5);
        // FF: finish(a) - finish(b) = 3
        assert_eq!(ws.evaluate(3, None), 3);

        // Hypothetically moving A to 0 satisfies everything but SF
        assert_eq!(ws.evaluate(0, Some((0, 0))), 0);
        assert_eq!(ws.evaluate(1, Some((0, 0))), 0);
        assert_eq!(ws.evaluate(2, Some((0, 0))), 1);
        assert_eq!(ws.evaluate(3, Some((0, 0))), 0);
    }

    #[test]
    fn test_eval_resource_hypothetical() {
        let mut ws = sample_workspace();
        ws.build(6);
        ws.reset();
        ws.set_variable(0, 0);
        ws.set_variable(1, 2);

        // Cell (R1, t=2) is oversubscribed by one
        let cell = ws.resources_offset + 2;
        assert_eq!(ws.evaluate(cell, None), 1);

        // Moving T2 to 3 frees the cell
        assert_eq!(ws.evaluate(cell, Some((1, 3))), 0);
        // And claims (R1, t=4) without conflict
        assert_eq!(ws.evaluate(ws.resources_offset + 4, Some((1, 3))), 0);
        // Moving T1 to 2 still covers the cell, so the conflict remains
        assert_eq!(ws.evaluate(cell, Some((0, 2))), 1);
    }

    #[test]
    fn test_escalate_weights() {
        let mut ws = sample_workspace();
        ws.build(6);
        ws.reset();
        ws.set_variable(0, 0);
        ws.set_variable(1, 0);

        let mut score = 0;
        for c in 0..ws.constraints.len() {
            let eval = ws.evaluate(c, None);
            ws.constraints[c].score = eval;
            score += eval;
        }
        assert!(score > 0);

        let added = ws.escalate_weights();
        assert_eq!(added, score);
        for c in &ws.constraints {
            assert!(c.weight >= 1);
            if c.score > 0 {
                assert_eq!(c.weight, 2);
            } else {
                assert_eq!(c.weight, 1);
            }
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut ws = sample_workspace();
        ws.build(6);
        ws.reset();
        ws.set_variable(0, 0);
        ws.set_variable(1, 0);
        ws.escalate_weights();

        ws.reset();
        assert!(ws.variables.iter().all(|v| v.value == UNSET));
        assert!(ws.stocks.cells().iter().all(|&s| s == 1));
        assert!(ws.constraints.iter().all(|c| c.score == 0 && c.weight == 1));
    }
}
