//! Stochastic local search over one makespan attempt.
//!
//! Weighted min-conflicts: the coordinator repeatedly commits the best
//! single-variable move found by a pool of worker threads, escalating
//! constraint weights whenever no move improves the weighted global
//! score. Workers read a frozen workspace snapshot and report their
//! proposals through their join handles, so all mutation stays in the
//! coordinator; the only shared mutable state is the next-variable
//! counter and the stop flag, both atomics.
//!
//! # References
//! - Minton et al. (1992), "Minimizing conflicts"
//! - Morris (1993), "The breakout method for escaping from local minima"

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use log::{error, trace};
use rand::Rng;

use super::workspace::Workspace;
use super::Solver;

/// A worker's best move: reassign `var` to `value`, reaching weighted
/// global score `score`, with the recomputed raw scores of every
/// constraint the move touches.
pub(crate) struct Proposal {
    pub var: usize,
    pub value: i64,
    pub score: i64,
    pub patches: Vec<(usize, i64)>,
}

impl Solver {
    /// Runs one search episode for the given candidate makespan.
    /// Returns whether a zero-score assignment was reached.
    pub(crate) fn search_range(&mut self, makespan: i64) -> bool {
        let project_slack = makespan - self.workspace.min_makespan;
        if project_slack < 0 {
            return false;
        }

        // Widen every upper bound by the slack and draw a uniform
        // random start within the window.
        for v in 0..self.workspace.num_variables() {
            let (lbound, ubound) = {
                let variable = &mut self.workspace.variables[v];
                variable.ubound = variable.min_ubound + project_slack;
                (variable.lbound, variable.ubound)
            };
            let value = self.rng.random_range(lbound..=ubound);
            self.workspace.set_variable(v, value);
            self.stats.assignments += 1;
        }

        // Score everything from scratch; weights are all one, so the
        // weighted global score is the plain sum.
        let mut score = 0;
        for c in 0..self.workspace.constraints.len() {
            let eval = self.workspace.evaluate(c, None);
            self.workspace.constraints[c].score = eval;
            score += eval;
        }
        self.stats.record_score(score);
        if score == 0 {
            return true;
        }

        let deadline = self.params.deadline();
        let max_iterations = self.params.max_iterations();
        let threads = self.params.threads();
        let step = self.params.step();

        let mut iterations: i64 = 0;
        loop {
            if let Some(limit) = deadline {
                if Instant::now() >= limit {
                    return false;
                }
            } else if iterations >= max_iterations {
                // The iteration cap binds only without a time budget.
                return false;
            }
            iterations += 1;
            self.stats.iterations += 1;

            let next_var = AtomicUsize::new(0);
            let stop = AtomicBool::new(false);
            let workspace = &self.workspace;
            let results: Vec<thread::Result<Option<Proposal>>> = thread::scope(|scope| {
                let mut handles = Vec::with_capacity(threads);
                for _ in 0..threads {
                    handles.push(scope.spawn(|| {
                        explore_variables(workspace, step, score, &next_var, &stop, deadline)
                    }));
                }
                handles.into_iter().map(|handle| handle.join()).collect()
            });

            let mut best: Option<Proposal> = None;
            for result in results {
                match result {
                    Ok(Some(proposal)) => {
                        // Strictly-less comparison: equal proposals lose.
                        let best_score = best.as_ref().map_or(score, |b| b.score);
                        if proposal.score < best_score {
                            best = Some(proposal);
                        }
                    }
                    Ok(None) => {}
                    Err(_) => {
                        error!("search worker panicked, aborting this attempt");
                        return false;
                    }
                }
            }

            match best {
                Some(proposal) => {
                    self.workspace.set_variable(proposal.var, proposal.value);
                    self.stats.assignments += 1;
                    for &(c, eval) in &proposal.patches {
                        self.workspace.constraints[c].score = eval;
                    }
                    score = proposal.score;
                    self.stats.record_score(score);
                    if score == 0 {
                        return true;
                    }
                }
                None => {
                    // Plateau: amplify the cost of the violated
                    // constraints so the next iterations can leave the
                    // local minimum.
                    score += self.workspace.escalate_weights();
                    self.stats.escapes += 1;
                    trace!("plateau, weights escalated, weighted score now {score}");
                }
            }
        }
    }
}

/// Worker routine: pulls variables off the shared counter and scores
/// every candidate start in `[x0 - step, x0 + step]` clamped to the
/// variable's window, against the frozen workspace.
///
/// Returns the best strictly-improving move found, if any. Finding a
/// zero-score move raises `stop` so sibling workers drain early.
pub(crate) fn explore_variables(
    workspace: &Workspace,
    step: i64,
    score: i64,
    next_var: &AtomicUsize,
    stop: &AtomicBool,
    deadline: Option<Instant>,
) -> Option<Proposal> {
    let num_variables = workspace.num_variables();
    let columns = workspace.stocks.columns();
    let mut best: Option<Proposal> = None;
    let mut best_score = score;

    'variables: loop {
        let v = next_var.fetch_add(1, Ordering::SeqCst);
        if v >= num_variables {
            break;
        }
        let variable = &workspace.variables[v];
        if variable.lbound == variable.ubound {
            continue;
        }

        let x0 = variable.value;
        let window_low = (x0 - step).max(variable.lbound);
        let window_high = (x0 + step).min(variable.ubound);

        for x in window_low..=window_high {
            if stop.load(Ordering::SeqCst) {
                break 'variables;
            }
            if deadline.is_some_and(|limit| Instant::now() >= limit) {
                break 'variables;
            }
            if x == x0 {
                continue;
            }

            let mut new_score = score;
            let mut patches = Vec::new();

            // Dependency constraints sit at the front of the incident
            // list, before the resource cells.
            for &c in variable
                .constraints
                .iter()
                .take_while(|&&c| c < workspace.resources_offset)
            {
                let eval = workspace.evaluate(c, Some((v, x)));
                let state = workspace.constraints[c];
                new_score += (eval - state.score) * state.weight;
                patches.push((c, eval));
            }

            // Resource cells covered under the current or the candidate
            // start. A cell under both windows re-evaluates to its
            // current score, contributing nothing.
            for r in 0..workspace.capacities.len() {
                if workspace.allocations.get(v, r) == 0 {
                    continue;
                }
                let row = workspace.resources_offset + r * columns;
                for origin in [x0, x] {
                    let first = row + origin as usize;
                    for c in first..first + workspace.durations[v] as usize {
                        let eval = workspace.evaluate(c, Some((v, x)));
                        let state = workspace.constraints[c];
                        new_score += (eval - state.score) * state.weight;
                        patches.push((c, eval));
                    }
                }
            }

            if new_score < best_score {
                best_score = new_score;
                let found_zero = new_score == 0;
                best = Some(Proposal {
                    var: v,
                    value: x,
                    score: new_score,
                    patches,
                });
                if found_zero {
                    stop.store(true, Ordering::SeqCst);
                    break 'variables;
                }
            }
        }
    }
    best
}
