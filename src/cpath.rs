//! Critical-path analysis.
//!
//! Builds a precedence network over the finish-to-start dependencies,
//! augmented with synthetic source and sink nodes, and runs the classic
//! forward and backward passes to derive each task's earliest/latest
//! start and finish. The sink's earliest start is the minimum project
//! makespan in the resource-free relaxation.
//!
//! Only FS dependencies shape the network; SS, SF, and FF relations are
//! enforced later by the solver but do not tighten these bounds.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-path planning and scheduling"

use crate::models::{DependencyKind, Task, TaskWindow};
use std::collections::HashMap;

/// Result of a critical-path analysis.
///
/// `windows` is parallel to the analyzed task slice.
#[derive(Debug, Clone)]
pub(crate) struct CriticalPath {
    pub windows: Vec<TaskWindow>,
    pub min_makespan: i64,
}

const UNSET: i64 = -1;

struct Node {
    duration: i64,
    es: i64,
    ef: i64,
    ls: i64,
    lf: i64,
    preds: Vec<usize>,
    succs: Vec<usize>,
    unmarked_preds: usize,
    unmarked_succs: usize,
    marked: bool,
}

impl Node {
    fn new(duration: i64) -> Self {
        Self {
            duration,
            es: UNSET,
            ef: UNSET,
            ls: UNSET,
            lf: UNSET,
            preds: Vec::new(),
            succs: Vec::new(),
            unmarked_preds: 0,
            unmarked_succs: 0,
            marked: false,
        }
    }
}

/// Analyzes the FS network over `tasks`.
///
/// Returns `None` when the network cannot be fully annotated, which
/// happens exactly when the FS dependencies contain a cycle.
pub(crate) fn analyze(tasks: &[Task]) -> Option<CriticalPath> {
    let n = tasks.len();
    let source = n;
    let sink = n + 1;

    let index: HashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();

    let mut nodes: Vec<Node> = tasks.iter().map(|t| Node::new(t.duration)).collect();
    nodes.push(Node::new(0)); // source
    nodes.push(Node::new(0)); // sink

    for (i, task) in tasks.iter().enumerate() {
        for (succ_id, kind) in &task.dependencies {
            if *kind != DependencyKind::FinishToStart {
                continue;
            }
            let j = *index.get(succ_id.as_str())?;
            nodes[i].succs.push(j);
            nodes[j].preds.push(i);
        }
    }
    // Tasks without FS predecessors hang off the source, tasks without
    // FS successors feed the sink.
    for i in 0..n {
        if nodes[i].preds.is_empty() {
            nodes[source].succs.push(i);
            nodes[i].preds.push(source);
        }
        if nodes[i].succs.is_empty() {
            nodes[i].succs.push(sink);
            nodes[sink].preds.push(i);
        }
    }
    for node in nodes.iter_mut() {
        node.unmarked_preds = node.preds.len();
        node.unmarked_succs = node.succs.len();
    }

    let min_makespan = walk_from_start(&mut nodes, source, sink)?;
    for node in nodes.iter_mut() {
        node.marked = false;
    }
    walk_from_finish(&mut nodes, source, sink, min_makespan)?;

    let windows: Vec<TaskWindow> = nodes[..n]
        .iter()
        .map(|node| TaskWindow {
            earliest_start: node.es,
            earliest_finish: node.ef,
            latest_start: node.ls,
            latest_finish: node.lf,
        })
        .collect();
    // A node left unannotated means the passes never reached it, which
    // the sweeps above only allow when a cycle bypasses the sink.
    if windows.iter().any(|w| {
        w.earliest_start < 0 || w.earliest_finish < 0 || w.latest_start < 0 || w.latest_finish < 0
    }) {
        return None;
    }
    Some(CriticalPath {
        windows,
        min_makespan,
    })
}

fn mark_from_start(nodes: &mut [Node], id: usize, es: i64, ef: i64) {
    nodes[id].es = es;
    nodes[id].ef = ef;
    for k in 0..nodes[id].succs.len() {
        let s = nodes[id].succs[k];
        nodes[s].unmarked_preds -= 1;
    }
    nodes[id].marked = true;
}

/// Forward pass: repeatedly sweeps for nodes whose predecessors are all
/// marked, assigning `es = max(pred ef)` and `ef = es + duration`.
/// Returns the sink's earliest start. A sweep that marks nothing means
/// the network is cyclic; the pass gives up.
fn walk_from_start(nodes: &mut [Node], source: usize, sink: usize) -> Option<i64> {
    mark_from_start(nodes, source, 0, 0);
    loop {
        let mut progressed = false;
        for id in 0..nodes.len() {
            if id == source || nodes[id].marked || nodes[id].unmarked_preds > 0 {
                continue;
            }
            let es = nodes[id].preds.iter().map(|&p| nodes[p].ef).fold(0, i64::max);
            if id == sink {
                return Some(es);
            }
            let ef = es + nodes[id].duration;
            mark_from_start(nodes, id, es, ef);
            progressed = true;
        }
        if !progressed {
            return None;
        }
    }
}

fn mark_from_finish(nodes: &mut [Node], id: usize, ls: i64, lf: i64) {
    nodes[id].ls = ls;
    nodes[id].lf = lf;
    for k in 0..nodes[id].preds.len() {
        let p = nodes[id].preds[k];
        nodes[p].unmarked_succs -= 1;
    }
    nodes[id].marked = true;
}

/// Backward pass, symmetric to the forward one: `lf = min(succ ls)`,
/// `ls = lf - duration`, starting from the sink pinned at `makespan`.
fn walk_from_finish(nodes: &mut [Node], source: usize, sink: usize, makespan: i64) -> Option<()> {
    mark_from_finish(nodes, sink, makespan, makespan);
    loop {
        let mut progressed = false;
        for id in 0..nodes.len() {
            if id == sink || nodes[id].marked || nodes[id].unmarked_succs > 0 {
                continue;
            }
            if id == source {
                return Some(());
            }
            let lf = nodes[id].succs.iter().map(|&s| nodes[s].ls).min()?;
            let ls = lf - nodes[id].duration;
            mark_from_finish(nodes, id, ls, lf);
            progressed = true;
        }
        if !progressed {
            return None;
        }
    }
}
