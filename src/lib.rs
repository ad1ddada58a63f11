//! Resource-constrained project scheduling engine.
//!
//! Computes start times for tasks with integer durations under four
//! kinds of precedence constraints (SS, SF, FS, FF) and renewable
//! resources with integer capacities, minimizing the project makespan
//! or deciding feasibility for a caller-chosen one.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Resource`, `DependencyKind`,
//!   `TaskSchedule`, `Violation`
//! - **`project`**: Validated problem builder, scheduling entry point,
//!   and independent consistency checker
//! - **`solver`**: Constraint model, multi-threaded weighted
//!   min-conflicts search, bisection driver, compaction
//! - **`matrix`**: Dense integer matrix backing the solver's tensors
//! - **`validation`**: Model-definition error taxonomy
//!
//! # Pipeline
//!
//! A critical-path pass over the finish-to-start dependencies gives
//! each task an earliest/latest start window and a lower bound on the
//! makespan. A stochastic local search then repairs a random assignment
//! inside those windows, with constraint weights escalating on
//! plateaus, while a bisection driver squeezes the makespan between the
//! critical-path bound and the sum of durations. A final compaction
//! pass left-shifts tasks across idle columns.
//!
//! # Quick Start
//!
//! ```
//! use u_rcpsp::project::Project;
//! use u_rcpsp::models::DependencyKind;
//! use u_rcpsp::solver::SolverParams;
//!
//! let mut project = Project::new();
//! project.add_resource("R1", 1).unwrap();
//! project.add_task("build", 3).unwrap();
//! project.add_task("test", 2).unwrap();
//! project.add_dependency("build", "test", DependencyKind::FinishToStart).unwrap();
//! project.add_allocation("build", "R1", 1).unwrap();
//!
//! project.set_solver_params(SolverParams::new().with_max_iterations(1000));
//! assert!(project.schedule());
//! assert_eq!(project.makespan(), Some(5));
//! assert!(project.check_consistency().is_empty());
//! ```
//!
//! # References
//!
//! - Kolisch & Hartmann (2006), "Experimental investigation of
//!   heuristics for resource-constrained project scheduling"
//! - Minton et al. (1992), "Minimizing conflicts: a heuristic repair
//!   method for constraint satisfaction"
//! - Hoos & Stützle (2004), "Stochastic Local Search: Foundations and
//!   Applications"

mod cpath;
pub mod matrix;
pub mod models;
pub mod project;
pub mod solver;
pub mod validation;
