//! Task dependency kinds.
//!
//! The four classic precedence relations between a pair of tasks.
//! Given a dependency from task `a` to task `b`, the relation constrains
//! the start or finish of `b` relative to `a`.
//!
//! # Reference
//! Kerzner (2017), "Project Management", precedence diagramming method

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A precedence relation kind between two tasks.
///
/// For a dependency `(a, b, kind)` a schedule must satisfy:
///
/// | Kind | Relation |
/// |------|----------|
/// | `StartToStart` (SS) | `start(a) <= start(b)` |
/// | `StartToFinish` (SF) | `start(a) < finish(b)` |
/// | `FinishToStart` (FS) | `finish(a) < start(b)` |
/// | `FinishToFinish` (FF) | `finish(a) <= finish(b)` |
///
/// where `finish(t) = start(t) + duration(t) - 1` (inclusive last busy step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// `b` cannot start before `a` starts.
    #[serde(rename = "SS")]
    StartToStart,
    /// `b` cannot finish before `a` starts.
    #[serde(rename = "SF")]
    StartToFinish,
    /// `b` cannot start before `a` finishes.
    #[serde(rename = "FS")]
    FinishToStart,
    /// `b` cannot finish before `a` finishes.
    #[serde(rename = "FF")]
    FinishToFinish,
}

/// Error returned when parsing an unknown dependency tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dependency kind '{0}'")]
pub struct ParseDependencyKindError(String);

impl DependencyKind {
    /// The conventional two-letter tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::StartToStart => "SS",
            Self::StartToFinish => "SF",
            Self::FinishToStart => "FS",
            Self::FinishToFinish => "FF",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DependencyKind {
    type Err = ParseDependencyKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SS" => Ok(Self::StartToStart),
            "SF" => Ok(Self::StartToFinish),
            "FS" => Ok(Self::FinishToStart),
            "FF" => Ok(Self::FinishToFinish),
            other => Err(ParseDependencyKindError(other.to_string())),
        }
    }
}
