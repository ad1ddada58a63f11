//! Renewable resource model.
//!
//! A resource has a fixed integer capacity renewed at every time step.
//! Tasks consume integer levels of it for their whole duration.

use serde::{Deserialize, Serialize};

/// A renewable resource with a per-step capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Units available at every time step.
    pub capacity: i64,
}

impl Resource {
    /// Creates a new resource.
    pub fn new(id: impl Into<String>, capacity: i64) -> Self {
        Self {
            id: id.into(),
            capacity,
        }
    }
}
