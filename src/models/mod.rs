//! Domain model types.

pub mod alarm;
pub mod content;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identifier of a delivery target group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
