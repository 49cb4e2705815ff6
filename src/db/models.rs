//! Database model types.

use serde::{Deserialize, Serialize};

/// A monitored target, as registered by the prober.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: String,
    pub name: String,
    pub url: String,
}
