//! User rating.

use serde::{Deserialize, Serialize};

/// Stars a user holds; also the number of concurrent loans allowed.
///
/// The rating service floors stars at 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub stars: u64,
}

/// Rating lost for a late return or a book returned in another condition.
pub const PENALTY: i64 = -10;

/// Rating gained for an on-time return in the recorded condition.
pub const BONUS: i64 = 1;

impl Rating {
    /// Whether one more loan fits next to `active` current ones.
    pub fn allows_another(&self, active: usize) -> bool {
        (active as u64) < self.stars
    }
}
