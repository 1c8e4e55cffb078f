use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named grouping of streams (an event that several streamers take turns on)
///
/// A marathon does not own its streams: deleting one is refused while any
/// stream still references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marathon {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMarathonRequest {
    pub name: String,
}
