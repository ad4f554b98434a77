use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-owned portfolio. Transactions and holdings hang off this record.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Reporting currency for summaries, e.g. "USD".
    pub base_currency: String,
    pub created_at: DateTime<Utc>,
}
