use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::AssessmentStatus;

/// Intake assessment gating whether a dog may be booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub dog_id: String,
    pub status: AssessmentStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
}
