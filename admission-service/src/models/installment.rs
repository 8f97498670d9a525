use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Unpaid,
    Paid,
    Overdue,
}

/// One scheduled EMI payment. `installment_no` is unique per admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    #[serde(rename = "_id")]
    pub id: String,
    pub admission_id: String,
    pub installment_no: u32,
    pub amount: f64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub due_date: DateTime<Utc>,
    pub status: InstallmentStatus,
    pub paid_date: Option<mongodb::bson::DateTime>,
    pub payment_id: Option<String>,
    pub late_fees: f64,
    /// Invariant: `total_amount = amount + late_fees`.
    pub total_amount: f64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Installment {
    pub fn new(admission_id: String, installment_no: u32, amount: f64, due_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            admission_id,
            installment_no,
            amount,
            due_date,
            status: InstallmentStatus::Unpaid,
            paid_date: None,
            payment_id: None,
            late_fees: 0.0,
            total_amount: amount,
            created_at: Utc::now(),
        }
    }

    pub fn total(amount: f64, late_fees: f64) -> f64 {
        amount + late_fees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_installment_is_unpaid_with_no_late_fees() {
        let inst = Installment::new("adm-1".to_string(), 1, 4000.0, Utc::now());
        assert_eq!(inst.status, InstallmentStatus::Unpaid);
        assert_eq!(inst.total_amount, 4000.0);
        assert!(inst.payment_id.is_none());
    }

    #[test]
    fn total_includes_late_fees() {
        assert_eq!(Installment::total(4000.0, 250.0), 4250.0);
    }
}
