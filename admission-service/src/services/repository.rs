//! Admission, payment, and installment persistence.
//!
//! All admission/payment reads take an [`AccessScope`] and merge its filter
//! into the query, so role-based branch/student isolation cannot be bypassed
//! by a handler. Payment records are the ledger of record; admission totals
//! are recomputed from them, never incremented ad hoc.

use anyhow::Result;
use chrono::{DateTime, Datelike, Months, Utc};
use futures::TryStreamExt;
use institute_core::scope::AccessScope;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use crate::models::{
    Admission, Installment, InstallmentStatus, Payment, PaymentStatus, SequenceCounter,
};

/// Format an admission receipt number, e.g. `ADM-2026-000042`.
pub fn format_admission_receipt(year: i32, seq: i64) -> String {
    format!("ADM-{}-{:06}", year, seq)
}

/// Format a payment receipt number, e.g. `PAY20260042`.
pub fn format_payment_receipt(year: i32, seq: i64) -> String {
    format!("PAY{}{:04}", year, seq)
}

/// Optional caller-supplied admission list filters. Only honored for roles
/// whose scope allows explicit filtering.
#[derive(Debug, Default, Clone)]
pub struct AdmissionFilters {
    pub branch_id: Option<String>,
    pub course_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdmissionStats {
    pub total_admissions: u64,
    pub active_admissions: u64,
    pub completed_admissions: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseStat {
    #[serde(rename = "_id")]
    pub course_id: String,
    pub count: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct PaymentStats {
    pub total_payments: u64,
    pub total_revenue: f64,
    pub today_revenue: f64,
    pub by_method: Vec<MethodStat>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MethodStat {
    #[serde(rename = "_id")]
    pub method: String,
    pub count: i64,
    pub amount: f64,
}

#[derive(Clone)]
pub struct AdmissionRepository {
    admissions: Collection<Admission>,
    payments: Collection<Payment>,
    installments: Collection<Installment>,
    counters: Collection<SequenceCounter>,
}

impl AdmissionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            admissions: db.collection("admissions"),
            payments: db.collection("payments"),
            installments: db.collection("installments"),
            counters: db.collection("counters"),
        }
    }

    /// Initialize indexes backing the uniqueness invariants and the scoped
    /// query paths.
    pub async fn init_indexes(&self) -> Result<()> {
        let unique = |name: &str| {
            IndexOptions::builder()
                .unique(true)
                .name(name.to_string())
                .build()
        };

        let receipt_index = IndexModel::builder()
            .keys(doc! { "receipt_number": 1 })
            .options(unique("admission_receipt_idx"))
            .build();
        let branch_index = IndexModel::builder()
            .keys(doc! { "course_details.branch_id": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("admission_branch_status_idx".to_string())
                    .build(),
            )
            .build();
        let student_index = IndexModel::builder()
            .keys(doc! { "student_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("admission_student_idx".to_string())
                    .build(),
            )
            .build();
        self.admissions
            .create_indexes([receipt_index, branch_index, student_index], None)
            .await?;

        let payment_receipt_index = IndexModel::builder()
            .keys(doc! { "receipt_number": 1 })
            .options(unique("payment_receipt_idx"))
            .build();
        let payment_admission_index = IndexModel::builder()
            .keys(doc! { "admission_id": 1, "payment_date": -1 })
            .options(
                IndexOptions::builder()
                    .name("payment_admission_idx".to_string())
                    .build(),
            )
            .build();
        self.payments
            .create_indexes([payment_receipt_index, payment_admission_index], None)
            .await?;

        // One row per (admission, installment number).
        let installment_index = IndexModel::builder()
            .keys(doc! { "admission_id": 1, "installment_no": 1 })
            .options(unique("installment_no_idx"))
            .build();
        self.installments
            .create_indexes([installment_index], None)
            .await?;

        tracing::info!("Admission service indexes initialized");
        Ok(())
    }

    /// Atomically advance the per-year sequence for `entity` and return the
    /// new value.
    async fn next_sequence(&self, entity: &str, year: i32) -> Result<i64> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": format!("{}:{}", entity, year) },
                doc! { "$inc": { "seq": 1i64 } },
                options,
            )
            .await?
            .ok_or_else(|| anyhow::anyhow!("sequence upsert returned no document"))?;
        Ok(counter.seq)
    }

    pub async fn next_admission_receipt(&self) -> Result<String> {
        let year = Utc::now().year();
        let seq = self.next_sequence("admission", year).await?;
        Ok(format_admission_receipt(year, seq))
    }

    pub async fn next_payment_receipt(&self) -> Result<String> {
        let year = Utc::now().year();
        let seq = self.next_sequence("payment", year).await?;
        Ok(format_payment_receipt(year, seq))
    }

    // --- admissions ---

    pub async fn create_admission(&self, admission: &Admission) -> Result<()> {
        self.admissions.insert_one(admission, None).await?;
        Ok(())
    }

    pub async fn find_admission(
        &self,
        scope: &AccessScope,
        id: &str,
    ) -> Result<Option<Admission>> {
        let mut filter = scope.admission_filter();
        filter.insert("_id", id);
        Ok(self.admissions.find_one(filter, None).await?)
    }

    /// Unscoped lookup for internal flows (ledger reconciliation).
    pub async fn find_admission_unscoped(&self, id: &str) -> Result<Option<Admission>> {
        Ok(self.admissions.find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn list_admissions(
        &self,
        scope: &AccessScope,
        filters: &AdmissionFilters,
        page: u64,
        limit: i64,
    ) -> Result<(Vec<Admission>, u64)> {
        let mut filter = scope.admission_filter();

        if scope.allows_explicit_filters() {
            if let Some(ref branch_id) = filters.branch_id {
                filter.insert("course_details.branch_id", branch_id);
            }
        }
        if let Some(ref course_id) = filters.course_id {
            filter.insert("course_details.course_id", course_id);
        }
        if let Some(ref status) = filters.status {
            filter.insert("status", status);
        }

        let total = self
            .admissions
            .count_documents(filter.clone(), None)
            .await?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip((page - 1) * limit as u64)
            .limit(limit)
            .build();
        let cursor = self.admissions.find(filter, options).await?;
        let admissions: Vec<Admission> = cursor.try_collect().await?;

        Ok((admissions, total))
    }

    /// Apply a `$set` patch within scope and return the updated document.
    pub async fn update_admission(
        &self,
        scope: &AccessScope,
        id: &str,
        set: Document,
    ) -> Result<Option<Admission>> {
        let mut filter = scope.admission_filter();
        filter.insert("_id", id);

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .admissions
            .find_one_and_update(filter, doc! { "$set": set }, options)
            .await?;
        Ok(updated)
    }

    pub async fn delete_admission(&self, scope: &AccessScope, id: &str) -> Result<bool> {
        let mut filter = scope.admission_filter();
        filter.insert("_id", id);
        let result = self.admissions.delete_one(filter, None).await?;
        Ok(result.deleted_count == 1)
    }

    pub async fn admission_stats(&self, scope: &AccessScope) -> Result<AdmissionStats> {
        let filter = scope.admission_filter();

        let total = self
            .admissions
            .count_documents(filter.clone(), None)
            .await?;
        let mut active_filter = filter.clone();
        active_filter.insert("status", "ACTIVE");
        let active = self.admissions.count_documents(active_filter, None).await?;
        let mut completed_filter = filter.clone();
        completed_filter.insert("status", "COMPLETED");
        let completed = self
            .admissions
            .count_documents(completed_filter, None)
            .await?;

        let pipeline = vec![
            doc! { "$match": filter },
            doc! { "$group": {
                "_id": null,
                "total": { "$sum": "$payment_details.registration_fees" },
            }},
        ];
        let mut cursor = self.admissions.aggregate(pipeline, None).await?;
        let total_revenue = match cursor.try_next().await? {
            Some(doc) => doc.get_f64("total").unwrap_or(0.0),
            None => 0.0,
        };

        Ok(AdmissionStats {
            total_admissions: total,
            active_admissions: active,
            completed_admissions: completed,
            total_revenue,
        })
    }

    pub async fn course_stats(&self, scope: &AccessScope) -> Result<Vec<CourseStat>> {
        let pipeline = vec![
            doc! { "$match": scope.admission_filter() },
            doc! { "$group": {
                "_id": "$course_details.course_id",
                "count": { "$sum": 1 },
                "revenue": { "$sum": "$payment_details.registration_fees" },
            }},
            doc! { "$sort": { "count": -1 } },
        ];
        let mut cursor = self.admissions.aggregate(pipeline, None).await?;
        let mut stats = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            stats.push(mongodb::bson::from_document(doc)?);
        }
        Ok(stats)
    }

    // --- payments ---

    pub async fn create_payment(&self, payment: &Payment) -> Result<()> {
        self.payments.insert_one(payment, None).await?;
        Ok(())
    }

    /// Sum of verified, completed gateway/ledger payments for an admission.
    pub async fn sum_verified_payments(&self, admission_id: &str) -> Result<f64> {
        let pipeline = vec![
            doc! { "$match": {
                "admission_id": admission_id,
                "status": "COMPLETED",
                "verified": true,
            }},
            doc! { "$group": { "_id": null, "paid": { "$sum": "$amount" } } },
        ];
        let mut cursor = self.payments.aggregate(pipeline, None).await?;
        Ok(match cursor.try_next().await? {
            Some(doc) => doc.get_f64("paid").unwrap_or(0.0),
            None => 0.0,
        })
    }

    /// Recompute the admission's paid/pending/status from the payment ledger.
    ///
    /// The ledger is the source of truth: this runs after every verified
    /// payment, and re-running it repairs an admission left stale by a crash
    /// between the payment insert and this update.
    pub async fn reconcile_admission_ledger(
        &self,
        admission_id: &str,
    ) -> Result<Option<(f64, f64, PaymentStatus)>> {
        let admission = match self.find_admission_unscoped(admission_id).await? {
            Some(admission) => admission,
            None => return Ok(None),
        };

        let paid = self.sum_verified_payments(admission_id).await?;
        let (pending, status) =
            PaymentStatus::derive(admission.payment_details.total_fees, paid);

        self.admissions
            .update_one(
                doc! { "_id": admission_id },
                doc! { "$set": {
                    "payment_details.paid_amount": paid,
                    "payment_details.pending_amount": pending,
                    "payment_details.payment_status": mongodb::bson::to_bson(&status)?,
                    "updated_at": mongodb::bson::DateTime::now(),
                }},
                None,
            )
            .await?;

        Ok(Some((paid, pending, status)))
    }

    pub async fn payments_for_admission(
        &self,
        scope: &AccessScope,
        admission_id: &str,
    ) -> Result<Vec<Payment>> {
        let mut filter = scope.payment_filter();
        filter.insert("admission_id", admission_id);
        let options = FindOptions::builder()
            .sort(doc! { "payment_date": -1 })
            .build();
        let cursor = self.payments.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn payment_stats(&self, scope: &AccessScope) -> Result<PaymentStats> {
        let base = scope.payment_filter();

        let total_payments = self.payments.count_documents(base.clone(), None).await?;

        let mut completed = base.clone();
        completed.insert("status", "COMPLETED");

        let pipeline = vec![
            doc! { "$match": completed.clone() },
            doc! { "$group": { "_id": null, "amount": { "$sum": "$amount" } } },
        ];
        let mut cursor = self.payments.aggregate(pipeline, None).await?;
        let total_revenue = match cursor.try_next().await? {
            Some(doc) => doc.get_f64("amount").unwrap_or(0.0),
            None => 0.0,
        };

        let today_start = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
            .unwrap_or_else(Utc::now);
        let mut today_filter = completed;
        today_filter.insert(
            "payment_date",
            doc! { "$gte": mongodb::bson::DateTime::from_chrono(today_start) },
        );
        let pipeline = vec![
            doc! { "$match": today_filter },
            doc! { "$group": { "_id": null, "amount": { "$sum": "$amount" } } },
        ];
        let mut cursor = self.payments.aggregate(pipeline, None).await?;
        let today_revenue = match cursor.try_next().await? {
            Some(doc) => doc.get_f64("amount").unwrap_or(0.0),
            None => 0.0,
        };

        let pipeline = vec![
            doc! { "$match": base },
            doc! { "$group": {
                "_id": "$payment_method",
                "count": { "$sum": 1 },
                "amount": { "$sum": "$amount" },
            }},
        ];
        let mut cursor = self.payments.aggregate(pipeline, None).await?;
        let mut by_method = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            by_method.push(mongodb::bson::from_document(doc)?);
        }

        Ok(PaymentStats {
            total_payments,
            total_revenue,
            today_revenue,
            by_method,
        })
    }

    // --- installments ---

    /// Replace the admission's EMI schedule: drop existing rows, insert
    /// 1..=n fresh UNPAID rows at one-month due-date increments. Calling
    /// this twice leaves exactly n rows.
    pub async fn replace_installments(
        &self,
        admission_id: &str,
        count: u32,
        amount: f64,
        start: DateTime<Utc>,
    ) -> Result<Vec<Installment>> {
        self.installments
            .delete_many(doc! { "admission_id": admission_id }, None)
            .await?;

        let rows: Vec<Installment> = (1..=count)
            .map(|no| {
                Installment::new(
                    admission_id.to_string(),
                    no,
                    amount,
                    start + Months::new(no),
                )
            })
            .collect();
        self.installments.insert_many(&rows, None).await?;
        Ok(rows)
    }

    pub async fn find_installment(&self, id: &str) -> Result<Option<Installment>> {
        Ok(self.installments.find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn find_installment_by_no(
        &self,
        admission_id: &str,
        installment_no: u32,
    ) -> Result<Option<Installment>> {
        Ok(self
            .installments
            .find_one(
                doc! { "admission_id": admission_id, "installment_no": installment_no },
                None,
            )
            .await?)
    }

    pub async fn mark_installment_paid(&self, id: &str, payment_id: &str) -> Result<()> {
        self.installments
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "status": mongodb::bson::to_bson(&InstallmentStatus::Paid)?,
                    "paid_date": mongodb::bson::DateTime::now(),
                    "payment_id": payment_id,
                }},
                None,
            )
            .await?;
        Ok(())
    }

    /// List an admission's installments ordered by number.
    ///
    /// No scheduler exists, so the overdue sweep runs here: unpaid rows past
    /// their due date flip to OVERDUE before the read. OVERDUE rows stay
    /// payable.
    pub async fn installments_for_admission(
        &self,
        admission_id: &str,
    ) -> Result<Vec<Installment>> {
        self.sweep_overdue(admission_id).await?;

        let options = FindOptions::builder()
            .sort(doc! { "installment_no": 1 })
            .build();
        let cursor = self
            .installments
            .find(doc! { "admission_id": admission_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn sweep_overdue(&self, admission_id: &str) -> Result<()> {
        let cutoff = Utc::now();
        self.installments
            .update_many(
                doc! {
                    "admission_id": admission_id,
                    "status": mongodb::bson::to_bson(&InstallmentStatus::Unpaid)?,
                    "due_date": { "$lt": mongodb::bson::DateTime::from_chrono(cutoff) },
                },
                doc! { "$set": {
                    "status": mongodb::bson::to_bson(&InstallmentStatus::Overdue)?,
                }},
                None,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_receipts_are_year_scoped_and_zero_padded() {
        assert_eq!(format_admission_receipt(2026, 1), "ADM-2026-000001");
        assert_eq!(format_admission_receipt(2026, 123456), "ADM-2026-123456");
    }

    #[test]
    fn payment_receipts_are_compact() {
        assert_eq!(format_payment_receipt(2026, 7), "PAY20260007");
        assert_eq!(format_payment_receipt(2026, 12345), "PAY202612345");
    }
}
