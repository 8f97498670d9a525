//! Admission request/response schemas.
//!
//! Nested admission data arrives as one JSON document (the `data` multipart
//! field) and is deserialized exactly once here; handlers never touch
//! untyped values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{Admission, AdmissionStatus, Gender, PaymentPlan};

fn validate_digits_10(value: &str) -> Result<(), ValidationError> {
    if value.len() == 10 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("mobile_format"))
    }
}

fn validate_digits_6(value: &str) -> Result<(), ValidationError> {
    if value.len() == 6 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("pincode_format"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PersonalDetailsInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = validate_digits_10, message = "Mobile must be 10 digits"))]
    pub mobile: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 1, message = "Address line1 is required"))]
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "District is required"))]
    pub district: String,
    #[validate(custom(function = validate_digits_6, message = "Pincode must be 6 digits"))]
    pub pincode: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CourseSelectionInput {
    #[validate(length(min = 1, message = "Course is required"))]
    pub course_id: String,
    pub batch_id: Option<String>,
    #[validate(length(min = 1, message = "Branch is required"))]
    pub branch_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentSetupInput {
    pub payment_type: PaymentPlan,
    #[validate(range(min = 0.0, message = "Registration fees cannot be negative"))]
    #[serde(default)]
    pub registration_fees: f64,
    #[validate(range(min = 1, max = 12, message = "Installments must be between 1 and 12"))]
    pub number_of_installments: Option<u32>,
    pub installment_amount: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdmissionRequest {
    #[validate(length(min = 1, message = "Student is required"))]
    pub student_id: String,
    #[validate(nested)]
    pub personal_details: PersonalDetailsInput,
    #[validate(nested)]
    pub address: AddressInput,
    #[validate(nested)]
    pub course_details: CourseSelectionInput,
    #[validate(nested)]
    pub payment_details: PaymentSetupInput,
}

/// Merge-patch bodies: keys absent from a sub-document patch are preserved.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PersonalDetailsPatch {
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AddressPatch {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CourseDetailsPatch {
    pub batch_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PaymentDetailsPatch {
    pub registration_fees: Option<f64>,
    pub number_of_installments: Option<u32>,
    pub installment_amount: Option<f64>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAdmissionRequest {
    pub status: Option<AdmissionStatus>,
    pub personal_details: Option<PersonalDetailsPatch>,
    pub address: Option<AddressPatch>,
    pub course_details: Option<CourseDetailsPatch>,
    pub payment_details: Option<PaymentDetailsPatch>,
}

#[derive(Debug, Deserialize)]
pub struct AdmissionListParams {
    pub page: Option<u64>,
    pub limit: Option<i64>,
    pub branch_id: Option<String>,
    pub course_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: i64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct AdmissionListResponse {
    pub admissions: Vec<AdmissionView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct AdmissionResponse {
    pub message: String,
    pub admission: AdmissionView,
}

/// JSON projection of an admission (datetimes as RFC 3339 strings).
///
/// Single-record responses additionally expand the student/creator/course/
/// branch references into display names; list responses keep the bare ids.
#[derive(Debug, Serialize)]
pub struct AdmissionView {
    pub id: String,
    pub receipt_number: String,
    pub status: AdmissionStatus,
    pub student_id: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    pub personal_details: crate::models::PersonalDetails,
    pub address: crate::models::Address,
    pub course_details: crate::models::CourseDetails,
    pub payment_details: crate::models::PaymentDetails,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Admission> for AdmissionView {
    fn from(a: Admission) -> Self {
        Self {
            id: a.id,
            receipt_number: a.receipt_number,
            status: a.status,
            student_id: a.student_id,
            created_by: a.created_by,
            student_name: None,
            created_by_name: None,
            course_title: None,
            branch_name: None,
            personal_details: a.personal_details,
            address: a.address,
            course_details: a.course_details,
            payment_details: a.payment_details,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}
