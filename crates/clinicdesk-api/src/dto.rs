//! Request and response DTOs
//!
//! Ids travel on the wire as bare UUID strings (serde's view of the
//! newtype); money amounts are minor units. Totals are never accepted from
//! the client.

use serde::{Deserialize, Serialize};
use validator::Validate;

use clinicdesk_types::{
    Gender, LineItem, MedicationLine, PatientSnapshot, PaymentMode, ReceiptId, VisitId,
    VisitStatus,
};
use clinicdesk_visits::PrescriptionContent;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PatientInput {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub phone: String,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
}

impl From<PatientInput> for PatientSnapshot {
    fn from(input: PatientInput) -> Self {
        Self {
            name: input.name,
            phone: input.phone,
            age: input.age,
            gender: input.gender,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVisitRequest {
    #[validate(nested)]
    pub patient: PatientInput,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListVisitsQuery {
    /// Defaults to today when omitted
    pub date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransitionRequest {
    pub status: VisitStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MedicationInput {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    pub dosage: String,
    pub schedule: String,
    pub duration: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PrescriptionRequest {
    pub diagnosis: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub medications: Vec<MedicationInput>,
    pub advice: Option<String>,
}

impl From<PrescriptionRequest> for PrescriptionContent {
    fn from(req: PrescriptionRequest) -> Self {
        Self {
            diagnosis: req.diagnosis,
            medications: req
                .medications
                .into_iter()
                .map(|m| MedicationLine {
                    name: m.name,
                    dosage: m.dosage,
                    schedule: m.schedule,
                    duration: m.duration,
                })
                .collect(),
            advice: req.advice,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    pub amount: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReceiptRequest {
    pub visit_id: Option<VisitId>,
    #[validate(nested)]
    pub patient: Option<PatientInput>,
    #[validate(length(min = 1, message = "a receipt needs at least one line item"), nested)]
    pub line_items: Vec<LineItemInput>,
    #[serde(default)]
    pub discount_amount: i64,
    pub discount_reason: Option<String>,
}

impl CreateReceiptRequest {
    pub fn line_items(&self) -> Vec<LineItem> {
        self.line_items
            .iter()
            .map(|item| LineItem {
                description: item.description.clone(),
                amount: item.amount,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct MarkPaidRequest {
    #[validate(length(min = 1, message = "must name at least one receipt"))]
    pub receipt_ids: Vec<ReceiptId>,
    pub payment_mode: Option<PaymentMode>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkPaidResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub receipt_id: ReceiptId,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SharedQuery {
    pub clinic_id: clinicdesk_types::ClinicId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(range(min = 1, max = 60, message = "must be between 1 and 60"))]
    pub share_duration_minutes: Option<u32>,
}
