//! Request/response shapes for the REST boundary.
//!
//! These mirror the wire contract of the original clinic server: list
//! responses carry a `count`, visit payloads embed a patient summary, and
//! account payloads never contain password material.

use chrono::{DateTime, Utc};
use hms_core::{
    AccountSummary, Medication, Patient, PatientDetail, PatientSummary, Prescription,
    RemovedPatient, VisitView,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Health probe response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body: a human-readable message plus, for validation failures,
/// the field → message map.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PatientRes {
    pub id: Uuid,
    pub unique_id: String,
    pub name: String,
    pub contact: String,
    pub registration_date: DateTime<Utc>,
}

impl From<Patient> for PatientRes {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            unique_id: p.unique_id,
            name: p.name,
            contact: p.contact,
            registration_date: p.registration_date,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPatientReq {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListPatientsRes {
    pub count: usize,
    pub patients: Vec<PatientRes>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletePatientRes {
    pub id: Uuid,
    pub name: String,
    pub unique_id: String,
}

impl From<RemovedPatient> for DeletePatientRes {
    fn from(r: RemovedPatient) -> Self {
        Self {
            id: r.id,
            name: r.name,
            unique_id: r.unique_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PatientSummaryRes {
    pub id: Uuid,
    pub name: String,
    pub unique_id: String,
}

impl From<PatientSummary> for PatientSummaryRes {
    fn from(s: PatientSummary) -> Self {
        Self {
            id: s.id,
            name: s.name,
            unique_id: s.unique_id,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LogVisitReq {
    pub patient_id: Uuid,
    pub screening_notes: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VisitRes {
    pub id: Uuid,
    /// Absent when the referenced patient has since been deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientSummaryRes>,
    pub date: DateTime<Utc>,
    pub screening_notes: String,
}

impl From<VisitView> for VisitRes {
    fn from(v: VisitView) -> Self {
        Self {
            id: v.id,
            patient: v.patient.map(PatientSummaryRes::from),
            date: v.date,
            screening_notes: v.screening_notes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListVisitsRes {
    pub count: usize,
    pub visits: Vec<VisitRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicationDto {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

impl From<MedicationDto> for Medication {
    fn from(m: MedicationDto) -> Self {
        Self {
            name: m.name,
            dosage: m.dosage,
            frequency: m.frequency,
            duration: m.duration,
        }
    }
}

impl From<Medication> for MedicationDto {
    fn from(m: Medication) -> Self {
        Self {
            name: m.name,
            dosage: m.dosage,
            frequency: m.frequency,
            duration: m.duration,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePrescriptionReq {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medications: Vec<MedicationDto>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrescriptionRes {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medications: Vec<MedicationDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
    pub status: String,
}

impl From<Prescription> for PrescriptionRes {
    fn from(p: Prescription) -> Self {
        Self {
            id: p.id,
            patient_id: p.patient_id,
            doctor_id: p.doctor_id,
            medications: p.medications.into_iter().map(MedicationDto::from).collect(),
            notes: p.notes.map(hms_types::NonEmptyText::into_inner),
            date: p.date,
            status: p.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListPrescriptionsRes {
    pub count: usize,
    pub prescriptions: Vec<PrescriptionRes>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountRes {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub name: String,
    pub email: String,
}

impl From<AccountSummary> for AccountRes {
    fn from(a: AccountSummary) -> Self {
        Self {
            id: a.id,
            username: a.username,
            role: a.role.to_string(),
            name: a.name,
            email: a.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginRes {
    pub account: AccountRes,
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterStaffReq {
    pub username: String,
    pub password: String,
    /// One of `admin`, `receptionist`, `doctor`.
    pub role: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PatientDetailRes {
    pub patient: PatientRes,
    pub visits: Vec<VisitRes>,
    pub prescriptions: Vec<PrescriptionRes>,
}

impl From<PatientDetail> for PatientDetailRes {
    fn from(d: PatientDetail) -> Self {
        Self {
            patient: d.patient.into(),
            visits: d.visits.into_iter().map(VisitRes::from).collect(),
            prescriptions: d
                .prescriptions
                .into_iter()
                .map(PrescriptionRes::from)
                .collect(),
        }
    }
}
