//! Prescription ledger: medication orders tied to a patient and the
//! issuing staff member.
//!
//! Every prescription carries a non-empty, ordered list of medication
//! entries. The lifecycle `status` field starts as `"pending"` and is
//! otherwise treated as an opaque string; no transition machinery is
//! defined here.

use crate::constants::PRESCRIPTION_STATUS_PENDING;
use crate::error::{FieldErrors, HmsError, HmsResult};
use crate::store::{AccountStore, PatientStore, PrescriptionStore};
use chrono::{DateTime, Utc};
use hms_types::NonEmptyText;
use std::sync::Arc;
use uuid::Uuid;

/// One entry in a prescription's medication list. All fields required.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

/// A medication order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// Staff account that issued the order.
    pub doctor_id: Uuid,
    pub medications: Vec<Medication>,
    /// Free-text notes; whitespace-only input collapses to `None`.
    pub notes: Option<NonEmptyText>,
    pub date: DateTime<Utc>,
    /// Opaque lifecycle status; the core only ever assigns `"pending"`.
    pub status: String,
}

/// Service recording and reading medication orders.
#[derive(Clone)]
pub struct PrescriptionLedger {
    prescriptions: Arc<dyn PrescriptionStore>,
    patients: Arc<dyn PatientStore>,
    accounts: Arc<dyn AccountStore>,
}

impl PrescriptionLedger {
    pub fn new(
        prescriptions: Arc<dyn PrescriptionStore>,
        patients: Arc<dyn PatientStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            prescriptions,
            patients,
            accounts,
        }
    }

    /// Creates a prescription with `status = "pending"`.
    ///
    /// The medication list must be non-empty with every entry fully
    /// populated, and both the patient and doctor references must resolve
    /// to existing records.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Validation`] naming each failing field
    /// (including unresolved references, keyed `patient_id`/`doctor_id`);
    /// nothing is persisted on failure.
    pub fn create(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        medications: Vec<Medication>,
        notes: Option<String>,
    ) -> HmsResult<Prescription> {
        let mut errors = FieldErrors::new();

        if medications.is_empty() {
            errors.push("medications", "at least one medication is required");
        }
        for (index, medication) in medications.iter().enumerate() {
            for (field, value) in [
                ("name", &medication.name),
                ("dosage", &medication.dosage),
                ("frequency", &medication.frequency),
                ("duration", &medication.duration),
            ] {
                if value.trim().is_empty() {
                    errors.push(
                        format!("medications[{index}].{field}"),
                        format!("medication {field} is required"),
                    );
                }
            }
        }

        if self.patients.patient(patient_id).is_none() {
            errors.push("patient_id", "patient not found");
        }
        if self.accounts.account(doctor_id).is_none() {
            errors.push("doctor_id", "doctor not found");
        }

        errors.into_result()?;

        let medications = medications
            .into_iter()
            .map(|m| Medication {
                name: m.name.trim().to_owned(),
                dosage: m.dosage.trim().to_owned(),
                frequency: m.frequency.trim().to_owned(),
                duration: m.duration.trim().to_owned(),
            })
            .collect();

        let prescription = Prescription {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            medications,
            notes: notes.and_then(|n| NonEmptyText::new(n).ok()),
            date: Utc::now(),
            status: PRESCRIPTION_STATUS_PENDING.to_owned(),
        };
        self.prescriptions.insert_prescription(prescription.clone());
        tracing::info!(prescription = %prescription.id, "prescription created");
        Ok(prescription)
    }

    /// Fetches a single prescription.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::NotFound`] when the id is unknown.
    pub fn get(&self, id: Uuid) -> HmsResult<Prescription> {
        self.prescriptions
            .prescription(id)
            .ok_or(HmsError::NotFound("prescription"))
    }

    /// Prescriptions for one patient, most recent first.
    ///
    /// Remains queryable after the patient is deleted (no cascade).
    pub fn list_for_patient(&self, patient_id: Uuid) -> Vec<Prescription> {
        let mut prescriptions = self.prescriptions.prescriptions_for_patient(patient_id);
        prescriptions.sort_by(|a, b| b.date.cmp(&a.date));
        prescriptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, StaffAccount};
    use crate::patient::PatientRegistry;
    use crate::store::MemoryStore;

    fn medication(name: &str) -> Medication {
        Medication {
            name: name.into(),
            dosage: "500 mg".into(),
            frequency: "twice daily".into(),
            duration: "5 days".into(),
        }
    }

    fn setup() -> (Arc<MemoryStore>, PatientRegistry, PrescriptionLedger, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let registry = PatientRegistry::new(store.clone());
        let ledger = PrescriptionLedger::new(store.clone(), store.clone(), store.clone());

        let doctor = StaffAccount {
            id: Uuid::new_v4(),
            username: "drmehta".into(),
            password_hash: "$2b$04$unusedhashunusedhashunusedha".into(),
            role: Role::Doctor,
            name: "R Mehta".into(),
            email: "drmehta@clinic.example".into(),
        };
        let doctor_id = doctor.id;
        store.insert_account(doctor).unwrap();

        (store, registry, ledger, doctor_id)
    }

    #[test]
    fn create_assigns_pending_status() {
        let (_, registry, ledger, doctor_id) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let prescription = ledger
            .create(patient.id, doctor_id, vec![medication("amoxicillin")], None)
            .unwrap();

        assert_eq!(prescription.status, "pending");
        assert_eq!(prescription.medications.len(), 1);
    }

    #[test]
    fn empty_medication_list_is_rejected() {
        let (store, registry, ledger, doctor_id) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let result = ledger.create(patient.id, doctor_id, vec![], None);
        match result {
            Err(HmsError::Validation(fields)) => {
                assert!(fields.get("medications").is_some());
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(store.prescription_count(), 0);
    }

    #[test]
    fn incomplete_medication_entry_is_rejected() {
        let (store, registry, ledger, doctor_id) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let mut incomplete = medication("amoxicillin");
        incomplete.dosage = "  ".into();

        let result = ledger.create(patient.id, doctor_id, vec![incomplete], None);
        match result {
            Err(HmsError::Validation(fields)) => {
                assert!(fields.get("medications[0].dosage").is_some());
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(store.prescription_count(), 0);
    }

    #[test]
    fn unresolved_references_are_reported_per_field() {
        let (store, _, ledger, _) = setup();
        let result = ledger.create(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![medication("amoxicillin")],
            None,
        );
        match result {
            Err(HmsError::Validation(fields)) => {
                assert_eq!(fields.get("patient_id"), Some("patient not found"));
                assert_eq!(fields.get("doctor_id"), Some("doctor not found"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(store.prescription_count(), 0);
    }

    #[test]
    fn blank_notes_are_stored_as_none() {
        let (_, registry, ledger, doctor_id) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let prescription = ledger
            .create(
                patient.id,
                doctor_id,
                vec![medication("amoxicillin")],
                Some("   ".into()),
            )
            .unwrap();
        assert!(prescription.notes.is_none());
    }

    #[test]
    fn list_for_patient_orders_by_date_descending() {
        let (store, registry, ledger, doctor_id) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        for offset in [2i64, 0, 1] {
            store.insert_prescription(Prescription {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                doctor_id,
                medications: vec![medication("amoxicillin")],
                notes: None,
                date: Utc::now() - chrono::Duration::days(offset),
                status: "pending".into(),
            });
        }

        let listed = ledger.list_for_patient(patient.id);
        assert_eq!(listed.len(), 3);
        assert!(listed.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn get_unknown_prescription_is_not_found() {
        let (_, _, ledger, _) = setup();
        assert!(matches!(
            ledger.get(Uuid::new_v4()),
            Err(HmsError::NotFound("prescription"))
        ));
    }
}
