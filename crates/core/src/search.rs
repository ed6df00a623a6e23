//! Query/aggregation facade.
//!
//! Composes the patient registry, visit ledger, and prescription ledger to
//! answer the search and dashboard lookups. Everything here is read-only
//! and assembled at query time; there is no materialised denormalization
//! beyond the display fields the visit views already carry.

use crate::error::{HmsError, HmsResult};
use crate::patient::{Patient, PatientRegistry};
use crate::prescription::{Prescription, PrescriptionLedger};
use crate::visit::{VisitLedger, VisitView};
use uuid::Uuid;

/// A patient joined with their full visit and prescription history.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PatientDetail {
    pub patient: Patient,
    /// Most recent first.
    pub visits: Vec<VisitView>,
    /// Most recent first.
    pub prescriptions: Vec<Prescription>,
}

/// Read-only facade over the three record services.
#[derive(Clone)]
pub struct RecordsFacade {
    registry: PatientRegistry,
    visits: VisitLedger,
    prescriptions: PrescriptionLedger,
}

impl RecordsFacade {
    pub fn new(
        registry: PatientRegistry,
        visits: VisitLedger,
        prescriptions: PrescriptionLedger,
    ) -> Self {
        Self {
            registry,
            visits,
            prescriptions,
        }
    }

    /// Finds a single patient by their human-facing identifier.
    ///
    /// An exact `unique_id` match wins; otherwise the most recently
    /// registered patient whose `unique_id` starts with the query is
    /// returned. Matching is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::NotFound`] when nothing matches.
    pub fn search_patient(&self, query: &str) -> HmsResult<Patient> {
        let query = query.trim().to_ascii_uppercase();
        if query.is_empty() {
            return Err(HmsError::NotFound("patient"));
        }

        let patients = self.registry.list();
        if let Some(exact) = patients
            .iter()
            .find(|p| p.unique_id.to_ascii_uppercase() == query)
        {
            return Ok(exact.clone());
        }
        // list() is registration-date descending, so the first prefix hit
        // is the most recent.
        patients
            .into_iter()
            .find(|p| p.unique_id.to_ascii_uppercase().starts_with(&query))
            .ok_or(HmsError::NotFound("patient"))
    }

    /// Case-insensitive substring filter over unique id, name, and
    /// contact, for list views. An empty query returns every patient.
    /// Ordered most recently registered first.
    pub fn filter_patients(&self, query: &str) -> Vec<Patient> {
        let query = query.trim().to_lowercase();
        let patients = self.registry.list();
        if query.is_empty() {
            return patients;
        }
        patients
            .into_iter()
            .filter(|p| {
                p.unique_id.to_lowercase().contains(&query)
                    || p.name.to_lowercase().contains(&query)
                    || p.contact.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Joins a patient with their ordered visit and prescription history.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::NotFound`] when the patient id is unknown.
    pub fn patient_detail(&self, id: Uuid) -> HmsResult<PatientDetail> {
        let patient = self.registry.get(id)?;
        Ok(PatientDetail {
            visits: self.visits.list_for_patient(patient.id),
            prescriptions: self.prescriptions.list_for_patient(patient.id),
            patient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, StaffAccount};
    use crate::prescription::Medication;
    use crate::store::{AccountStore, MemoryStore};
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryStore>, RecordsFacade, PatientRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = PatientRegistry::new(store.clone());
        let visits = VisitLedger::new(store.clone(), store.clone());
        let prescriptions =
            PrescriptionLedger::new(store.clone(), store.clone(), store.clone());
        let facade = RecordsFacade::new(registry.clone(), visits, prescriptions);
        (store, facade, registry)
    }

    #[test]
    fn exact_unique_id_match_wins() {
        let (_, facade, registry) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let found = facade.search_patient(&patient.unique_id).unwrap();
        assert_eq!(found.id, patient.id);
    }

    #[test]
    fn search_is_case_insensitive() {
        let (_, facade, registry) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let found = facade
            .search_patient(&patient.unique_id.to_lowercase())
            .unwrap();
        assert_eq!(found.id, patient.id);
    }

    #[test]
    fn prefix_match_falls_back_when_no_exact_hit() {
        let (_, facade, registry) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let prefix = &patient.unique_id[..8]; // "HMS-YYYY"
        let found = facade.search_patient(prefix).unwrap();
        assert_eq!(found.id, patient.id);
    }

    #[test]
    fn unmatched_query_is_not_found() {
        let (_, facade, registry) = setup();
        registry.register("Asha Rao", "9876543210").unwrap();
        assert!(matches!(
            facade.search_patient("HMS-1999-0000"),
            Err(HmsError::NotFound("patient"))
        ));
        assert!(matches!(
            facade.search_patient("   "),
            Err(HmsError::NotFound("patient"))
        ));
    }

    #[test]
    fn filter_matches_name_and_contact_substrings() {
        let (_, facade, registry) = setup();
        registry.register("Asha Rao", "9876543210").unwrap();
        registry.register("Vikram Iyer", "9123456780").unwrap();

        assert_eq!(facade.filter_patients("asha").len(), 1);
        assert_eq!(facade.filter_patients("912345").len(), 1);
        assert_eq!(facade.filter_patients("").len(), 2);
        assert!(facade.filter_patients("zzz").is_empty());
    }

    #[test]
    fn patient_detail_joins_all_three_ledgers() {
        let (store, facade, registry) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let doctor = StaffAccount {
            id: uuid::Uuid::new_v4(),
            username: "drmehta".into(),
            password_hash: "$2b$04$unusedhashunusedhashunusedha".into(),
            role: Role::Doctor,
            name: "R Mehta".into(),
            email: "drmehta@clinic.example".into(),
        };
        let doctor_id = doctor.id;
        store.insert_account(doctor).unwrap();

        let visits = VisitLedger::new(store.clone(), store.clone());
        visits
            .log_visit(patient.id, "screening notes long enough")
            .unwrap();

        let prescriptions =
            PrescriptionLedger::new(store.clone(), store.clone(), store.clone());
        prescriptions
            .create(
                patient.id,
                doctor_id,
                vec![Medication {
                    name: "amoxicillin".into(),
                    dosage: "500 mg".into(),
                    frequency: "twice daily".into(),
                    duration: "5 days".into(),
                }],
                None,
            )
            .unwrap();

        let detail = facade.patient_detail(patient.id).unwrap();
        assert_eq!(detail.patient.id, patient.id);
        assert_eq!(detail.visits.len(), 1);
        assert_eq!(detail.prescriptions.len(), 1);
    }

    #[test]
    fn detail_for_unknown_patient_is_not_found() {
        let (_, facade, _) = setup();
        assert!(matches!(
            facade.patient_detail(uuid::Uuid::new_v4()),
            Err(HmsError::NotFound("patient"))
        ));
    }
}
