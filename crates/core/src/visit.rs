//! Visit ledger: append-only log of clinical encounters.
//!
//! Visits are write-once (audit-trail semantics): there is no update or
//! delete operation. Each visit references exactly one patient by primary
//! key; the patient must exist at write time. Read views denormalize the
//! patient's name and unique id for display without duplicating them in
//! storage.
//!
//! The existence check and the subsequent write are not atomic with a
//! concurrent patient deletion. The documented policy is to allow the
//! resulting dangling reference: views simply report the patient as
//! missing. See [`VisitView::patient`].

use crate::error::{HmsError, HmsResult};
use crate::patient::Patient;
use crate::store::{PatientStore, VisitStore};
use crate::validation;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// A clinical encounter as persisted.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub date: DateTime<Utc>,
    pub screening_notes: String,
}

/// Denormalized display fields for the referenced patient.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub unique_id: String,
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
            unique_id: patient.unique_id.clone(),
        }
    }
}

/// A visit as returned by read paths, with the patient summary resolved
/// at query time. `patient` is `None` when the referenced patient has
/// since been deleted.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VisitView {
    pub id: Uuid,
    pub patient: Option<PatientSummary>,
    pub date: DateTime<Utc>,
    pub screening_notes: String,
}

/// Service recording and reading clinical encounters.
#[derive(Clone)]
pub struct VisitLedger {
    visits: Arc<dyn VisitStore>,
    patients: Arc<dyn PatientStore>,
}

impl VisitLedger {
    pub fn new(visits: Arc<dyn VisitStore>, patients: Arc<dyn PatientStore>) -> Self {
        Self { visits, patients }
    }

    /// Logs a new visit against an existing patient.
    ///
    /// Screening notes must be at least 10 characters after trimming, and
    /// the patient reference must resolve before the write.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Validation`] for short notes (nothing is
    /// persisted) or [`HmsError::NotFound`] when the patient is unknown.
    pub fn log_visit(&self, patient_id: Uuid, screening_notes: &str) -> HmsResult<VisitView> {
        let screening_notes = validation::screening_notes(screening_notes)?;

        let patient = self
            .patients
            .patient(patient_id)
            .ok_or(HmsError::NotFound("patient"))?;

        let visit = Visit {
            id: Uuid::new_v4(),
            patient_id,
            date: Utc::now(),
            screening_notes,
        };
        self.visits.insert_visit(visit.clone());
        tracing::info!(patient = %patient.unique_id, "visit logged");

        Ok(VisitView {
            id: visit.id,
            patient: Some(PatientSummary::from(&patient)),
            date: visit.date,
            screening_notes: visit.screening_notes,
        })
    }

    /// Fetches a single visit.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::NotFound`] when the id is unknown.
    pub fn get(&self, id: Uuid) -> HmsResult<VisitView> {
        let visit = self.visits.visit(id).ok_or(HmsError::NotFound("visit"))?;
        Ok(self.view(visit))
    }

    /// All visits, most recent first.
    pub fn list_all(&self) -> Vec<VisitView> {
        self.sorted_views(self.visits.visits())
    }

    /// Visits for one patient, most recent first.
    ///
    /// Remains queryable after the patient is deleted; the views then
    /// carry no patient summary.
    pub fn list_for_patient(&self, patient_id: Uuid) -> Vec<VisitView> {
        self.sorted_views(self.visits.visits_for_patient(patient_id))
    }

    fn sorted_views(&self, mut visits: Vec<Visit>) -> Vec<VisitView> {
        visits.sort_by(|a, b| b.date.cmp(&a.date));
        visits.into_iter().map(|v| self.view(v)).collect()
    }

    fn view(&self, visit: Visit) -> VisitView {
        let patient = self.patients.patient(visit.patient_id);
        if patient.is_none() {
            tracing::warn!(visit = %visit.id, "visit references a deleted patient");
        }
        VisitView {
            id: visit.id,
            patient: patient.as_ref().map(PatientSummary::from),
            date: visit.date,
            screening_notes: visit.screening_notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::PatientRegistry;
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, PatientRegistry, VisitLedger) {
        let store = Arc::new(MemoryStore::new());
        let registry = PatientRegistry::new(store.clone());
        let ledger = VisitLedger::new(store.clone(), store.clone());
        (store, registry, ledger)
    }

    #[test]
    fn log_visit_denormalizes_patient_fields() {
        let (_, registry, ledger) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let view = ledger
            .log_visit(patient.id, "complains of persistent cough")
            .unwrap();

        let summary = view.patient.unwrap();
        assert_eq!(summary.name, "Asha Rao");
        assert_eq!(summary.unique_id, patient.unique_id);
    }

    #[test]
    fn short_notes_fail_and_write_nothing() {
        let (store, registry, ledger) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let result = ledger.log_visit(patient.id, "  too short ");
        assert!(matches!(result, Err(HmsError::Validation(_))));
        assert_eq!(store.visit_count(), 0);
    }

    #[test]
    fn multibyte_short_notes_fail_and_write_nothing() {
        let (store, registry, ledger) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        // Five characters, fifteen bytes; must be counted as five.
        let result = ledger.log_visit(patient.id, "ありがとう");
        assert!(matches!(result, Err(HmsError::Validation(_))));
        assert_eq!(store.visit_count(), 0);
    }

    #[test]
    fn unknown_patient_fails_and_writes_nothing() {
        let (store, _, ledger) = setup();
        let result = ledger.log_visit(Uuid::new_v4(), "perfectly valid screening notes");
        assert!(matches!(result, Err(HmsError::NotFound("patient"))));
        assert_eq!(store.visit_count(), 0);
    }

    #[test]
    fn listings_are_ordered_by_date_descending() {
        let (store, registry, ledger) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();
        for offset in [3i64, 1, 2] {
            store.insert_visit(Visit {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                date: Utc::now() - chrono::Duration::days(offset),
                screening_notes: format!("notes from {offset} days ago"),
            });
        }

        let listed = ledger.list_for_patient(patient.id);
        assert_eq!(listed.len(), 3);
        assert!(listed.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn visits_survive_patient_deletion_without_summary() {
        let (_, registry, ledger) = setup();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();
        ledger
            .log_visit(patient.id, "routine follow-up, vitals stable")
            .unwrap();

        registry.delete(patient.id).unwrap();

        let listed = ledger.list_for_patient(patient.id);
        assert_eq!(listed.len(), 1);
        assert!(listed[0].patient.is_none());
    }

    #[test]
    fn get_unknown_visit_is_not_found() {
        let (_, _, ledger) = setup();
        assert!(matches!(
            ledger.get(Uuid::new_v4()),
            Err(HmsError::NotFound("visit"))
        ));
    }
}
