//! Patient registry: identity issuance and patient record CRUD.
//!
//! The registry is the exclusive owner of patient records and the sole
//! writer of the human-facing `unique_id`. Identifiers look like
//! `HMS-<year>-<4-digit suffix>`; the suffix is random and the store's
//! uniqueness constraint is the authoritative guard against collisions.
//! A rejected insert triggers regeneration, never a hard failure.

use crate::constants::{SUFFIX_MAX, SUFFIX_MIN, UNIQUE_ID_PREFIX};
use crate::error::{HmsError, HmsResult};
use crate::store::{PatientStore, UniqueViolation};
use crate::validation;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

/// A registered patient.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Patient {
    /// Internal primary key, store-assigned and opaque.
    pub id: Uuid,
    /// Human-facing identifier, immutable once assigned.
    pub unique_id: String,
    pub name: String,
    pub contact: String,
    pub registration_date: DateTime<Utc>,
}

/// Summary returned when a patient is deleted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RemovedPatient {
    pub id: Uuid,
    pub name: String,
    pub unique_id: String,
}

/// Source of the 4-digit unique-id suffix.
///
/// Production uses [`RandomSuffix`]; tests substitute a scripted source to
/// force collisions deterministically.
pub trait SuffixSource: Send + Sync {
    /// Returns a value in `1000..=9999`.
    fn next_suffix(&self) -> u16;
}

/// Thread-rng backed suffix source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> u16 {
        rand::thread_rng().gen_range(SUFFIX_MIN..=SUFFIX_MAX)
    }
}

/// Service owning patient identity and CRUD operations.
#[derive(Clone)]
pub struct PatientRegistry {
    store: Arc<dyn PatientStore>,
    suffixes: Arc<dyn SuffixSource>,
}

impl PatientRegistry {
    /// Creates a registry over the given store with random id suffixes.
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self::with_suffix_source(store, Arc::new(RandomSuffix))
    }

    /// Creates a registry with an explicit suffix source.
    pub fn with_suffix_source(store: Arc<dyn PatientStore>, suffixes: Arc<dyn SuffixSource>) -> Self {
        Self { store, suffixes }
    }

    /// Registers a new patient.
    ///
    /// Validates `name` (trimmed length >= 2) and `contact`
    /// (`[0-9+\-\s()]{10,15}`), then generates a candidate `unique_id`
    /// and inserts. If the store reports a duplicate `unique_id`, a fresh
    /// candidate is generated and the insert retried; the id space
    /// (9000 values per year) makes unbounded retry acceptable here.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Validation`] with a field → message map when
    /// either input is invalid; nothing is persisted in that case.
    pub fn register(&self, name: &str, contact: &str) -> HmsResult<Patient> {
        let (name, contact) = validation::patient_fields(name, contact)?;

        loop {
            let patient = Patient {
                id: Uuid::new_v4(),
                unique_id: self.generate_unique_id(),
                name: name.clone(),
                contact: contact.clone(),
                registration_date: Utc::now(),
            };

            match self.store.insert_patient(patient.clone()) {
                Ok(()) => {
                    tracing::info!(unique_id = %patient.unique_id, "patient registered");
                    return Ok(patient);
                }
                Err(UniqueViolation::UniqueId) => {
                    tracing::warn!(
                        unique_id = %patient.unique_id,
                        "unique id collision, regenerating"
                    );
                }
                Err(violation) => {
                    return Err(HmsError::Conflict(violation.field()));
                }
            }
        }
    }

    /// Fetches a patient by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::NotFound`] when the id is unknown.
    pub fn get(&self, id: Uuid) -> HmsResult<Patient> {
        self.store.patient(id).ok_or(HmsError::NotFound("patient"))
    }

    /// Lists all patients, most recently registered first.
    pub fn list(&self) -> Vec<Patient> {
        let mut patients = self.store.patients();
        patients.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));
        patients
    }

    /// Updates a patient's mutable fields (`name` and `contact`).
    ///
    /// `unique_id` and `registration_date` are never touched by this call.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Validation`] on invalid input or
    /// [`HmsError::NotFound`] when the id is unknown.
    pub fn update(&self, id: Uuid, name: &str, contact: &str) -> HmsResult<Patient> {
        let (name, contact) = validation::patient_fields(name, contact)?;

        let mut patient = self.get(id)?;
        patient.name = name;
        patient.contact = contact;

        if !self.store.save_patient(patient.clone()) {
            // Deleted between the read and the write.
            return Err(HmsError::NotFound("patient"));
        }
        Ok(patient)
    }

    /// Deletes a patient, returning a removal summary.
    ///
    /// Visits and prescriptions referencing the patient are left in place;
    /// their read views surface a missing patient instead (no cascade).
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::NotFound`] when the id is unknown.
    pub fn delete(&self, id: Uuid) -> HmsResult<RemovedPatient> {
        let removed = self
            .store
            .remove_patient(id)
            .ok_or(HmsError::NotFound("patient"))?;
        tracing::info!(unique_id = %removed.unique_id, "patient deleted");
        Ok(RemovedPatient {
            id: removed.id,
            name: removed.name,
            unique_id: removed.unique_id,
        })
    }

    fn generate_unique_id(&self) -> String {
        format!(
            "{}-{}-{}",
            UNIQUE_ID_PREFIX,
            Utc::now().year(),
            self.suffixes.next_suffix()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    /// Replays a scripted sequence of suffixes, then falls back to 9999.
    struct ScriptedSuffixes(Mutex<Vec<u16>>);

    impl ScriptedSuffixes {
        fn new(sequence: &[u16]) -> Self {
            let mut reversed = sequence.to_vec();
            reversed.reverse();
            Self(Mutex::new(reversed))
        }
    }

    impl SuffixSource for ScriptedSuffixes {
        fn next_suffix(&self) -> u16 {
            self.0.lock().unwrap().pop().unwrap_or(9999)
        }
    }

    fn registry() -> (Arc<MemoryStore>, PatientRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = PatientRegistry::new(store.clone());
        (store, registry)
    }

    fn unique_id_matches_format(unique_id: &str) -> bool {
        let mut parts = unique_id.split('-');
        parts.next() == Some("HMS")
            && parts.next().is_some_and(|y| y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()))
            && parts.next().is_some_and(|s| s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()))
            && parts.next().is_none()
    }

    #[test]
    fn register_produces_well_formed_unique_id() {
        let (_, registry) = registry();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();
        assert!(unique_id_matches_format(&patient.unique_id));
        assert!(patient
            .unique_id
            .contains(&Utc::now().year().to_string()));
    }

    #[test]
    fn register_rejects_invalid_input_without_persisting() {
        let (store, registry) = registry();
        let result = registry.register("A", "123");
        assert!(matches!(result, Err(HmsError::Validation(_))));
        assert_eq!(store.patient_count(), 0);
    }

    #[test]
    fn register_counts_name_characters_not_bytes() {
        let (store, registry) = registry();
        // A single accented character is still one character.
        let result = registry.register("é", "9876543210");
        assert!(matches!(result, Err(HmsError::Validation(_))));
        assert_eq!(store.patient_count(), 0);

        assert!(registry.register("Äli", "9876543210").is_ok());
    }

    #[test]
    fn registered_ids_are_unique_across_a_run() {
        let (_, registry) = registry();
        let mut seen = std::collections::HashSet::new();
        for i in 0..50 {
            let patient = registry
                .register(&format!("Patient {i}"), "9876543210")
                .unwrap();
            assert!(seen.insert(patient.unique_id));
        }
    }

    #[test]
    fn forced_suffix_collision_resolves_to_distinct_ids() {
        let store = Arc::new(MemoryStore::new());
        // Second registration draws 1234 twice before the store accepts 5678.
        let suffixes = Arc::new(ScriptedSuffixes::new(&[1234, 1234, 1234, 5678]));
        let registry = PatientRegistry::with_suffix_source(store, suffixes);

        let first = registry.register("Asha Rao", "9876543210").unwrap();
        let second = registry.register("Vikram Iyer", "9123456780").unwrap();

        assert_ne!(first.unique_id, second.unique_id);
        assert!(first.unique_id.ends_with("1234"));
        assert!(second.unique_id.ends_with("5678"));
    }

    #[test]
    fn list_orders_by_registration_date_descending() {
        let (store, registry) = registry();
        // Insert directly so the timestamps are fully controlled.
        for (i, name) in ["first", "second", "third"].iter().enumerate() {
            store
                .insert_patient(Patient {
                    id: Uuid::new_v4(),
                    unique_id: format!("HMS-2026-{}", 1000 + i),
                    name: (*name).to_owned(),
                    contact: "9876543210".into(),
                    registration_date: Utc::now() - chrono::Duration::days(3 - i as i64),
                })
                .unwrap();
        }
        let listed = registry.list();
        let names: Vec<&str> = listed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["third", "second", "first"]);
    }

    #[test]
    fn update_preserves_unique_id_and_registration_date() {
        let (_, registry) = registry();
        let original = registry.register("Asha Rao", "9876543210").unwrap();

        let updated = registry
            .update(original.id, "Asha R. Rao", "9123456780")
            .unwrap();

        assert_eq!(updated.unique_id, original.unique_id);
        assert_eq!(updated.registration_date, original.registration_date);
        assert_eq!(updated.name, "Asha R. Rao");
        assert_eq!(updated.contact, "9123456780");
    }

    #[test]
    fn update_validates_fields() {
        let (_, registry) = registry();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();
        assert!(matches!(
            registry.update(patient.id, "X", "9876543210"),
            Err(HmsError::Validation(_))
        ));
    }

    #[test]
    fn update_unknown_patient_is_not_found() {
        let (_, registry) = registry();
        assert!(matches!(
            registry.update(Uuid::new_v4(), "Asha Rao", "9876543210"),
            Err(HmsError::NotFound("patient"))
        ));
    }

    #[test]
    fn delete_then_get_returns_not_found() {
        let (_, registry) = registry();
        let patient = registry.register("Asha Rao", "9876543210").unwrap();

        let removed = registry.delete(patient.id).unwrap();
        assert_eq!(removed.unique_id, patient.unique_id);
        assert_eq!(removed.name, "Asha Rao");

        assert!(matches!(
            registry.get(patient.id),
            Err(HmsError::NotFound("patient"))
        ));
    }

    #[test]
    fn delete_unknown_patient_is_not_found() {
        let (_, registry) = registry();
        assert!(matches!(
            registry.delete(Uuid::new_v4()),
            Err(HmsError::NotFound("patient"))
        ));
    }
}
