//! Document-store abstraction and the in-process implementation.
//!
//! The persistent engine is an external collaborator: the core only needs
//! lookup by primary key, a handful of secondary predicates, and inserts
//! whose uniqueness violations are typed. Services receive store handles
//! as explicitly passed dependencies, never as process-wide singletons.
//!
//! Uniqueness enforcement inside the store is the *authoritative* guard
//! for `unique_id`, `username`, and `email`. Application-level pre-checks
//! are optimisations only and are never relied upon for correctness.

use crate::auth::StaffAccount;
use crate::patient::Patient;
use crate::prescription::Prescription;
use crate::visit::Visit;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// A uniqueness constraint rejected an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueViolation {
    /// Duplicate patient `unique_id`.
    UniqueId,
    /// Duplicate staff username.
    Username,
    /// Duplicate staff email.
    Email,
}

impl UniqueViolation {
    /// Name of the offending field, for conflict reporting.
    pub fn field(self) -> &'static str {
        match self {
            UniqueViolation::UniqueId => "unique_id",
            UniqueViolation::Username => "username",
            UniqueViolation::Email => "email",
        }
    }
}

/// Storage operations for patient records.
pub trait PatientStore: Send + Sync {
    /// Inserts a new patient. Fails with [`UniqueViolation::UniqueId`]
    /// when another patient already holds the same `unique_id`.
    fn insert_patient(&self, patient: Patient) -> Result<(), UniqueViolation>;

    /// Fetches a patient by primary key.
    fn patient(&self, id: Uuid) -> Option<Patient>;

    /// Returns all patients in unspecified order.
    fn patients(&self) -> Vec<Patient>;

    /// Overwrites an existing patient. Returns false when the id is
    /// unknown (nothing is written).
    fn save_patient(&self, patient: Patient) -> bool;

    /// Removes a patient, returning the removed record.
    fn remove_patient(&self, id: Uuid) -> Option<Patient>;

    /// Number of stored patients.
    fn patient_count(&self) -> usize;
}

/// Storage operations for visit records (append-only).
pub trait VisitStore: Send + Sync {
    fn insert_visit(&self, visit: Visit);
    fn visit(&self, id: Uuid) -> Option<Visit>;
    fn visits(&self) -> Vec<Visit>;
    fn visits_for_patient(&self, patient_id: Uuid) -> Vec<Visit>;
    fn visit_count(&self) -> usize;
}

/// Storage operations for prescription records.
pub trait PrescriptionStore: Send + Sync {
    fn insert_prescription(&self, prescription: Prescription);
    fn prescription(&self, id: Uuid) -> Option<Prescription>;
    fn prescriptions_for_patient(&self, patient_id: Uuid) -> Vec<Prescription>;
    fn prescription_count(&self) -> usize;
}

/// Storage operations for staff credential records.
pub trait AccountStore: Send + Sync {
    /// Inserts a new account. Fails with [`UniqueViolation::Username`] or
    /// [`UniqueViolation::Email`] when either value is already taken.
    fn insert_account(&self, account: StaffAccount) -> Result<(), UniqueViolation>;

    fn account(&self, id: Uuid) -> Option<StaffAccount>;
    fn account_by_username(&self, username: &str) -> Option<StaffAccount>;
    fn account_count(&self) -> usize;
}

/// In-process document store backed by `RwLock`'d maps.
///
/// This is the engine the binaries and tests run against. Each method
/// takes the relevant lock for the duration of one operation, which gives
/// the insert-time uniqueness checks the atomicity the domain relies on.
#[derive(Default)]
pub struct MemoryStore {
    patients: RwLock<HashMap<Uuid, Patient>>,
    visits: RwLock<HashMap<Uuid, Visit>>,
    prescriptions: RwLock<HashMap<Uuid, Prescription>>,
    accounts: RwLock<HashMap<Uuid, StaffAccount>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatientStore for MemoryStore {
    fn insert_patient(&self, patient: Patient) -> Result<(), UniqueViolation> {
        let mut patients = self.patients.write().expect("patient store lock poisoned");
        if patients.values().any(|p| p.unique_id == patient.unique_id) {
            return Err(UniqueViolation::UniqueId);
        }
        patients.insert(patient.id, patient);
        Ok(())
    }

    fn patient(&self, id: Uuid) -> Option<Patient> {
        self.patients
            .read()
            .expect("patient store lock poisoned")
            .get(&id)
            .cloned()
    }

    fn patients(&self) -> Vec<Patient> {
        self.patients
            .read()
            .expect("patient store lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn save_patient(&self, patient: Patient) -> bool {
        let mut patients = self.patients.write().expect("patient store lock poisoned");
        match patients.get_mut(&patient.id) {
            Some(slot) => {
                *slot = patient;
                true
            }
            None => false,
        }
    }

    fn remove_patient(&self, id: Uuid) -> Option<Patient> {
        self.patients
            .write()
            .expect("patient store lock poisoned")
            .remove(&id)
    }

    fn patient_count(&self) -> usize {
        self.patients
            .read()
            .expect("patient store lock poisoned")
            .len()
    }
}

impl VisitStore for MemoryStore {
    fn insert_visit(&self, visit: Visit) {
        self.visits
            .write()
            .expect("visit store lock poisoned")
            .insert(visit.id, visit);
    }

    fn visit(&self, id: Uuid) -> Option<Visit> {
        self.visits
            .read()
            .expect("visit store lock poisoned")
            .get(&id)
            .cloned()
    }

    fn visits(&self) -> Vec<Visit> {
        self.visits
            .read()
            .expect("visit store lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn visits_for_patient(&self, patient_id: Uuid) -> Vec<Visit> {
        self.visits
            .read()
            .expect("visit store lock poisoned")
            .values()
            .filter(|v| v.patient_id == patient_id)
            .cloned()
            .collect()
    }

    fn visit_count(&self) -> usize {
        self.visits.read().expect("visit store lock poisoned").len()
    }
}

impl PrescriptionStore for MemoryStore {
    fn insert_prescription(&self, prescription: Prescription) {
        self.prescriptions
            .write()
            .expect("prescription store lock poisoned")
            .insert(prescription.id, prescription);
    }

    fn prescription(&self, id: Uuid) -> Option<Prescription> {
        self.prescriptions
            .read()
            .expect("prescription store lock poisoned")
            .get(&id)
            .cloned()
    }

    fn prescriptions_for_patient(&self, patient_id: Uuid) -> Vec<Prescription> {
        self.prescriptions
            .read()
            .expect("prescription store lock poisoned")
            .values()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect()
    }

    fn prescription_count(&self) -> usize {
        self.prescriptions
            .read()
            .expect("prescription store lock poisoned")
            .len()
    }
}

impl AccountStore for MemoryStore {
    fn insert_account(&self, account: StaffAccount) -> Result<(), UniqueViolation> {
        let mut accounts = self.accounts.write().expect("account store lock poisoned");
        if accounts.values().any(|a| a.username == account.username) {
            return Err(UniqueViolation::Username);
        }
        if accounts.values().any(|a| a.email == account.email) {
            return Err(UniqueViolation::Email);
        }
        accounts.insert(account.id, account);
        Ok(())
    }

    fn account(&self, id: Uuid) -> Option<StaffAccount> {
        self.accounts
            .read()
            .expect("account store lock poisoned")
            .get(&id)
            .cloned()
    }

    fn account_by_username(&self, username: &str) -> Option<StaffAccount> {
        self.accounts
            .read()
            .expect("account store lock poisoned")
            .values()
            .find(|a| a.username == username)
            .cloned()
    }

    fn account_count(&self) -> usize {
        self.accounts
            .read()
            .expect("account store lock poisoned")
            .len()
    }
}
