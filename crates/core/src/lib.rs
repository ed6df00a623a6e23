//! # HMS Core
//!
//! Clinical record domain model for a single-clinic records tool:
//! patient identity issuance, the patient → visit → prescription
//! relationship graph, and the authentication/authorization gate that
//! protects mutating operations.
//!
//! Services are constructed over an abstract document store
//! ([`store::MemoryStore`] in-process; the traits in [`store`] are the
//! seam for anything else) and hold no process-wide mutable state: the
//! store handle and [`CoreConfig`] are explicitly passed dependencies.
//!
//! **No API concerns**: HTTP transport, DTOs, and status-code mapping
//! belong in `hms-api-rest`.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod prescription;
pub mod search;
pub mod store;
pub mod validation;
pub mod visit;

pub use auth::{AccountSummary, AuthGate, Identity, NewStaffAccount, Role, StaffAccount};
pub use config::CoreConfig;
pub use error::{FieldErrors, HmsError, HmsResult};
pub use patient::{Patient, PatientRegistry, RemovedPatient};
pub use prescription::{Medication, Prescription, PrescriptionLedger};
pub use search::{PatientDetail, RecordsFacade};
pub use store::{
    AccountStore, MemoryStore, PatientStore, PrescriptionStore, UniqueViolation, VisitStore,
};
pub use visit::{PatientSummary, Visit, VisitLedger, VisitView};
