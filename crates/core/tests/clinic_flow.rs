//! End-to-end flow over the assembled services: register a patient, log a
//! visit, issue a prescription, then delete the patient and observe the
//! documented no-cascade behaviour.

use chrono::{Datelike, Duration, Utc};
use hms_core::{
    AuthGate, CoreConfig, HmsError, Medication, MemoryStore, NewStaffAccount, PatientRegistry,
    PrescriptionLedger, RecordsFacade, Role, VisitLedger,
};
use std::sync::Arc;

struct Clinic {
    registry: PatientRegistry,
    visits: VisitLedger,
    prescriptions: PrescriptionLedger,
    facade: RecordsFacade,
    auth: AuthGate,
}

fn clinic() -> Clinic {
    let store = Arc::new(MemoryStore::new());
    let cfg = Arc::new(
        CoreConfig::new(
            "integration-test-secret-key".into(),
            Duration::hours(24),
            4,
        )
        .unwrap(),
    );

    let registry = PatientRegistry::new(store.clone());
    let visits = VisitLedger::new(store.clone(), store.clone());
    let prescriptions = PrescriptionLedger::new(store.clone(), store.clone(), store.clone());
    let facade = RecordsFacade::new(registry.clone(), visits.clone(), prescriptions.clone());
    let auth = AuthGate::new(store, cfg);

    Clinic {
        registry,
        visits,
        prescriptions,
        facade,
        auth,
    }
}

#[test]
fn full_patient_journey_with_no_cascade_on_delete() {
    let clinic = clinic();

    // Staff setup: seed an admin, then the admin registers a doctor.
    clinic
        .auth
        .seed_admin("admin", "admin-pass", "Clinic Admin", "admin@clinic.example")
        .unwrap();
    let (_, admin_token) = clinic.auth.login("admin", "admin-pass").unwrap();
    let doctor = clinic
        .auth
        .register(
            &admin_token,
            NewStaffAccount {
                username: "drmehta".into(),
                password: "s3cret-pw".into(),
                role: Role::Doctor,
                name: "R Mehta".into(),
                email: "drmehta@clinic.example".into(),
            },
        )
        .unwrap();

    // Register a patient and check the issued identifier.
    let patient = clinic.registry.register("Asha Rao", "9876543210").unwrap();
    let expected_prefix = format!("HMS-{}-", Utc::now().year());
    assert!(patient.unique_id.starts_with(&expected_prefix));
    let suffix = &patient.unique_id[expected_prefix.len()..];
    assert_eq!(suffix.len(), 4);
    assert!(suffix.bytes().all(|b| b.is_ascii_digit()));

    // Log a visit with 12-character notes.
    let notes = "12 char note";
    assert_eq!(notes.len(), 12);
    let visit = clinic.visits.log_visit(patient.id, notes).unwrap();
    assert_eq!(
        visit.patient.as_ref().unwrap().unique_id,
        patient.unique_id
    );
    assert_eq!(clinic.visits.list_for_patient(patient.id).len(), 1);

    // Issue a prescription with a single medication entry.
    let prescription = clinic
        .prescriptions
        .create(
            patient.id,
            doctor.id,
            vec![Medication {
                name: "amoxicillin".into(),
                dosage: "500 mg".into(),
                frequency: "twice daily".into(),
                duration: "5 days".into(),
            }],
            Some("take with food".into()),
        )
        .unwrap();
    assert_eq!(prescription.status, "pending");
    assert_eq!(clinic.prescriptions.list_for_patient(patient.id).len(), 1);

    // The facade joins everything.
    let detail = clinic.facade.patient_detail(patient.id).unwrap();
    assert_eq!(detail.visits.len(), 1);
    assert_eq!(detail.prescriptions.len(), 1);

    // Delete the patient: the record is gone...
    clinic.registry.delete(patient.id).unwrap();
    assert!(matches!(
        clinic.registry.get(patient.id),
        Err(HmsError::NotFound("patient"))
    ));

    // ...but visit and prescription history stays queryable. Deletion has
    // no cascade; the visit view now reports the patient as missing.
    let visits_after = clinic.visits.list_for_patient(patient.id);
    assert_eq!(visits_after.len(), 1);
    assert!(visits_after[0].patient.is_none());
    assert_eq!(clinic.prescriptions.list_for_patient(patient.id).len(), 1);
}

#[test]
fn concurrent_registrations_issue_distinct_ids() {
    let clinic = clinic();
    let registry = clinic.registry;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry
                    .register(&format!("Patient {i}"), "9876543210")
                    .unwrap()
                    .unique_id
            })
        })
        .collect();

    let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}

#[test]
fn search_supports_dashboard_lookups() {
    let clinic = clinic();
    let asha = clinic.registry.register("Asha Rao", "9876543210").unwrap();
    clinic.registry.register("Vikram Iyer", "9123456780").unwrap();

    let found = clinic.facade.search_patient(&asha.unique_id).unwrap();
    assert_eq!(found.id, asha.id);

    let filtered = clinic.facade.filter_patients("rao");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, asha.id);
}
