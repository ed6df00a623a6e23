//! # HMS REST API
//!
//! REST boundary for the clinic records core.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Mapping domain errors to status codes and JSON bodies
//!
//! All domain semantics live in `hms-core`; this crate only translates.

#![warn(rust_2018_idioms)]

pub mod dto;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use hms_core::{
    AuthGate, CoreConfig, HmsError, MemoryStore, NewStaffAccount, PatientRegistry,
    PrescriptionLedger, RecordsFacade, VisitLedger,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use uuid::Uuid;

use dto::*;

/// Application state shared across REST handlers.
///
/// Holds the assembled domain services; they are cheap to clone (each is
/// a bundle of `Arc` handles).
#[derive(Clone)]
pub struct AppState {
    pub registry: PatientRegistry,
    pub visits: VisitLedger,
    pub prescriptions: PrescriptionLedger,
    pub facade: RecordsFacade,
    pub auth: AuthGate,
}

impl AppState {
    /// Wires every domain service over one shared store.
    pub fn assemble(store: Arc<MemoryStore>, cfg: Arc<CoreConfig>) -> Self {
        let registry = PatientRegistry::new(store.clone());
        let visits = VisitLedger::new(store.clone(), store.clone());
        let prescriptions =
            PrescriptionLedger::new(store.clone(), store.clone(), store.clone());
        let facade = RecordsFacade::new(registry.clone(), visits.clone(), prescriptions.clone());
        let auth = AuthGate::new(store, cfg);
        Self {
            registry,
            visits,
            prescriptions,
            facade,
            auth,
        }
    }
}

/// Domain error wrapped for HTTP presentation.
pub struct ApiError(HmsError);

impl From<HmsError> for ApiError {
    fn from(err: HmsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self.0 {
            HmsError::Validation(fields) => {
                let map = fields
                    .iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    "validation failed".to_owned(),
                    Some(map),
                )
            }
            HmsError::NotFound(kind) => (StatusCode::NOT_FOUND, format!("{kind} not found"), None),
            HmsError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "invalid credentials".to_owned(),
                None,
            ),
            HmsError::Forbidden => (
                StatusCode::FORBIDDEN,
                "insufficient permissions".to_owned(),
                None,
            ),
            HmsError::Conflict(field) => {
                (StatusCode::CONFLICT, format!("{field} already exists"), None)
            }
            HmsError::Internal(detail) => {
                // Log the detail, never send it to the client.
                tracing::error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_owned(),
                    None,
                )
            }
        };
        (status, Json(ErrorRes { message, errors })).into_response()
    }
}

/// Pulls the bearer token out of the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError(HmsError::Unauthorized))
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Search text matched against unique id, name, and contact.
    pub q: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        register_patient,
        search_patient,
        get_patient,
        patient_detail,
        update_patient,
        delete_patient,
        log_visit,
        list_visits,
        get_visit,
        list_patient_visits,
        create_prescription,
        get_prescription,
        list_patient_prescriptions,
        login,
        register_staff,
        current_account,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        PatientRes,
        RegisterPatientReq,
        UpdatePatientReq,
        ListPatientsRes,
        DeletePatientRes,
        PatientSummaryRes,
        LogVisitReq,
        VisitRes,
        ListVisitsRes,
        MedicationDto,
        CreatePrescriptionReq,
        PrescriptionRes,
        ListPrescriptionsRes,
        LoginReq,
        AccountRes,
        LoginRes,
        RegisterStaffReq,
        PatientDetailRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(register_patient))
        .route("/patients/search", get(search_patient))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/patients/:id/detail", get(patient_detail))
        .route("/visits", get(list_visits).post(log_visit))
        .route("/visits/:id", get(get_visit))
        .route("/visits/patient/:patient_id", get(list_patient_visits))
        .route("/prescriptions", post(create_prescription))
        .route("/prescriptions/:id", get(get_prescription))
        .route(
            "/prescriptions/patient/:patient_id",
            get(list_patient_prescriptions),
        )
        .route("/auth/login", post(login))
        .route("/auth/register", post(register_staff))
        .route("/auth/me", get(current_account))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used for monitoring and load balancers.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "HMS REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients",
    params(SearchQuery),
    responses(
        (status = 200, description = "List of patients", body = ListPatientsRes)
    )
)]
/// List patients, most recently registered first.
///
/// With `?q=`, filters by case-insensitive substring over unique id,
/// name, and contact.
async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ListPatientsRes> {
    let patients = state.facade.filter_patients(query.q.as_deref().unwrap_or(""));
    Json(ListPatientsRes {
        count: patients.len(),
        patients: patients.into_iter().map(PatientRes::from).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = RegisterPatientReq,
    responses(
        (status = 201, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Validation failed", body = ErrorRes)
    )
)]
/// Register a new patient; the server assigns the `HMS-<year>-<nnnn>`
/// unique id.
async fn register_patient(
    State(state): State<AppState>,
    Json(req): Json<RegisterPatientReq>,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let patient = state.registry.register(&req.name, &req.contact)?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

#[utoipa::path(
    get,
    path = "/patients/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Best matching patient", body = PatientRes),
        (status = 404, description = "No match", body = ErrorRes)
    )
)]
/// Find one patient by unique id (exact, then prefix).
async fn search_patient(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient = state
        .facade
        .search_patient(query.q.as_deref().unwrap_or(""))?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient primary key")),
    responses(
        (status = 200, description = "Patient record", body = PatientRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Fetch a single patient.
async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient = state.registry.get(id)?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/detail",
    params(("id" = Uuid, Path, description = "Patient primary key")),
    responses(
        (status = 200, description = "Patient with visit and prescription history", body = PatientDetailRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Patient joined with ordered visit and prescription history.
async fn patient_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PatientDetailRes>, ApiError> {
    let detail = state.facade.patient_detail(id)?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient primary key")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Updated patient", body = PatientRes),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Update a patient's name and contact. The unique id and registration
/// date never change.
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<PatientRes>, ApiError> {
    let patient = state.registry.update(id, &req.name, &req.contact)?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient primary key")),
    responses(
        (status = 200, description = "Deletion summary", body = DeletePatientRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Delete a patient. Existing visits and prescriptions are not cascaded.
async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletePatientRes>, ApiError> {
    let removed = state.registry.delete(id)?;
    Ok(Json(removed.into()))
}

#[utoipa::path(
    post,
    path = "/visits",
    request_body = LogVisitReq,
    responses(
        (status = 201, description = "Visit logged", body = VisitRes),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
/// Log a clinical encounter against an existing patient.
async fn log_visit(
    State(state): State<AppState>,
    Json(req): Json<LogVisitReq>,
) -> Result<(StatusCode, Json<VisitRes>), ApiError> {
    let visit = state.visits.log_visit(req.patient_id, &req.screening_notes)?;
    Ok((StatusCode::CREATED, Json(visit.into())))
}

#[utoipa::path(
    get,
    path = "/visits",
    responses(
        (status = 200, description = "All visits, most recent first", body = ListVisitsRes)
    )
)]
/// List every visit, most recent first.
async fn list_visits(State(state): State<AppState>) -> Json<ListVisitsRes> {
    let visits = state.visits.list_all();
    Json(ListVisitsRes {
        count: visits.len(),
        visits: visits.into_iter().map(VisitRes::from).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit record", body = VisitRes),
        (status = 404, description = "Visit not found", body = ErrorRes)
    )
)]
/// Fetch a single visit.
async fn get_visit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VisitRes>, ApiError> {
    let visit = state.visits.get(id)?;
    Ok(Json(visit.into()))
}

#[utoipa::path(
    get,
    path = "/visits/patient/{patient_id}",
    params(("patient_id" = Uuid, Path, description = "Patient primary key")),
    responses(
        (status = 200, description = "Visits for one patient", body = ListVisitsRes)
    )
)]
/// Visits for one patient, most recent first. Still answers after the
/// patient is deleted (the entries then carry no patient summary).
async fn list_patient_visits(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> Json<ListVisitsRes> {
    let visits = state.visits.list_for_patient(patient_id);
    Json(ListVisitsRes {
        count: visits.len(),
        visits: visits.into_iter().map(VisitRes::from).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/prescriptions",
    request_body = CreatePrescriptionReq,
    responses(
        (status = 201, description = "Prescription created", body = PrescriptionRes),
        (status = 400, description = "Validation failed", body = ErrorRes)
    )
)]
/// Create a prescription; the initial status is always `pending`.
async fn create_prescription(
    State(state): State<AppState>,
    Json(req): Json<CreatePrescriptionReq>,
) -> Result<(StatusCode, Json<PrescriptionRes>), ApiError> {
    let prescription = state.prescriptions.create(
        req.patient_id,
        req.doctor_id,
        req.medications.into_iter().map(Into::into).collect(),
        req.notes,
    )?;
    Ok((StatusCode::CREATED, Json(prescription.into())))
}

#[utoipa::path(
    get,
    path = "/prescriptions/{id}",
    params(("id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription record", body = PrescriptionRes),
        (status = 404, description = "Prescription not found", body = ErrorRes)
    )
)]
/// Fetch a single prescription.
async fn get_prescription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PrescriptionRes>, ApiError> {
    let prescription = state.prescriptions.get(id)?;
    Ok(Json(prescription.into()))
}

#[utoipa::path(
    get,
    path = "/prescriptions/patient/{patient_id}",
    params(("patient_id" = Uuid, Path, description = "Patient primary key")),
    responses(
        (status = 200, description = "Prescriptions for one patient", body = ListPrescriptionsRes)
    )
)]
/// Prescriptions for one patient, most recent first.
async fn list_patient_prescriptions(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> Json<ListPrescriptionsRes> {
    let prescriptions = state.prescriptions.list_for_patient(patient_id);
    Json(ListPrescriptionsRes {
        count: prescriptions.len(),
        prescriptions: prescriptions
            .into_iter()
            .map(PrescriptionRes::from)
            .collect(),
    })
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Account summary and bearer token", body = LoginRes),
        (status = 401, description = "Invalid credentials", body = ErrorRes)
    )
)]
/// Verify credentials and mint a 24-hour bearer token. Unknown usernames
/// and wrong passwords are indistinguishable in the response.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<LoginRes>, ApiError> {
    let (account, token) = state.auth.login(&req.username, &req.password)?;
    Ok(Json(LoginRes {
        account: account.into(),
        token,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterStaffReq,
    responses(
        (status = 201, description = "Staff account created", body = AccountRes),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 401, description = "Invalid token", body = ErrorRes),
        (status = 403, description = "Requester is not an admin", body = ErrorRes),
        (status = 409, description = "Username or email taken", body = ErrorRes)
    )
)]
/// Register a staff account. Requires a bearer token carrying the admin
/// role.
async fn register_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterStaffReq>,
) -> Result<(StatusCode, Json<AccountRes>), ApiError> {
    let token = bearer_token(&headers)?;
    let role = hms_core::auth::parse_role(&req.role)?;
    let summary = state.auth.register(
        token,
        NewStaffAccount {
            username: req.username,
            password: req.password,
            role,
            name: req.name,
            email: req.email,
        },
    )?;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Account behind the presented token", body = AccountRes),
        (status = 401, description = "Invalid token", body = ErrorRes)
    )
)]
/// Resolve the account behind the presented bearer token.
async fn current_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccountRes>, ApiError> {
    let token = bearer_token(&headers)?;
    let summary = state.auth.current_account(token)?;
    Ok(Json(summary.into()))
}
