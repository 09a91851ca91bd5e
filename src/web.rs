use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::display::{grid_rows, GridRow};
use crate::export::{workbook_bytes, WORKBOOK_FILE, XLSX_CONTENT_TYPE};
use crate::parser::read_availability;
use crate::schedule::{Allocator, Person, RandomTieBreak, Roster, Slot, Workload};

// Last upload and last generated roster, in memory only.
// Lock order is always people, then roster.
pub struct AppState {
    pub people: Mutex<Option<Vec<Person>>>,
    pub roster: Mutex<Option<GeneratedRoster>>,
    pub admin_password: String,
    pub allocator: Allocator,
}

impl AppState {
    pub fn new(admin_password: String, allocator: Allocator) -> Self {
        Self {
            people: Mutex::new(None),
            roster: Mutex::new(None),
            admin_password,
            allocator,
        }
    }

    /// Runs a fresh randomized allocation and stores it as the current roster.
    /// Callers hold the `people` guard so the stored pair always matches.
    fn store_roster(&self, people: &[Person]) -> Result<GeneratedRoster> {
        let roster = self.allocator.allocate(people, &Slot::universe(), &mut RandomTieBreak::from_thread_rng());
        let generated = GeneratedRoster {
            generated_at: Utc::now(),
            roster,
        };
        *lock(&self.roster)? = Some(generated.clone());
        Ok(generated)
    }

    /// Replaces the stored responses and their roster together
    pub fn replace(&self, people: Vec<Person>) -> Result<GeneratedRoster> {
        let mut stored = lock(&self.people)?;
        let generated = self.store_roster(&people)?;
        *stored = Some(people);
        Ok(generated)
    }

    /// New layout over the stored responses; `None` before the first upload
    pub fn regenerate(&self) -> Result<Option<(usize, GeneratedRoster)>> {
        let stored = lock(&self.people)?;
        let Some(people) = stored.as_ref() else {
            return Ok(None);
        };
        let generated = self.store_roster(people)?;
        Ok(Some((people.len(), generated)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedRoster {
    pub generated_at: DateTime<Utc>,
    pub roster: Roster,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    success: bool,
    generated_at: DateTime<Utc>,
    people: usize,
    covered_slots: usize,
    alerts: usize,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    generated_at: DateTime<Utc>,
    grid: Vec<GridRow>,
    uncovered: Vec<Slot>,
    alerts: Vec<String>,
    unassignable: Vec<String>,
    unplaced: Vec<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    workload: Vec<Workload>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("state lock poisoned"))
}

fn is_admin(req: &HttpRequest, state: &AppState) -> bool {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    !password.is_empty() && password == state.admin_password
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Não autorizado"}))
}

fn generate_response(people: usize, generated: &GeneratedRoster) -> GenerateResponse {
    GenerateResponse {
        success: true,
        generated_at: generated.generated_at,
        people,
        covered_slots: generated.roster.slots.iter().filter(|a| !a.people.is_empty()).count(),
        alerts: generated.roster.alerts.len(),
    }
}

// Admin login endpoint
async fn admin_login(req: web::Json<LoginRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    if !req.password.is_empty() && req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Senha inválida"})))
    }
}

// Availability CSV upload: replaces the stored responses and generates a roster
async fn admin_upload(req: HttpRequest, body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    let people = match read_availability(&body[..]) {
        Ok(people) => people,
        Err(e) => {
            warn!(error = %e, "rejected availability upload");
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Falha ao processar o CSV: {}", e)
            })));
        }
    };

    info!(people = people.len(), "availability uploaded");
    let count = people.len();
    let generated = state.replace(people)?;

    Ok(HttpResponse::Ok().json(generate_response(count, &generated)))
}

// New randomized layout over the stored responses
async fn admin_generate(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    let Some((count, generated)) = state.regenerate()? else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Nenhuma disponibilidade enviada"})));
    };

    Ok(HttpResponse::Ok().json(generate_response(count, &generated)))
}

async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    let current = lock(&state.roster)?;
    let Some(generated) = current.as_ref() else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Escala não disponível"})));
    };

    let roster = &generated.roster;
    Ok(HttpResponse::Ok().json(ScheduleResponse {
        generated_at: generated.generated_at,
        grid: grid_rows(roster),
        uncovered: roster.uncovered().collect(),
        alerts: roster.alert_messages(),
        unassignable: roster.unassignable.clone(),
        unplaced: roster.unplaced.clone(),
    }))
}

async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let current = lock(&state.roster)?;
    let Some(generated) = current.as_ref() else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Nenhum dado disponível"})));
    };

    Ok(HttpResponse::Ok().json(StatsResponse {
        workload: generated.roster.workload_by_load().into_iter().cloned().collect(),
    }))
}

// Workbook download with the Escala and Estatisticas sheets
async fn export_workbook(state: web::Data<AppState>) -> Result<HttpResponse> {
    let current = lock(&state.roster)?;
    let Some(generated) = current.as_ref() else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "Escala não disponível"})));
    };

    let bytes = workbook_bytes(&generated.roster).map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", WORKBOOK_FILE)))
        .body(bytes))
}

/// Registers the API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/login", web::post().to(admin_login))
        .route("/api/upload", web::post().to(admin_upload))
        .route("/api/generate", web::post().to(admin_generate))
        .route("/api/schedule", web::get().to(get_schedule))
        .route("/api/stats", web::get().to(get_stats))
        .route("/api/export", web::get().to(export_workbook));
}

pub async fn start_server(port: u16, admin_password: String, allocator: Allocator) -> std::io::Result<()> {
    if admin_password.trim().is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "admin password must not be empty",
        ));
    }

    let app_state = web::Data::new(AppState::new(admin_password, allocator));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
