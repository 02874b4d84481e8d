//! Web dashboard: file upload, report endpoint, static frontend.
//!
//! The server holds one current table at a time (the tool is one session
//! per process); the pipeline cache sits beside it so re-uploading the same
//! bytes, or toggling a section, never recomputes the derivation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::pipeline::TableCache;
use crate::report::{self, DashboardReport};
use crate::types::{DisplayFlags, PriceTable};

struct CurrentFile {
    name: String,
    table: Arc<PriceTable>,
}

struct AppState {
    cache: Mutex<TableCache>,
    current: Mutex<Option<CurrentFile>>,
}

#[derive(Serialize)]
struct UploadSummary {
    file: String,
    rows: usize,
    cached: bool,
}

#[derive(Deserialize)]
struct ReportQuery {
    eda: Option<bool>,
    visuals: Option<bool>,
    metrics: Option<bool>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReportResponse {
    /// No file uploaded yet. An instructional prompt, not an error.
    Empty { message: String },
    Ready { file: String, report: DashboardReport },
}

pub async fn run(port: u16, preload: Option<PathBuf>) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        cache: Mutex::new(TableCache::new()),
        current: Mutex::new(None),
    });

    if let Some(path) = preload {
        let bytes = std::fs::read(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let loaded = state.cache.lock().load(&bytes)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!(file = %name, rows = loaded.table.len(), "preloaded");
        *state.current.lock() = Some(CurrentFile { name, table: loaded.table });
    }

    let app = Router::new()
        .route("/api/upload", post(upload))
        .route("/api/report", get(render_report))
        .fallback_service(ServeDir::new("static"))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    info!("dashboard at http://localhost:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadSummary>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("upload.csv").to_string();
            let bytes = field.bytes().await?;
            file = Some((name, bytes.to_vec()));
        }
    }
    let Some((name, bytes)) = file else {
        return Err(AppError::BadRequest("multipart field 'file' is required".to_string()));
    };

    let loaded = state.cache.lock().load(&bytes).map_err(|e| {
        warn!(file = %name, error = %e, "load failed");
        AppError::from(e)
    })?;
    info!(file = %name, rows = loaded.table.len(), cached = loaded.cached, "file loaded");

    let summary = UploadSummary { file: name.clone(), rows: loaded.table.len(), cached: loaded.cached };
    *state.current.lock() = Some(CurrentFile { name, table: loaded.table });
    Ok(Json(summary))
}

async fn render_report(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ReportQuery>,
) -> Json<ReportResponse> {
    let flags = DisplayFlags {
        show_eda: q.eda.unwrap_or(true),
        show_visuals: q.visuals.unwrap_or(true),
        show_metrics: q.metrics.unwrap_or(true),
    };

    let (file, table) = {
        let current = state.current.lock();
        match current.as_ref() {
            Some(cur) => (cur.name.clone(), Arc::clone(&cur.table)),
            None => {
                return Json(ReportResponse::Empty {
                    message: "Upload a CSV file to begin.".to_string(),
                })
            }
        }
    };

    Json(ReportResponse::Ready { file, report: report::build_report(&table, flags) })
}
