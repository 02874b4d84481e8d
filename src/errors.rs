use axum::http::StatusCode;
use axum::response::IntoResponse;
use thiserror::Error;

/// Failures that abort a file load. All are terminal for that render cycle:
/// no partial table is ever produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("unparseable Date value {value:?} on line {line}")]
    DateParse { value: String, line: usize },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("no usable rows (every record was missing Trades)")]
    Empty,
}

/// Web-boundary error type. Load failures surface as the blocking warning
/// the dashboard shows for a bad file.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("{0}")]
    BadRequest(String),
    #[error("upload failed: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}
