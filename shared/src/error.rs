use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // garde::Report の Display は末尾に改行が付く
    #[error("Campo obrigatório ausente ou inválido: {}", .0.to_string().trim_end())]
    ValidationError(#[from] garde::Report),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Formato de data inválido em {0}. Use ISO 8601 (YYYY-MM-DDTHH:MM:SS)")]
    InvalidDateFormat(String),
    #[error("A data/hora de início deve ser anterior à data/hora de fim")]
    InvalidTimeRange,
    #[error("{0}")]
    BusinessRuleViolation(String),
    // 衝突した予約はレスポンス用に JSON 化したものを保持する
    #[error("Choque de horário detectado")]
    ReservationConflict(Option<Value>),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    TransactionError(#[source] sqlx::Error),
    #[error("{0}")]
    ConversionEntityError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidRequest(_)
            | AppError::InvalidDateFormat(_)
            | AppError::InvalidTimeRange
            | AppError::BusinessRuleViolation(_) => StatusCode::BAD_REQUEST,
            AppError::ReservationConflict(_) => StatusCode::CONFLICT,
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::TransactionError(_)
            | AppError::ConversionEntityError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let body = match &self {
            AppError::ReservationConflict(conflict) => json!({
                "erro": self.to_string(),
                "mensagem": "Esta sala já está reservada para este período",
                "conflito": conflict,
            }),
            _ if status_code.is_server_error() => {
                tracing::error!(
                    error.cause_chain = ?self,
                    error.message = %self,
                    "Unexpected error happened"
                );
                json!({
                    "erro": "Erro interno do servidor",
                    "detalhes": self.to_string(),
                })
            }
            _ => json!({ "erro": self.to_string() }),
        };
        if status_code.is_client_error() {
            tracing::debug!(status = %status_code, error.message = %self, "request rejected");
        }

        (status_code, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::ConversionEntityError(value.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        AppError::InvalidRequest(format!("Corpo da requisição inválido: {}", value.body_text()))
    }
}

pub type AppResult<T> = Result<T, AppError>;
