use api_types::{
    Created,
    outcome::{Failure, Outcome},
};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};
use serde::Serialize;
use uuid::Uuid;

pub use server::{router, run_with_listener};
pub use user::USER_HEADER;

mod accounts;
mod balances;
mod categories;
mod convert;
mod credit_cards;
mod exchanges;
mod server;
mod transactions;
mod transfers;
mod user;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// An engine error caused by one request field.
    Field {
        field: &'static str,
        error: EngineError,
    },
}

fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::DuplicateEntity => StatusCode::CONFLICT,
        ErrorKind::InsufficientBalance | ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (error, field) = match self {
            ServerError::Engine(error) => (error, None),
            ServerError::Field { field, error } => (error, Some(field.to_string())),
        };
        let kind = error.kind();
        let failure = Failure {
            kind: convert::to_api_error_kind(kind),
            message: message_for_engine_error(error),
            field,
        };

        (status_for_kind(kind), Json(Outcome::<()>::Failure(failure))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Successful response wrapped in the outcome envelope.
pub struct Reply<T>(StatusCode, T);

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> axum::response::Response {
        (self.0, Json(Outcome::Success(self.1))).into_response()
    }
}

pub(crate) fn ok<T>(value: T) -> Reply<T> {
    Reply(StatusCode::OK, value)
}

pub(crate) fn created(id: Uuid) -> Reply<Created> {
    Reply(StatusCode::CREATED, Created { id })
}

pub(crate) type ApiResult<T> = Result<Reply<T>, ServerError>;
