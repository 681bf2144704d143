//! Caller identity.
//!
//! Authentication happens upstream; requests reach this service with the
//! already-authenticated user id in the `x-user-id` header.

use api_types::outcome::{ErrorKind, Failure, Outcome};
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as HeaderError, Header},
};

use crate::server::ServerState;

pub static USER_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Id of the user a request acts for, inserted by [`auth`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub String);

/// `TypedHeader` for the `x-user-id` header.
#[derive(Debug)]
pub(crate) struct UserIdHeader(String);

impl Header for UserIdHeader {
    fn name() -> &'static HeaderName {
        &USER_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, HeaderError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(HeaderError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(HeaderError::invalid());
        }

        Ok(UserIdHeader(value.to_string()))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

fn unauthorized(message: &str) -> Response {
    let failure = Failure {
        kind: ErrorKind::NotFound,
        message: message.to_string(),
        field: Some(USER_HEADER.to_string()),
    };
    (
        StatusCode::UNAUTHORIZED,
        Json(Outcome::<()>::Failure(failure)),
    )
        .into_response()
}

pub(crate) async fn auth(
    user_header: Option<TypedHeader<UserIdHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(UserIdHeader(user_id))) = user_header else {
        return unauthorized("missing user id");
    };

    match state.engine.user_exists(&user_id).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(%user_id, "rejected request from unknown user");
            return unauthorized("unknown user");
        }
        Err(err) => return crate::ServerError::from(err).into_response(),
    }

    request.extensions_mut().insert(CurrentUser(user_id));
    next.run(request).await
}
