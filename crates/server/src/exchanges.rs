//! Exchanges API endpoints

use api_types::{
    Created,
    exchange::{ExchangeNew, ExchangeView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::ExchangeCmd;
use uuid::Uuid;

use crate::{
    ApiResult, created,
    convert::{parse_positive, to_api_currency, to_engine_currency, utc},
    ok,
    server::ServerState,
    transfers::AccountFilter,
    user::CurrentUser,
};

fn map_exchange(exchange: engine::Exchange) -> ExchangeView {
    ExchangeView {
        id: exchange.id,
        account_id: exchange.account_id,
        from_currency: to_api_currency(exchange.from_currency),
        to_currency: to_api_currency(exchange.to_currency),
        from_amount: exchange.from_amount.to_string(),
        to_amount: exchange.to_amount.to_string(),
        occurred_at: exchange.occurred_at,
        description: exchange.description,
    }
}

pub async fn create(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ExchangeNew>,
) -> ApiResult<Created> {
    let from_amount = parse_positive("from_amount", &payload.from_amount)?;
    let to_amount = parse_positive("to_amount", &payload.to_amount)?;
    let mut cmd = ExchangeCmd::new(
        user_id,
        payload.account_id,
        (to_engine_currency(payload.from_currency), from_amount),
        (to_engine_currency(payload.to_currency), to_amount),
        utc(payload.occurred_at),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let id = state.engine.record_exchange(cmd).await?;
    Ok(created(id))
}

pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(filter): Query<AccountFilter>,
) -> ApiResult<Vec<ExchangeView>> {
    let exchanges = state
        .engine
        .list_exchanges(&user_id, filter.account_id)
        .await?;
    Ok(ok(exchanges.into_iter().map(map_exchange).collect()))
}

pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(exchange_id): Path<Uuid>,
) -> ApiResult<ExchangeView> {
    let exchange = state.engine.exchange(&user_id, exchange_id).await?;
    Ok(ok(map_exchange(exchange)))
}

pub async fn remove(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(exchange_id): Path<Uuid>,
) -> ApiResult<()> {
    state.engine.delete_exchange(&user_id, exchange_id).await?;
    Ok(ok(()))
}
