//! Transfers API endpoints

use api_types::{
    Created,
    transfer::{TransferNew, TransferView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::TransferCmd;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    ApiResult, created,
    convert::{parse_positive, to_api_currency, to_engine_currency, utc},
    ok,
    server::ServerState,
    user::CurrentUser,
};

/// Optional account filter shared by the transfer and exchange lists.
#[derive(Debug, Default, Deserialize)]
pub struct AccountFilter {
    pub account_id: Option<Uuid>,
}

fn map_transfer(transfer: engine::Transfer) -> TransferView {
    TransferView {
        id: transfer.id,
        from_account_id: transfer.from_account_id,
        to_account_id: transfer.to_account_id,
        currency: to_api_currency(transfer.currency),
        amount: transfer.amount.to_string(),
        occurred_at: transfer.occurred_at,
        description: transfer.description,
    }
}

pub async fn create(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> ApiResult<Created> {
    let amount = parse_positive("amount", &payload.amount)?;
    let mut cmd = TransferCmd::new(
        user_id,
        payload.from_account_id,
        payload.to_account_id,
        to_engine_currency(payload.currency),
        amount,
        utc(payload.occurred_at),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let id = state.engine.record_transfer(cmd).await?;
    Ok(created(id))
}

pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(filter): Query<AccountFilter>,
) -> ApiResult<Vec<TransferView>> {
    let transfers = state
        .engine
        .list_transfers(&user_id, filter.account_id)
        .await?;
    Ok(ok(transfers.into_iter().map(map_transfer).collect()))
}

pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transfer_id): Path<Uuid>,
) -> ApiResult<TransferView> {
    let transfer = state.engine.transfer(&user_id, transfer_id).await?;
    Ok(ok(map_transfer(transfer)))
}

pub async fn remove(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transfer_id): Path<Uuid>,
) -> ApiResult<()> {
    state.engine.delete_transfer(&user_id, transfer_id).await?;
    Ok(ok(()))
}
