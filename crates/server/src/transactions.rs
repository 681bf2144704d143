//! Transactions API endpoints

use api_types::{
    Created,
    transaction::{
        TransactionFields, TransactionKind as ApiKind, TransactionList, TransactionRequest,
        TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CreateTransactionCmd, EditTransactionCmd, TransactionKind, TransactionListFilter};
use uuid::Uuid;

use crate::{
    ApiResult, Reply, ServerError, created,
    convert::{parse_non_negative, to_api_currency, to_engine_currency, utc},
    ok,
    server::ServerState,
    user::CurrentUser,
};

fn to_engine_kind(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Expense => TransactionKind::Expense,
        ApiKind::Income => TransactionKind::Income,
    }
}

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        currency: to_api_currency(tx.currency),
        category_id: tx.category_id,
        kind: match tx.kind {
            TransactionKind::Expense => ApiKind::Expense,
            TransactionKind::Income => ApiKind::Income,
        },
        amount: tx.amount.to_string(),
        occurred_at: tx.occurred_at,
        description: tx.description,
    }
}

fn create_cmd(
    user_id: &str,
    fields: TransactionFields,
) -> Result<CreateTransactionCmd, ServerError> {
    let amount = parse_non_negative("amount", &fields.amount)?;
    let mut cmd = CreateTransactionCmd::new(
        user_id,
        fields.account_id,
        to_engine_currency(fields.currency),
        fields.category_id,
        to_engine_kind(fields.kind),
        amount,
        utc(fields.occurred_at),
    );
    if let Some(description) = fields.description {
        cmd = cmd.description(description);
    }
    Ok(cmd)
}

/// Creates or edits a transaction depending on the request `action`.
///
/// Creation answers `201` with the new id, edition `200` with the same id.
pub async fn submit(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionRequest>,
) -> ApiResult<Created> {
    match payload {
        TransactionRequest::Creation(fields) => {
            let cmd = create_cmd(&user_id, fields)?;
            let id = state.engine.record_transaction(cmd).await?;
            Ok(created(id))
        }
        TransactionRequest::Edition(edition) => {
            let cmd = EditTransactionCmd::new(edition.id, create_cmd(&user_id, edition.fields)?);
            state.engine.edit_transaction(cmd).await?;
            Ok(Reply(StatusCode::OK, Created { id: edition.id }))
        }
    }
}

pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> ApiResult<Vec<TransactionView>> {
    let mut filter = TransactionListFilter {
        account_id: query.account_id,
        currency: query.currency.map(to_engine_currency),
        kind: query.kind.map(to_engine_kind),
        from: query.from.map(utc),
        to: query.to.map(utc),
        ..Default::default()
    };
    if let Some(limit) = query.limit {
        filter.limit = limit;
    }

    let txs = state.engine.list_transactions(&user_id, &filter).await?;
    Ok(ok(txs.into_iter().map(map_transaction).collect()))
}

pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<TransactionView> {
    let tx = state.engine.transaction(&user_id, transaction_id).await?;
    Ok(ok(map_transaction(tx)))
}

pub async fn remove(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<()> {
    state
        .engine
        .delete_transaction(&user_id, transaction_id)
        .await?;
    Ok(ok(()))
}
