//! Credit card API endpoints.

use api_types::{
    Created,
    credit_card::{
        CardTransactionKind as ApiKind, CardTransactionNew, CardTransactionView, CreditCardNew,
        CreditCardView, InstallmentView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{CardTransactionCmd, CardTransactionKind, NewCreditCardCmd};
use uuid::Uuid;

use crate::{
    ApiResult, created,
    convert::{parse_positive, to_api_currency, to_engine_currency, utc},
    ok,
    server::ServerState,
    transfers::AccountFilter,
    user::CurrentUser,
};

fn map_card(card: engine::CreditCard) -> CreditCardView {
    CreditCardView {
        id: card.id,
        account_id: card.account_id,
        currency: to_api_currency(card.currency),
        name: card.name,
    }
}

pub async fn create(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<CreditCardNew>,
) -> ApiResult<Created> {
    let cmd = NewCreditCardCmd::new(
        user_id,
        payload.account_id,
        to_engine_currency(payload.currency),
        payload.name,
    );
    let id = state.engine.new_credit_card(cmd).await?;
    Ok(created(id))
}

pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(filter): Query<AccountFilter>,
) -> ApiResult<Vec<CreditCardView>> {
    let cards = state
        .engine
        .list_credit_cards(&user_id, filter.account_id)
        .await?;
    Ok(ok(cards.into_iter().map(map_card).collect()))
}

pub async fn remove(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(credit_card_id): Path<Uuid>,
) -> ApiResult<()> {
    state
        .engine
        .delete_credit_card(&user_id, credit_card_id)
        .await?;
    Ok(ok(()))
}

/// Records a charge or refund on the card in the path.
pub async fn charge(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(credit_card_id): Path<Uuid>,
    Json(payload): Json<CardTransactionNew>,
) -> ApiResult<Created> {
    let amount = parse_positive("amount", &payload.amount)?;
    let kind = match payload.kind {
        ApiKind::Charge => CardTransactionKind::Charge,
        ApiKind::Refund => CardTransactionKind::Refund,
    };
    let mut cmd = CardTransactionCmd::new(
        user_id,
        credit_card_id,
        kind,
        amount,
        utc(payload.occurred_at),
    );
    if let Some(installments) = payload.installments {
        cmd = cmd.installments(installments);
    }
    if let Some(category_id) = payload.category_id {
        cmd = cmd.category_id(category_id);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let id = state.engine.record_card_transaction(cmd).await?;
    Ok(created(id))
}

pub async fn transactions(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(credit_card_id): Path<Uuid>,
) -> ApiResult<Vec<CardTransactionView>> {
    let txs = state
        .engine
        .card_transactions(&user_id, credit_card_id)
        .await?
        .into_iter()
        .map(|tx| CardTransactionView {
            id: tx.id,
            kind: match tx.kind {
                CardTransactionKind::Charge => ApiKind::Charge,
                CardTransactionKind::Refund => ApiKind::Refund,
            },
            amount: tx.amount.to_string(),
            installments: tx.installments,
            category_id: tx.category_id,
            occurred_at: tx.occurred_at,
            description: tx.description,
        })
        .collect();
    Ok(ok(txs))
}

pub async fn installments(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(credit_card_id): Path<Uuid>,
) -> ApiResult<Vec<InstallmentView>> {
    let schedule = state
        .engine
        .installments(&user_id, credit_card_id)
        .await?
        .into_iter()
        .map(|installment| InstallmentView {
            card_transaction_id: installment.card_transaction_id,
            number: installment.number,
            amount: installment.amount.to_string(),
            due_at: installment.due_at,
        })
        .collect();
    Ok(ok(schedule))
}

pub async fn remove_transaction(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(card_transaction_id): Path<Uuid>,
) -> ApiResult<()> {
    state
        .engine
        .delete_card_transaction(&user_id, card_transaction_id)
        .await?;
    Ok(ok(()))
}
