//! Accounts API endpoints.

use api_types::{
    Created,
    account::{AccountKind as ApiKind, AccountNew, AccountView, DriftView, WalletView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{AccountKind, NewAccountCmd, UpdateAccountCmd};
use uuid::Uuid;

use crate::{
    ApiResult, created,
    convert::{to_api_currency, to_engine_currency},
    ok,
    server::ServerState,
    user::CurrentUser,
};

fn to_engine_kind(kind: ApiKind) -> AccountKind {
    match kind {
        ApiKind::Bank => AccountKind::Bank,
        ApiKind::Cash => AccountKind::Cash,
        ApiKind::DigitalWallet => AccountKind::DigitalWallet,
        ApiKind::CryptoWallet => AccountKind::CryptoWallet,
        ApiKind::Broker => AccountKind::Broker,
    }
}

fn to_api_kind(kind: AccountKind) -> ApiKind {
    match kind {
        AccountKind::Bank => ApiKind::Bank,
        AccountKind::Cash => ApiKind::Cash,
        AccountKind::DigitalWallet => ApiKind::DigitalWallet,
        AccountKind::CryptoWallet => ApiKind::CryptoWallet,
        AccountKind::Broker => ApiKind::Broker,
    }
}

fn map_wallet(wallet: engine::Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        currency: to_api_currency(wallet.currency),
        balance: wallet.balance.to_string(),
    }
}

fn map_account(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        kind: to_api_kind(account.kind),
        description: account.description,
        wallets: account.wallets.into_iter().map(map_wallet).collect(),
    }
}

fn currencies(payload: &AccountNew) -> Vec<engine::Currency> {
    payload
        .currencies
        .iter()
        .copied()
        .map(to_engine_currency)
        .collect()
}

pub async fn create(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> ApiResult<Created> {
    let mut cmd = NewAccountCmd::new(
        user_id,
        payload.name.as_str(),
        to_engine_kind(payload.kind),
        currencies(&payload),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let id = state.engine.new_account(cmd).await?;
    Ok(created(id))
}

pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> ApiResult<Vec<AccountView>> {
    let accounts = state.engine.list_accounts(&user_id).await?;
    Ok(ok(accounts.into_iter().map(map_account).collect()))
}

pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<AccountView> {
    let account = state.engine.account(&user_id, account_id).await?;
    Ok(ok(map_account(account)))
}

pub async fn update(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<AccountNew>,
) -> ApiResult<AccountView> {
    let mut cmd = UpdateAccountCmd::new(
        user_id.as_str(),
        account_id,
        payload.name.as_str(),
        to_engine_kind(payload.kind),
        currencies(&payload),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    state.engine.update_account(cmd).await?;
    let account = state.engine.account(&user_id, account_id).await?;
    Ok(ok(map_account(account)))
}

pub async fn remove(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<()> {
    state.engine.delete_account(&user_id, account_id).await?;
    Ok(ok(()))
}

pub async fn wallets(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Vec<WalletView>> {
    let wallets = state.engine.list_wallets(&user_id, account_id).await?;
    Ok(ok(wallets.into_iter().map(map_wallet).collect()))
}

/// Read-only consistency check of an account's wallets against its ledger.
pub async fn reconcile(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Vec<DriftView>> {
    let drifts = state
        .engine
        .reconcile_balances(&user_id, account_id)
        .await?
        .into_iter()
        .map(|drift| DriftView {
            wallet_id: drift.wallet_id,
            currency: to_api_currency(drift.currency),
            stored: drift.stored.to_string(),
            computed: drift.computed.to_string(),
        })
        .collect();
    Ok(ok(drifts))
}
