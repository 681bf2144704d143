use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use std::sync::Arc;

use crate::{
    accounts, balances, categories, credit_cards, exchanges, transactions, transfers, user,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Builds the API router around an engine.
pub fn router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route("/accounts", post(accounts::create).get(accounts::list))
        .route(
            "/accounts/{id}",
            get(accounts::get)
                .patch(accounts::update)
                .delete(accounts::remove),
        )
        .route("/accounts/{id}/wallets", get(accounts::wallets))
        .route("/accounts/{id}/reconcile", get(accounts::reconcile))
        .route(
            "/categories",
            post(categories::create).get(categories::list),
        )
        .route(
            "/categories/{id}",
            delete(categories::remove).patch(categories::rename),
        )
        .route(
            "/transactions",
            post(transactions::submit).get(transactions::list),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get).delete(transactions::remove),
        )
        .route("/transfers", post(transfers::create).get(transfers::list))
        .route(
            "/transfers/{id}",
            get(transfers::get).delete(transfers::remove),
        )
        .route("/exchanges", post(exchanges::create).get(exchanges::list))
        .route(
            "/exchanges/{id}",
            get(exchanges::get).delete(exchanges::remove),
        )
        .route("/balances", get(balances::list))
        .route("/stats", get(balances::stats))
        .route(
            "/credit-cards",
            post(credit_cards::create).get(credit_cards::list),
        )
        .route("/credit-cards/{id}", delete(credit_cards::remove))
        .route(
            "/credit-cards/{id}/transactions",
            post(credit_cards::charge).get(credit_cards::transactions),
        )
        .route(
            "/credit-cards/{id}/installments",
            get(credit_cards::installments),
        )
        .route(
            "/card-transactions/{id}",
            delete(credit_cards::remove_transaction),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), user::auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}
