use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.new_user("alice").await.unwrap();
    engine.new_user("bob").await.unwrap();
    server::router(engine)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(&server::USER_HEADER, user);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, user: &str, uri: &str, body: Value) -> String {
    let (status, value) = call(app, Method::POST, uri, Some(user), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{uri}: {value}");
    assert_eq!(value["ok"], true);
    value["value"]["id"].as_str().unwrap().to_string()
}

async fn account(app: &Router, user: &str, name: &str, currencies: Value) -> String {
    create(
        app,
        user,
        "/accounts",
        json!({ "name": name, "kind": "bank", "description": null, "currencies": currencies }),
    )
    .await
}

fn transaction(account_id: &str, category_id: &str, kind: &str, amount: &str) -> Value {
    json!({
        "action": "creation",
        "account_id": account_id,
        "currency": "USD",
        "category_id": category_id,
        "kind": kind,
        "amount": amount,
        "occurred_at": "2026-01-15T10:00:00+01:00",
        "description": null,
    })
}

#[tokio::test]
async fn requests_without_known_user_are_unauthorized() {
    let app = app().await;

    let (status, _) = call(&app, Method::GET, "/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, Method::GET, "/accounts", Some("mallory"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn expense_beyond_balance_is_rejected() {
    let app = app().await;
    let account_id = account(&app, "alice", "Checking", json!(["USD"])).await;
    let category_id = create(&app, "alice", "/categories", json!({ "name": "Food" })).await;

    create(
        &app,
        "alice",
        "/transactions",
        transaction(&account_id, &category_id, "income", "1,000.00"),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/transactions",
        Some("alice"),
        Some(transaction(&account_id, &category_id, "expense", "1500")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "insufficient_balance");

    let (status, body) = call(&app, Method::GET, "/balances", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"][0]["currency"], "USD");
    assert_eq!(body["value"][0]["amount"], "1000.00");
}

#[tokio::test]
async fn malformed_amount_names_the_field() {
    let app = app().await;
    let account_id = account(&app, "alice", "Checking", json!(["USD"])).await;
    let category_id = create(&app, "alice", "/categories", json!({ "name": "Food" })).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/transactions",
        Some("alice"),
        Some(transaction(&account_id, &category_id, "income", "12.345")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["field"], "amount");
}

#[tokio::test]
async fn edition_replaces_the_transaction() {
    let app = app().await;
    let account_id = account(&app, "alice", "Checking", json!(["USD"])).await;
    let category_id = create(&app, "alice", "/categories", json!({ "name": "Salary" })).await;
    let tx_id = create(
        &app,
        "alice",
        "/transactions",
        transaction(&account_id, &category_id, "income", "100"),
    )
    .await;

    let mut edition = transaction(&account_id, &category_id, "income", "250.50");
    edition["action"] = json!("edition");
    edition["id"] = json!(tx_id);
    let (status, body) = call(
        &app,
        Method::POST,
        "/transactions",
        Some("alice"),
        Some(edition),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["value"]["id"], tx_id.as_str());

    let uri = format!("/accounts/{account_id}/wallets");
    let (_, body) = call(&app, Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(body["value"][0]["balance"], "250.50");

    let (_, body) = call(&app, Method::GET, "/transactions", Some("alice"), None).await;
    assert_eq!(body["value"].as_array().unwrap().len(), 1);
    assert_eq!(body["value"][0]["amount"], "250.50");
}

#[tokio::test]
async fn foreign_rows_are_not_found() {
    let app = app().await;
    let account_id = account(&app, "alice", "Checking", json!(["USD"])).await;

    let uri = format!("/accounts/{account_id}");
    let (status, body) = call(&app, Method::GET, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, _) = call(&app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"]["name"], "Checking");
}

#[tokio::test]
async fn duplicate_account_is_a_conflict() {
    let app = app().await;
    account(&app, "alice", "Checking", json!(["USD"])).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/accounts",
        Some("alice"),
        Some(json!({ "name": " checking ", "kind": "bank", "currencies": ["EUR"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "duplicate_entity");
}

#[tokio::test]
async fn transfer_and_exchange_move_balances() {
    let app = app().await;
    let source = account(&app, "alice", "Checking", json!(["USD", "EUR"])).await;
    let target = account(&app, "alice", "Savings", json!(["USD"])).await;
    let category_id = create(&app, "alice", "/categories", json!({ "name": "Salary" })).await;
    create(
        &app,
        "alice",
        "/transactions",
        transaction(&source, &category_id, "income", "500"),
    )
    .await;

    create(
        &app,
        "alice",
        "/transfers",
        json!({
            "from_account_id": source,
            "to_account_id": target,
            "currency": "USD",
            "amount": "200",
            "occurred_at": "2026-01-16T09:00:00Z",
        }),
    )
    .await;
    create(
        &app,
        "alice",
        "/exchanges",
        json!({
            "account_id": source,
            "from_currency": "USD",
            "to_currency": "EUR",
            "from_amount": "100",
            "to_amount": "92.50",
            "occurred_at": "2026-01-17T09:00:00Z",
        }),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/exchanges",
        Some("alice"),
        Some(json!({
            "account_id": source,
            "from_currency": "USD",
            "to_currency": "EUR",
            "from_amount": "0",
            "to_amount": "1",
            "occurred_at": "2026-01-17T09:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "from_amount");

    let (_, body) = call(&app, Method::GET, "/balances", Some("alice"), None).await;
    let totals: Vec<(String, String)> = body["value"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| {
            (
                row["currency"].as_str().unwrap().to_string(),
                row["amount"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        totals,
        vec![
            ("USD".to_string(), "400.00".to_string()),
            ("EUR".to_string(), "92.50".to_string()),
        ]
    );

    let uri = format!("/balances?group_by=account&account_id={target}");
    let (_, body) = call(&app, Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(body["value"][0]["account_id"], target.as_str());
    assert_eq!(body["value"][0]["amount"], "200.00");

    let (_, body) = call(&app, Method::GET, "/stats", Some("alice"), None).await;
    let usd = body["value"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["currency"] == "USD")
        .unwrap();
    assert_eq!(usd["total_income"], "500.00");
    assert_eq!(usd["total_expenses"], "0.00");

    let uri = format!("/accounts/{source}/reconcile");
    let (status, body) = call(&app, Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], json!([]));
}

#[tokio::test]
async fn card_charge_builds_installments() {
    let app = app().await;
    let account_id = account(&app, "alice", "Checking", json!(["USD"])).await;
    let card_id = create(
        &app,
        "alice",
        "/credit-cards",
        json!({ "account_id": account_id, "currency": "USD", "name": "Visa" }),
    )
    .await;

    let uri = format!("/credit-cards/{card_id}/transactions");
    let card_tx = create(
        &app,
        "alice",
        &uri,
        json!({
            "kind": "charge",
            "amount": "10.00",
            "installments": 3,
            "occurred_at": "2026-01-31T12:00:00Z",
        }),
    )
    .await;

    let uri = format!("/credit-cards/{card_id}/installments");
    let (status, body) = call(&app, Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    let amounts: Vec<&str> = body["value"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["amount"].as_str().unwrap())
        .collect();
    assert_eq!(amounts, vec!["3.34", "3.33", "3.33"]);

    let uri = format!("/credit-cards/{card_id}");
    let (status, body) = call(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");

    let uri = format!("/card-transactions/{card_tx}");
    let (status, _) = call(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/credit-cards/{card_id}");
    let (status, _) = call(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
}
