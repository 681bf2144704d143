use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AccountKind, BalanceGrouping, BalanceQuery, CardTransactionCmd, CardTransactionKind,
    CreateTransactionCmd, Currency, EditTransactionCmd, Engine, EngineError, ExchangeCmd, Money,
    NewAccountCmd, NewCreditCardCmd, TransactionKind, TransactionListFilter, TransferCmd,
    UpdateAccountCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    engine.new_user("alice").await.unwrap();
    engine.new_user("bob").await.unwrap();
    (engine, db)
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap()
}

async fn account(engine: &Engine, user: &str, name: &str, currencies: Vec<Currency>) -> Uuid {
    engine
        .new_account(NewAccountCmd::new(user, name, AccountKind::Bank, currencies))
        .await
        .unwrap()
}

/// Credits `minor` units through an income transaction so the ledger stays
/// consistent with the wallet.
async fn fund(
    engine: &Engine,
    user: &str,
    account_id: Uuid,
    currency: Currency,
    category_id: Uuid,
    minor: i64,
) -> Uuid {
    engine
        .record_transaction(CreateTransactionCmd::new(
            user,
            account_id,
            currency,
            category_id,
            TransactionKind::Income,
            Money::new(minor),
            at(1),
        ))
        .await
        .unwrap()
}

fn expense(user: &str, account_id: Uuid, category_id: Uuid, minor: i64) -> CreateTransactionCmd {
    CreateTransactionCmd::new(
        user,
        account_id,
        Currency::Usd,
        category_id,
        TransactionKind::Expense,
        Money::new(minor),
        at(2),
    )
}

async fn balance(engine: &Engine, user: &str, account_id: Uuid, currency: Currency) -> i64 {
    engine
        .balance(user, account_id, currency)
        .await
        .unwrap()
        .minor()
}

#[tokio::test]
async fn expense_beyond_balance_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Food").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;

    engine
        .record_transaction(expense("alice", account_a, category, 500))
        .await
        .unwrap();
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 500);

    let err = engine
        .record_transaction(expense("alice", account_a, category, 600))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 500);
}

#[tokio::test]
async fn transfer_moves_balance_between_accounts() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let account_b = account(&engine, "alice", "B", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Salary").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;

    engine
        .record_transfer(TransferCmd::new(
            "alice",
            account_a,
            account_b,
            Currency::Usd,
            Money::new(400),
            at(2),
        ))
        .await
        .unwrap();
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 600);
    assert_eq!(balance(&engine, "alice", account_b, Currency::Usd).await, 400);

    let err = engine
        .record_transfer(TransferCmd::new(
            "alice",
            account_a,
            account_b,
            Currency::Usd,
            Money::new(700),
            at(3),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 600);
    assert_eq!(balance(&engine, "alice", account_b, Currency::Usd).await, 400);
}

#[tokio::test]
async fn exchange_converts_inside_one_account() {
    let (engine, _db) = engine_with_db().await;
    let account_x = account(&engine, "alice", "X", vec![Currency::Usd, Currency::Eur]).await;
    let category = engine.new_category("alice", "Salary").await.unwrap();
    fund(&engine, "alice", account_x, Currency::Usd, category, 1000).await;

    engine
        .record_exchange(ExchangeCmd::new(
            "alice",
            account_x,
            (Currency::Usd, Money::new(500)),
            (Currency::Eur, Money::new(460)),
            at(2),
        ))
        .await
        .unwrap();
    assert_eq!(balance(&engine, "alice", account_x, Currency::Usd).await, 500);
    assert_eq!(balance(&engine, "alice", account_x, Currency::Eur).await, 460);
}

#[tokio::test]
async fn deleting_spent_transfer_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let account_b = account(&engine, "alice", "B", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Rent").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;

    let transfer_id = engine
        .record_transfer(TransferCmd::new(
            "alice",
            account_a,
            account_b,
            Currency::Usd,
            Money::new(400),
            at(2),
        ))
        .await
        .unwrap();
    engine
        .record_transaction(expense("alice", account_b, category, 300))
        .await
        .unwrap();

    let err = engine
        .delete_transfer("alice", transfer_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 600);
    assert_eq!(balance(&engine, "alice", account_b, Currency::Usd).await, 100);
    assert!(engine.transfer("alice", transfer_id).await.is_ok());
}

#[tokio::test]
async fn deleting_spent_exchange_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let account_x = account(&engine, "alice", "X", vec![Currency::Usd, Currency::Eur]).await;
    let category = engine.new_category("alice", "Travel").await.unwrap();
    fund(&engine, "alice", account_x, Currency::Usd, category, 1000).await;

    let exchange_id = engine
        .record_exchange(ExchangeCmd::new(
            "alice",
            account_x,
            (Currency::Usd, Money::new(500)),
            (Currency::Eur, Money::new(460)),
            at(2),
        ))
        .await
        .unwrap();
    let mut spend = expense("alice", account_x, category, 100);
    spend.currency = Currency::Eur;
    engine.record_transaction(spend).await.unwrap();

    let err = engine
        .delete_exchange("alice", exchange_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, "alice", account_x, Currency::Usd).await, 500);
    assert_eq!(balance(&engine, "alice", account_x, Currency::Eur).await, 360);
    assert!(engine.exchange("alice", exchange_id).await.is_ok());

    fund(&engine, "alice", account_x, Currency::Eur, category, 100).await;
    engine.delete_exchange("alice", exchange_id).await.unwrap();
    assert_eq!(balance(&engine, "alice", account_x, Currency::Usd).await, 1000);
    assert_eq!(balance(&engine, "alice", account_x, Currency::Eur).await, 0);
    assert!(matches!(
        engine.exchange("alice", exchange_id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_account_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    account(&engine, "alice", "Checking", vec![Currency::Usd]).await;

    let err = engine
        .new_account(NewAccountCmd::new(
            "alice",
            "Checking",
            AccountKind::Bank,
            vec![Currency::Usd],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // Same name under another kind or another user is a different account.
    engine
        .new_account(NewAccountCmd::new(
            "alice",
            "Checking",
            AccountKind::Cash,
            vec![Currency::Usd],
        ))
        .await
        .unwrap();
    account(&engine, "bob", "Checking", vec![Currency::Usd]).await;
}

#[tokio::test]
async fn account_names_collide_after_normalization() {
    let (engine, _db) = engine_with_db().await;
    account(&engine, "alice", "Caja Ahorro", vec![Currency::Ars]).await;

    let err = engine
        .new_account(NewAccountCmd::new(
            "alice",
            "  caja   ahorro ",
            AccountKind::Bank,
            vec![Currency::Ars],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn names_without_letters_or_digits_are_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.new_category("alice", "!!!").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    let err = engine
        .new_account(NewAccountCmd::new(
            "alice",
            "???",
            AccountKind::Bank,
            vec![Currency::Usd],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    assert!(engine.list_categories("alice").await.unwrap().is_empty());
    assert!(engine.list_accounts("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_operations_change_nothing() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd, Currency::Eur]).await;
    let account_b = account(&engine, "alice", "B", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Misc").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;

    let before = engine
        .balances(
            "alice",
            &BalanceQuery {
                group_by: BalanceGrouping::Account,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let rejected = [
        engine
            .record_transaction(expense("alice", account_a, category, 1001))
            .await,
        engine
            .record_transfer(TransferCmd::new(
                "alice",
                account_a,
                account_a,
                Currency::Usd,
                Money::new(1),
                at(2),
            ))
            .await,
        engine
            .record_transfer(TransferCmd::new(
                "alice",
                account_a,
                account_b,
                Currency::Eur,
                Money::new(1),
                at(2),
            ))
            .await,
        engine
            .record_exchange(ExchangeCmd::new(
                "alice",
                account_a,
                (Currency::Usd, Money::new(100)),
                (Currency::Usd, Money::new(100)),
                at(2),
            ))
            .await,
        engine
            .record_exchange(ExchangeCmd::new(
                "alice",
                account_a,
                (Currency::Eur, Money::new(1)),
                (Currency::Usd, Money::new(1)),
                at(2),
            ))
            .await,
    ];
    assert!(matches!(rejected[0], Err(EngineError::InsufficientFunds(_))));
    assert!(matches!(rejected[1], Err(EngineError::InvalidInput(_))));
    assert!(matches!(rejected[2], Err(EngineError::KeyNotFound(_))));
    assert!(matches!(rejected[3], Err(EngineError::CurrencyMismatch(_))));
    assert!(matches!(rejected[4], Err(EngineError::InsufficientFunds(_))));

    let after = engine
        .balances(
            "alice",
            &BalanceQuery {
                group_by: BalanceGrouping::Account,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(before, after);

    let txs = engine
        .list_transactions("alice", &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert!(engine.list_transfers("alice", None).await.unwrap().is_empty());
    assert!(engine.list_exchanges("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn transfers_conserve_currency_totals() {
    let (engine, _db) = engine_with_db().await;
    let accounts = [
        account(&engine, "alice", "A", vec![Currency::Usd]).await,
        account(&engine, "alice", "B", vec![Currency::Usd]).await,
        account(&engine, "alice", "C", vec![Currency::Usd]).await,
    ];
    let category = engine.new_category("alice", "Salary").await.unwrap();
    fund(&engine, "alice", accounts[0], Currency::Usd, category, 10_000).await;

    let moves = [(0, 1, 2_500), (1, 2, 1_000), (0, 2, 3_333), (2, 0, 4_000)];
    for (from, to, minor) in moves {
        engine
            .record_transfer(TransferCmd::new(
                "alice",
                accounts[from],
                accounts[to],
                Currency::Usd,
                Money::new(minor),
                at(3),
            ))
            .await
            .unwrap();
    }

    let totals = engine
        .balances("alice", &BalanceQuery::default())
        .await
        .unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].currency, Currency::Usd);
    assert_eq!(totals[0].amount, Money::new(10_000));
}

#[tokio::test]
async fn exchange_only_touches_its_two_wallets() {
    let (engine, _db) = engine_with_db().await;
    let account_x = account(
        &engine,
        "alice",
        "X",
        vec![Currency::Usd, Currency::Eur, Currency::Usdt],
    )
    .await;
    let category = engine.new_category("alice", "Salary").await.unwrap();
    fund(&engine, "alice", account_x, Currency::Usd, category, 5_000).await;
    fund(&engine, "alice", account_x, Currency::Usdt, category, 700).await;

    engine
        .record_exchange(ExchangeCmd::new(
            "alice",
            account_x,
            (Currency::Usd, Money::new(1_234)),
            (Currency::Eur, Money::new(1_100)),
            at(4),
        ))
        .await
        .unwrap();

    assert_eq!(balance(&engine, "alice", account_x, Currency::Usd).await, 3_766);
    assert_eq!(balance(&engine, "alice", account_x, Currency::Eur).await, 1_100);
    assert_eq!(balance(&engine, "alice", account_x, Currency::Usdt).await, 700);

    let eur = engine
        .wallet("alice", account_x, Currency::Eur)
        .await
        .unwrap();
    assert_eq!(eur.account_id, account_x);
    assert_eq!(eur.balance, Money::new(1_100));
    assert!(matches!(
        engine.wallet("alice", account_x, Currency::Dai).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn edit_there_and_back_restores_balances() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let account_b = account(&engine, "alice", "B", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Food").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;
    fund(&engine, "alice", account_b, Currency::Usd, category, 300).await;

    let original = expense("alice", account_a, category, 400);
    let tx_id = engine.record_transaction(original.clone()).await.unwrap();
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 600);

    // In place: checked against balance - old effect, so 1000 fits.
    engine
        .edit_transaction(EditTransactionCmd::new(
            tx_id,
            expense("alice", account_a, category, 1000),
        ))
        .await
        .unwrap();
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 0);

    // Moved to B: the undo lands on A, the new effect must fit in B.
    let err = engine
        .edit_transaction(EditTransactionCmd::new(
            tx_id,
            expense("alice", account_b, category, 301),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 0);

    engine
        .edit_transaction(EditTransactionCmd::new(
            tx_id,
            expense("alice", account_b, category, 300),
        ))
        .await
        .unwrap();
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 1000);
    assert_eq!(balance(&engine, "alice", account_b, Currency::Usd).await, 0);

    engine
        .edit_transaction(EditTransactionCmd::new(tx_id, original))
        .await
        .unwrap();
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 600);
    assert_eq!(balance(&engine, "alice", account_b, Currency::Usd).await, 300);

    let tx = engine.transaction("alice", tx_id).await.unwrap();
    assert_eq!(tx.account_id, account_a);
    assert_eq!(tx.amount, Money::new(400));
}

#[tokio::test]
async fn deleting_income_that_was_spent_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Salary").await.unwrap();
    let income = fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;
    let spent = engine
        .record_transaction(expense("alice", account_a, category, 800))
        .await
        .unwrap();

    let err = engine
        .delete_transaction("alice", income)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    engine.delete_transaction("alice", spent).await.unwrap();
    engine.delete_transaction("alice", income).await.unwrap();
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 0);
}

#[tokio::test]
async fn foreign_rows_look_missing() {
    let (engine, _db) = engine_with_db().await;
    let alice_account = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let bob_account = account(&engine, "bob", "B", vec![Currency::Usd]).await;
    let alice_category = engine.new_category("alice", "Food").await.unwrap();
    let bob_category = engine.new_category("bob", "Food").await.unwrap();
    let tx_id = fund(
        &engine,
        "alice",
        alice_account,
        Currency::Usd,
        alice_category,
        1000,
    )
    .await;

    assert!(matches!(
        engine.account("bob", alice_account).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.transaction("bob", tx_id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.delete_transaction("bob", tx_id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    // Bob's category on Alice's account, and Alice's category on Bob's account.
    assert!(matches!(
        engine
            .record_transaction(expense("bob", alice_account, bob_category, 1))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .record_transaction(expense("bob", bob_account, alice_category, 0))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .record_transfer(TransferCmd::new(
                "bob",
                alice_account,
                bob_account,
                Currency::Usd,
                Money::new(100),
                at(2),
            ))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .edit_transaction(EditTransactionCmd::new(
                tx_id,
                expense("bob", bob_account, bob_category, 0),
            ))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));

    let bob_totals = engine
        .balances("bob", &BalanceQuery::default())
        .await
        .unwrap();
    assert_eq!(bob_totals.len(), 1);
    assert_eq!(bob_totals[0].amount, Money::ZERO);
    assert_eq!(
        balance(&engine, "alice", alice_account, Currency::Usd).await,
        1000
    );
}

#[tokio::test]
async fn concurrent_expenses_never_overdraw() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Food").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;

    let (first, second) = tokio::join!(
        engine.record_transaction(expense("alice", account_a, category, 600)),
        engine.record_transaction(expense("alice", account_a, category, 600)),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|outcome| matches!(outcome, Err(EngineError::InsufficientFunds(_))))
    );
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 400);
}

#[tokio::test]
async fn deleting_category_uncategorizes_transactions() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Food").await.unwrap();
    let tx_id = fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;

    assert!(matches!(
        engine.new_category("alice", " FOOD ").await,
        Err(EngineError::ExistingKey(_))
    ));

    engine.delete_category("alice", category).await.unwrap();

    let tx = engine.transaction("alice", tx_id).await.unwrap();
    assert_eq!(tx.category_id, None);
    assert!(engine.list_categories("alice").await.unwrap().is_empty());
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 1000);
}

#[tokio::test]
async fn reconcile_reports_tampered_wallets() {
    let (engine, db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let account_b = account(&engine, "alice", "B", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Salary").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;
    engine
        .record_transfer(TransferCmd::new(
            "alice",
            account_a,
            account_b,
            Currency::Usd,
            Money::new(250),
            at(2),
        ))
        .await
        .unwrap();

    assert!(
        engine
            .reconcile_balances("alice", account_a)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        engine
            .reconcile_balances("alice", account_b)
            .await
            .unwrap()
            .is_empty()
    );

    let backend = db.get_database_backend();
    db.execute(Statement::from_string(
        backend,
        "UPDATE wallets SET balance = balance + 100",
    ))
    .await
    .unwrap();

    let drifts = engine.reconcile_balances("alice", account_a).await.unwrap();
    assert_eq!(drifts.len(), 1);
    assert_eq!(drifts[0].stored, Money::new(850));
    assert_eq!(drifts[0].computed, Money::new(750));
}

#[tokio::test]
async fn card_charges_follow_installment_schedule() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Travel").await.unwrap();
    let card = engine
        .new_credit_card(NewCreditCardCmd::new("alice", account_a, Currency::Usd, "Visa"))
        .await
        .unwrap();

    assert!(matches!(
        engine
            .new_credit_card(NewCreditCardCmd::new("alice", account_a, Currency::Eur, "Amex"))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));

    let charge = engine
        .record_card_transaction(
            CardTransactionCmd::new(
                "alice",
                card,
                CardTransactionKind::Charge,
                Money::new(1000),
                Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap(),
            )
            .installments(3)
            .category_id(category)
            .description("flights"),
        )
        .await
        .unwrap();

    let schedule = engine.installments("alice", card).await.unwrap();
    let amounts: Vec<i64> = schedule.iter().map(|i| i.amount.minor()).collect();
    assert_eq!(amounts, vec![334, 333, 333]);
    let numbers: Vec<u32> = schedule.iter().map(|i| i.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(
        schedule[1].due_at,
        Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap()
    );

    // Card activity stays off the cash ledger.
    assert_eq!(balance(&engine, "alice", account_a, Currency::Usd).await, 0);

    assert!(matches!(
        engine.delete_credit_card("alice", card).await,
        Err(EngineError::InUse(_))
    ));
    assert!(matches!(
        engine.installments("bob", card).await,
        Err(EngineError::KeyNotFound(_))
    ));

    engine
        .delete_card_transaction("alice", charge)
        .await
        .unwrap();
    assert!(engine.installments("alice", card).await.unwrap().is_empty());
    engine.delete_credit_card("alice", card).await.unwrap();
}

#[tokio::test]
async fn accounts_with_money_or_history_stay() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd, Currency::Eur]).await;
    let category = engine.new_category("alice", "Salary").await.unwrap();
    let income = fund(&engine, "alice", account_a, Currency::Usd, category, 500).await;

    assert!(matches!(
        engine.delete_account("alice", account_a).await,
        Err(EngineError::InUse(_))
    ));
    assert!(matches!(
        engine
            .update_account(UpdateAccountCmd::new(
                "alice",
                account_a,
                "A",
                AccountKind::Bank,
                vec![Currency::Eur],
            ))
            .await,
        Err(EngineError::InUse(_))
    ));

    // Dropping the empty EUR wallet and adding ARS is fine.
    engine
        .update_account(
            UpdateAccountCmd::new(
                "alice",
                account_a,
                "Main",
                AccountKind::Bank,
                vec![Currency::Usd, Currency::Ars],
            )
            .description("salary account"),
        )
        .await
        .unwrap();
    let updated = engine.account("alice", account_a).await.unwrap();
    assert_eq!(updated.name, "Main");
    assert_eq!(updated.description.as_deref(), Some("salary account"));
    let mut currencies: Vec<Currency> = updated.wallets.iter().map(|w| w.currency).collect();
    currencies.sort();
    assert_eq!(currencies, vec![Currency::Usd, Currency::Ars]);

    engine.delete_transaction("alice", income).await.unwrap();
    engine.delete_account("alice", account_a).await.unwrap();
    assert!(engine.list_accounts("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn statistics_count_period_income_and_expense() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let account_b = account(&engine, "alice", "B", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Misc").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;
    engine
        .record_transaction(expense("alice", account_a, category, 200))
        .await
        .unwrap();
    engine
        .record_transfer(TransferCmd::new(
            "alice",
            account_a,
            account_b,
            Currency::Usd,
            Money::new(300),
            at(3),
        ))
        .await
        .unwrap();

    let all = engine.statistics("alice", None, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].balance, Money::new(800));
    assert_eq!(all[0].income, Money::new(1000));
    assert_eq!(all[0].expense, Money::new(200));

    let from_second = engine
        .statistics("alice", Some(at(2)), Some(at(10)))
        .await
        .unwrap();
    assert_eq!(from_second[0].income, Money::ZERO);
    assert_eq!(from_second[0].expense, Money::new(200));

    assert!(matches!(
        engine.statistics("alice", Some(at(5)), Some(at(5))).await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn transaction_list_filters_and_orders() {
    let (engine, _db) = engine_with_db().await;
    let account_a = account(&engine, "alice", "A", vec![Currency::Usd]).await;
    let category = engine.new_category("alice", "Misc").await.unwrap();
    fund(&engine, "alice", account_a, Currency::Usd, category, 1000).await;
    for day in [2, 3, 4] {
        engine
            .record_transaction(
                CreateTransactionCmd::new(
                    "alice",
                    account_a,
                    Currency::Usd,
                    category,
                    TransactionKind::Expense,
                    Money::new(10),
                    at(day),
                )
                .description(format!("day {day}")),
            )
            .await
            .unwrap();
    }

    let expenses = engine
        .list_transactions(
            "alice",
            &TransactionListFilter {
                kind: Some(TransactionKind::Expense),
                limit: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let descriptions: Vec<_> = expenses
        .iter()
        .map(|tx| tx.description.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(descriptions, vec!["day 4", "day 3"]);

    let window = engine
        .list_transactions(
            "alice",
            &TransactionListFilter {
                from: Some(at(2)),
                to: Some(at(4)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(window.len(), 2);

    assert!(matches!(
        engine
            .list_transactions(
                "alice",
                &TransactionListFilter {
                    limit: 0,
                    ..Default::default()
                },
            )
            .await,
        Err(EngineError::InvalidInput(_))
    ));
}
