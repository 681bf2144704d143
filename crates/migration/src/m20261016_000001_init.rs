//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: owners of everything below
//! - `accounts`: bank accounts, cash, digital and crypto wallets, brokers
//! - `wallets`: one running balance per account and currency
//! - `categories`: per-user transaction categories
//! - `transactions`: incomes and expenses on one wallet
//! - `transfers`: one currency moved between two accounts
//! - `exchanges`: two currencies swapped inside one account
//! - `credit_cards`, `card_transactions`, `installments`: card spending and
//!   its schedule

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    UserId,
    Name,
    NameNorm,
    Kind,
    Description,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    AccountId,
    Currency,
    Balance,
    Version,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    NameNorm,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    AccountId,
    Currency,
    CategoryId,
    Kind,
    AmountMinor,
    OccurredAt,
    Description,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    FromAccountId,
    ToAccountId,
    Currency,
    AmountMinor,
    OccurredAt,
    Description,
}

#[derive(Iden)]
enum Exchanges {
    Table,
    Id,
    AccountId,
    FromCurrency,
    ToCurrency,
    FromAmountMinor,
    ToAmountMinor,
    OccurredAt,
    Description,
}

#[derive(Iden)]
enum CreditCards {
    Table,
    Id,
    AccountId,
    Currency,
    Name,
    NameNorm,
}

#[derive(Iden)]
enum CardTransactions {
    Table,
    Id,
    CreditCardId,
    CategoryId,
    Kind,
    AmountMinor,
    Installments,
    OccurredAt,
    Description,
}

#[derive(Iden)]
enum Installments {
    Table,
    Id,
    CardTransactionId,
    Number,
    AmountMinor,
    DueAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::UserId).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::NameNorm).string().not_null())
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(ColumnDef::new(Accounts::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-user_id")
                            .from(Accounts::Table, Accounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-user_id-name_norm-kind-unique")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .col(Accounts::NameNorm)
                    .col(Accounts::Kind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Wallets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Wallets::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Wallets::AccountId).blob().not_null())
                    .col(ColumnDef::new(Wallets::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Wallets::Balance)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Wallets::Balance).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Wallets::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallets-account_id")
                            .from(Wallets::Table, Wallets::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-account_id-currency-unique")
                    .table(Wallets::Table)
                    .col(Wallets::AccountId)
                    .col(Wallets::Currency)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::UserId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-user_id")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::AccountId).blob().not_null())
                    .col(ColumnDef::new(Transactions::Currency).string().not_null())
                    .col(ColumnDef::new(Transactions::CategoryId).blob())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-occurred_at")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Transfers::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Transfers::FromAccountId).blob().not_null())
                    .col(ColumnDef::new(Transfers::ToAccountId).blob().not_null())
                    .col(ColumnDef::new(Transfers::Currency).string().not_null())
                    .col(ColumnDef::new(Transfers::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transfers::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-from_account_id")
                            .from(Transfers::Table, Transfers::FromAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-to_account_id")
                            .from(Transfers::Table, Transfers::ToAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Exchanges
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Exchanges::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Exchanges::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Exchanges::AccountId).blob().not_null())
                    .col(ColumnDef::new(Exchanges::FromCurrency).string().not_null())
                    .col(ColumnDef::new(Exchanges::ToCurrency).string().not_null())
                    .col(
                        ColumnDef::new(Exchanges::FromAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Exchanges::ToAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Exchanges::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Exchanges::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-exchanges-account_id")
                            .from(Exchanges::Table, Exchanges::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Credit cards
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CreditCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditCards::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditCards::AccountId).blob().not_null())
                    .col(ColumnDef::new(CreditCards::Currency).string().not_null())
                    .col(ColumnDef::new(CreditCards::Name).string().not_null())
                    .col(ColumnDef::new(CreditCards::NameNorm).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_cards-account_id")
                            .from(CreditCards::Table, CreditCards::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-credit_cards-account_id-name_norm-unique")
                    .table(CreditCards::Table)
                    .col(CreditCards::AccountId)
                    .col(CreditCards::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CardTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CardTransactions::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CardTransactions::CreditCardId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CardTransactions::CategoryId).blob())
                    .col(ColumnDef::new(CardTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(CardTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CardTransactions::Installments)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CardTransactions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CardTransactions::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-card_transactions-credit_card_id")
                            .from(CardTransactions::Table, CardTransactions::CreditCardId)
                            .to(CreditCards::Table, CreditCards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-card_transactions-category_id")
                            .from(CardTransactions::Table, CardTransactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Installments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Installments::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Installments::CardTransactionId)
                            .blob()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Installments::Number).integer().not_null())
                    .col(
                        ColumnDef::new(Installments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Installments::DueAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-installments-card_transaction_id")
                            .from(Installments::Table, Installments::CardTransactionId)
                            .to(CardTransactions::Table, CardTransactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-installments-card_transaction_id-number-unique")
                    .table(Installments::Table)
                    .col(Installments::CardTransactionId)
                    .col(Installments::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Installments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CardTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditCards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exchanges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
