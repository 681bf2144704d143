//! Ownership guard.
//!
//! Every lookup is scoped to the acting user. A row that exists but belongs to
//! someone else is reported exactly like a missing one, so callers can never
//! probe for other users' ids.

use sea_orm::{DatabaseTransaction, JoinType, QueryFilter, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, accounts, card_transactions, categories, credit_cards, exchanges,
    transactions, transfers, users,
};

use super::Engine;

/// Generates a `require_*` method for an entity whose ownership goes through
/// one join to `accounts`.
macro_rules! impl_require_through_account {
    ($require_fn:ident, $entity:path, $model:path, $relation:expr, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            user_id: &str,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .join(JoinType::InnerJoin, $relation)
                .filter(accounts::Column::UserId.eq(user_id))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_through_account!(
        require_transaction,
        transactions::Entity,
        transactions::Model,
        transactions::Relation::Account.def(),
        "transaction not exists"
    );

    impl_require_through_account!(
        require_transfer,
        transfers::Entity,
        transfers::Model,
        transfers::Relation::FromAccount.def(),
        "transfer not exists"
    );

    impl_require_through_account!(
        require_exchange,
        exchanges::Entity,
        exchanges::Model,
        exchanges::Relation::Account.def(),
        "exchange not exists"
    );

    impl_require_through_account!(
        require_credit_card,
        credit_cards::Entity,
        credit_cards::Model,
        credit_cards::Relation::Account.def(),
        "credit card not exists"
    );

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<()> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    pub(super) async fn require_category(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    /// Card transactions sit two joins away from their owner.
    pub(super) async fn require_card_transaction(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        card_transaction_id: Uuid,
    ) -> ResultEngine<card_transactions::Model> {
        card_transactions::Entity::find_by_id(card_transaction_id)
            .join(
                JoinType::InnerJoin,
                card_transactions::Relation::CreditCard.def(),
            )
            .join(JoinType::InnerJoin, credit_cards::Relation::Account.def())
            .filter(accounts::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("card transaction not exists".to_string()))
    }
}
