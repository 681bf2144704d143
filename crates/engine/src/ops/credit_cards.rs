use sea_orm::{
    ActiveValue, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    CardTransaction, CardTransactionCmd, CreditCard, EngineError, Installment, NewCreditCardCmd,
    ResultEngine, accounts, card_transactions, credit_cards, installments, split_installments,
    util::{name_key, normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Attaches a credit card to an account.
    ///
    /// The account must already hold a wallet in the card currency. Card names
    /// are unique per account.
    pub async fn new_credit_card(&self, cmd: NewCreditCardCmd) -> ResultEngine<Uuid> {
        let name = normalize_required_name(&cmd.name, "credit card")?;
        let name_norm = name_key(&name, "credit card")?;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, &cmd.user_id, cmd.account_id)
                .await?;
            self.require_wallet(&db_tx, cmd.account_id, cmd.currency)
                .await?;

            let taken = credit_cards::Entity::find()
                .filter(credit_cards::Column::AccountId.eq(cmd.account_id))
                .filter(credit_cards::Column::NameNorm.eq(name_norm.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(name.clone()));
            }

            let id = Uuid::new_v4();
            let active = credit_cards::ActiveModel {
                id: ActiveValue::Set(id),
                account_id: ActiveValue::Set(cmd.account_id),
                currency: ActiveValue::Set(cmd.currency.code().to_string()),
                name: ActiveValue::Set(name.clone()),
                name_norm: ActiveValue::Set(name_norm.clone()),
            };
            active
                .insert(&db_tx)
                .await
                .map_err(|err| EngineError::from_insert(err, &name))?;
            Ok(id)
        })
    }

    /// Deletes a credit card without transactions.
    pub async fn delete_credit_card(
        &self,
        user_id: &str,
        credit_card_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_credit_card(&db_tx, user_id, credit_card_id)
                .await?;
            let used = card_transactions::Entity::find()
                .filter(card_transactions::Column::CreditCardId.eq(credit_card_id))
                .count(&db_tx)
                .await?;
            if used > 0 {
                return Err(EngineError::InUse(format!(
                    "credit card has {used} transactions"
                )));
            }
            credit_cards::Entity::delete_by_id(credit_card_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Credit cards of a user, optionally restricted to one account.
    pub async fn list_credit_cards(
        &self,
        user_id: &str,
        account_id: Option<Uuid>,
    ) -> ResultEngine<Vec<CreditCard>> {
        with_tx!(self, |db_tx| {
            let mut query = credit_cards::Entity::find()
                .join(JoinType::InnerJoin, credit_cards::Relation::Account.def())
                .filter(accounts::Column::UserId.eq(user_id));
            if let Some(account_id) = account_id {
                self.require_account(&db_tx, user_id, account_id).await?;
                query = query.filter(credit_cards::Column::AccountId.eq(account_id));
            }
            let models = query
                .order_by_asc(credit_cards::Column::NameNorm)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(CreditCard::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Records a charge or a refund and its installment schedule.
    ///
    /// Card activity is tracked apart from the cash ledger: no wallet balance
    /// changes here.
    pub async fn record_card_transaction(&self, cmd: CardTransactionCmd) -> ResultEngine<Uuid> {
        let id = Uuid::new_v4();
        let schedule = split_installments(id, cmd.amount, cmd.installments, cmd.occurred_at)?;
        let card_tx = CardTransaction {
            id,
            credit_card_id: cmd.credit_card_id,
            category_id: cmd.category_id,
            kind: cmd.kind,
            amount: cmd.amount,
            installments: cmd.installments,
            occurred_at: cmd.occurred_at,
            description: normalize_optional_text(cmd.description.as_deref()),
        };

        with_tx!(self, |db_tx| {
            self.require_credit_card(&db_tx, &cmd.user_id, card_tx.credit_card_id)
                .await?;
            if let Some(category_id) = card_tx.category_id {
                self.require_category(&db_tx, &cmd.user_id, category_id)
                    .await?;
            }

            let active: card_transactions::ActiveModel = (&card_tx).try_into()?;
            active.insert(&db_tx).await?;
            for installment in &schedule {
                let active: installments::ActiveModel = installment.try_into()?;
                active.insert(&db_tx).await?;
            }
            Ok(card_tx.id)
        })
    }

    /// Deletes a card transaction together with its installments.
    pub async fn delete_card_transaction(
        &self,
        user_id: &str,
        card_transaction_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_card_transaction(&db_tx, user_id, card_transaction_id)
                .await?;
            installments::Entity::delete_many()
                .filter(installments::Column::CardTransactionId.eq(card_transaction_id))
                .exec(&db_tx)
                .await?;
            card_transactions::Entity::delete_by_id(card_transaction_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Transactions of a credit card, newest first.
    pub async fn card_transactions(
        &self,
        user_id: &str,
        credit_card_id: Uuid,
    ) -> ResultEngine<Vec<CardTransaction>> {
        with_tx!(self, |db_tx| {
            self.require_credit_card(&db_tx, user_id, credit_card_id)
                .await?;
            let models = card_transactions::Entity::find()
                .filter(card_transactions::Column::CreditCardId.eq(credit_card_id))
                .order_by_desc(card_transactions::Column::OccurredAt)
                .order_by_desc(card_transactions::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(CardTransaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Installment schedule of every transaction on a credit card, by due
    /// date.
    pub async fn installments(
        &self,
        user_id: &str,
        credit_card_id: Uuid,
    ) -> ResultEngine<Vec<Installment>> {
        with_tx!(self, |db_tx| {
            self.require_credit_card(&db_tx, user_id, credit_card_id)
                .await?;
            let models = installments::Entity::find()
                .join(
                    JoinType::InnerJoin,
                    installments::Relation::CardTransaction.def(),
                )
                .filter(card_transactions::Column::CreditCardId.eq(credit_card_id))
                .order_by_asc(installments::Column::DueAt)
                .order_by_asc(installments::Column::CardTransactionId)
                .order_by_asc(installments::Column::Number)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Installment::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}

fn stored_count(value: u32) -> ResultEngine<i32> {
    i32::try_from(value).map_err(|_| EngineError::OutOfRange("installment count".to_string()))
}

impl TryFrom<&CardTransaction> for card_transactions::ActiveModel {
    type Error = EngineError;

    fn try_from(tx: &CardTransaction) -> ResultEngine<Self> {
        Ok(Self {
            id: ActiveValue::Set(tx.id),
            credit_card_id: ActiveValue::Set(tx.credit_card_id),
            category_id: ActiveValue::Set(tx.category_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            installments: ActiveValue::Set(stored_count(tx.installments)?),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            description: ActiveValue::Set(tx.description.clone()),
        })
    }
}

impl TryFrom<&Installment> for installments::ActiveModel {
    type Error = EngineError;

    fn try_from(installment: &Installment) -> ResultEngine<Self> {
        Ok(Self {
            id: ActiveValue::Set(Uuid::new_v4()),
            card_transaction_id: ActiveValue::Set(installment.card_transaction_id),
            number: ActiveValue::Set(stored_count(installment.number)?),
            amount_minor: ActiveValue::Set(installment.amount.minor()),
            due_at: ActiveValue::Set(installment.due_at),
        })
    }
}
