use sea_orm::{
    ActiveValue, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Exchange, ExchangeCmd, ResultEngine, accounts, exchanges,
    util::{normalize_optional_text, require_positive},
};

use super::{Engine, with_tx};

impl Engine {
    /// Converts `from_amount` of one currency into `to_amount` of another
    /// inside a single account.
    ///
    /// The account must hold wallets in both currencies and the source wallet
    /// must cover `from_amount`. The two amounts are unrelated to each other.
    pub async fn record_exchange(&self, cmd: ExchangeCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.from_amount, "from amount")?;
        require_positive(cmd.to_amount, "to amount")?;
        if cmd.from_currency == cmd.to_currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "cannot exchange {} into itself",
                cmd.from_currency
            )));
        }
        let exchange = Exchange {
            id: Uuid::new_v4(),
            account_id: cmd.account_id,
            from_currency: cmd.from_currency,
            to_currency: cmd.to_currency,
            from_amount: cmd.from_amount,
            to_amount: cmd.to_amount,
            occurred_at: cmd.occurred_at,
            description: normalize_optional_text(cmd.description.as_deref()),
        };

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, &cmd.user_id, exchange.account_id)
                .await?;
            for currency in [exchange.from_currency, exchange.to_currency] {
                self.require_wallet(&db_tx, exchange.account_id, currency)
                    .await?;
            }
            self.apply_effects(&db_tx, &exchange.effects()).await?;

            let model: exchanges::ActiveModel = (&exchange).into();
            model.insert(&db_tx).await?;
            Ok(exchange.id)
        })
    }

    /// Deletes an exchange and restores both wallets.
    ///
    /// Fails with [`EngineError::InsufficientFunds`] when the credited
    /// currency has since been spent.
    pub async fn delete_exchange(&self, user_id: &str, exchange_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_exchange(&db_tx, user_id, exchange_id).await?;
            let exchange = Exchange::try_from(model)?;
            let reversal = exchange.effects().map(|effect| effect.reversed());
            self.apply_effects(&db_tx, &reversal).await?;
            exchanges::Entity::delete_by_id(exchange_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub async fn exchange(&self, user_id: &str, exchange_id: Uuid) -> ResultEngine<Exchange> {
        with_tx!(self, |db_tx| {
            let model = self.require_exchange(&db_tx, user_id, exchange_id).await?;
            Exchange::try_from(model)
        })
    }

    /// Lists exchanges, newest first.
    pub async fn list_exchanges(
        &self,
        user_id: &str,
        account_id: Option<Uuid>,
    ) -> ResultEngine<Vec<Exchange>> {
        with_tx!(self, |db_tx| {
            let mut query = exchanges::Entity::find()
                .join(JoinType::InnerJoin, exchanges::Relation::Account.def())
                .filter(accounts::Column::UserId.eq(user_id));
            if let Some(account_id) = account_id {
                self.require_account(&db_tx, user_id, account_id).await?;
                query = query.filter(exchanges::Column::AccountId.eq(account_id));
            }
            let models = query
                .order_by_desc(exchanges::Column::OccurredAt)
                .order_by_desc(exchanges::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Exchange::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}

impl From<&Exchange> for exchanges::ActiveModel {
    fn from(exchange: &Exchange) -> Self {
        Self {
            id: ActiveValue::Set(exchange.id),
            account_id: ActiveValue::Set(exchange.account_id),
            from_currency: ActiveValue::Set(exchange.from_currency.code().to_string()),
            to_currency: ActiveValue::Set(exchange.to_currency.code().to_string()),
            from_amount_minor: ActiveValue::Set(exchange.from_amount.minor()),
            to_amount_minor: ActiveValue::Set(exchange.to_amount.minor()),
            occurred_at: ActiveValue::Set(exchange.occurred_at),
            description: ActiveValue::Set(exchange.description.clone()),
        }
    }
}
