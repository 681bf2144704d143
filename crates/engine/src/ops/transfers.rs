use sea_orm::{
    ActiveValue, Condition, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transfer, TransferCmd, accounts, transfers,
    util::{normalize_optional_text, require_positive},
};

use super::{Engine, with_tx};

impl Engine {
    /// Moves money between two wallets of the same currency.
    ///
    /// Both accounts must belong to the user, be distinct and hold a wallet
    /// in `currency`. The source wallet must cover the amount.
    pub async fn record_transfer(&self, cmd: TransferCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.amount, "amount")?;
        if cmd.from_account_id == cmd.to_account_id {
            return Err(EngineError::InvalidInput(
                "transfer source and destination must differ".to_string(),
            ));
        }
        let transfer = Transfer {
            id: Uuid::new_v4(),
            from_account_id: cmd.from_account_id,
            to_account_id: cmd.to_account_id,
            currency: cmd.currency,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
            description: normalize_optional_text(cmd.description.as_deref()),
        };

        with_tx!(self, |db_tx| {
            for account_id in [transfer.from_account_id, transfer.to_account_id] {
                self.require_account(&db_tx, &cmd.user_id, account_id)
                    .await?;
                self.require_wallet(&db_tx, account_id, transfer.currency)
                    .await?;
            }
            self.apply_effects(&db_tx, &transfer.effects()).await?;

            let model: transfers::ActiveModel = (&transfer).into();
            model.insert(&db_tx).await?;
            Ok(transfer.id)
        })
    }

    /// Deletes a transfer, moving the amount back to the source wallet.
    ///
    /// Fails with [`EngineError::InsufficientFunds`] when the destination has
    /// already spent part of the transferred amount.
    pub async fn delete_transfer(&self, user_id: &str, transfer_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_transfer(&db_tx, user_id, transfer_id).await?;
            let transfer = Transfer::try_from(model)?;
            let reversal = transfer.effects().map(|effect| effect.reversed());
            self.apply_effects(&db_tx, &reversal).await?;
            transfers::Entity::delete_by_id(transfer_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub async fn transfer(&self, user_id: &str, transfer_id: Uuid) -> ResultEngine<Transfer> {
        with_tx!(self, |db_tx| {
            let model = self.require_transfer(&db_tx, user_id, transfer_id).await?;
            Transfer::try_from(model)
        })
    }

    /// Lists transfers, newest first. With `account_id`, only transfers in or
    /// out of that account.
    pub async fn list_transfers(
        &self,
        user_id: &str,
        account_id: Option<Uuid>,
    ) -> ResultEngine<Vec<Transfer>> {
        with_tx!(self, |db_tx| {
            let mut query = transfers::Entity::find()
                .join(JoinType::InnerJoin, transfers::Relation::FromAccount.def())
                .filter(accounts::Column::UserId.eq(user_id));
            if let Some(account_id) = account_id {
                self.require_account(&db_tx, user_id, account_id).await?;
                query = query.filter(
                    Condition::any()
                        .add(transfers::Column::FromAccountId.eq(account_id))
                        .add(transfers::Column::ToAccountId.eq(account_id)),
                );
            }
            let models = query
                .order_by_desc(transfers::Column::OccurredAt)
                .order_by_desc(transfers::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Transfer::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}

impl From<&Transfer> for transfers::ActiveModel {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(transfer.id),
            from_account_id: ActiveValue::Set(transfer.from_account_id),
            to_account_id: ActiveValue::Set(transfer.to_account_id),
            currency: ActiveValue::Set(transfer.currency.code().to_string()),
            amount_minor: ActiveValue::Set(transfer.amount.minor()),
            occurred_at: ActiveValue::Set(transfer.occurred_at),
            description: ActiveValue::Set(transfer.description.clone()),
        }
    }
}
