use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    Condition, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    BalanceGrouping, BalanceQuery, Currency, Exchange, Money, ResultEngine, Transaction, Transfer,
    WalletEffect, accounts, exchanges, transactions, transfers, util::model_currency, wallets,
};

use super::{Engine, with_tx};

/// One line of a balance query.
///
/// `account_id` is set when grouping by account and `None` when the amount is
/// a per-currency total across accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub account_id: Option<Uuid>,
    pub currency: Currency,
    pub amount: Money,
}

/// A wallet whose stored balance disagrees with its ledger rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    pub wallet_id: Uuid,
    pub currency: Currency,
    pub stored: Money,
    pub computed: Money,
}

impl Engine {
    /// Sums wallet balances of a user.
    ///
    /// Grouping by currency yields one total per currency; grouping by
    /// account yields one row per `(account, currency)` wallet, ordered by
    /// account then currency.
    pub async fn balances(
        &self,
        user_id: &str,
        query: &BalanceQuery,
    ) -> ResultEngine<Vec<BalanceRow>> {
        with_tx!(self, |db_tx| {
            if let Some(account_id) = query.account_id {
                self.require_account(&db_tx, user_id, account_id).await?;
            }
            let models = self
                .owned_wallets(&db_tx, user_id, query.account_id, query.currency)
                .await?;

            match query.group_by {
                BalanceGrouping::Currency => {
                    let mut totals: BTreeMap<Currency, Money> = BTreeMap::new();
                    for model in models {
                        let currency = model_currency(&model.currency)?;
                        let total = totals.entry(currency).or_insert(Money::ZERO);
                        *total = total.checked_add(Money::new(model.balance))?;
                    }
                    Ok(totals
                        .into_iter()
                        .map(|(currency, amount)| BalanceRow {
                            account_id: None,
                            currency,
                            amount,
                        })
                        .collect::<Vec<_>>())
                }
                BalanceGrouping::Account => {
                    let mut rows = models
                        .into_iter()
                        .map(|model| {
                            Ok(BalanceRow {
                                account_id: Some(model.account_id),
                                currency: model_currency(&model.currency)?,
                                amount: Money::new(model.balance),
                            })
                        })
                        .collect::<ResultEngine<Vec<_>>>()?;
                    rows.sort_by_key(|row| (row.account_id, row.currency));
                    Ok(rows)
                }
            }
        })
    }

    /// Replays the ledger rows of an account and reports every wallet whose
    /// stored balance does not match them. Read-only.
    pub async fn reconcile_balances(
        &self,
        user_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, account_id).await?;
            let effects = self.account_effects(&db_tx, account_id).await?;

            let mut computed: HashMap<Currency, Money> = HashMap::new();
            for effect in effects
                .into_iter()
                .filter(|effect| effect.account_id == account_id)
            {
                let sum = computed.entry(effect.currency).or_insert(Money::ZERO);
                *sum = sum.checked_add(effect.delta)?;
            }

            let mut drifts = Vec::new();
            for wallet in self.account_wallets(&db_tx, account_id).await? {
                let expected = computed
                    .get(&wallet.currency)
                    .copied()
                    .unwrap_or(Money::ZERO);
                if expected != wallet.balance {
                    tracing::warn!(
                        wallet_id = %wallet.id,
                        currency = %wallet.currency,
                        stored = %wallet.balance,
                        computed = %expected,
                        "wallet balance drifted from ledger"
                    );
                    drifts.push(BalanceDrift {
                        wallet_id: wallet.id,
                        currency: wallet.currency,
                        stored: wallet.balance,
                        computed: expected,
                    });
                }
            }
            Ok(drifts)
        })
    }

    /// Wallets of a user joined through `accounts`, so foreign wallets can
    /// never leak into a total.
    async fn owned_wallets(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        account_id: Option<Uuid>,
        currency: Option<Currency>,
    ) -> ResultEngine<Vec<wallets::Model>> {
        let mut query = wallets::Entity::find()
            .join(JoinType::InnerJoin, wallets::Relation::Account.def())
            .filter(accounts::Column::UserId.eq(user_id));
        if let Some(account_id) = account_id {
            query = query.filter(wallets::Column::AccountId.eq(account_id));
        }
        if let Some(currency) = currency {
            query = query.filter(wallets::Column::Currency.eq(currency.code()));
        }
        query
            .order_by_asc(wallets::Column::AccountId)
            .order_by_asc(wallets::Column::Currency)
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// Every wallet effect of every ledger row touching the account.
    async fn account_effects(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Vec<WalletEffect>> {
        let mut effects = Vec::new();

        for model in transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .all(db)
            .await?
        {
            effects.push(Transaction::try_from(model)?.effect());
        }

        for model in transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(transfers::Column::FromAccountId.eq(account_id))
                    .add(transfers::Column::ToAccountId.eq(account_id)),
            )
            .all(db)
            .await?
        {
            effects.extend(Transfer::try_from(model)?.effects());
        }

        for model in exchanges::Entity::find()
            .filter(exchanges::Column::AccountId.eq(account_id))
            .all(db)
            .await?
        {
            effects.extend(Exchange::try_from(model)?.effects());
        }

        Ok(effects)
    }
}
