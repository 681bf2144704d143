use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, AccountKind, Currency, EngineError, Money, NewAccountCmd, ResultEngine,
    UpdateAccountCmd, Wallet, accounts, credit_cards, exchanges, transactions, transfers,
    util::{name_key, normalize_optional_text, normalize_required_name},
    wallets,
};

use super::{Engine, wallets::sort_wallets, with_tx};

/// Rejects an empty wallet set and repeated currencies.
fn unique_currencies(currencies: &[Currency]) -> ResultEngine<BTreeSet<Currency>> {
    if currencies.is_empty() {
        return Err(EngineError::InvalidInput(
            "an account needs at least one currency".to_string(),
        ));
    }
    let mut set = BTreeSet::new();
    for currency in currencies {
        if !set.insert(*currency) {
            return Err(EngineError::ExistingKey(format!("{currency} wallet")));
        }
    }
    Ok(set)
}

impl Engine {
    /// Creates an account with one zero-balance wallet per currency.
    ///
    /// Name and kind together are unique per user; the name is compared after
    /// normalization.
    pub async fn new_account(&self, cmd: NewAccountCmd) -> ResultEngine<Uuid> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let name_norm = name_key(&name, "account")?;
        let description = normalize_optional_text(cmd.description.as_deref());
        let currencies = unique_currencies(&cmd.currencies)?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &cmd.user_id).await?;
            self.ensure_account_name_free(
                &db_tx,
                &cmd.user_id,
                &name,
                &name_norm,
                cmd.kind,
                None,
            )
            .await?;

            let account_id = Uuid::new_v4();
            let active = accounts::ActiveModel {
                id: ActiveValue::Set(account_id),
                user_id: ActiveValue::Set(cmd.user_id.clone()),
                name: ActiveValue::Set(name.clone()),
                name_norm: ActiveValue::Set(name_norm.clone()),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                description: ActiveValue::Set(description.clone()),
            };
            active
                .insert(&db_tx)
                .await
                .map_err(|err| EngineError::from_insert(err, &name))?;

            for currency in &currencies {
                self.insert_wallet(&db_tx, account_id, *currency).await?;
            }
            Ok(account_id)
        })
    }

    /// Updates name, kind, description and the wallet set of an account.
    ///
    /// Dropping a currency deletes its wallet, which is only allowed when the
    /// wallet is empty and nothing references it ([`EngineError::InUse`]
    /// otherwise).
    pub async fn update_account(&self, cmd: UpdateAccountCmd) -> ResultEngine<()> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let name_norm = name_key(&name, "account")?;
        let description = normalize_optional_text(cmd.description.as_deref());
        let currencies = unique_currencies(&cmd.currencies)?;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, &cmd.user_id, cmd.account_id)
                .await?;
            self.ensure_account_name_free(
                &db_tx,
                &cmd.user_id,
                &name,
                &name_norm,
                cmd.kind,
                Some(cmd.account_id),
            )
            .await?;

            let active = accounts::ActiveModel {
                id: ActiveValue::Set(cmd.account_id),
                name: ActiveValue::Set(name.clone()),
                name_norm: ActiveValue::Set(name_norm.clone()),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                description: ActiveValue::Set(description.clone()),
                ..Default::default()
            };
            active
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_insert(err, &name))?;

            let existing = self.account_wallets(&db_tx, cmd.account_id).await?;
            for wallet in &existing {
                if !currencies.contains(&wallet.currency) {
                    self.ensure_wallet_removable(&db_tx, wallet).await?;
                    wallets::Entity::delete_by_id(wallet.id)
                        .exec(&db_tx)
                        .await?;
                }
            }
            for currency in &currencies {
                if !existing.iter().any(|wallet| wallet.currency == *currency) {
                    self.insert_wallet(&db_tx, cmd.account_id, *currency)
                        .await?;
                }
            }
            Ok(())
        })
    }

    /// Deletes an account and its wallets.
    ///
    /// Refused with [`EngineError::InUse`] while any wallet holds money or any
    /// ledger row or credit card points at the account.
    pub async fn delete_account(&self, user_id: &str, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, account_id).await?;
            for wallet in self.account_wallets(&db_tx, account_id).await? {
                self.ensure_wallet_removable(&db_tx, &wallet).await?;
            }
            if self.account_references(&db_tx, account_id, None).await? > 0 {
                return Err(EngineError::InUse("account has ledger entries".to_string()));
            }

            wallets::Entity::delete_many()
                .filter(wallets::Column::AccountId.eq(account_id))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_by_id(account_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Return an account snapshot with its wallets.
    pub async fn account(&self, user_id: &str, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, user_id, account_id).await?;
            let wallets = self.account_wallets(&db_tx, account_id).await?;
            Account::try_from((model, wallets))
        })
    }

    /// Every account of a user, by name.
    pub async fn list_accounts(&self, user_id: &str) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .order_by_asc(accounts::Column::NameNorm)
                .order_by_asc(accounts::Column::Kind)
                .all(&db_tx)
                .await?;
            let ids: Vec<Uuid> = models.iter().map(|model| model.id).collect();

            let mut by_account: HashMap<Uuid, Vec<Wallet>> = HashMap::new();
            for model in wallets::Entity::find()
                .filter(wallets::Column::AccountId.is_in(ids))
                .all(&db_tx)
                .await?
            {
                let wallet = Wallet::try_from(model)?;
                by_account.entry(wallet.account_id).or_default().push(wallet);
            }

            models
                .into_iter()
                .map(|model| {
                    let mut wallets = by_account.remove(&model.id).unwrap_or_default();
                    sort_wallets(&mut wallets);
                    Account::try_from((model, wallets))
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    async fn insert_wallet(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        currency: Currency,
    ) -> ResultEngine<()> {
        let active = wallets::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            account_id: ActiveValue::Set(account_id),
            currency: ActiveValue::Set(currency.code().to_string()),
            balance: ActiveValue::Set(0),
            version: ActiveValue::Set(0),
        };
        active
            .insert(db)
            .await
            .map_err(|err| EngineError::from_insert(err, &format!("{currency} wallet")))?;
        Ok(())
    }

    async fn ensure_account_name_free(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        name: &str,
        name_norm: &str,
        kind: AccountKind,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::NameNorm.eq(name_norm))
            .filter(accounts::Column::Kind.eq(kind.as_str()));
        if let Some(id) = except {
            query = query.filter(accounts::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(format!(
                "{name} ({})",
                kind.as_str()
            )));
        }
        Ok(())
    }

    async fn ensure_wallet_removable(
        &self,
        db: &DatabaseTransaction,
        wallet: &Wallet,
    ) -> ResultEngine<()> {
        if wallet.balance != Money::ZERO {
            return Err(EngineError::InUse(format!(
                "{} wallet still holds {}",
                wallet.currency, wallet.balance
            )));
        }
        if self
            .account_references(db, wallet.account_id, Some(wallet.currency))
            .await?
            > 0
        {
            return Err(EngineError::InUse(format!(
                "{} wallet has ledger entries",
                wallet.currency
            )));
        }
        Ok(())
    }

    /// Counts ledger rows and credit cards pointing at an account, optionally
    /// restricted to one currency.
    async fn account_references(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        currency: Option<Currency>,
    ) -> ResultEngine<u64> {
        let code = currency.map(Currency::code);

        let mut tx_query =
            transactions::Entity::find().filter(transactions::Column::AccountId.eq(account_id));
        let mut transfer_query = transfers::Entity::find().filter(
            Condition::any()
                .add(transfers::Column::FromAccountId.eq(account_id))
                .add(transfers::Column::ToAccountId.eq(account_id)),
        );
        let mut exchange_query =
            exchanges::Entity::find().filter(exchanges::Column::AccountId.eq(account_id));
        let mut card_query =
            credit_cards::Entity::find().filter(credit_cards::Column::AccountId.eq(account_id));

        if let Some(code) = code {
            tx_query = tx_query.filter(transactions::Column::Currency.eq(code));
            transfer_query = transfer_query.filter(transfers::Column::Currency.eq(code));
            exchange_query = exchange_query.filter(
                Condition::any()
                    .add(exchanges::Column::FromCurrency.eq(code))
                    .add(exchanges::Column::ToCurrency.eq(code)),
            );
            card_query = card_query.filter(credit_cards::Column::Currency.eq(code));
        }

        Ok(tx_query.count(db).await?
            + transfer_query.count(db).await?
            + exchange_query.count(db).await?
            + card_query.count(db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_set_rejects_duplicates_and_empty_lists() {
        assert!(matches!(
            unique_currencies(&[]),
            Err(EngineError::InvalidInput(_))
        ));
        assert_eq!(
            unique_currencies(&[Currency::Usd, Currency::Eur, Currency::Usd]).unwrap_err(),
            EngineError::ExistingKey("USD wallet".to_string())
        );
        assert_eq!(
            unique_currencies(&[Currency::Eur, Currency::Usd]).unwrap().len(),
            2
        );
    }
}
