//! Applying wallet effects.
//!
//! Ledger operations describe what they do to balances as a list of
//! [`WalletEffect`]s (new effects, reversed old ones, or both for an edit).
//! [`Engine::apply_effects`] nets them per wallet, checks every resulting
//! balance and only then writes, so a rejected operation never touches a
//! wallet.

use std::collections::BTreeMap;

use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::{Currency, Money, ResultEngine, WalletEffect};

use super::{Engine, wallets::insufficient_funds};

/// Sums effects per `(account, currency)`, dropping wallets whose net change
/// is zero.
pub(super) fn net_effects(
    effects: &[WalletEffect],
) -> ResultEngine<BTreeMap<(Uuid, Currency), Money>> {
    let mut net: BTreeMap<(Uuid, Currency), Money> = BTreeMap::new();
    for effect in effects {
        let entry = net.entry(effect.wallet_key()).or_insert(Money::ZERO);
        *entry = entry.checked_add(effect.delta)?;
    }
    net.retain(|_, delta| !delta.is_zero());
    Ok(net)
}

impl Engine {
    pub(super) async fn apply_effects(
        &self,
        db: &DatabaseTransaction,
        effects: &[WalletEffect],
    ) -> ResultEngine<()> {
        let net = net_effects(effects)?;

        let mut planned = Vec::with_capacity(net.len());
        for ((account_id, currency), delta) in net {
            let wallet = self.require_wallet(db, account_id, currency).await?;
            let balance = Money::new(wallet.balance);
            if balance.checked_add(delta)?.is_negative() {
                tracing::debug!(
                    %account_id,
                    %currency,
                    %balance,
                    %delta,
                    "rejecting mutation, wallet would go negative"
                );
                return Err(insufficient_funds(&wallet.currency, balance, delta));
            }
            planned.push((wallet.id, delta));
        }

        for (wallet_id, delta) in planned {
            self.adjust_balance(db, wallet_id, delta).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_place_edit_nets_to_the_difference() {
        let account = Uuid::new_v4();
        let old = WalletEffect::new(account, Currency::Usd, Money::new(-500));
        let new = WalletEffect::new(account, Currency::Usd, Money::new(-800));

        let net = net_effects(&[old.reversed(), new]).unwrap();
        assert_eq!(net.get(&(account, Currency::Usd)), Some(&Money::new(-300)));
    }

    #[test]
    fn moved_edit_touches_both_wallets() {
        let old_account = Uuid::new_v4();
        let new_account = Uuid::new_v4();
        let old = WalletEffect::new(old_account, Currency::Usd, Money::new(200));
        let new = WalletEffect::new(new_account, Currency::Eur, Money::new(200));

        let net = net_effects(&[old.reversed(), new]).unwrap();
        assert_eq!(net.len(), 2);
        assert_eq!(
            net.get(&(old_account, Currency::Usd)),
            Some(&Money::new(-200))
        );
        assert_eq!(net.get(&(new_account, Currency::Eur)), Some(&Money::new(200)));
    }

    #[test]
    fn unchanged_edit_is_a_no_op() {
        let effect = WalletEffect::new(Uuid::new_v4(), Currency::Ars, Money::new(-42));
        assert!(net_effects(&[effect.reversed(), effect]).unwrap().is_empty());
    }
}
