pub use accounts::{Account, AccountKind};
pub use card_transactions::{
    CardTransaction, CardTransactionKind, Installment, MAX_INSTALLMENTS, split_installments,
};
pub use categories::Category;
pub use commands::{
    BalanceGrouping, BalanceQuery, CardTransactionCmd, CreateTransactionCmd, EditTransactionCmd,
    ExchangeCmd, NewAccountCmd, NewCreditCardCmd, TransactionListFilter, TransferCmd,
    UpdateAccountCmd,
};
pub use credit_cards::CreditCard;
pub use currency::Currency;
pub use effects::WalletEffect;
pub use error::{EngineError, ErrorKind};
pub use exchanges::Exchange;
pub use money::Money;
pub use ops::{BalanceDrift, BalanceRow, Engine, EngineBuilder, SpendSummary};
pub use transactions::{Transaction, TransactionKind};
pub use transfers::Transfer;
pub use wallets::Wallet;

mod accounts;
mod card_transactions;
mod categories;
mod commands;
mod credit_cards;
mod currency;
mod effects;
mod error;
mod exchanges;
mod installments;
mod money;
mod ops;
mod transactions;
mod transfers;
mod users;
mod util;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
