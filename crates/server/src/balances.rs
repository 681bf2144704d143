//! Balance and statistics API endpoints

use api_types::{
    balance::{BalanceList, BalanceView, GroupBy},
    stats::{Statistic, StatisticsQuery},
};
use axum::{
    Extension,
    extract::{Query, State},
};
use engine::{BalanceGrouping, BalanceQuery};

use crate::{
    ApiResult,
    convert::{to_api_currency, to_engine_currency, utc},
    ok,
    server::ServerState,
    user::CurrentUser,
};

pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<BalanceList>,
) -> ApiResult<Vec<BalanceView>> {
    let query = BalanceQuery {
        account_id: query.account_id,
        currency: query.currency.map(to_engine_currency),
        group_by: match query.group_by.unwrap_or_default() {
            GroupBy::Currency => BalanceGrouping::Currency,
            GroupBy::Account => BalanceGrouping::Account,
        },
    };

    let rows = state
        .engine
        .balances(&user_id, &query)
        .await?
        .into_iter()
        .map(|row| BalanceView {
            account_id: row.account_id,
            currency: to_api_currency(row.currency),
            amount: row.amount.to_string(),
        })
        .collect();
    Ok(ok(rows))
}

/// Handle requests for user statistics
pub async fn stats(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<StatisticsQuery>,
) -> ApiResult<Vec<Statistic>> {
    let stats = state
        .engine
        .statistics(&user_id, query.from.map(utc), query.to.map(utc))
        .await?
        .into_iter()
        .map(|summary| Statistic {
            currency: to_api_currency(summary.currency),
            balance: summary.balance.to_string(),
            total_income: summary.income.to_string(),
            total_expenses: summary.expense.to_string(),
        })
        .collect();
    Ok(ok(stats))
}
