// Account endpoints: listing and balance.

use tracing::debug;

use crate::client::EircClient;
use crate::error::Error;
use crate::models::{Account, BalanceEntry};

const ACCOUNTS_PATH: &str = "v8/accounts";

fn balance_path(account_id: i64) -> String {
    format!("v7/accounts/{account_id}/payments/at/current/amount/discretion")
}

impl EircClient {
    /// Fetch all subscriber accounts visible to the logged-in user.
    pub async fn list_accounts(&mut self) -> Result<Vec<Account>, Error> {
        let url = self.api_url(ACCOUNTS_PATH)?;
        self.get_json(url).await
    }

    /// Current balance for an account: the sum of accrued charges across
    /// entries the provider flags as `checked`.
    pub async fn account_balance(&mut self, account_id: i64) -> Result<f64, Error> {
        let url = self.api_url(&balance_path(account_id))?;
        let entries: Vec<BalanceEntry> = self.get_json(url).await?;

        let balance = entries
            .iter()
            .filter(|entry| entry.checked)
            .map(|entry| entry.charge.accrued)
            .sum();
        debug!("account {account_id} balance: {balance}");
        Ok(balance)
    }
}
