// Meter endpoints: info and reading submission.

use reqwest::Method;
use tracing::debug;

use crate::client::EircClient;
use crate::error::Error;
use crate::models::{Meter, MeterReading};

fn meters_info_path(account_id: i64) -> String {
    format!("v6/accounts/{account_id}/meters/info")
}

fn reading_path(account_id: i64, registration: &str) -> String {
    format!("v8/accounts/{account_id}/meters/{registration}/reading")
}

impl EircClient {
    /// Fetch meters (with their scale indications) for an account.
    pub async fn meter_info(&mut self, account_id: i64) -> Result<Vec<Meter>, Error> {
        let url = self.api_url(&meters_info_path(account_id))?;
        self.get_json(url).await
    }

    /// Submit a batch of scale readings for one meter.
    ///
    /// `registration` is the meter's registration key from
    /// [`MeterId`](crate::models::MeterId), not the numeric account id.
    /// The provider answers with a free-form body; only the status matters.
    pub async fn send_readings(
        &mut self,
        account_id: i64,
        registration: &str,
        readings: &[MeterReading],
    ) -> Result<(), Error> {
        let url = self.api_url(&reading_path(account_id, registration))?;
        debug!(
            "submitting {} reading(s) for meter {registration} on account {account_id}",
            readings.len()
        );

        self.execute(Method::POST, url, Some(readings), false)
            .await?;
        Ok(())
    }
}
