// Provider response types
//
// Read-only projections of the EIRC JSON responses. Fields use
// `#[serde(default)]` liberally because the provider is inconsistent about
// field presence across accounts and service types; undocumented fields
// land in `extra` instead of failing the whole parse.

use serde::{Deserialize, Serialize};

// ── Accounts ─────────────────────────────────────────────────────────

/// Subscriber account from `GET /v8/accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    #[serde(default)]
    pub alias: Option<String>,
    /// Unconfirmed accounts are visible but not yet usable;
    /// the embedding integration skips them.
    #[serde(default)]
    pub confirmed: bool,
    pub tenancy: Tenancy,
    #[serde(default)]
    pub service: Option<ServiceInfo>,
    #[serde(default)]
    pub delivery: bool,
    #[serde(default)]
    pub auto_payment_on: bool,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Tenancy block carrying the human-facing account register
/// (distinct from the internal numeric account id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenancy {
    pub register: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Service descriptor nested inside [`Account`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    #[serde(default)]
    pub provider_code: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Balance ──────────────────────────────────────────────────────────

/// One entry from the payment-discretion endpoint.
///
/// The account balance is the sum of `charge.accrued` across entries
/// with `checked == true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub charge: Charge,
    #[serde(default)]
    pub checked: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    #[serde(default)]
    pub accrued: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Meters ───────────────────────────────────────────────────────────

/// Meter from `GET /v6/accounts/{id}/meters/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meter {
    pub id: MeterId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subservice_id: Option<i64>,
    #[serde(default)]
    pub indications: Vec<Indication>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Meter identifier block. `registration` is the key used in the
/// reading-submission URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterId {
    pub registration: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single meter scale's reading record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indication {
    pub meter_scale_id: i64,
    #[serde(default)]
    pub scale_name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub previous_reading: Option<f64>,
    #[serde(default)]
    pub previous_reading_date: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One scale value submitted via
/// [`send_readings`](crate::EircClient::send_readings).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterReading {
    pub scale_id: i64,
    pub value: f64,
}

// ── Auth wire shapes (crate-private) ─────────────────────────────────

/// Successful login response body.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub auth: String,
}

/// Body of the distinguished "verification required" login response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerificationRequired {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Body of a successful email-code verification.
#[derive(Debug, Deserialize)]
pub(crate) struct TwoFactorTokens {
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub verified: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn account_parses_with_unknown_fields() {
        let account: Account = serde_json::from_value(json!({
            "id": 123,
            "alias": "Flat",
            "confirmed": true,
            "tenancy": { "register": "500-123-456" },
            "service": { "providerCode": "PES" },
            "delivery": false,
            "autoPaymentOn": true,
            "someFutureField": { "nested": 1 }
        }))
        .unwrap();

        assert_eq!(account.id, 123);
        assert_eq!(account.tenancy.register, "500-123-456");
        assert!(account.confirmed);
        assert!(account.auto_payment_on);
        assert!(account.extra.contains_key("someFutureField"));
    }

    #[test]
    fn meter_reading_serializes_camel_case() {
        let body = serde_json::to_value([MeterReading {
            scale_id: 7,
            value: 1234.5,
        }])
        .unwrap();
        assert_eq!(body, json!([{ "scaleId": 7, "value": 1234.5 }]));
    }
}
