//! Normalised inbound webhook payload.
//!
//! Gateways disagree on field names (`transactionId` vs `id`, `userId` vs
//! `uid`) and on whether `amount` is a number or a string. The raw body is
//! decoded once here into [`InboundWebhook`]; nothing downstream looks at the
//! wire shape again.

use serde::Deserialize;
use serde_json::Number;

use super::money::{Amount, Currency};
use super::webhook_errors::WebhookError;
use super::EntitlementUpdate;
use crate::domain::foundation::{TransactionId, UserId};

/// Raw wire shape. Every field is optional so that missing fields surface as
/// `MissingField` rather than an opaque serde error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePayload {
    #[serde(alias = "transaction_id")]
    transaction_id: Option<String>,
    id: Option<String>,
    status: Option<String>,
    amount: Option<WireAmount>,
    currency: Option<String>,
    context: Option<String>,
    timestamp: Option<serde_json::Value>,
    #[serde(alias = "user_id")]
    user_id: Option<String>,
    uid: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireAmount {
    Number(Number),
    Text(String),
}

impl WireAmount {
    fn into_amount(self) -> Result<Amount, WebhookError> {
        let text = match self {
            WireAmount::Number(n) => n.to_string(),
            WireAmount::Text(s) => s.trim().to_string(),
        };
        parse_amount(&text)
    }
}

/// Integers are whole currency units; decimals are converted to minor units.
fn parse_amount(text: &str) -> Result<Amount, WebhookError> {
    let invalid = || WebhookError::InvalidPayload(format!("amount is not numeric: {:?}", text));

    // Checked on the text: "-0.50" has a zero major part.
    if text.starts_with('-') {
        return Err(WebhookError::InvalidPayload(format!(
            "amount must be positive, got {}",
            text
        )));
    }

    let amount = match text.split_once('.') {
        None => Amount::whole(text.parse::<i64>().map_err(|_| invalid())?),
        Some((major, fraction)) => {
            let major: i64 = major.parse().map_err(|_| invalid())?;
            if fraction.is_empty() || fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let cents: i64 = format!("{:0<2}", fraction).parse().map_err(|_| invalid())?;
            if cents == 0 {
                Amount::whole(major)
            } else {
                let minor = major
                    .checked_mul(100)
                    .and_then(|m| m.checked_add(cents))
                    .ok_or_else(invalid)?;
                Amount::minor(minor)
            }
        }
    };

    if amount.value() <= 0 {
        return Err(WebhookError::InvalidPayload(format!(
            "amount must be positive, got {}",
            text
        )));
    }
    Ok(amount)
}

/// A structurally valid webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundWebhook {
    pub transaction_id: TransactionId,
    /// Gateway status string as sent, for logging.
    pub status: String,
    pub amount: Amount,
    pub currency: Currency,
    pub context: Option<String>,
    pub timestamp: Option<String>,
    /// `userId` if present, else `uid`.
    pub claimed_user_id: Option<UserId>,
    pub email: Option<String>,
}

impl InboundWebhook {
    /// Parses and validates a raw webhook body.
    ///
    /// `default_currency` fills in for gateways that omit the currency.
    pub fn parse(body: &[u8], default_currency: &Currency) -> Result<Self, WebhookError> {
        let wire: WirePayload = serde_json::from_slice(body)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        let transaction_id = non_blank(wire.transaction_id)
            .or_else(|| non_blank(wire.id))
            .ok_or(WebhookError::MissingField("transactionId"))?;
        let transaction_id = TransactionId::new(transaction_id)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        let status = non_blank(wire.status).ok_or(WebhookError::MissingField("status"))?;
        let amount = wire
            .amount
            .ok_or(WebhookError::MissingField("amount"))?
            .into_amount()?;

        let currency = match non_blank(wire.currency) {
            Some(code) => {
                Currency::new(code).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?
            }
            None => default_currency.clone(),
        };

        let claimed_user_id = non_blank(wire.user_id)
            .or_else(|| non_blank(wire.uid))
            .and_then(|id| UserId::new(id).ok());

        let timestamp = wire.timestamp.and_then(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(Self {
            transaction_id,
            status,
            amount,
            currency,
            context: non_blank(wire.context),
            timestamp,
            claimed_user_id,
            email: non_blank(wire.email),
        })
    }

    /// Only `approved` and `completed` grant access.
    pub fn is_approved(&self) -> bool {
        let status = self.status.trim();
        status.eq_ignore_ascii_case("approved") || status.eq_ignore_ascii_case("completed")
    }

    /// The entitlement change this delivery would make.
    pub fn entitlement_update(&self) -> EntitlementUpdate {
        EntitlementUpdate {
            amount: self.amount,
            transaction_id: self.transaction_id.clone(),
            currency: self.currency.clone(),
            context: self.context.clone(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<InboundWebhook, WebhookError> {
        InboundWebhook::parse(body.as_bytes(), &Currency::mzn())
    }

    #[test]
    fn parses_canonical_payload() {
        let hook = parse(
            r#"{"transactionId":"tx_1","status":"completed","amount":499,"currency":"MZN","context":"Plano Premium"}"#,
        )
        .unwrap();

        assert_eq!(hook.transaction_id.as_str(), "tx_1");
        assert_eq!(hook.amount, Amount::whole(499));
        assert_eq!(hook.currency, Currency::mzn());
        assert_eq!(hook.context.as_deref(), Some("Plano Premium"));
        assert!(hook.is_approved());
    }

    #[test]
    fn accepts_snake_case_and_id_aliases() {
        let snake = parse(r#"{"transaction_id":"tx_2","status":"approved","amount":10}"#).unwrap();
        assert_eq!(snake.transaction_id.as_str(), "tx_2");

        let bare = parse(r#"{"id":"tx_3","status":"approved","amount":10}"#).unwrap();
        assert_eq!(bare.transaction_id.as_str(), "tx_3");
    }

    #[test]
    fn transaction_id_wins_over_id() {
        let hook = parse(r#"{"transactionId":"tx_a","id":"evt_9","status":"pending","amount":1}"#).unwrap();
        assert_eq!(hook.transaction_id.as_str(), "tx_a");
    }

    #[test]
    fn amount_may_be_a_numeric_string() {
        let hook = parse(r#"{"transactionId":"tx_1","status":"completed","amount":"499"}"#).unwrap();
        assert_eq!(hook.amount, Amount::whole(499));

        let decimal = parse(r#"{"transactionId":"tx_1","status":"completed","amount":"199.50"}"#).unwrap();
        assert_eq!(decimal.amount, Amount::minor(19950));

        let float = parse(r#"{"transactionId":"tx_1","status":"completed","amount":499.0}"#).unwrap();
        assert_eq!(float.amount, Amount::whole(499));
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let err = parse(r#"{"transactionId":"tx_1","status":"completed","amount":"lots"}"#).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
    }

    #[test]
    fn negative_fraction_below_one_is_rejected() {
        for amount in [r#""-0.50""#, "-0.5", r#""-3""#] {
            let body = format!(r#"{{"transactionId":"tx_1","status":"completed","amount":{}}}"#, amount);
            assert!(
                matches!(parse(&body), Err(WebhookError::InvalidPayload(_))),
                "amount {}",
                amount
            );
        }
    }

    #[test]
    fn decimal_too_large_for_minor_units_is_rejected() {
        let err = parse(r#"{"transactionId":"tx_1","status":"completed","amount":"92233720368547758.50"}"#)
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        assert_eq!(
            parse(r#"{"status":"completed","amount":1}"#).unwrap_err(),
            WebhookError::MissingField("transactionId")
        );
        assert_eq!(
            parse(r#"{"transactionId":"tx_1","amount":1}"#).unwrap_err(),
            WebhookError::MissingField("status")
        );
        assert_eq!(
            parse(r#"{"transactionId":"tx_1","status":"completed"}"#).unwrap_err(),
            WebhookError::MissingField("amount")
        );
    }

    #[test]
    fn malformed_json_is_invalid_payload() {
        assert!(matches!(parse("{not json"), Err(WebhookError::InvalidPayload(_))));
        assert!(matches!(parse("[]"), Err(WebhookError::InvalidPayload(_))));
    }

    #[test]
    fn currency_defaults_when_absent() {
        let hook = parse(r#"{"transactionId":"tx_1","status":"completed","amount":1}"#).unwrap();
        assert_eq!(hook.currency, Currency::mzn());
    }

    #[test]
    fn user_id_resolution_prefers_user_id_over_uid() {
        let both = parse(
            r#"{"transactionId":"tx_1","status":"completed","amount":1,"userId":"u_primary","uid":"u_fallback"}"#,
        )
        .unwrap();
        assert_eq!(both.claimed_user_id.as_ref().map(|u| u.as_str()), Some("u_primary"));

        let uid_only = parse(r#"{"transactionId":"tx_1","status":"completed","amount":1,"uid":"u_fallback"}"#).unwrap();
        assert_eq!(uid_only.claimed_user_id.as_ref().map(|u| u.as_str()), Some("u_fallback"));

        let blank = parse(r#"{"transactionId":"tx_1","status":"completed","amount":1,"userId":"  "}"#).unwrap();
        assert!(blank.claimed_user_id.is_none());
    }

    #[test]
    fn only_approved_or_completed_is_approved() {
        for (status, approved) in [
            ("completed", true),
            ("APPROVED", true),
            ("pending", false),
            ("failed", false),
            ("paid", false),
        ] {
            let body = format!(r#"{{"transactionId":"tx_1","status":"{}","amount":1}}"#, status);
            assert_eq!(parse(&body).unwrap().is_approved(), approved, "status {}", status);
        }
    }

    #[test]
    fn entitlement_update_carries_payment_fields() {
        let hook = parse(r#"{"transactionId":"tx_1","status":"completed","amount":499,"currency":"MZN"}"#).unwrap();
        let update = hook.entitlement_update();

        assert_eq!(update.amount, Amount::whole(499));
        assert_eq!(update.transaction_id.as_str(), "tx_1");
        assert_eq!(update.currency.as_str(), "MZN");
    }
}
