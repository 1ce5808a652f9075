//! Mock payment gateway for testing and local development.
//!
//! Provides a configurable implementation of `PaymentGateway`. Supports:
//! - Scripted transaction statuses (the last scripted status repeats)
//! - Error injection, per method or for the next call
//! - Call tracking

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::TransactionId;
use crate::domain::payment::PaymentStatus;
use crate::ports::{
    CreatePaymentRequest, CreatedPayment, GatewayError, PaymentGateway, TransactionStatusReport,
};

/// Mock gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.set_next_transaction_id("tx_1");
/// gateway.script_status("tx_1", [PaymentStatus::Pending, PaymentStatus::Completed]);
/// gateway.set_method_error("create_payment", GatewayError::connectivity("offline"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    next_transaction_ids: VecDeque<String>,
    issued: u64,
    statuses: HashMap<String, VecDeque<PaymentStatus>>,
    next_error: Option<GatewayError>,
    method_errors: HashMap<String, GatewayError>,
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Queue the id returned by the next `create_payment`.
    pub fn set_next_transaction_id(&self, id: impl Into<String>) {
        self.state().next_transaction_ids.push_back(id.into());
    }

    /// Script the statuses returned for a transaction, one per call.
    pub fn script_status(&self, id: &str, statuses: impl IntoIterator<Item = PaymentStatus>) {
        self.state()
            .statuses
            .insert(id.to_string(), statuses.into_iter().collect());
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: GatewayError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method until cleared.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<CreatedPayment, GatewayError> {
        self.record_call(
            "create_payment",
            vec![
                request.amount.in_whole_units().to_string(),
                request.context.clone(),
            ],
        );
        self.check_error("create_payment")?;

        let id = {
            let mut state = self.state();
            state.issued += 1;
            let issued = state.issued;
            state
                .next_transaction_ids
                .pop_front()
                .unwrap_or_else(|| format!("tx_mock_{}", issued))
        };
        let transaction_id =
            TransactionId::new(id.clone()).map_err(|e| GatewayError::invalid_response(e.to_string()))?;
        let redirect_url = format!("https://checkout.mock/pay/{}", id);

        Ok(CreatedPayment {
            raw: json!({ "success": true, "id": id, "redirectUrl": redirect_url }),
            transaction_id,
            redirect_url,
        })
    }

    async fn get_transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionStatusReport, GatewayError> {
        self.record_call("get_transaction_status", vec![transaction_id.to_string()]);
        self.check_error("get_transaction_status")?;

        let mut state = self.state();
        let script = state
            .statuses
            .get_mut(transaction_id.as_str())
            .ok_or_else(|| GatewayError::not_found(transaction_id))?;
        let status = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().copied()
        }
        .unwrap_or(PaymentStatus::Pending);

        Ok(TransactionStatusReport {
            transaction_id: transaction_id.clone(),
            status,
            raw: json!({ "status": status.as_str() }),
        })
    }
}
