//! CreatePaymentHandler - Command handler for starting a hosted checkout.

use std::sync::Arc;

use crate::domain::foundation::AuthenticatedUser;
use crate::domain::payment::{
    Amount, Currency, PaymentFlowError, PaymentIntent, TransactionUserLedgerEntry,
};
use crate::ports::{CreatePaymentRequest, PaymentGateway, TransactionLedger};

/// Deployment-level settings sent with every payment.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub currency: Currency,
    /// Webhook endpoint the gateway notifies.
    pub callback_url: String,
    /// Page the browser returns to after checkout.
    pub return_url: String,
}

/// Command to create a payment for the authenticated user.
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub user: AuthenticatedUser,
    /// Price in whole currency units.
    pub amount: i64,
    /// Plan name.
    pub context: String,
}

/// Result of successful payment creation.
#[derive(Debug, Clone)]
pub struct CreatePaymentResult {
    pub intent: PaymentIntent,
    pub display_amount: String,
}

/// Handler for payment creation.
///
/// The ledger entry is written only after the gateway accepted the payment,
/// so a failed create never leaves a mapping behind.
pub struct CreatePaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn TransactionLedger>,
    settings: CheckoutSettings,
}

impl CreatePaymentHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn TransactionLedger>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            gateway,
            ledger,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentCommand,
    ) -> Result<CreatePaymentResult, PaymentFlowError> {
        // 1. Validate input
        let amount = Amount::positive_whole(cmd.amount)?;
        let context = cmd.context.trim();
        if context.is_empty() {
            return Err(PaymentFlowError::validation("context", "Plan name is required"));
        }

        // 2. Create the payment with the gateway
        let created = self
            .gateway
            .create_payment(CreatePaymentRequest {
                amount,
                context: context.to_string(),
                callback_url: self.settings.callback_url.clone(),
                return_url: self.settings.return_url.clone(),
                currency: self.settings.currency.clone(),
            })
            .await
            .map_err(|e| {
                tracing::warn!(
                    user_id = %cmd.user.id,
                    code = %e.code,
                    error = %e.message,
                    "Payment creation failed"
                );
                PaymentFlowError::from(e)
            })?;

        // 3. Remember who is paying
        self.ledger
            .register(TransactionUserLedgerEntry::new(
                created.transaction_id.clone(),
                cmd.user.id.clone(),
                cmd.user.email.clone(),
            ))
            .await
            .map_err(|e| {
                tracing::error!(
                    transaction_id = %created.transaction_id,
                    user_id = %cmd.user.id,
                    error = %e,
                    "Failed to register transaction in ledger"
                );
                PaymentFlowError::from(e)
            })?;

        tracing::info!(
            transaction_id = %created.transaction_id,
            user_id = %cmd.user.id,
            amount = amount.value(),
            "Payment created"
        );

        let intent = PaymentIntent::new(
            created.transaction_id,
            amount,
            self.settings.currency.clone(),
            context,
            created.redirect_url,
        );
        let display_amount = amount.display(&self.settings.currency);

        Ok(CreatePaymentResult {
            intent,
            display_amount,
        })
    }
}
