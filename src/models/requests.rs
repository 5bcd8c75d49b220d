use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest SKU or reason the refund endpoint accepts
pub const MAX_REFUND_FIELD_LENGTH: usize = 255;

// ==================================================================================================
// Transaction modes
// ==================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionMode {
    #[default]
    #[serde(rename = "0001")]
    Checkout,
    #[serde(rename = "0002")]
    PreAuthorization,
    #[serde(rename = "0011")]
    Agreement,
    #[serde(rename = "0021")]
    Disbursement,
    #[serde(rename = "0031")]
    Refund,
}

// ==================================================================================================
// Create payment
// ==================================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub mode: TransactionMode,
    #[serde(rename = "payerReference")]
    pub payer_reference: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    pub amount: Decimal,
    pub currency: String,
    pub intent: String,
    #[serde(rename = "merchantInvoiceNumber")]
    pub merchant_invoice_number: String,
}

impl CreatePaymentRequest {
    pub fn new(
        amount: Decimal,
        merchant_invoice_number: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            mode: TransactionMode::Checkout,
            payer_reference: String::new(),
            callback_url: callback_url.into(),
            amount,
            currency: "BDT".to_string(),
            intent: "sale".to_string(),
            merchant_invoice_number: merchant_invoice_number.into(),
        }
    }

    pub fn with_payer_reference(mut self, payer_reference: impl Into<String>) -> Self {
        self.payer_reference = payer_reference.into();
        self
    }

    pub fn with_mode(mut self, mode: TransactionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::InvalidArgument(
                "Amount must be greater than 0".to_string(),
            ));
        }
        require_non_blank("MerchantInvoiceNumber", &self.merchant_invoice_number)?;
        require_non_blank("CallbackURL", &self.callback_url)?;
        Ok(())
    }
}

// ==================================================================================================
// Execute / query payment
// ==================================================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PaymentIdRequest<'a> {
    #[serde(rename = "paymentID")]
    pub payment_id: &'a str,
}

// ==================================================================================================
// Refunds
// ==================================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundPaymentRequest {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    #[serde(rename = "trxId")]
    pub trx_id: String,
    #[serde(rename = "refundAmount")]
    pub refund_amount: Decimal,
    pub sku: String,
    pub reason: String,
}

impl RefundPaymentRequest {
    pub fn new(
        payment_id: impl Into<String>,
        trx_id: impl Into<String>,
        refund_amount: Decimal,
    ) -> Self {
        Self {
            payment_id: payment_id.into(),
            trx_id: trx_id.into(),
            refund_amount,
            sku: String::new(),
            reason: String::new(),
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("PaymentId", &self.payment_id)?;
        require_non_blank("TrxId", &self.trx_id)?;

        if self.refund_amount <= Decimal::ZERO {
            return Err(Error::InvalidArgument(
                "valid RefundAmount is required".to_string(),
            ));
        }
        if self.sku.chars().count() > MAX_REFUND_FIELD_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "SKU cannot exceed {} characters",
                MAX_REFUND_FIELD_LENGTH
            )));
        }
        if self.reason.chars().count() > MAX_REFUND_FIELD_LENGTH {
            return Err(Error::InvalidArgument(format!(
                "Reason cannot exceed {} characters",
                MAX_REFUND_FIELD_LENGTH
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundStatusRequest<'a> {
    #[serde(rename = "paymentId")]
    pub payment_id: &'a str,
    #[serde(rename = "trxId")]
    pub trx_id: &'a str,
}

/// Reject blank identifiers before any network call
pub fn require_non_blank(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{} is required", name)));
    }
    Ok(())
}
