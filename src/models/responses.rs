use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error_codes;

const COMPLETED: &str = "Completed";

// ==================================================================================================
// Create payment
// ==================================================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePaymentResponse {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    #[serde(rename = "agreementID")]
    pub agreement_id: String,
    #[serde(rename = "paymentCreateTime")]
    pub payment_create_time: String,
    #[serde(rename = "transactionStatus")]
    pub transaction_status: String,
    pub amount: String,
    pub currency: String,
    pub intent: String,
    #[serde(rename = "merchantInvoiceNumber")]
    pub merchant_invoice_number: String,
    /// Checkout page the customer is redirected to
    #[serde(rename = "bkashURL")]
    pub bkash_url: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    #[serde(rename = "successCallbackURL")]
    pub success_callback_url: String,
    #[serde(rename = "failureCallbackURL")]
    pub failure_callback_url: String,
    #[serde(rename = "cancelledCallbackURL")]
    pub cancelled_callback_url: String,
    #[serde(rename = "statusCode")]
    pub status_code: String,
    #[serde(rename = "statusMessage")]
    pub status_message: String,
    #[serde(rename = "errorCode")]
    pub error_code: String,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

impl CreatePaymentResponse {
    pub fn is_success(&self) -> bool {
        error_codes::is_success(&self.status_code) && !self.payment_id.is_empty()
    }
}

// ==================================================================================================
// Execute payment
// ==================================================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutePaymentResponse {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    #[serde(rename = "agreementID")]
    pub agreement_id: String,
    #[serde(rename = "customerMsisdn")]
    pub customer_msisdn: String,
    #[serde(rename = "payerReference")]
    pub payer_reference: String,
    #[serde(rename = "agreementExecuteTime")]
    pub agreement_execute_time: String,
    #[serde(rename = "agreementStatus")]
    pub agreement_status: String,
    #[serde(rename = "paymentExecuteTime")]
    pub payment_execute_time: String,
    #[serde(rename = "trxID")]
    pub trx_id: String,
    #[serde(rename = "transactionStatus")]
    pub transaction_status: String,
    pub amount: String,
    pub currency: String,
    pub intent: String,
    #[serde(rename = "merchantInvoiceNumber")]
    pub merchant_invoice_number: String,
    #[serde(rename = "statusCode")]
    pub status_code: String,
    #[serde(rename = "statusMessage")]
    pub status_message: String,
    #[serde(rename = "errorCode")]
    pub error_code: String,
}

impl ExecutePaymentResponse {
    pub fn is_completed(&self) -> bool {
        self.transaction_status == COMPLETED && !self.trx_id.is_empty()
    }
}

// ==================================================================================================
// Query payment
// ==================================================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPaymentResponse {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    pub mode: String,
    #[serde(rename = "payerReference")]
    pub payer_reference: String,
    #[serde(rename = "paymentCreateTime")]
    pub payment_create_time: String,
    #[serde(rename = "paymentExecuteTime")]
    pub payment_execute_time: String,
    #[serde(rename = "trxID")]
    pub trx_id: String,
    #[serde(rename = "transactionStatus")]
    pub transaction_status: String,
    pub amount: Decimal,
    pub currency: String,
    pub intent: String,
    #[serde(rename = "merchantInvoiceNumber")]
    pub merchant_invoice_number: String,
    #[serde(rename = "userVerificationStatus")]
    pub user_verification_status: String,
    #[serde(rename = "statusCode")]
    pub status_code: String,
    #[serde(rename = "statusMessage")]
    pub status_message: String,
    #[serde(rename = "errorCode")]
    pub error_code: String,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

impl QueryPaymentResponse {
    pub fn is_payment_completed_successfully(&self) -> bool {
        self.transaction_status.eq_ignore_ascii_case(COMPLETED)
            && error_codes::is_success(&self.status_code)
    }
}

// ==================================================================================================
// Refunds
// ==================================================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundPaymentResponse {
    #[serde(rename = "originalTrxId")]
    pub original_trx_id: String,
    #[serde(rename = "refundTrxId")]
    pub refund_trx_id: String,
    #[serde(rename = "refundTransactionStatus")]
    pub refund_transaction_status: String,
    #[serde(rename = "originalTrxAmount")]
    pub original_trx_amount: String,
    #[serde(rename = "refundAmount")]
    pub refund_amount: String,
    pub currency: String,
    #[serde(rename = "completedTime")]
    pub completed_time: String,
    pub sku: String,
    pub reason: String,
    #[serde(rename = "internalCode")]
    pub internal_code: String,
    #[serde(rename = "externalCode")]
    pub external_code: String,
    #[serde(rename = "errorMessageEn")]
    pub error_message_en: String,
    #[serde(rename = "errorMessageBn")]
    pub error_message_bn: String,
}

impl RefundPaymentResponse {
    pub fn is_completed(&self) -> bool {
        self.refund_transaction_status == COMPLETED
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundTransaction {
    #[serde(rename = "refundTrxId")]
    pub refund_trx_id: String,
    #[serde(rename = "refundTransactionStatus")]
    pub refund_transaction_status: String,
    #[serde(rename = "refundAmount")]
    pub refund_amount: Decimal,
    #[serde(rename = "completedTime")]
    pub completed_time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundStatusResponse {
    #[serde(rename = "originalTrxId")]
    pub original_trx_id: String,
    #[serde(rename = "originalTrxAmount")]
    pub original_trx_amount: Decimal,
    #[serde(rename = "originalTrxCompletedTime")]
    pub original_trx_completed_time: String,
    #[serde(rename = "refundTransactions")]
    pub refund_transactions: Vec<RefundTransaction>,
    #[serde(rename = "internalCode")]
    pub internal_code: String,
    #[serde(rename = "externalCode")]
    pub external_code: String,
    #[serde(rename = "errorMessageEn")]
    pub error_message_en: String,
    #[serde(rename = "errorMessageBn")]
    pub error_message_bn: String,
}

impl RefundStatusResponse {
    pub fn total_refunded(&self) -> Decimal {
        self.refund_transactions
            .iter()
            .map(|r| r.refund_amount)
            .sum()
    }

    pub fn has_refund(&self) -> bool {
        !self.refund_transactions.is_empty()
    }

    pub fn is_full_refunded(&self) -> bool {
        self.total_refunded() >= self.original_trx_amount
    }

    pub fn remaining_refund_amount(&self) -> Decimal {
        self.original_trx_amount - self.total_refunded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_create_payment_response() {
        let response: CreatePaymentResponse = serde_json::from_value(json!({
            "paymentID": "TR0011ABC",
            "bkashURL": "https://sandbox.payment.bkash.com/?paymentId=TR0011ABC",
            "amount": "100",
            "statusCode": "0000",
            "statusMessage": "Successful"
        }))
        .unwrap();

        assert!(response.is_success());
        assert_eq!(response.payment_id, "TR0011ABC");
        assert!(response.bkash_url.contains("TR0011ABC"));
    }

    #[test]
    fn test_create_payment_response_without_payment_id_is_failure() {
        let response: CreatePaymentResponse =
            serde_json::from_value(json!({"statusCode": "0000"})).unwrap();
        assert!(!response.is_success());

        let response: CreatePaymentResponse =
            serde_json::from_value(json!({"statusCode": "2023", "paymentID": "P"})).unwrap();
        assert!(!response.is_success());
    }

    #[test]
    fn test_execute_completion() {
        let response: ExecutePaymentResponse = serde_json::from_value(json!({
            "paymentID": "P1",
            "trxID": "TRX1",
            "transactionStatus": "Completed",
            "statusCode": "0000"
        }))
        .unwrap();
        assert!(response.is_completed());

        let response: ExecutePaymentResponse = serde_json::from_value(json!({
            "paymentID": "P1",
            "transactionStatus": "Completed"
        }))
        .unwrap();
        assert!(!response.is_completed());
    }

    #[test]
    fn test_query_payment_amount_accepts_string_or_number() {
        let response: QueryPaymentResponse = serde_json::from_value(json!({
            "transactionStatus": "completed",
            "statusCode": "0000",
            "amount": "150.75"
        }))
        .unwrap();
        assert_eq!(response.amount, dec!(150.75));
        assert!(response.is_payment_completed_successfully());

        let response: QueryPaymentResponse =
            serde_json::from_value(json!({"amount": 20, "transactionStatus": "Initiated"}))
                .unwrap();
        assert_eq!(response.amount, dec!(20));
        assert!(!response.is_payment_completed_successfully());
    }

    #[test]
    fn test_refund_status_helpers() {
        let response: RefundStatusResponse = serde_json::from_value(json!({
            "originalTrxId": "TRX1",
            "originalTrxAmount": "100",
            "refundTransactions": [
                {"refundTrxId": "R1", "refundTransactionStatus": "Completed", "refundAmount": "40"},
                {"refundTrxId": "R2", "refundTransactionStatus": "Completed", "refundAmount": "25.50"}
            ]
        }))
        .unwrap();

        assert!(response.has_refund());
        assert!(!response.is_full_refunded());
        assert_eq!(response.total_refunded(), dec!(65.50));
        assert_eq!(response.remaining_refund_amount(), dec!(34.50));
    }

    #[test]
    fn test_refund_status_full_refund() {
        let response = RefundStatusResponse {
            original_trx_amount: dec!(50),
            refund_transactions: vec![RefundTransaction {
                refund_amount: dec!(50),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(response.is_full_refunded());
        assert_eq!(response.remaining_refund_amount(), Decimal::ZERO);

        let empty = RefundStatusResponse::default();
        assert!(!empty.has_refund());
    }

    #[test]
    fn test_refund_payment_response() {
        let response: RefundPaymentResponse = serde_json::from_value(json!({
            "refundTrxId": "RF1",
            "refundTransactionStatus": "Completed"
        }))
        .unwrap();
        assert!(response.is_completed());

        let response: RefundPaymentResponse = serde_json::from_value(json!({
            "externalCode": "2072",
            "errorMessageEn": "Refund amount not valid"
        }))
        .unwrap();
        assert!(!response.is_completed());
    }
}
