use serde::{Deserialize, Serialize};

/// Payment notification pushed by the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookNotification {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    #[serde(rename = "trxID")]
    pub trx_id: String,
    #[serde(rename = "transactionStatus")]
    pub transaction_status: String,
    pub amount: String,
    pub currency: String,
    #[serde(rename = "merchantInvoiceNumber")]
    pub merchant_invoice_number: String,
    #[serde(rename = "paymentExecuteTime")]
    pub payment_execute_time: String,
    #[serde(rename = "customerMsisdn")]
    pub customer_msisdn: String,
    #[serde(rename = "eventType")]
    pub event_type: String,
    /// Unix seconds at which the event was emitted
    pub timestamp: i64,
}
