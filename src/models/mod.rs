// Data models for the tokenized checkout API

pub mod error_codes;
pub mod requests;
pub mod responses;
pub mod webhook;

pub use requests::{CreatePaymentRequest, RefundPaymentRequest, TransactionMode};
pub use responses::{
    CreatePaymentResponse, ExecutePaymentResponse, QueryPaymentResponse, RefundPaymentResponse,
    RefundStatusResponse, RefundTransaction,
};
pub use webhook::WebhookNotification;
