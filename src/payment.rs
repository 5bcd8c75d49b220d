use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::auth::gateway::transport_error_kind;
use crate::auth::{cancellable, TokenManager};
use crate::error::{Error, Result};
use crate::models::error_codes;
use crate::models::requests::{require_non_blank, PaymentIdRequest, RefundStatusRequest};
use crate::models::{
    CreatePaymentRequest, CreatePaymentResponse, ExecutePaymentResponse, QueryPaymentResponse,
    RefundPaymentRequest, RefundPaymentResponse, RefundStatusResponse,
};

pub const CREATE_PAYMENT_PATH: &str = "/v1.2.0-beta/tokenized/checkout/create";
pub const EXECUTE_PAYMENT_PATH: &str = "/v1.2.0-beta/tokenized/checkout/execute";
pub const QUERY_PAYMENT_PATH: &str = "/v1.2.0-beta/tokenized/checkout/payment/status";
pub const REFUND_PAYMENT_PATH: &str = "/v2/tokenized-checkout/refund/payment/transaction";
pub const REFUND_STATUS_PATH: &str = "/v2/tokenized-checkout/refund/payment/status";

const APP_KEY_HEADER: &str = "X-APP-Key";

/// Retries after a 401 with a newly granted token
const MAX_AUTH_RETRIES: u32 = 1;

/// Tokenized checkout client
///
/// Every call takes its bearer token from the shared [`TokenManager`].
pub struct PaymentClient {
    client: Client,
    token_manager: Arc<TokenManager>,
}

impl PaymentClient {
    /// Create a payment client with the configured request timeout
    pub fn new(token_manager: Arc<TokenManager>) -> Result<Self> {
        let client = Client::builder()
            .timeout(token_manager.config().timeout())
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(token_manager, client))
    }

    pub fn with_client(token_manager: Arc<TokenManager>, client: Client) -> Self {
        Self {
            client,
            token_manager,
        }
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.token_manager
    }

    /// Create a checkout payment and return the redirect URL details
    pub async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<CreatePaymentResponse> {
        request.validate()?;

        tracing::info!(
            merchant_invoice_number = %request.merchant_invoice_number,
            amount = %request.amount,
            "Creating bKash payment"
        );

        let response: CreatePaymentResponse = self
            .post_authorized(
                CREATE_PAYMENT_PATH,
                request,
                "Create payment",
                "CREATE_PAYMENT_FAILED",
                cancel,
            )
            .await?;

        if !response.is_success() {
            let code = if response.error_code.is_empty() {
                response.status_code.clone()
            } else {
                response.error_code.clone()
            };
            let detail = if response.error_message.is_empty() {
                &response.status_message
            } else {
                &response.error_message
            };
            let description = error_codes::error_message(&code);
            let message = if detail.is_empty() || detail == description {
                description.to_string()
            } else {
                format!("{}: {}", description, detail)
            };

            tracing::error!(
                error_code = %code,
                known_code = error_codes::is_known_error_code(&code),
                error_message = %message,
                "bKash rejected payment creation"
            );
            return Err(Error::operation(code, message, None));
        }

        tracing::info!(payment_id = %response.payment_id, "bKash payment created");
        Ok(response)
    }

    /// Execute a payment after the customer has authorized it
    pub async fn execute_payment(
        &self,
        payment_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ExecutePaymentResponse> {
        require_non_blank("PaymentID", payment_id)?;

        let response: ExecutePaymentResponse = self
            .post_authorized(
                EXECUTE_PAYMENT_PATH,
                &PaymentIdRequest { payment_id },
                "Execute payment",
                "EXECUTE_PAYMENT_FAILED",
                cancel,
            )
            .await?;

        if response.is_completed() {
            tracing::info!(
                payment_id = %payment_id,
                trx_id = %response.trx_id,
                "bKash payment executed"
            );
        } else {
            tracing::warn!(
                payment_id = %payment_id,
                transaction_status = %response.transaction_status,
                status_code = %response.status_code,
                status_message = %response.status_message,
                "bKash payment execution did not complete"
            );
        }

        Ok(response)
    }

    pub async fn query_payment(
        &self,
        payment_id: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryPaymentResponse> {
        require_non_blank("PaymentID", payment_id)?;

        self.post_authorized(
            QUERY_PAYMENT_PATH,
            &PaymentIdRequest { payment_id },
            "Query payment",
            "QUERY_PAYMENT_FAILED",
            cancel,
        )
        .await
    }

    /// Refund all or part of a completed transaction
    pub async fn refund_payment(
        &self,
        request: &RefundPaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<RefundPaymentResponse> {
        request.validate()?;

        tracing::info!(
            payment_id = %request.payment_id,
            trx_id = %request.trx_id,
            refund_amount = %request.refund_amount,
            "Refunding bKash payment"
        );

        let response: RefundPaymentResponse = self
            .post_authorized(
                REFUND_PAYMENT_PATH,
                request,
                "Refund payment",
                "REFUND_PAYMENT_FAILED",
                cancel,
            )
            .await?;

        if !response.is_completed() {
            tracing::warn!(
                payment_id = %request.payment_id,
                external_code = %response.external_code,
                error_message = %response.error_message_en,
                "bKash refund did not complete"
            );
        }

        Ok(response)
    }

    pub async fn query_refund_status(
        &self,
        payment_id: &str,
        trx_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RefundStatusResponse> {
        require_non_blank("PaymentId", payment_id)?;
        require_non_blank("TrxId", trx_id)?;

        self.post_authorized(
            REFUND_STATUS_PATH,
            &RefundStatusRequest { payment_id, trx_id },
            "Refund status",
            "REFUND_STATUS_FAILED",
            cancel,
        )
        .await
    }

    /// POST a JSON body with gateway authorization.
    ///
    /// A 401 clears the token cache and the call is repeated with a newly
    /// granted token; a second 401 is an authentication failure.
    async fn post_authorized<B, R>(
        &self,
        path: &str,
        body: &B,
        operation: &str,
        failure_code: &str,
        cancel: &CancellationToken,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let config = self.token_manager.config();
        let url = config.endpoint(path);
        let mut attempt = 0;

        loop {
            let token = self.token_manager.get_valid_token(cancel).await?;

            tracing::debug!(url = %url, attempt = attempt + 1, "Sending bKash request");

            let send = async {
                self.client
                    .post(&url)
                    .header(ACCEPT, "application/json")
                    .header(AUTHORIZATION, &token)
                    .header(APP_KEY_HEADER, &config.app_key)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| {
                        let error_kind = transport_error_kind(&e);
                        tracing::error!(
                            error_kind = error_kind,
                            error = %e,
                            url = %url,
                            "{} request could not be sent",
                            operation
                        );
                        Error::operation(
                            failure_code,
                            format!("{} request failed: {} (kind: {})", operation, e, error_kind),
                            None,
                        )
                    })
            };
            let response = cancellable(cancel, send).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if attempt < MAX_AUTH_RETRIES {
                    tracing::warn!("Received 401 from bKash, clearing token cache and retrying...");
                    self.token_manager.clear_cache_if(&token).await;
                    attempt += 1;
                    continue;
                }

                tracing::error!(url = %url, "bKash rejected the renewed token");
                return Err(Error::auth(
                    format!("{} unauthorized after token renewal", operation),
                    Some(status.as_u16()),
                ));
            }

            let read = async {
                response.text().await.map_err(|e| {
                    Error::operation(
                        failure_code,
                        format!("{} response could not be read: {}", operation, e),
                        Some(status.as_u16()),
                    )
                })
            };
            let text = cancellable(cancel, read).await?;

            if !status.is_success() {
                tracing::error!(
                    status = status.as_u16(),
                    url = %url,
                    response_body = %text,
                    "bKash {} failed",
                    operation.to_lowercase()
                );
                return Err(Error::operation(
                    failure_code,
                    format!("{} request failed: {}", operation, status),
                    Some(status.as_u16()),
                ));
            }

            return serde_json::from_str(&text).map_err(|e| {
                tracing::error!(
                    error = %e,
                    response_body = %text,
                    "Failed to decode bKash {} response",
                    operation.to_lowercase()
                );
                Error::operation(
                    "DESERIALIZATION_FAILED",
                    format!("Failed to parse {} response: {}", operation.to_lowercase(), e),
                    Some(status.as_u16()),
                )
            });
        }
    }
}
