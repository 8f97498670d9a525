//! Razorpay payment gateway client.
//!
//! Creates hosted checkout orders and verifies the `order_id|payment_id`
//! signature Razorpay returns after checkout. Signature verification is the
//! sole authenticity check for a payment callback.

use crate::config::RazorpayConfig;
use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    config: RazorpayConfig,
}

/// Admission metadata attached to an order so the verify step can locate
/// what the payment settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNotes {
    pub admission_id: String,
    pub payment_type: String,
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    /// Amount in smallest currency unit (paise for INR).
    amount: u64,
    currency: String,
    receipt: String,
    notes: OrderNotes,
}

/// Response from Razorpay order creation.
#[derive(Debug, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    code: String,
    description: String,
}

/// Payment verification parameters.
#[derive(Debug)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if Razorpay credentials are set.
    pub fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.expose_secret().is_empty()
    }

    /// Public key id for the client to open hosted checkout.
    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    /// Create a hosted checkout order. No funds move until the client
    /// completes checkout and the callback is verified.
    pub async fn create_order(
        &self,
        amount_paise: u64,
        currency: &str,
        receipt: String,
        notes: OrderNotes,
    ) -> Result<RazorpayOrder> {
        if !self.is_configured() {
            return Err(anyhow!("Razorpay credentials not configured"));
        }

        let request = CreateOrderRequest {
            amount: amount_paise,
            currency: currency.to_string(),
            receipt,
            notes,
        };

        let url = format!("{}/orders", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Razorpay create_order response");

        if status.is_success() {
            let order: RazorpayOrder = serde_json::from_str(&body)?;
            tracing::info!(
                order_id = %order.id,
                amount = order.amount,
                currency = %order.currency,
                "Razorpay order created"
            );
            Ok(order)
        } else {
            let error: RazorpayError =
                serde_json::from_str(&body).unwrap_or_else(|_| RazorpayError {
                    error: RazorpayErrorDetail {
                        code: "UNKNOWN".to_string(),
                        description: body.clone(),
                    },
                });
            tracing::error!(
                code = %error.error.code,
                description = %error.error.description,
                "Razorpay order creation failed"
            );
            Err(anyhow!(
                "Razorpay error: {} - {}",
                error.error.code,
                error.error.description
            ))
        }
    }

    /// Verify the checkout signature:
    /// `HMAC-SHA256(order_id + "|" + payment_id, key_secret)`.
    pub fn verify_payment_signature(&self, verification: &PaymentVerification) -> Result<bool> {
        let payload = format!(
            "{}|{}",
            verification.razorpay_order_id, verification.razorpay_payment_id
        );

        let expected =
            self.compute_signature(&payload, self.config.key_secret.expose_secret())?;

        let is_valid: bool = expected
            .as_bytes()
            .ct_eq(verification.razorpay_signature.as_bytes())
            .into();

        if is_valid {
            tracing::info!(
                order_id = %verification.razorpay_order_id,
                payment_id = %verification.razorpay_payment_id,
                "Payment signature verified"
            );
        } else {
            tracing::warn!(
                order_id = %verification.razorpay_order_id,
                payment_id = %verification.razorpay_payment_id,
                "Payment signature verification failed"
            );
        }

        Ok(is_valid)
    }

    fn compute_signature(&self, payload: &str, secret: &str) -> Result<String> {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| anyhow!("Invalid key length"))?;
        mac.update(payload.as_bytes());
        let result = mac.finalize();
        Ok(hex::encode(result.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_config() -> RazorpayConfig {
        RazorpayConfig {
            key_id: "rzp_test_123".to_string(),
            key_secret: Secret::new("my_secret_key".to_string()),
            api_base_url: "https://api.razorpay.com/v1".to_string(),
        }
    }

    #[test]
    fn test_is_configured() {
        let client = RazorpayClient::new(test_config());
        assert!(client.is_configured());

        let empty = RazorpayConfig {
            key_id: "".to_string(),
            key_secret: Secret::new("".to_string()),
            api_base_url: "".to_string(),
        };
        assert!(!RazorpayClient::new(empty).is_configured());
    }

    #[test]
    fn test_payment_signature_verification() {
        let client = RazorpayClient::new(test_config());

        let payload = "order_123|pay_456";
        let expected = client.compute_signature(payload, "my_secret_key").unwrap();

        let verification = PaymentVerification {
            razorpay_order_id: "order_123".to_string(),
            razorpay_payment_id: "pay_456".to_string(),
            razorpay_signature: expected,
        };

        assert!(client.verify_payment_signature(&verification).unwrap());
    }

    #[test]
    fn test_invalid_signature() {
        let client = RazorpayClient::new(test_config());

        let verification = PaymentVerification {
            razorpay_order_id: "order_123".to_string(),
            razorpay_payment_id: "pay_456".to_string(),
            razorpay_signature: "invalid_signature".to_string(),
        };

        assert!(!client.verify_payment_signature(&verification).unwrap());
    }
}
