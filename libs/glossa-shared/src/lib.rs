use serde::{Deserialize, Serialize};

pub mod api {
    use super::*;

    /// Marketing attribution tags carried in deep-link payloads and lead
    /// submissions. Field names match the backend wire format as-is.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UtmParams {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub utm_source: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub utm_medium: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub utm_campaign: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub utm_term: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub utm_content: Option<String>,
    }

    impl UtmParams {
        pub fn is_empty(&self) -> bool {
            self.utm_source.is_none()
                && self.utm_medium.is_none()
                && self.utm_campaign.is_none()
                && self.utm_term.is_none()
                && self.utm_content.is_none()
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LeadRequest {
        pub user_id: i64,
        pub utm: UtmParams,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub promo_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApiResponse<T = serde_json::Value> {
        pub success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub data: Option<T>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
    }

    /// Body of `POST /api/payment-log`. Required fields are `Option` here
    /// so the handler can answer 400 with a field-specific message instead
    /// of a deserializer error.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentLogRequest {
        pub user_id: Option<i64>,
        pub username: Option<String>,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub payment_id: Option<String>,
        pub amount: Option<i64>,
        pub currency: Option<String>,
        pub registration_time: Option<String>,
        pub payment_time: Option<String>,
        pub utm: Option<UtmParams>,
        pub promo_id: Option<String>,
    }

    /// Body of `POST /api/payment-creation-log`. No time derivation on this
    /// one, it marks the moment a user picked a tariff.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentCreationLogRequest {
        pub user_id: Option<i64>,
        pub username: Option<String>,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub payment_id: Option<String>,
        pub amount: Option<i64>,
        pub currency: Option<String>,
        pub tariff_name: Option<String>,
        pub utm: Option<UtmParams>,
        pub promo_id: Option<String>,
    }

    /// Body of `POST /api/invoice`. Currency, when present, must be the
    /// Stars code; amount is a literal Stars count.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InvoiceRequest {
        pub user_id: Option<i64>,
        pub product_name: Option<String>,
        pub description: Option<String>,
        pub amount: Option<i64>,
        pub currency: Option<String>,
        pub payload: Option<String>,
        pub photo_url: Option<String>,
    }
}
