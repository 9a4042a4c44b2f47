//! JSON-over-HTTP reference market client.
//!
//! `POST {base_url}/orders` with `{ instrument_id, side, size, price }`,
//! answered by `{ order_id, filled_size }`. Timeouts are enforced by the
//! hedge dispatcher, not here.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::port::outbound::reference::{ExternalOrderAck, ExternalOrderRequest, ReferenceMarket};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Serialize)]
struct PlaceOrderBody<'a> {
    instrument_id: &'a str,
    side: &'a str,
    size: Decimal,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct PlaceOrderResponse {
    order_id: String,
    filled_size: Decimal,
}

/// HTTP client for an external venue.
pub struct HttpReferenceMarket {
    http: HttpClient,
    orders_url: Url,
    api_key: Option<String>,
}

impl HttpReferenceMarket {
    /// Build a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Fails when `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(Self {
            http: HttpClient::new(),
            orders_url: base.join("orders")?,
            api_key,
        })
    }

    #[must_use]
    pub fn orders_url(&self) -> &Url {
        &self.orders_url
    }
}

#[async_trait]
impl ReferenceMarket for HttpReferenceMarket {
    async fn place_order(&self, order: &ExternalOrderRequest) -> Result<ExternalOrderAck> {
        let body = PlaceOrderBody {
            instrument_id: order.instrument_id.as_str(),
            side: order.side.as_str(),
            size: order.size,
            price: order.price,
        };
        let mut request = self.http.post(self.orders_url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?.error_for_status()?;
        let parsed: PlaceOrderResponse = response.json().await?;
        if parsed.filled_size < Decimal::ZERO {
            return Err(Error::Parse(format!(
                "negative filled_size {} for order {}",
                parsed.filled_size, parsed.order_id
            )));
        }
        debug!(
            instrument_id = %order.instrument_id,
            external_order_id = %parsed.order_id,
            filled_size = %parsed.filled_size,
            "Reference order acknowledged"
        );
        Ok(ExternalOrderAck {
            external_order_id: parsed.order_id,
            filled_size: parsed.filled_size,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
