//! Request builders and the accessor layer for the marketplace API.
//!
//! # Design
//! `MarketplaceClient` holds only the resolved configuration and carries no
//! mutable state between calls. Each backend operation has a `build_*`
//! method that produces an `HttpRequest` without touching the network.
//! `Storefront` pairs the builders with a `Transport` and decodes the
//! responses, so every accessor is one build, one round-trip, one decode.

use tracing::warn;
use url::form_urlencoded::byte_serialize;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::filter::{LocalFilter, ProductFilters};
use crate::http::HttpRequest;
use crate::sequence::{RequestSequence, Tracked};
use crate::transport::{self, build_request, RequestOptions, Transport};
use crate::types::{
    Category, HealthStatus, Id, Message, NewCategory, NewMessage, NewOrder, NewUser, Order,
    OrderSummary, Product, ProductDraft, User,
};

/// Header carrying the seller id on product creation. The seller never
/// appears in the JSON body.
pub const SELLER_ID_HEADER: &str = "seller_id";

/// Percent-encode an id for use as a single path segment.
fn segment(id: &Id) -> String {
    byte_serialize(id.to_string().as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Stateless request builder for the marketplace API.
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    config: ClientConfig,
}

impl MarketplaceClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn get(&self, endpoint: &str) -> HttpRequest {
        build_request(&self.config, endpoint, RequestOptions::get())
    }

    fn post_json<B: serde::Serialize>(&self, endpoint: &str, body: &B) -> Result<HttpRequest> {
        let body = serde_json::to_string(body)?;
        Ok(build_request(&self.config, endpoint, RequestOptions::post(body)))
    }

    /// Look up the account linked to a Telegram id, registering it on first use.
    pub fn build_get_or_create_telegram_user(&self, telegram_id: &str) -> HttpRequest {
        let path = format!("/users/telegram/{}", segment(&Id::from(telegram_id)));
        build_request(&self.config, &path, RequestOptions::post(String::new()))
    }

    pub fn build_get_user(&self, id: i64) -> HttpRequest {
        self.get(&format!("/users/{id}"))
    }

    pub fn build_create_user(&self, user: &NewUser) -> Result<HttpRequest> {
        self.post_json("/users/", user)
    }

    pub fn build_list_products(&self, filters: &ProductFilters) -> HttpRequest {
        match filters.to_query() {
            Some(query) => self.get(&format!("/products?{query}")),
            None => self.get("/products"),
        }
    }

    pub fn build_get_product(&self, id: &Id) -> HttpRequest {
        self.get(&format!("/products/{}", segment(id)))
    }

    pub fn build_create_product(&self, draft: &ProductDraft, seller_id: &Id) -> Result<HttpRequest> {
        draft.validate()?;
        let body = serde_json::to_string(draft)?;
        let options = RequestOptions::post(body).header(SELLER_ID_HEADER, seller_id.to_string());
        Ok(build_request(&self.config, "/products/", options))
    }

    pub fn build_list_categories(&self) -> HttpRequest {
        self.get("/categories")
    }

    pub fn build_get_category(&self, id: i64) -> HttpRequest {
        self.get(&format!("/categories/{id}"))
    }

    pub fn build_create_category(&self, name: &str) -> Result<HttpRequest> {
        self.post_json(
            "/categories",
            &NewCategory {
                name: name.to_string(),
            },
        )
    }

    pub fn build_list_messages(&self, product_id: &Id) -> HttpRequest {
        self.get(&format!("/messages/product/{}", segment(product_id)))
    }

    pub fn build_send_message(&self, product_id: &Id, sender_id: i64, text: &str) -> Result<HttpRequest> {
        self.post_json(
            "/messages",
            &NewMessage {
                product_id: product_id.clone(),
                sender_id,
                text: text.to_string(),
            },
        )
    }

    pub fn build_create_order(&self, buyer_id: i64, product_id: &Id) -> Result<HttpRequest> {
        self.post_json(
            "/orders",
            &NewOrder {
                buyer_id,
                product_id: product_id.clone(),
            },
        )
    }

    pub fn build_get_order(&self, id: i64) -> HttpRequest {
        self.get(&format!("/orders/{id}"))
    }

    pub fn build_get_order_summary(&self, id: i64) -> HttpRequest {
        self.get(&format!("/orders/{id}/summary"))
    }

    pub fn build_health(&self) -> HttpRequest {
        self.get("/health")
    }
}

/// Marketplace API over a concrete transport.
///
/// Accessors never retry, cache, or keep state; every failure propagates to
/// the caller except in [`Storefront::check_health`].
#[derive(Debug, Clone)]
pub struct Storefront<T> {
    client: MarketplaceClient,
    transport: T,
}

impl<T: Transport> Storefront<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            client: MarketplaceClient::new(config),
            transport,
        }
    }

    pub fn client(&self) -> &MarketplaceClient {
        &self.client
    }

    pub fn config(&self) -> &ClientConfig {
        self.client.config()
    }

    fn fetch<R: serde::de::DeserializeOwned>(&self, request: HttpRequest) -> Result<R> {
        let response = transport::send(&self.transport, &request)?;
        transport::decode(&response)
    }

    /// The account for `telegram_id`. The backend creates it on first call, so
    /// this never yields `NotFound` for a well-formed id.
    pub fn get_or_create_telegram_user(&self, telegram_id: &str) -> Result<User> {
        self.fetch(self.client.build_get_or_create_telegram_user(telegram_id))
    }

    pub fn get_user(&self, id: i64) -> Result<User> {
        self.fetch(self.client.build_get_user(id))
    }

    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        self.fetch(self.client.build_create_user(user)?)
    }

    /// Products matching `filters`, in server order.
    pub fn list_products(&self, filters: &ProductFilters) -> Result<Vec<Product>> {
        self.fetch(self.client.build_list_products(filters))
    }

    pub fn get_product(&self, id: &Id) -> Result<Product> {
        self.fetch(self.client.build_get_product(id))
    }

    pub fn create_product(&self, draft: &ProductDraft, seller_id: &Id) -> Result<Product> {
        self.fetch(self.client.build_create_product(draft, seller_id)?)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.fetch(self.client.build_list_categories())
    }

    pub fn get_category(&self, id: i64) -> Result<Category> {
        self.fetch(self.client.build_get_category(id))
    }

    pub fn create_category(&self, name: &str) -> Result<Category> {
        self.fetch(self.client.build_create_category(name)?)
    }

    pub fn list_messages_for_product(&self, product_id: &Id) -> Result<Vec<Message>> {
        self.fetch(self.client.build_list_messages(product_id))
    }

    pub fn send_message(&self, product_id: &Id, sender_id: i64, text: &str) -> Result<Message> {
        self.fetch(self.client.build_send_message(product_id, sender_id, text)?)
    }

    pub fn create_order(&self, buyer_id: i64, product_id: &Id) -> Result<Order> {
        self.fetch(self.client.build_create_order(buyer_id, product_id)?)
    }

    pub fn get_order(&self, id: i64) -> Result<Order> {
        self.fetch(self.client.build_get_order(id))
    }

    pub fn get_order_summary(&self, id: i64) -> Result<OrderSummary> {
        self.fetch(self.client.build_get_order_summary(id))
    }

    /// Probe the liveness endpoint. Any failure yields `None`.
    pub fn check_health(&self) -> Option<HealthStatus> {
        match self.fetch(self.client.build_health()) {
            Ok(status) => Some(status),
            Err(err) => {
                warn!(error = %err, "health check failed");
                None
            }
        }
    }

    /// Server-filtered listing narrowed by local-only checks.
    pub fn browse(&self, filters: &ProductFilters, local: &LocalFilter) -> Result<Vec<Product>> {
        self.list_products(filters).map(|products| local.apply(products))
    }

    /// Like [`Storefront::browse`], tagged with a fresh token from `sequence`
    /// so the caller can discard it if a newer browse was issued meanwhile.
    pub fn browse_tracked(
        &self,
        sequence: &mut RequestSequence,
        filters: &ProductFilters,
        local: &LocalFilter,
    ) -> Tracked<Result<Vec<Product>>> {
        let token = sequence.issue();
        Tracked {
            token,
            value: self.browse(filters, local),
        }
    }
}
