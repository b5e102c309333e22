//! Domain DTOs for the marketplace API.
//!
//! # Design
//! These types mirror the backend's JSON schema but are defined independently
//! of the mock-server crate; integration tests catch schema drift between the
//! two. Records are read-only snapshots: the client never mutates them except
//! through explicit write calls.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Identifier that is either numeric or a string, depending on the schema
/// generation that produced it. Serializes back to the JSON kind it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Text(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(n) => write!(f, "{n}"),
            Id::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Int(n)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::Text(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::Text(s)
    }
}

impl From<Uuid> for Id {
    fn from(id: Uuid) -> Self {
        Id::Text(id.to_string())
    }
}

/// Top-level marketplace mode a product is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Paid listings.
    Market,
    /// Item-for-item swaps.
    Swop,
    /// Free giveaways.
    Charity,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Market => "market",
            Section::Swop => "swop",
            Section::Charity => "charity",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(Section::Market),
            "swop" => Ok(Section::Swop),
            "charity" => Ok(Section::Charity),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let price = f64::deserialize(deserializer)?;
    if valid_price(price) {
        Ok(price)
    } else {
        Err(de::Error::custom(format!("invalid price: {price}")))
    }
}

/// A product listing as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Id,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
    pub seller_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub section: Section,
    pub created_at: String,
}

impl Product {
    /// Display URL for the product image, if it has one.
    pub fn image_src(&self, config: &ClientConfig) -> Option<String> {
        self.image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| config.resolve_image(url))
    }
}

/// Payload for creating a product. Identifier, timestamp and seller are
/// assigned by the server, so they have no field here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub section: Section,
}

impl ProductDraft {
    pub fn new(title: impl Into<String>, price: f64, section: Section) -> Self {
        Self {
            title: title.into(),
            description: None,
            price,
            category_id: None,
            image_url: None,
            image_key: None,
            seller_username: None,
            seller_contact: None,
            size: None,
            color: None,
            style: None,
            gender: None,
            condition: None,
            section,
        }
    }

    /// Reject drafts the backend would store with a meaningless price.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !valid_price(self.price) {
            return Err(ApiError::InvalidRequest(format!(
                "price must be a finite non-negative number, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

/// A marketplace account. Its `id` is what product, message and order calls
/// take as `seller_id`, `sender_id` and `buyer_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

/// A message in a product's conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender_id: i64,
    pub product_id: Id,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub product_id: Id,
    pub sender_id: i64,
    pub text: String,
}

/// An order. `status` values are owned by the backend and opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub product_id: Id,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub buyer_id: i64,
    pub product_id: Id,
}

/// Money split for an order: what the platform keeps and what the seller gets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: i64,
    pub product_price: f64,
    pub platform_fee: f64,
    pub seller_receives: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
