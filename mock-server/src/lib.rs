use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_LIMIT: usize = 100;
pub const PLATFORM_FEE_RATE: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Market,
    Swop,
    Charity,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
    pub seller_id: i64,
    pub seller_username: Option<String>,
    pub seller_contact: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub style: Option<String>,
    pub gender: Option<String>,
    pub condition: Option<String>,
    pub section: Section,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
    pub seller_username: Option<String>,
    pub seller_contact: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub style: Option<String>,
    pub gender: Option<String>,
    pub condition: Option<String>,
    pub section: Section,
}

#[derive(Deserialize, Default)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub section: Option<Section>,
    pub category_id: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub style: Option<String>,
    pub gender: Option<String>,
    pub condition: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub telegram_id: Option<String>,
}

#[derive(Clone, Debug)]
struct UserRow {
    user: User,
    telegram_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateCategory {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender_id: i64,
    pub product_id: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateMessage {
    pub product_id: String,
    pub sender_id: i64,
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub product_id: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateOrder {
    pub buyer_id: i64,
    pub product_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: i64,
    pub product_price: f64,
    pub platform_fee: f64,
    pub seller_receives: f64,
    pub status: String,
}

/// In-memory tables. Vectors keep insertion order so listings are stable.
#[derive(Default)]
pub struct Store {
    users: Vec<UserRow>,
    products: Vec<Product>,
    categories: Vec<Category>,
    messages: Vec<Message>,
    orders: Vec<Order>,
}

pub type Db = Arc<RwLock<Store>>;

/// Error body in the `{"detail": ...}` shape the real backend uses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/health", get(health))
        .route("/users", post(create_user))
        .route("/users/", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/telegram/{telegram_id}", post(get_or_create_telegram_user))
        .route("/products", get(list_products).post(create_product))
        .route("/products/", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{id}", get(get_category))
        .route("/messages", post(send_message))
        .route("/messages/product/{product_id}", get(list_messages))
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/summary", get(order_summary))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

impl Store {
    fn insert_user(&mut self, username: String, telegram_id: Option<String>) -> User {
        let user = User {
            id: self.users.len() as i64 + 1,
            username,
        };
        info!(id = user.id, username = %user.username, "user created");
        self.users.push(UserRow {
            user: user.clone(),
            telegram_id,
        });
        user
    }
}

async fn create_user(State(db): State<Db>, Json(input): Json<CreateUser>) -> Result<Json<User>, ApiError> {
    let mut store = db.write().await;
    if store.users.iter().any(|row| row.user.username == input.username) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Username already exists"));
    }
    Ok(Json(store.insert_user(input.username, input.telegram_id)))
}

async fn get_user(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<User>, ApiError> {
    let store = db.read().await;
    store
        .users
        .iter()
        .find(|row| row.user.id == id)
        .map(|row| Json(row.user.clone()))
        .ok_or_else(|| ApiError::not_found("User"))
}

/// Returns the user linked to `telegram_id`, registering `user_<telegram_id>`
/// on first sight.
async fn get_or_create_telegram_user(State(db): State<Db>, Path(telegram_id): Path<String>) -> Json<User> {
    let mut store = db.write().await;
    let existing = store
        .users
        .iter()
        .find(|row| row.telegram_id.as_deref() == Some(telegram_id.as_str()))
        .map(|row| row.user.clone());
    match existing {
        Some(user) => Json(user),
        None => Json(store.insert_user(format!("user_{telegram_id}"), Some(telegram_id))),
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.map_or(false, |h| h.to_lowercase().contains(needle))
}

fn field_matches(value: &Option<String>, wanted: &Option<String>) -> bool {
    match wanted {
        Some(wanted) => value.as_deref() == Some(wanted.as_str()),
        None => true,
    }
}

impl ProductQuery {
    fn matches(&self, product: &Product) -> bool {
        let search_ok = match self.search.as_deref() {
            Some(search) => {
                let needle = search.to_lowercase();
                contains_ci(Some(product.title.as_str()), &needle)
                    || contains_ci(product.description.as_deref(), &needle)
            }
            None => true,
        };
        search_ok
            && self.section.map_or(true, |s| s == product.section)
            && self.category_id.map_or(true, |c| product.category_id == Some(c))
            && field_matches(&product.size, &self.size)
            && field_matches(&product.color, &self.color)
            && field_matches(&product.style, &self.style)
            && field_matches(&product.gender, &self.gender)
            && field_matches(&product.condition, &self.condition)
    }
}

async fn list_products(State(db): State<Db>, Query(query): Query<ProductQuery>) -> Json<Vec<Product>> {
    let store = db.read().await;
    let products = store
        .products
        .iter()
        .filter(|p| query.matches(p))
        .skip(query.skip.unwrap_or(0))
        .take(query.limit.unwrap_or(DEFAULT_LIMIT))
        .cloned()
        .collect();
    Json(products)
}

async fn create_product(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateProduct>,
) -> Result<Json<Product>, ApiError> {
    let seller_id = headers
        .get("seller_id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::unprocessable("seller_id header is required"))?;
    if !(input.price.is_finite() && input.price >= 0.0) {
        return Err(ApiError::unprocessable("price must be non-negative"));
    }
    let product = Product {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        description: input.description,
        price: input.price,
        category_id: input.category_id,
        image_url: input.image_url,
        image_key: input.image_key,
        seller_id,
        seller_username: input.seller_username,
        seller_contact: input.seller_contact,
        size: input.size,
        color: input.color,
        style: input.style,
        gender: input.gender,
        condition: input.condition,
        section: input.section,
        created_at: now(),
    };
    info!(id = %product.id, seller_id, "product created");
    db.write().await.products.push(product.clone());
    Ok(Json(product))
}

async fn get_product(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Product>, ApiError> {
    let store = db.read().await;
    store
        .products
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product"))
}

async fn list_categories(State(db): State<Db>) -> Json<Vec<Category>> {
    Json(db.read().await.categories.clone())
}

async fn create_category(
    State(db): State<Db>,
    Json(input): Json<CreateCategory>,
) -> Result<Json<Category>, ApiError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ApiError::unprocessable("name must not be empty"));
    }
    let mut store = db.write().await;
    let category = Category {
        id: store.categories.len() as i64 + 1,
        name: name.to_string(),
    };
    info!(id = category.id, name = %category.name, "category created");
    store.categories.push(category.clone());
    Ok(Json(category))
}

async fn get_category(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Category>, ApiError> {
    let store = db.read().await;
    store
        .categories
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

async fn send_message(
    State(db): State<Db>,
    Json(input): Json<CreateMessage>,
) -> Result<Json<Message>, ApiError> {
    let mut store = db.write().await;
    if !store.products.iter().any(|p| p.id == input.product_id) {
        return Err(ApiError::not_found("Product"));
    }
    let message = Message {
        id: store.messages.len() as i64 + 1,
        text: input.text,
        sender_id: input.sender_id,
        product_id: input.product_id,
        created_at: now(),
    };
    store.messages.push(message.clone());
    Ok(Json(message))
}

async fn list_messages(State(db): State<Db>, Path(product_id): Path<String>) -> Json<Vec<Message>> {
    let store = db.read().await;
    Json(
        store
            .messages
            .iter()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect(),
    )
}

async fn create_order(
    State(db): State<Db>,
    Json(input): Json<CreateOrder>,
) -> Result<Json<Order>, ApiError> {
    let mut store = db.write().await;
    if !store.products.iter().any(|p| p.id == input.product_id) {
        return Err(ApiError::not_found("Product"));
    }
    let order = Order {
        id: store.orders.len() as i64 + 1,
        buyer_id: input.buyer_id,
        product_id: input.product_id,
        status: "pending".to_string(),
        created_at: now(),
    };
    info!(id = order.id, buyer_id = order.buyer_id, "order created");
    store.orders.push(order.clone());
    Ok(Json(order))
}

async fn get_order(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Order>, ApiError> {
    let store = db.read().await;
    store
        .orders
        .iter()
        .find(|o| o.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order"))
}

/// Platform fee is 10% of the price, rounded to cents.
pub fn summarize(order: &Order, price: f64) -> OrderSummary {
    let fee = (price * PLATFORM_FEE_RATE * 100.0).round() / 100.0;
    OrderSummary {
        order_id: order.id,
        product_price: price,
        platform_fee: fee,
        seller_receives: price - fee,
        status: order.status.clone(),
    }
}

async fn order_summary(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<OrderSummary>, ApiError> {
    let store = db.read().await;
    let order = store
        .orders
        .iter()
        .find(|o| o.id == id)
        .ok_or_else(|| ApiError::not_found("Order"))?;
    let product = store
        .products
        .iter()
        .find(|p| p.id == order.product_id)
        .ok_or_else(|| ApiError::not_found("Product"))?;
    Ok(Json(summarize(order, product.price)))
}
