use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Category, Message, Order, OrderSummary, Product, User};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn create_product_request(body: &str, seller_id: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/products/")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("seller_id", seller_id)
        .body(body.to_string())
        .unwrap()
}

/// Send one request through a shared router so state persists between calls.
async fn call(app: &mut axum::routing::RouterIntoService<String>, req: Request<String>) -> axum::response::Response {
    use tower::Service;
    ServiceExt::ready(app).await.unwrap().call(req).await.unwrap()
}

// --- health ---

#[tokio::test]
async fn health_reports_ok() {
    let resp = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

// --- users ---

#[tokio::test]
async fn telegram_user_is_created_once() {
    let mut app = app().into_service();

    let resp = call(&mut app, json_request("POST", "/users/telegram/555", "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let first: User = body_json(resp).await;
    assert_eq!(first.id, 1);
    assert_eq!(first.username, "user_555");

    let resp = call(&mut app, json_request("POST", "/users/telegram/555", "")).await;
    let again: User = body_json(resp).await;
    assert_eq!(again.id, first.id);

    let resp = call(&mut app, get("/users/1")).await;
    let fetched: User = body_json(resp).await;
    assert_eq!(fetched.username, "user_555");
}

#[tokio::test]
async fn unknown_user_has_detail() {
    let resp = app().oneshot(get("/users/9")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "User not found");
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let mut app = app().into_service();
    let resp = call(&mut app, json_request("POST", "/users/", r#"{"username":"anya"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = call(&mut app, json_request("POST", "/users/", r#"{"username":"anya","telegram_id":"1"}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Username already exists");
}

// --- products ---

#[tokio::test]
async fn list_products_empty() {
    let resp = app().oneshot(get("/products")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let products: Vec<Product> = body_json(resp).await;
    assert!(products.is_empty());
}

#[tokio::test]
async fn create_product_requires_seller_header() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/products/",
            r#"{"title":"Coat","price":10,"section":"market"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "seller_id header is required");
}

#[tokio::test]
async fn create_product_rejects_negative_price() {
    let resp = app()
        .oneshot(create_product_request(
            r#"{"title":"Coat","price":-1,"section":"market"}"#,
            "5",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_product_assigns_id_seller_and_timestamp() {
    let resp = app()
        .oneshot(create_product_request(
            r#"{"title":"Coat","price":10,"section":"swop","size":"L"}"#,
            "5",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let product: Product = body_json(resp).await;
    assert_eq!(product.seller_id, 5);
    assert_eq!(product.size.as_deref(), Some("L"));
    assert!(uuid::Uuid::parse_str(&product.id).is_ok());
    assert!(!product.created_at.is_empty());
}

#[tokio::test]
async fn get_product_not_found_has_detail() {
    let resp = app().oneshot(get("/products/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Product not found");
}

#[tokio::test]
async fn list_products_applies_filters_and_paging() {
    let mut app = app().into_service();
    for (title, section, size) in [
        ("Red coat", "market", "M"),
        ("Blue coat", "swop", "M"),
        ("Green scarf", "swop", "S"),
        ("Black coat", "swop", "M"),
    ] {
        let body = format!(r#"{{"title":"{title}","price":5,"section":"{section}","size":"{size}"}}"#);
        let resp = call(&mut app, create_product_request(&body, "1")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = call(&mut app, get("/products?section=swop&size=M")).await;
    let products: Vec<Product> = body_json(resp).await;
    let titles: Vec<_> = products.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Blue coat", "Black coat"]);

    let resp = call(&mut app, get("/products?search=COAT&skip=1&limit=1")).await;
    let products: Vec<Product> = body_json(resp).await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Blue coat");
}

// --- categories ---

#[tokio::test]
async fn categories_create_list_get() {
    let mut app = app().into_service();

    let resp = call(&mut app, json_request("POST", "/categories", r#"{"name":"Обувь"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Category = body_json(resp).await;
    assert_eq!(created.id, 1);

    let resp = call(&mut app, get("/categories")).await;
    let all: Vec<Category> = body_json(resp).await;
    assert_eq!(all.len(), 1);

    let resp = call(&mut app, get("/categories/1")).await;
    let fetched: Category = body_json(resp).await;
    assert_eq!(fetched.name, "Обувь");

    let resp = call(&mut app, get("/categories/2")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_bad_id_returns_400() {
    let resp = app().oneshot(get("/categories/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- messages and orders ---

#[tokio::test]
async fn order_lifecycle() {
    let mut app = app().into_service();

    let resp = call(
        &mut app,
        create_product_request(r#"{"title":"Dress","price":40,"section":"market"}"#, "2"),
    )
    .await;
    let product: Product = body_json(resp).await;

    // message thread
    for text in ["Hi!", "Is it available?"] {
        let body = serde_json::json!({"product_id": product.id, "sender_id": 9, "text": text});
        let resp = call(&mut app, json_request("POST", "/messages", &body.to_string())).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = call(&mut app, get(&format!("/messages/product/{}", product.id))).await;
    let messages: Vec<Message> = body_json(resp).await;
    let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["Hi!", "Is it available?"]);

    // order for an unknown product
    let resp = call(
        &mut app,
        json_request("POST", "/orders", r#"{"buyer_id":9,"product_id":"missing"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // order for the real product
    let body = serde_json::json!({"buyer_id": 9, "product_id": product.id});
    let resp = call(&mut app, json_request("POST", "/orders", &body.to_string())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Order = body_json(resp).await;
    assert_eq!(order.status, "pending");

    let resp = call(&mut app, get(&format!("/orders/{}", order.id))).await;
    let fetched: Order = body_json(resp).await;
    assert_eq!(fetched.product_id, product.id);

    let resp = call(&mut app, get(&format!("/orders/{}/summary", order.id))).await;
    let summary: OrderSummary = body_json(resp).await;
    assert_eq!(summary.product_price, 40.0);
    assert_eq!(summary.platform_fee, 4.0);
    assert_eq!(summary.seller_receives, 36.0);

    let resp = call(&mut app, get("/orders/99/summary")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], br#"{"detail":"Order not found"}"#);
}
