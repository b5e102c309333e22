//! Verify request building and response decoding against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected results or errors. Comparing parsed JSON (not raw strings)
//! avoids false negatives from field-ordering differences.

use std::cell::RefCell;

use storefront_core::{
    transport, ApiError, ClientConfig, HttpMethod, HttpRequest, HttpResponse, Id, MarketplaceClient,
    Product, ProductDraft, ProductFilters, Result, Storefront,
};

const BASE_URL: &str = "http://localhost:8000";

fn client() -> MarketplaceClient {
    MarketplaceClient::new(ClientConfig::new(BASE_URL))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

// ---------------------------------------------------------------------------
// List products
// ---------------------------------------------------------------------------

#[test]
fn list_products_test_vectors() {
    let raw = include_str!("../../test-vectors/list_products.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let filters: ProductFilters = serde_json::from_value(case["filters"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = client().build_list_products(&filters);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify decode through the accessor
        let response = simulated(case);
        let seen = RefCell::new(Vec::new());
        let canned = |req: &HttpRequest| -> Result<HttpResponse> {
            seen.borrow_mut().push(req.clone());
            Ok(response.clone())
        };
        let store = Storefront::new(ClientConfig::new(BASE_URL), canned);
        let products = store.list_products(&filters).unwrap();
        let expected: Vec<Product> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(products, expected, "{name}: parsed result");
        assert_eq!(seen.borrow().as_slice(), &[req], "{name}: executed request");
    }
}

// ---------------------------------------------------------------------------
// Create product
// ---------------------------------------------------------------------------

#[test]
fn create_product_test_vectors() {
    let raw = include_str!("../../test-vectors/create_product.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: ProductDraft = serde_json::from_value(case["input"].clone()).unwrap();
        let seller_id: Id = serde_json::from_value(case["seller_id"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_create_product(&input, &seller_id).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let req_body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");

        // Verify decode
        let product: Product = transport::decode(&simulated(case)).unwrap();
        let expected: Product = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(product, expected, "{name}: parsed result");
        assert_eq!(product.seller_id, seller_id, "{name}: seller echoed back");
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn error_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse::new(
            case["status"].as_u64().unwrap() as u16,
            case["body"].as_str().unwrap(),
        );
        let err = transport::decode::<Vec<Product>>(&response).unwrap_err();

        match case["expected_error"].as_str().unwrap() {
            "NotFound" => assert!(matches!(err, ApiError::NotFound { .. }), "{name}: expected NotFound"),
            "Http" => assert!(
                matches!(err, ApiError::Http { status, .. } if status == response.status),
                "{name}: expected Http"
            ),
            "MalformedResponse" => {
                assert!(matches!(err, ApiError::MalformedResponse(_)), "{name}: expected MalformedResponse")
            }
            other => panic!("{name}: unknown expected_error: {other}"),
        }
        if let Some(detail) = case.get("expected_detail") {
            assert_eq!(err.detail(), detail.as_str(), "{name}: detail");
            assert_eq!(err.to_string(), detail.as_str().unwrap(), "{name}: message");
        }
    }
}
