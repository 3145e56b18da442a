//! Integration tests for `StripeClient` using wiremock HTTP mocks.

use std::str::FromStr;

use rust_decimal::Decimal;
use storefront_payments::{CheckoutItem, CheckoutRequest, PaymentError, StripeClient};
use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, max_retries: u32) -> StripeClient {
    StripeClient::with_base_url("sk_test_123", 30, max_retries, base_url)
        .expect("client construction should not fail")
        .with_backoff_base_ms(0)
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        items: vec![CheckoutItem {
            name: "USB-C cable".to_owned(),
            price: Decimal::from_str("12.99").unwrap(),
            quantity: 2,
            image: None,
            description: None,
        }],
        user_id: Some("user-1".to_owned()),
        success_url: "https://shop.test/success?session_id={CHECKOUT_SESSION_ID}".to_owned(),
        cancel_url: "https://shop.test/store".to_owned(),
        allowed_countries: vec!["US".to_owned()],
        statement_descriptor: None,
    }
}

#[tokio::test]
async fn create_checkout_session_posts_form_and_returns_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("authorization", "Bearer sk_test_123"))
        .and(header_exists("idempotency-key"))
        .and(body_string_contains("mode=payment"))
        .and(body_string_contains("unit_amount%5D=1299"))
        .and(body_string_contains("metadata%5Buser_id%5D=user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_test_1",
            "url": "https://checkout.test/pay/cs_test_1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let session = client
        .create_checkout_session(&checkout_request())
        .await
        .expect("should create session");

    assert_eq!(session.id, "cs_test_1");
    assert_eq!(session.url.as_deref(), Some("https://checkout.test/pay/cs_test_1"));
}

#[tokio::test]
async fn invalid_items_never_reach_the_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut request = checkout_request();
    request.items.clear();
    let err = test_client(&server.uri(), 0)
        .create_checkout_session(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::InvalidRequest(_)));
}

#[tokio::test]
async fn retrieve_session_expands_line_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_1"))
        .and(query_param("expand[]", "line_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_test_1",
            "payment_status": "paid",
            "amount_total": 2598,
            "currency": "usd",
            "customer_details": { "email": "ada@example.com", "name": "Ada" },
            "metadata": { "user_id": "guest" },
            "line_items": {
                "object": "list",
                "has_more": false,
                "data": [
                    { "description": "USB-C cable", "quantity": 2, "amount_total": 2598, "currency": "usd" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let session = test_client(&server.uri(), 0)
        .retrieve_session("cs_test_1")
        .await
        .expect("should parse session");

    let status = storefront_payments::session_status(&session);
    assert_eq!(status.status, "paid");
    assert_eq!(status.amount_total, Some(2598));
    assert_eq!(status.customer_email.as_deref(), Some("ada@example.com"));
    assert_eq!(status.line_items.len(), 1);
    assert_eq!(status.line_items[0].quantity, Some(2));
}

#[tokio::test]
async fn list_line_items_returns_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_test_1/line_items"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "has_more": false,
            "data": [
                { "description": "A", "quantity": 1, "amount_total": 100, "currency": "usd" },
                { "description": "B", "quantity": 3, "amount_total": 300, "currency": "usd" }
            ]
        })))
        .mount(&server)
        .await;

    let items = test_client(&server.uri(), 0)
        .list_line_items("cs_test_1")
        .await
        .expect("should list line items");

    assert_eq!(items.len(), 2);
    assert_eq!(items[1].amount_total, Some(300));
}

#[tokio::test]
async fn provider_error_envelope_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {
                "type": "invalid_request_error",
                "message": "No such checkout.session: 'cs_missing'"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri(), 3)
        .retrieve_session("cs_missing")
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::Api { status: 404, .. }));
    assert!(err.is_client_error());
    assert!(
        err.to_string().contains("No such checkout.session"),
        "unexpected message: {err}"
    );
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_flaky",
            "payment_status": "unpaid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = test_client(&server.uri(), 2)
        .retrieve_session("cs_flaky")
        .await
        .expect("should succeed on the third attempt");

    assert_eq!(session.payment_status.as_deref(), Some("unpaid"));
}
