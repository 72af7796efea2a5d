use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::DateTime;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use listing_api::handlers::app;
use listing_api::models::{Category, PriceType, Property};
use listing_api::store::MemoryListingStore;

fn listing(id: i32) -> Property {
    Property {
        id,
        title: format!("Listing {}", id),
        description: "Family home with a garden".to_string(),
        location: "Springfield".to_string(),
        category: Category::House,
        price_type: PriceType::Sale,
        price: 250_000,
        area: 1_200,
        bedrooms: 3,
        bathrooms: 2,
        agent_id: 1,
        is_available: true,
        is_featured: false,
        is_verified: true,
        rating: 4.2,
        created_at: DateTime::from_timestamp(1_700_000_000 + i64::from(id), 0)
            .unwrap()
            .naive_utc(),
    }
}

/// Router over a seeded in-memory store: listing 101 (the spec scenario), a
/// cheaper listing 102 and an unavailable listing 103.
fn setup() -> (Router, Arc<MemoryListingStore>) {
    let store = Arc::new(MemoryListingStore::new());

    store.insert_property(listing(101));

    let mut studio = listing(102);
    studio.title = "Harbor studio".to_string();
    studio.price = 90_000;
    studio.area = 450;
    studio.bedrooms = 1;
    studio.bathrooms = 1;
    studio.rating = 3.1;
    store.insert_property(studio);

    let mut hidden = listing(103);
    hidden.is_available = false;
    store.insert_property(hidden);

    (app(store.clone()), store)
}

fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([198, 51, 100, 7], 40000)))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        router,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .extension(peer())
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn patch_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method("PATCH")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn search_never_exposes_unavailable_listings() {
    let (router, _) = setup();

    let (status, body) = get(&router, "/properties").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![102, 101]); // newest first by default
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["is_available"] == json!(true)));
}

#[tokio::test]
async fn price_range_scenario_for_listing_101() {
    let (router, _) = setup();

    let (status, body) = get(&router, "/properties?min_price=200000&max_price=300000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![101]);

    let (status, body) = get(&router, "/properties?max_price=100000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![102]);
}

#[tokio::test]
async fn exact_text_and_ordering_filters() {
    let (router, _) = setup();

    let (status, body) = get(&router, "/properties?bedrooms=1&price_type=sale").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![102]);

    let (status, body) = get(&router, "/properties?search=harbor").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![102]);

    let (status, body) = get(&router, "/properties?ordering=price").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![102, 101]);

    let (status, body) = get(&router, "/properties?ordering=-rating").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![101, 102]);
}

#[tokio::test]
async fn malformed_filters_are_field_keyed_errors() {
    let (router, _) = setup();

    let (status, body) = get(&router, "/properties?min_price=cheap").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["min_price"], json!(["A valid integer is required."]));

    let (status, body) = get(&router, "/properties?ordering=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("ordering").is_some());

    let (status, body) = get(&router, "/properties?category=castle&is_verified=maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("category").is_some());
    assert!(body.get("is_verified").is_some());
}

#[tokio::test]
async fn view_tracking_is_idempotent_per_visitor() {
    let (router, store) = setup();

    for agent in ["Mozilla/5.0", "curl/8.0"] {
        let (status, body) = send(
            &router,
            Request::builder()
                .method("POST")
                .uri("/properties/101/track_view")
                .header("x-forwarded-for", "10.0.0.5, 172.16.0.1")
                .header(header::USER_AGENT, agent)
                .extension(peer())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "view tracked"}));
    }

    let views = store.views_for(101);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].ip_address, "10.0.0.5");
    assert_eq!(views[0].user_agent, "Mozilla/5.0"); // first call wins
}

#[tokio::test]
async fn view_tracking_uses_peer_address_without_forwarded_header() {
    let (router, store) = setup();

    let (status, _) = send(
        &router,
        Request::builder()
            .method("POST")
            .uri("/properties/101/track_view")
            .extension(peer())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let views = store.views_for(101);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].ip_address, "198.51.100.7");
    assert_eq!(views[0].user_agent, "");
}

#[tokio::test]
async fn view_tracking_unknown_listing_is_404() {
    let (router, store) = setup();

    let (status, body) = send(
        &router,
        Request::builder()
            .method("POST")
            .uri("/properties/999/track_view")
            .extension(peer())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "not found"}));
    assert!(store.views_for(999).is_empty());
}

#[tokio::test]
async fn inquiry_with_blank_contact_creates_nothing() {
    let (router, store) = setup();

    let (status, body) = post_json(
        &router,
        "/properties/101/inquire",
        json!({
            "name": "",
            "email": "ada@example.com",
            "message": "Is it still available?"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"], json!(["This field may not be blank."]));
    assert_eq!(store.inquiry_count(), 0);
}

#[tokio::test]
async fn inquiry_unknown_listing_is_404_even_with_bad_body() {
    let (router, store) = setup();

    let (status, _) = post_json(&router, "/properties/999/inquire", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(store.inquiry_count(), 0);
}

#[tokio::test]
async fn valid_inquiry_is_created_as_submitted() {
    let (router, store) = setup();

    let (status, body) = post_json(
        &router,
        "/properties/101/inquire",
        json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "+1 555 010 2030",
            "message": "Is it still available?"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["property_id"], json!(101));
    assert_eq!(body["status"], json!("submitted"));
    assert!(body["id"].as_i64().unwrap() > 0);
    assert!(body.get("created_at").is_some());
    assert_eq!(store.inquiry_count(), 1);
}

#[tokio::test]
async fn inquiry_review_lifecycle_moves_forward_only() {
    let (router, _store) = setup();

    let (_, created) = post_json(
        &router,
        "/properties/101/inquire",
        json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "message": "Is it still available?"
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let uri = format!("/inquiries/{}", id);
    let (status, body) = patch_json(&router, &uri, json!({"status": "contacted"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("contacted"));

    let (status, body) = patch_json(&router, &uri, json!({"status": "submitted"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["status"],
        json!(["Cannot move from \"contacted\" to \"submitted\"."])
    );

    let (status, _) = patch_json(&router, &uri, json!({"status": "reopened"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = patch_json(&router, "/inquiries/999", json!({"status": "closed"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inquiry_listing_supports_property_and_status_filters() {
    let (router, _store) = setup();

    for property in [101, 102] {
        post_json(
            &router,
            &format!("/properties/{}/inquire", property),
            json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "message": "Is it still available?"
            }),
        )
        .await;
    }

    let (status, body) = get(&router, "/inquiries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = get(&router, "/inquiries?property=101").await;
    assert_eq!(status, StatusCode::OK);
    let inquiries = body.as_array().unwrap();
    assert_eq!(inquiries.len(), 1);
    assert_eq!(inquiries[0]["property_id"], json!(101));

    let (status, body) = get(&router, "/inquiries?status=closed").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = get(&router, "/inquiries?property=latest").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["property"], json!(["A valid integer is required."]));
}
