//! HTTP-level tests against the in-memory backend.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use uuid::Uuid;

use grading_orders::application::order_service::OrderService;
use grading_orders::configure;
use grading_orders::domain::directory::{Customer, Store};
use grading_orders::handlers::AppState;
use grading_orders::infrastructure::memory::InMemoryStore;

struct Fixture {
    store: Arc<InMemoryStore>,
    shop_id: Uuid,
    other_shop_id: Uuid,
    closed_shop_id: Uuid,
    customer_id: Uuid,
    card_id: Uuid,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let shop_id = Uuid::new_v4();
        let other_shop_id = Uuid::new_v4();
        let closed_shop_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();
        let card_id = Uuid::new_v4();

        store.insert_store(Store {
            id: shop_id,
            name: "Dragon Vault".to_string(),
            is_active: true,
            grading_price: Some(BigDecimal::from(300)),
            mystery_pack_price: None,
        });
        store.insert_store(Store {
            id: other_shop_id,
            name: "Card Corner".to_string(),
            is_active: true,
            grading_price: None,
            mystery_pack_price: None,
        });
        store.insert_store(Store {
            id: closed_shop_id,
            name: "Closed Shop".to_string(),
            is_active: false,
            grading_price: None,
            mystery_pack_price: None,
        });
        store.insert_customer(Customer {
            id: customer_id,
            name: "Ash Ketchum".to_string(),
            email: Some("ash@example.com".to_string()),
            store_id: Some(shop_id),
        });
        store.insert_card(card_id);

        Self {
            store,
            shop_id,
            other_shop_id,
            closed_shop_id,
            customer_id,
            card_id,
        }
    }

    fn state(&self) -> web::Data<AppState> {
        web::Data::new(AppState {
            orders: OrderService::new(self.store.clone(), self.store.clone(), self.store.clone()),
        })
    }
}

fn admin(req: test::TestRequest) -> test::TestRequest {
    req.insert_header(("X-Role", "admin"))
        .insert_header(("X-Api-Access", "true"))
}

fn store_owner(req: test::TestRequest, store_id: Uuid) -> test::TestRequest {
    req.insert_header(("X-Role", "store_owner"))
        .insert_header(("X-Api-Access", "true"))
        .insert_header(("X-Store-Id", store_id.to_string()))
}

fn customer(req: test::TestRequest, customer_id: Uuid) -> test::TestRequest {
    req.insert_header(("X-Role", "customer"))
        .insert_header(("X-Api-Access", "true"))
        .insert_header(("X-Customer-Id", customer_id.to_string()))
}

fn grading_basket() -> Value {
    json!({ "items": [{ "product_type": "grading", "quantity": 1 }] })
}

#[actix_web::test]
async fn order_lifecycle_from_creation_to_delivery() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;
    let unknown_card = Uuid::new_v4();

    let req = store_owner(test::TestRequest::post().uri("/orders"), fx.shop_id)
        .set_json(json!({
            "customer_id": fx.customer_id,
            "card_ids": [fx.card_id, unknown_card],
            "items": [
                { "product_type": "grading", "quantity": 2.7 },
                { "product_type": "mysterypack", "quantity": 1 }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    let order = &body["order"];
    let order_id: Uuid = order["id"].as_str().unwrap().parse().unwrap();
    let tracking_code = order["tracking_code"].as_str().unwrap().to_string();

    assert_eq!(order["status"], "pending");
    assert_eq!(order["store_id"], fx.shop_id.to_string());
    assert_eq!(order["store_name"], "Dragon Vault");
    assert_eq!(order["customer_name"], "Ash Ketchum");
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["items"][0]["unit_price"], "300");
    assert_eq!(order["items"][0]["subtotal"], "600");
    assert_eq!(order["items"][1]["unit_price"], "150");
    assert_eq!(order["total"], "750");
    assert_eq!(order["timeline"].as_array().unwrap().len(), 7);
    assert_eq!(order["timeline"][0]["state"], "current");
    assert_eq!(tracking_code.len(), 8);

    let warnings = body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap().contains(&unknown_card.to_string()));
    assert_eq!(fx.store.card_order(fx.card_id), Some(order_id));

    for status in [
        "received",
        "processing",
        "encapsulated",
        "completed",
        "shipped",
        "delivered",
    ] {
        let req = admin(test::TestRequest::patch().uri(&format!("/orders/{order_id}/status")))
            .set_json(json!({ "status": status, "performed_by": "ops" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "moving to {status}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], status);
    }

    // Delivered is terminal.
    let req = admin(test::TestRequest::patch().uri(&format!("/orders/{order_id}/status")))
        .set_json(json!({ "status": "delivered" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!("/tracking/{}", tracking_code.to_lowercase()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "delivered");
    assert!(body["timeline"]
        .as_array()
        .unwrap()
        .iter()
        .all(|entry| entry["state"] == "completed"));
    assert!(body.get("total").is_none());

    let req = admin(test::TestRequest::delete().uri(&format!("/orders/{order_id}"))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn skipping_a_step_is_rejected() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    let req = admin(test::TestRequest::post().uri("/orders"))
        .set_json(grading_basket())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let order_id = body["order"]["id"].as_str().unwrap().to_string();

    let req = admin(test::TestRequest::patch().uri(&format!("/orders/{order_id}/status")))
        .set_json(json!({ "status": "processing" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("received"));

    let req = admin(test::TestRequest::patch().uri(&format!("/orders/{order_id}/status")))
        .set_json(json!({ "status": "archived" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn store_owner_listing_is_forced_to_their_store() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    for store_id in [fx.shop_id, fx.other_shop_id, fx.other_shop_id] {
        let req = admin(test::TestRequest::post().uri("/orders"))
            .set_json(json!({
                "store_id": store_id,
                "items": [{ "product_type": "grading", "quantity": 1 }]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = store_owner(
        test::TestRequest::get().uri(&format!("/orders?store_id={}", fx.other_shop_id)),
        fx.shop_id,
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["store_id"], fx.shop_id.to_string());
    assert_eq!(body["items"][0]["items"][0]["unit_price"], "300");

    let req = admin(test::TestRequest::get().uri("/orders?limit=2")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_next"], true);

    let req = admin(test::TestRequest::get().uri("/orders?search=card%20corner")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 2);
}

#[actix_web::test]
async fn customers_only_see_their_own_orders() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    let req = admin(test::TestRequest::post().uri("/orders"))
        .set_json(grading_basket())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let foreign_order = body["order"]["id"].as_str().unwrap().to_string();

    let req = customer(test::TestRequest::post().uri("/orders"), fx.customer_id)
        .set_json(grading_basket())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = customer(
        test::TestRequest::get().uri(&format!("/orders/{foreign_order}")),
        fx.customer_id,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = customer(test::TestRequest::get().uri("/orders"), fx.customer_id).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["customer_id"], fx.customer_id.to_string());
}

#[actix_web::test]
async fn caller_identity_is_required() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    let req = test::TestRequest::get().uri("/orders").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/orders")
        .insert_header(("X-Role", "customer"))
        .insert_header(("X-Api-Access", "true"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/orders")
        .insert_header(("X-Role", "admin"))
        .set_json(grading_basket())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn invalid_items_are_bad_requests() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    for items in [
        json!([{ "product_type": "booster", "quantity": 1 }]),
        json!([{ "product_type": "grading", "quantity": 0.5 }]),
        json!([{ "product_type": "grading", "quantity": 30000000 }]),
        json!([]),
    ] {
        let req = admin(test::TestRequest::post().uri("/orders"))
            .set_json(json!({ "items": items }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "items: {items}");
    }

    let req = admin(test::TestRequest::post().uri("/orders"))
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = admin(test::TestRequest::post().uri("/orders"))
        .set_json(json!({
            "store_id": fx.closed_shop_id,
            "items": [{ "product_type": "grading", "quantity": 1 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = admin(test::TestRequest::get().uri("/orders/not-a-uuid")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn items_can_be_replaced_until_processing() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    let req = store_owner(test::TestRequest::post().uri("/orders"), fx.shop_id)
        .set_json(grading_basket())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let order_id = body["order"]["id"].as_str().unwrap().to_string();

    let req = store_owner(
        test::TestRequest::put().uri(&format!("/orders/{order_id}/items")),
        fx.shop_id,
    )
    .set_json(json!({ "items": [{ "product_type": "grading", "quantity": 3 }] }))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["order"]["total"], "900");
    assert_eq!(body["order"]["status"], "pending");

    for status in ["received", "processing"] {
        let req = admin(test::TestRequest::patch().uri(&format!("/orders/{order_id}/status")))
            .set_json(json!({ "status": status }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = store_owner(
        test::TestRequest::put().uri(&format!("/orders/{order_id}/items")),
        fx.shop_id,
    )
    .set_json(json!({ "items": [{ "product_type": "grading", "quantity": 1 }] }))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn only_admins_delete_orders() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    let req = store_owner(test::TestRequest::post().uri("/orders"), fx.shop_id)
        .set_json(grading_basket())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let order_id = body["order"]["id"].as_str().unwrap().to_string();

    let req = store_owner(
        test::TestRequest::delete().uri(&format!("/orders/{order_id}")),
        fx.shop_id,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = admin(test::TestRequest::delete().uri(&format!("/orders/{order_id}"))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = admin(test::TestRequest::get().uri(&format!("/orders/{order_id}"))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn pricing_quote_uses_store_overrides() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/pricing/calculate")
        .set_json(json!({
            "store_id": fx.shop_id,
            "items": [
                { "product_type": "grading", "quantity": 2 },
                { "product_type": "mysterypack", "quantity": 2 }
            ]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"][0]["subtotal"], "600");
    assert_eq!(body["items"][1]["subtotal"], "300");
    assert_eq!(body["total"], "900");

    let req = test::TestRequest::post()
        .uri("/pricing/calculate")
        .set_json(json!({ "items": [{ "product_type": "grading", "quantity": 1 }] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], "350");
}

#[actix_web::test]
async fn directory_lookups_respect_tenancy() {
    let fx = Fixture::new();
    let app = test::init_service(App::new().app_data(fx.state()).configure(configure)).await;

    let req = store_owner(
        test::TestRequest::get().uri(&format!("/customers/{}", fx.customer_id)),
        fx.shop_id,
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Ash Ketchum");

    let req = store_owner(
        test::TestRequest::get().uri(&format!("/customers/{}", fx.customer_id)),
        fx.other_shop_id,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = store_owner(
        test::TestRequest::get().uri(&format!("/stores/{}", fx.shop_id)),
        fx.shop_id,
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["grading_price"], "300");
    assert_eq!(body["mystery_pack_price"], Value::Null);

    let req = admin(test::TestRequest::get().uri(&format!("/stores/{}", Uuid::new_v4()))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
