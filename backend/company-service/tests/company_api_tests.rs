//! HTTP tests for the company endpoints
//!
//! Run against the in-memory repository with the fixed test key pair.

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use chrono::{Duration, Utc};
use common::{bearer, context, insert_company, ALICE, BOB, ROOT};
use company_service::configure;
use company_service::db::CompanyRepository;
use crypto_core::test_utils::test_key_pair;
use crypto_core::{KeyPair, TokenIssuer};
use serde_json::{json, Value};

// ============================================================================
// Authentication
// ============================================================================

#[actix_web::test]
async fn test_list_without_token_is_unauthorized() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::get().uri("/api/companies").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["status"], 401);
}

#[actix_web::test]
async fn test_every_company_route_requires_a_token() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let requests = vec![
        test::TestRequest::get().uri("/api/companies/some-id"),
        test::TestRequest::post()
            .uri("/api/companies")
            .set_json(json!({"name": "Acme"})),
        test::TestRequest::put()
            .uri("/api/companies/some-id")
            .set_json(json!({"name": "Acme"})),
        test::TestRequest::delete().uri("/api/companies/some-id"),
    ];

    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[actix_web::test]
async fn test_rejected_tokens() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let roles = vec!["ROLE_ADMIN".to_string()];
    let expired = TokenIssuer::new(&test_key_pair(), Duration::minutes(5))
        .unwrap()
        .issue_at(ROOT, &roles, Utc::now() - Duration::hours(1))
        .unwrap();
    let foreign = TokenIssuer::new(&KeyPair::generate().unwrap(), Duration::minutes(5))
        .unwrap()
        .issue(ROOT, &roles)
        .unwrap();
    let valid = bearer(ROOT, &["ADMIN"]);

    let headers = vec![
        format!("Bearer {}", expired),
        format!("Bearer {}", foreign),
        format!("{}tampered", valid),
        "Bearer not-a-jwt".to_string(),
        valid.replacen("Bearer ", "Basic ", 1),
    ];

    for value in headers {
        let req = test::TestRequest::get()
            .uri("/api/companies")
            .insert_header((header::AUTHORIZATION, value))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[actix_web::test]
async fn test_lowercase_bearer_scheme_is_accepted() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let authorization = bearer(ALICE, &["COMPANY_READ"]).replacen("Bearer", "bearer", 1);
    let req = test::TestRequest::get()
        .uri("/api/companies")
        .insert_header((header::AUTHORIZATION, authorization))
        .insert_header((header::ACCEPT, "application/json"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Listing
// ============================================================================

#[actix_web::test]
async fn test_list_with_unlisted_role_is_forbidden() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::get()
        .uri("/api/companies")
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["GUEST"])))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "forbidden");
}

#[actix_web::test]
async fn test_admin_sees_all_and_others_see_their_own() {
    let ctx = context();
    insert_company(&ctx, "Alice Co", ALICE).await;
    insert_company(&ctx, "Bob Co", BOB).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::get()
        .uri("/api/companies")
        .insert_header((header::ACCEPT, "application/json"))
        .insert_header((header::AUTHORIZATION, bearer(ROOT, &["ADMIN"])))
        .to_request();
    let all: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/companies")
        .insert_header((header::ACCEPT, "application/json"))
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_READ"])))
        .to_request();
    let mine: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["name"], "Alice Co");
    assert_eq!(mine[0]["createdByUser"], ALICE);
}

#[actix_web::test]
async fn test_every_listed_role_may_list() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    for role in ["COMPANY_READ", "COMPANY_SAVE", "COMPANY_DELETE", "COMPANY_CREATE"] {
        let req = test::TestRequest::get()
            .uri("/api/companies")
            .insert_header((header::AUTHORIZATION, bearer(ALICE, &[role])))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "role {} should list", role);
    }
}

#[actix_web::test]
async fn test_list_streams_server_sent_events_by_default() {
    let ctx = context();
    insert_company(&ctx, "Facebook", ALICE).await;
    insert_company(&ctx, "Google", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::get()
        .uri("/api/companies")
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_READ"])))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    let events: Vec<Value> = text
        .split("\n\n")
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| serde_json::from_str(chunk.strip_prefix("data:").unwrap()).unwrap())
        .collect();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["name"], "Facebook");
    assert_eq!(events[1]["name"], "Google");
}

#[actix_web::test]
async fn test_list_hides_deactivated_and_honours_page_size() {
    let ctx = context();
    for name in ["One", "Two", "Three"] {
        insert_company(&ctx, name, ALICE).await;
    }
    let mut dormant = insert_company(&ctx, "Dormant", ALICE).await;
    dormant.activated = false;
    ctx.repo.save(dormant).await.unwrap();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::get()
        .uri("/api/companies")
        .insert_header((header::ACCEPT, "application/json"))
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_READ"])))
        .to_request();
    let all: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 3);

    let req = test::TestRequest::get()
        .uri("/api/companies?pageSize=2")
        .insert_header((header::ACCEPT, "application/json"))
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_READ"])))
        .to_request();
    let page: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.len(), 2);
}

#[actix_web::test]
async fn test_list_with_bad_page_size_is_bad_request() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::get()
        .uri("/api/companies?pageSize=lots")
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_READ"])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Single record
// ============================================================================

#[actix_web::test]
async fn test_get_by_owner_admin_and_stranger() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;
    let uri = format!("/api/companies/{}", acme.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_READ"])))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], acme.id);
    assert_eq!(body["name"], "Acme");

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer(ROOT, &["ADMIN"])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer(BOB, &["COMPANY_READ"])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        format!("User({}) does not have access to this resource", BOB)
    );
}

#[actix_web::test]
async fn test_get_missing_company_is_not_found() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    for id in ["5f6c1a8e-1c1b-4f3e-9a43-2a4b5c6d7e8f", "not-a-uuid"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/companies/{}", id))
            .insert_header((header::AUTHORIZATION, bearer(ROOT, &["ADMIN"])))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[actix_web::test]
async fn test_get_requires_read_role_before_lookup() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    for id in [acme.id.as_str(), "missing"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/companies/{}", id))
            .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_CREATE"])))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}

// ============================================================================
// Create
// ============================================================================

#[actix_web::test]
async fn test_create_assigns_caller_as_owner() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::post()
        .uri("/api/companies")
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_CREATE"])))
        .set_json(json!({"name": "Acme", "createdByUser": BOB, "id": "forged"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let body: Value = test::read_body_json(resp).await;
    let id = body["id"].as_str().unwrap();
    assert_ne!(id, "forged");
    assert_eq!(location, format!("/api/companies/{}", id));
    assert_eq!(body["name"], "Acme");
    assert_eq!(body["createdByUser"], ALICE);
    assert_eq!(body["activated"], true);

    let stored = ctx.repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.created_by_user, ALICE);
}

#[actix_web::test]
async fn test_create_with_blank_name_is_bad_request() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    for payload in [json!({"name": "  "}), json!({"activated": true})] {
        let req = test::TestRequest::post()
            .uri("/api/companies")
            .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_CREATE"])))
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().unwrap().contains("must not be blank"));
    }

    assert_eq!(ctx.repo.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_create_with_malformed_json_is_bad_request() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::post()
        .uri("/api/companies")
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_CREATE"])))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"name\":")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "bad_request");
}

#[actix_web::test]
async fn test_create_role_check_precedes_validation() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::post()
        .uri("/api/companies")
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_READ"])))
        .set_json(json!({"name": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Update
// ============================================================================

#[actix_web::test]
async fn test_update_by_owner_preserves_identity() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/companies/{}", acme.id))
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_SAVE"])))
        .set_json(json!({"name": "Acme Corp", "activated": false, "createdByUser": BOB}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], acme.id);
    assert_eq!(body["name"], "Acme Corp");
    assert_eq!(body["activated"], false);
    assert_eq!(body["createdByUser"], ALICE);
    assert_eq!(body["lastModifiedByUser"], ALICE);

    let stored = ctx.repo.find_by_id(&acme.id).await.unwrap().unwrap();
    assert_eq!(stored.created_date, acme.created_date);
    assert_eq!(stored.name, "Acme Corp");
}

#[actix_web::test]
async fn test_admin_may_update_any_company() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/companies/{}", acme.id))
        .insert_header((header::AUTHORIZATION, bearer(ROOT, &["ADMIN"])))
        .set_json(json!({"name": "Renamed"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["createdByUser"], ALICE);
    assert_eq!(body["lastModifiedByUser"], ROOT);
}

#[actix_web::test]
async fn test_update_by_stranger_is_forbidden() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/companies/{}", acme.id))
        .insert_header((header::AUTHORIZATION, bearer(BOB, &["COMPANY_SAVE"])))
        .set_json(json!({"name": "Hijacked"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let stored = ctx.repo.find_by_id(&acme.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Acme");
}

#[actix_web::test]
async fn test_update_missing_company_is_not_found() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::put()
        .uri("/api/companies/missing")
        .insert_header((header::AUTHORIZATION, bearer(ROOT, &["ADMIN"])))
        .set_json(json!({"name": "Ghost"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.repo.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_update_validates_before_lookup() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::put()
        .uri("/api/companies/missing")
        .insert_header((header::AUTHORIZATION, bearer(ROOT, &["ADMIN"])))
        .set_json(json!({"name": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Delete
// ============================================================================

#[actix_web::test]
async fn test_delete_by_owner() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/companies/{}", acme.id))
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_DELETE"])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    assert!(body.is_empty());
    assert!(ctx.repo.find_by_id(&acme.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_delete_by_stranger_is_forbidden() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/companies/{}", acme.id))
        .insert_header((header::AUTHORIZATION, bearer(BOB, &["COMPANY_DELETE"])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        format!("User({}) does not have access to delete this resource", BOB)
    );
    assert!(ctx.repo.find_by_id(&acme.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn test_admin_may_delete_any_company() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/companies/{}", acme.id))
        .insert_header((header::AUTHORIZATION, bearer(ROOT, &["ADMIN"])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.repo.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_delete_missing_company_is_not_found() {
    let ctx = context();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::delete()
        .uri("/api/companies/missing")
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_DELETE"])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_delete_requires_delete_role() {
    let ctx = context();
    let acme = insert_company(&ctx, "Acme", ALICE).await;
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &ctx.state))).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/companies/{}", acme.id))
        .insert_header((header::AUTHORIZATION, bearer(ALICE, &["COMPANY_READ", "COMPANY_SAVE"])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(ctx.repo.find_by_id(&acme.id).await.unwrap().is_some());
}
