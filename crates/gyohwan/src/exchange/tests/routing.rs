use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::ExchangePolicy;
use crate::exchange::repository::RepositoryError;
use crate::exchange::router::{error_response, exchange_router};
use crate::exchange::service::ExchangeServiceError;

fn bearer_for(service: &MemoryService, uuid: &str) -> String {
    let session = service.login(uuid).expect("login succeeds");
    format!("Bearer {}", session.access_token)
}

fn put_json(uri: &str, authorization: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_with(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn token_route_returns_session_or_not_found() {
    let (service, store) = build_service(ExchangePolicy::default());
    let user = register(&store, "mina", 4.1, 4);
    let router = exchange_router(service);

    let response = router
        .clone()
        .oneshot(
            Request::post("/auth/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "uuid": user.uuid }).to_string()))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["tokenType"], json!("bearer"));
    assert_eq!(payload["user"]["id"], json!(user.id.0));
    assert!(payload["accessToken"].as_str().is_some());

    let response = router
        .oneshot(
            Request::post("/auth/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "uuid": "unknown" }).to_string()))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let (service, _) = build_service(ExchangePolicy::default());
    let router = exchange_router(service);

    for uri in ["/me", "/universities", "/universities/3", "/users/1"] {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&header::HeaderValue::from_static("Bearer"))
        );
        let payload = read_json_body(response).await;
        assert_eq!(payload["error"], json!("not authenticated"));
    }
}

#[tokio::test]
async fn update_route_returns_refreshed_profile() {
    let (service, store) = build_service(ExchangePolicy::default());
    let user = register(&store, "mina", 4.1, 1);
    let authorization = bearer_for(&service, &user.uuid);
    let router = exchange_router(service);

    let response = router
        .clone()
        .oneshot(put_json(
            "/me/applications",
            &authorization,
            json!({ "applications": [
                { "universityId": 7, "choice": 1 },
                { "universityId": 3, "choice": 2 }
            ] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["modifyCount"], json!(0));
    assert_eq!(payload["email"], json!("mina@knu.ac.kr"));
    assert_eq!(payload["applications"][0]["universityId"], json!(7));
    assert_eq!(payload["applications"][0]["universityName"], json!("Uppsala University"));
    assert_eq!(payload["applications"][1]["totalApplicants"], json!(1));

    let response = router
        .oneshot(put_json(
            "/me/applications",
            &authorization,
            json!({ "applications": [] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_route_reports_validation_reason() {
    let (service, store) = build_service(ExchangePolicy::default());
    let user = register(&store, "mina", 4.1, 2);
    let authorization = bearer_for(&service, &user.uuid);
    let router = exchange_router(service);

    let response = router
        .oneshot(put_json(
            "/me/applications",
            &authorization,
            json!({ "applications": [{ "universityId": 999, "choice": 1 }] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("999"));
}

#[tokio::test]
async fn negative_ranks_are_reported_as_validation_errors() {
    let (service, store) = build_service(ExchangePolicy::default());
    let user = register(&store, "mina", 4.1, 2);
    let authorization = bearer_for(&service, &user.uuid);
    let router = exchange_router(service.clone());

    let response = router
        .oneshot(put_json(
            "/me/applications",
            &authorization,
            json!({ "applications": [{ "universityId": 7, "choice": -1 }] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some_and(|reason| reason.contains("-1")));
    assert_eq!(service.profile(user.id).expect("profile").modify_count, 2);
}

#[tokio::test]
async fn update_route_checks_the_token_before_the_body() {
    let (service, store) = build_service(ExchangePolicy::default());
    let user = register(&store, "mina", 4.1, 2);
    let authorization = bearer_for(&service, &user.uuid);
    let router = exchange_router(service);

    let response = router
        .clone()
        .oneshot(put_json(
            "/me/applications",
            "Bearer garbage",
            json!({ "applications": "nope" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let malformed = Request::builder()
        .method("PUT")
        .uri("/me/applications")
        .header(header::AUTHORIZATION, authorization.as_str())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"applications":[{"universityId":7"#))
        .expect("request");
    let response = router.oneshot(malformed).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|reason| reason.starts_with("invalid request body")));
}

#[tokio::test]
async fn university_routes_list_and_rank() {
    let (service, store) = build_service(ExchangePolicy::default());
    let mina = register(&store, "mina", 3.9, 4);
    let jun = register(&store, "jun", 4.2, 4);
    service
        .update_applications(mina.id, choices(&[(9, 1)]))
        .expect("mina applies");
    service
        .update_applications(jun.id, choices(&[(9, 2), (3, 1)]))
        .expect("jun applies");
    let authorization = bearer_for(&service, &mina.uuid);
    let router = exchange_router(service);

    let response = router
        .clone()
        .oneshot(get_with("/universities", &authorization))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let listing = payload.as_array().expect("array");
    assert_eq!(listing.len(), catalog().len());
    let leeds = listing
        .iter()
        .find(|entry| entry["id"] == json!(9))
        .expect("leeds listed");
    assert_eq!(leeds["applicantCount"], json!(2));

    let response = router
        .clone()
        .oneshot(get_with("/universities/9", &authorization))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["totalApplicants"], json!(2));
    assert_eq!(payload["applicants"][0]["nickname"], json!("jun"));
    assert_eq!(payload["applicants"][0]["rank"], json!(1));
    assert_eq!(payload["applicants"][0]["choice"], json!(2));
    assert_eq!(payload["applicants"][1]["nickname"], json!("mina"));

    let response = router
        .oneshot(get_with("/universities/404", &authorization))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_profile_route_hides_private_fields() {
    let (service, store) = build_service(ExchangePolicy::default());
    let mina = register(&store, "mina", 3.9, 4);
    let jun = register(&store, "jun", 4.2, 4);
    let authorization = bearer_for(&service, &mina.uuid);
    let router = exchange_router(service);

    let response = router
        .oneshot(get_with(&format!("/users/{}", jun.id.0), &authorization))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["nickname"], json!("jun"));
    assert!(payload.get("email").is_none());
    assert!(payload.get("modifyCount").is_none());
}

#[tokio::test]
async fn register_route_creates_profiles_and_reports_conflicts() {
    let (service, _) = build_service(ExchangePolicy::default());
    let router = exchange_router(service);
    let body = json!({
        "email": "mina@knu.ac.kr",
        "uuid": "123e4567-e89b-12d3-a456-426614174000",
        "nickname": "mina",
        "grade": 4.1,
        "lang": "TOEIC 900"
    });

    let request = || {
        Request::post("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    };

    let response = router.clone().oneshot(request()).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["modifyCount"], json!(4));

    let response = router.oneshot(request()).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn storage_failures_stay_opaque() {
    let response = error_response(ExchangeServiceError::Repository(
        RepositoryError::Unavailable("connection reset by 10.0.0.4".to_string()),
    ));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("internal server error"));
}
