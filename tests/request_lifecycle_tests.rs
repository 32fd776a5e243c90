//! End-to-end tests for the join request lifecycle over HTTP.

mod common;

use axum::http::StatusCode;
use common::{error_code, get_request, post_json, put_json, TestApp};
use serde_json::json;

struct Scenario {
    t: TestApp,
    owner_id: String,
    owner: String,
    student_id: String,
    student: String,
    mentor: String,
    stranger: String,
    project_id: String,
}

async fn scenario() -> Scenario {
    let t = TestApp::new().await;
    let (owner_id, owner) = t.register("Owner", "student", &["Rust"]).await;
    let (student_id, student) = t.register("Sam", "student", &["Rust"]).await;
    let (_, mentor) = t.register("Mona", "mentor", &["Go"]).await;
    let (_, stranger) = t.register("Stan", "student", &[]).await;
    let project_id = t.create_project(&owner, "Compiler", &["Rust"]).await;

    Scenario {
        t,
        owner_id,
        owner,
        student_id,
        student,
        mentor,
        stranger,
        project_id,
    }
}

#[tokio::test]
async fn test_accept_adds_sender_to_team() {
    let s = scenario().await;

    let (status, request) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    assert_eq!(request["type"], "teammate_request");
    assert_eq!(request["senderId"], s.student_id.as_str());
    let request_id = request["id"].as_str().unwrap();

    let (status, resolved) = s.t.set_status(&s.owner, request_id, "accepted").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "accepted");
    assert!(resolved["resolvedAt"].is_string());

    let (status, project) = s
        .t
        .send(get_request(&format!("/api/project/{}", s.project_id), &s.owner))
        .await;
    assert_eq!(status, StatusCode::OK);
    let members = project["teamMembers"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["id"], s.student_id.as_str());
    assert!(project["mentors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_mentor_request_adds_to_mentors() {
    let s = scenario().await;

    let (_, request) = s
        .t
        .open_request(&s.mentor, &s.owner_id, &s.project_id, "mentor_request")
        .await;
    let request_id = request["id"].as_str().unwrap();
    s.t.set_status(&s.owner, request_id, "accepted").await;

    let (_, project) = s
        .t
        .send(get_request(&format!("/api/project/{}", s.project_id), &s.owner))
        .await;
    assert_eq!(project["mentors"].as_array().unwrap().len(), 1);
    assert!(project["teamMembers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_terminal_status_cannot_change() {
    let s = scenario().await;

    let (_, request) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    let request_id = request["id"].as_str().unwrap();

    let (status, _) = s.t.set_status(&s.owner, request_id, "rejected").await;
    assert_eq!(status, StatusCode::OK);

    for target in ["accepted", "rejected"] {
        let (status, body) = s.t.set_status(&s.owner, request_id, target).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error_code(&body), "INVALID_TRANSITION");
        assert_eq!(body["error"]["message"], "Request is already rejected");
    }

    let (status, body) = s.t.set_status(&s.student, request_id, "canceled").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_invalid_target_status() {
    let s = scenario().await;

    let (_, request) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    let request_id = request["id"].as_str().unwrap();

    for target in ["pending", "approved"] {
        let (status, body) = s.t.set_status(&s.owner, request_id, target).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "INVALID_TARGET_STATUS");
    }
}

#[tokio::test]
async fn test_duplicate_pending_request() {
    let s = scenario().await;

    let (status, _) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "DUPLICATE_PENDING");
}

#[tokio::test]
async fn test_existing_teammate_gets_already_member() {
    let s = scenario().await;

    let (_, request) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    s.t
        .set_status(&s.owner, request["id"].as_str().unwrap(), "accepted")
        .await;

    let (status, body) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ALREADY_MEMBER");
}

#[tokio::test]
async fn test_only_the_right_party_can_resolve() {
    let s = scenario().await;

    let (_, request) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    let request_id = request["id"].as_str().unwrap();

    let (status, body) = s.t.set_status(&s.stranger, request_id, "accepted").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");

    let (status, _) = s.t.set_status(&s.student, request_id, "accepted").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = s.t.set_status(&s.owner, request_id, "canceled").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = s.t.set_status(&s.student, request_id, "canceled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "canceled");
}

#[tokio::test]
async fn test_create_request_errors() {
    let s = scenario().await;

    let (status, body) = s
        .t
        .open_request(&s.student, &s.owner_id, "no-such-project", "teammate_request")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let (status, body) = s
        .t
        .open_request(&s.student, &s.student_id, &s.project_id, "teammate_request")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");

    let (status, body) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "friend_request")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");
}

#[tokio::test]
async fn test_missing_request_is_not_found() {
    let s = scenario().await;
    let (status, body) = s.t.set_status(&s.owner, "no-such-request", "accepted").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn test_list_my_requests() {
    let s = scenario().await;

    s.t.open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    s.t.open_request(&s.mentor, &s.owner_id, &s.project_id, "mentor_request")
        .await;

    let (status, body) = s.t.send(get_request("/api/request/me", &s.owner)).await;
    assert_eq!(status, StatusCode::OK);
    let incoming = body["incoming"].as_array().unwrap();
    assert_eq!(incoming.len(), 2);
    assert!(body["outgoing"].as_array().unwrap().is_empty());
    // Newest first.
    assert_eq!(incoming[0]["type"], "mentor_request");
    assert_eq!(incoming[0]["sender"]["name"], "Mona");
    assert_eq!(incoming[0]["project"]["name"], "Compiler");

    let (_, body) = s.t.send(get_request("/api/request/me", &s.student)).await;
    assert_eq!(body["outgoing"].as_array().unwrap().len(), 1);
    assert_eq!(body["outgoing"][0]["receiver"]["id"], s.owner_id.as_str());
}

#[tokio::test]
async fn test_list_project_requests() {
    let s = scenario().await;

    s.t.open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;

    let (status, body) = s
        .t
        .send(get_request(&format!("/api/request/project/{}", s.project_id), &s.owner))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = s
        .t
        .send(get_request("/api/request/project/no-such-project", &s.owner))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn test_requests_require_a_token() {
    let s = scenario().await;

    let (status, body) = s.t.send(get_request("/api/request/me", "wired_bogus123_nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_TOKEN");

    let request = axum::http::Request::builder()
        .uri("/api/request/me")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = s.t.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_malformed_bodies_are_invalid_input() {
    let s = scenario().await;

    let (status, body) = s
        .t
        .send(post_json(
            "/api/request",
            &s.student,
            json!({ "projectId": s.project_id, "type": "teammate_request" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");
    assert!(body["error"]["message"].is_string());

    let (_, request) = s
        .t
        .open_request(&s.student, &s.owner_id, &s.project_id, "teammate_request")
        .await;
    let uri = format!("/api/request/{}/status", request["id"].as_str().unwrap());
    let (status, body) = s.t.send(put_json(&uri, &s.owner, json!({ "state": "accepted" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_INPUT");
}
