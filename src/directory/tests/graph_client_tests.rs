//! HTTP client behaviour against a mock directory service
//!
//! Covers pagination, retry of transient failures, retry suppression,
//! status/decode error mapping and context cancellation.

use rolepolicy_core::{
    AssignmentQuery, DirectoryClient, DirectoryError, ErrorKind, GroupId, RequestContext, RoleKind,
};
use rolepolicy_directory::{DirectoryConfig, GraphClient, RetryPolicy};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROUP: &str = "11111111-1111-1111-1111-111111111111";
const ASSIGNMENTS: &str = "/beta/policies/roleManagementPolicyAssignments";
const POLICIES: &str = "/beta/policies/roleManagementPolicies";

fn client_for(server: &MockServer) -> GraphClient {
    GraphClient::new(test_config(server)).unwrap()
}

fn test_config(server: &MockServer) -> DirectoryConfig {
    DirectoryConfig {
        endpoint: server.uri(),
        api_version: "beta".to_string(),
        access_token: Some("test-token".to_string()),
        request_timeout_secs: 30,
        retry: RetryPolicy {
            max_attempts: 3,
            base_backoff_ms: 1,
            max_backoff_ms: 50,
            retry_not_found: true,
        },
    }
}

fn owner_query() -> AssignmentQuery {
    AssignmentQuery::new(GroupId::parse(GROUP).unwrap(), RoleKind::Owner)
}

fn assignment(policy_id: &str) -> serde_json::Value {
    json!({
        "id": format!("Group_{GROUP}_{policy_id}_owner"),
        "policyId": policy_id,
        "scopeId": GROUP,
        "scopeType": "Group",
        "roleDefinitionId": "owner"
    })
}

// ============================================================================
// LISTING
// ============================================================================

#[tokio::test]
async fn test_list_sends_filter_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ASSIGNMENTS))
        .and(query_param("$filter", owner_query().filter()))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [assignment("policy-abc")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let assignments = client
        .list_policy_assignments(&RequestContext::background(), &owner_query())
        .await
        .unwrap();

    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].policy_id(), Some("policy-abc"));
}

#[tokio::test]
async fn test_list_follows_next_link() {
    let server = MockServer::start().await;
    let next = format!("{}{ASSIGNMENTS}?$skiptoken=page2", server.uri());

    Mock::given(method("GET"))
        .and(path(ASSIGNMENTS))
        .and(query_param("$filter", owner_query().filter()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [assignment("policy-1")],
            "@odata.nextLink": next
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ASSIGNMENTS))
        .and(query_param("$skiptoken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [assignment("policy-2")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let assignments = client
        .list_policy_assignments(&RequestContext::background(), &owner_query())
        .await
        .unwrap();

    let ids: Vec<_> = assignments.iter().filter_map(|a| a.policy_id()).collect();
    assert_eq!(ids, vec!["policy-1", "policy-2"]);
}

#[tokio::test]
async fn test_list_rejects_foreign_next_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ASSIGNMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [],
            "@odata.nextLink": "https://elsewhere.example.net/steal"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .list_policy_assignments(&RequestContext::background(), &owner_query())
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Decode(_)));
}

#[tokio::test]
async fn test_malformed_payload_is_transport_class() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ASSIGNMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .list_policy_assignments(&RequestContext::background(), &owner_query())
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Decode(_)));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

// ============================================================================
// RETRIES
// ============================================================================

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES}/policy-abc")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES}/policy-abc")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "policy-abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let policy = client_for(&server)
        .get_policy(&RequestContext::background(), "policy-abc")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(policy.id(), Some("policy-abc"));
}

#[tokio::test]
async fn test_not_found_is_retried_until_attempts_run_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES}/missing")))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let policy = client_for(&server)
        .get_policy(&RequestContext::background(), "missing")
        .await
        .unwrap();
    assert!(policy.is_none());
}

#[tokio::test]
async fn test_suppressed_retries_send_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES}/missing")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ASSIGNMENTS))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ctx = RequestContext::background();
    let guard = client.retry_control().suppress(&ctx).await.unwrap();

    assert!(client.get_policy(&ctx, "missing").await.unwrap().is_none());
    let err = client
        .list_policy_assignments(&ctx, &owner_query())
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Status { status: 503, .. }));

    drop(guard);
    assert!(!client.retry_control().retries_disabled());
}

#[tokio::test]
async fn test_retry_after_is_capped_by_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES}/policy-abc")))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "3600"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES}/policy-abc")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "policy-abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    let policy = client_for(&server)
        .get_policy(&RequestContext::background(), "policy-abc")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(policy.id(), Some("policy-abc"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_retry_after_past_deadline_returns_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES}/policy-abc")))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "3600"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.retry.max_backoff_ms = 60_000;
    let client = GraphClient::new(config).unwrap();
    let ctx = RequestContext::background().with_timeout(Duration::from_secs(2));
    let started = Instant::now();

    let err = client.get_policy(&ctx, "policy-abc").await.unwrap_err();

    assert!(matches!(err, DirectoryError::Status { status: 503, .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{POLICIES}/forbidden")))
        .respond_with(ResponseTemplate::new(403).set_body_string("Insufficient privileges"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_policy(&RequestContext::background(), "forbidden")
        .await
        .unwrap_err();
    match err {
        DirectoryError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Insufficient privileges"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// CANCELLATION
// ============================================================================

#[tokio::test]
async fn test_deadline_aborts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ASSIGNMENTS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": [] }))
                .set_delay(Duration::from_secs(20)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ctx = RequestContext::background().with_timeout(Duration::from_millis(100));
    let started = Instant::now();

    let err = client
        .list_policy_assignments(&ctx, &owner_query())
        .await
        .unwrap_err();

    assert!(matches!(err, DirectoryError::DeadlineExceeded));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = RequestContext::background();
    ctx.cancel();

    let err = client_for(&server)
        .list_policy_assignments(&ctx, &owner_query())
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Cancelled));
}
