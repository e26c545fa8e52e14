//! Integration tests for the ARM HTTP client using wiremock
//!
//! Covers status handling and long-running operation polling against a
//! mocked resource manager endpoint.

use std::sync::Arc;
use std::time::Duration;

use azurerm_provider::client::http::PollSettings;
use azurerm_provider::client::{ArmClient, ArmError, HttpArmClient, StaticTokenCredential};
use serde_json::json;
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROFILE: &str =
    "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg/providers/Microsoft.Network/trafficManagerProfiles/tm1";
const API_VERSION: &str = "2018-08-01";

fn client(server: &MockServer) -> HttpArmClient {
    HttpArmClient::new(
        reqwest::Client::new(),
        server.uri(),
        Arc::new(StaticTokenCredential::new("test-token")),
    )
    .with_poll_settings(PollSettings {
        max_attempts: 5,
        delay: Duration::from_millis(10),
    })
}

fn profile_body(status: &str) -> serde_json::Value {
    json!({
        "id": PROFILE,
        "name": "tm1",
        "location": "global",
        "properties": {"profileStatus": status}
    })
}

mod get_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_sends_token_and_api_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROFILE))
            .and(query_param("api-version", API_VERSION))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("Enabled")))
            .expect(1)
            .mount(&server)
            .await;

        let resource = client(&server)
            .get(PROFILE, API_VERSION)
            .await
            .expect("Request should succeed")
            .expect("Resource should exist");
        assert_eq!(resource["properties"]["profileStatus"], "Enabled");
    }

    #[tokio::test]
    async fn test_get_404_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "ResourceNotFound", "message": "not found"}
            })))
            .mount(&server)
            .await;

        let resource = client(&server).get(PROFILE, API_VERSION).await.unwrap();
        assert!(resource.is_none());
    }

    #[tokio::test]
    async fn test_get_error_reads_arm_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": "AuthorizationFailed", "message": "no access"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).get(PROFILE, API_VERSION).await.unwrap_err();
        match err {
            ArmError::Status {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 403);
                assert_eq!(code, "AuthorizationFailed");
                assert_eq!(message, "no access");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

mod put_tests {
    use super::*;

    #[tokio::test]
    async fn test_put_200_returns_final_get() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(PROFILE))
            .and(query_param("api-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("Enabled")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("Disabled")))
            .expect(1)
            .mount(&server)
            .await;

        let resource = client(&server)
            .put(PROFILE, API_VERSION, &profile_body("Enabled"))
            .await
            .unwrap();
        assert_eq!(resource["properties"]["profileStatus"], "Disabled");
    }

    #[tokio::test]
    async fn test_put_201_polls_async_operation_until_succeeded() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/op1", server.uri());

        Mock::given(method("PUT"))
            .and(path(PROFILE))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Azure-AsyncOperation", operation.as_str())
                    .set_body_json(json!({"properties": {"provisioningState": "Creating"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PROFILE))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("Enabled")))
            .expect(1)
            .mount(&server)
            .await;

        let resource = client(&server)
            .put(PROFILE, API_VERSION, &profile_body("Enabled"))
            .await
            .unwrap();
        assert_eq!(resource["id"], PROFILE);
        assert_eq!(resource["properties"]["profileStatus"], "Enabled");
    }

    #[tokio::test]
    async fn test_put_202_polls_location_until_done() {
        let server = MockServer::start().await;
        let location = format!("{}/operationResults/op2", server.uri());

        Mock::given(method("PUT"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operationResults/op2"))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operationResults/op2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("Enabled")))
            .expect(1)
            .mount(&server)
            .await;

        let resource = client(&server)
            .put(PROFILE, API_VERSION, &profile_body("Enabled"))
            .await
            .unwrap();
        assert_eq!(resource["name"], "tm1");
    }

    #[tokio::test]
    async fn test_put_failed_operation_returns_error() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/op3", server.uri());

        Mock::given(method("PUT"))
            .and(path(PROFILE))
            .respond_with(
                ResponseTemplate::new(201).insert_header("Azure-AsyncOperation", operation.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Failed",
                "error": {"code": "Conflict", "message": "DNS name is already taken"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body("Enabled")))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .put(PROFILE, API_VERSION, &profile_body("Enabled"))
            .await
            .unwrap_err();
        match err {
            ArmError::OperationFailed { status, message } => {
                assert_eq!(status, "Failed");
                assert_eq!(message, "Conflict: DNS name is already taken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_put_operation_that_never_finishes_times_out() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/op4", server.uri());

        Mock::given(method("PUT"))
            .and(path(PROFILE))
            .respond_with(
                ResponseTemplate::new(201).insert_header("Azure-AsyncOperation", operation.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "InProgress"})))
            .expect(5)
            .mount(&server)
            .await;

        let err = client(&server)
            .put(PROFILE, API_VERSION, &profile_body("Enabled"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArmError::OperationTimedOut { attempts: 5 }));
    }

    #[tokio::test]
    async fn test_put_400_is_not_polled() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": "BadRequest", "message": "invalid ttl"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .put(PROFILE, API_VERSION, &profile_body("Enabled"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArmError::Status { status: 400, .. }));
    }
}

mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_404_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(PROFILE))
            .and(query_param("api-version", API_VERSION))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).delete(PROFILE, API_VERSION).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_202_polls_location() {
        let server = MockServer::start().await;
        let location = format!("{}/operationResults/del1", server.uri());

        Mock::given(method("DELETE"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operationResults/del1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).delete(PROFILE, API_VERSION).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_conflict_returns_status_error() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path(PROFILE))
            .respond_with(ResponseTemplate::new(409).set_body_string("locked"))
            .mount(&server)
            .await;

        let err = client(&server).delete(PROFILE, API_VERSION).await.unwrap_err();
        match err {
            ArmError::Status { status, code, .. } => {
                assert_eq!(status, 409);
                assert_eq!(code, "Conflict");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

mod action_tests {
    use super::*;

    const POLICY: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg/providers/Microsoft.Media/mediaServices/acct/contentKeyPolicies/policy1";

    #[tokio::test]
    async fn test_action_posts_to_action_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/getPolicyPropertiesWithSecrets", POLICY)))
            .and(query_param("api-version", "2022-08-01"))
            .and(bearer_token("test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"description": "with secrets"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let body = client(&server)
            .action(POLICY, "getPolicyPropertiesWithSecrets", "2022-08-01")
            .await
            .unwrap()
            .expect("Action should return a body");
        assert_eq!(body["description"], "with secrets");
    }

    #[tokio::test]
    async fn test_action_404_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/getPolicyPropertiesWithSecrets", POLICY)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let body = client(&server)
            .action(POLICY, "getPolicyPropertiesWithSecrets", "2022-08-01")
            .await
            .unwrap();
        assert!(body.is_none());
    }
}
