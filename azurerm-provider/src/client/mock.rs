//! In-memory ARM client for handler tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::{ArmClient, ArmError, ArmResult};

/// A request recorded by [`MockArmClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub id: String,
    pub api_version: String,
    pub body: Option<Json>,
}

/// Stores PUT bodies keyed by resource ID and serves them back on GET
///
/// Actions answer with the stored resource's `properties`, which is how the
/// `*WithSecrets` actions respond.
#[derive(Default)]
pub struct MockArmClient {
    resources: Mutex<HashMap<String, Json>>,
    requests: Mutex<Vec<Request>>,
    put_error: Mutex<Option<(u16, String)>>,
}

impl MockArmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource as if it already existed in Azure
    pub fn with_resource(self, id: &str, body: Json) -> Self {
        self.resources
            .lock()
            .unwrap()
            .insert(id.to_string(), with_id(id, body));
        self
    }

    /// Make the next PUT fail with the given status and ARM error code
    pub fn fail_next_put(&self, status: u16, code: &str) {
        *self.put_error.lock().unwrap() = Some((status, code.to_string()));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Body of the last PUT sent for `id`
    pub fn last_put(&self, id: &str) -> Option<Json> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == "PUT" && r.id == id)
            .and_then(|r| r.body)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resources.lock().unwrap().contains_key(id)
    }

    fn record(&self, method: &'static str, id: &str, api_version: &str, body: Option<&Json>) {
        self.requests.lock().unwrap().push(Request {
            method,
            id: id.to_string(),
            api_version: api_version.to_string(),
            body: body.cloned(),
        });
    }
}

fn with_id(id: &str, mut body: Json) -> Json {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), Json::String(id.to_string()));
        if let Some(name) = id.rsplit('/').next() {
            obj.insert("name".to_string(), Json::String(name.to_string()));
        }
    }
    body
}

#[async_trait]
impl ArmClient for MockArmClient {
    async fn get(&self, id: &str, api_version: &str) -> ArmResult<Option<Json>> {
        self.record("GET", id, api_version, None);
        Ok(self.resources.lock().unwrap().get(id).cloned())
    }

    async fn put(&self, id: &str, api_version: &str, body: &Json) -> ArmResult<Json> {
        self.record("PUT", id, api_version, Some(body));
        if let Some((status, code)) = self.put_error.lock().unwrap().take() {
            return Err(ArmError::Status {
                status,
                code,
                message: "rejected by mock".to_string(),
            });
        }
        let stored = with_id(id, body.clone());
        self.resources
            .lock()
            .unwrap()
            .insert(id.to_string(), stored.clone());
        Ok(stored)
    }

    async fn action(&self, id: &str, action: &str, api_version: &str) -> ArmResult<Option<Json>> {
        self.record("POST", &format!("{}/{}", id, action), api_version, None);
        Ok(self
            .resources
            .lock()
            .unwrap()
            .get(id)
            .map(|r| r.get("properties").cloned().unwrap_or(Json::Null)))
    }

    async fn delete(&self, id: &str, api_version: &str) -> ArmResult<()> {
        self.record("DELETE", id, api_version, None);
        self.resources.lock().unwrap().remove(id);
        Ok(())
    }
}
