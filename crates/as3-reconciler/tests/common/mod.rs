//! In-memory appliance used by the integration tests

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use as3_reconciler::{PostEvent, PostResponse, Submitter};
use async_trait::async_trait;
use serde_json::Value;

/// Applies declarations the way the appliance does: a stub body removes the
/// tenant, anything else replaces it.
#[derive(Default)]
pub struct FakeAppliance {
    tenants: Mutex<BTreeMap<String, Value>>,
    failures: Mutex<VecDeque<PostEvent>>,
    posts: Mutex<Vec<String>>,
    deletions: Mutex<Vec<Vec<String>>>,
}

impl FakeAppliance {
    pub fn failing_with(events: Vec<PostEvent>) -> Self {
        Self {
            failures: Mutex::new(events.into()),
            ..Default::default()
        }
    }

    pub fn tenants(&self) -> Vec<String> {
        self.tenants.lock().unwrap().keys().cloned().collect()
    }

    pub fn tenant(&self, name: &str) -> Option<Value> {
        self.tenants.lock().unwrap().get(name).cloned()
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }

    /// Tenants actually removed by each accepted post.
    pub fn deletions(&self) -> Vec<Vec<String>> {
        self.deletions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Submitter for FakeAppliance {
    async fn post_config(&self, declaration: &str, _tenants: Option<&[String]>) -> PostResponse {
        self.posts.lock().unwrap().push(declaration.to_string());

        if let Some(event) = self.failures.lock().unwrap().pop_front() {
            return PostResponse::rejected(event);
        }

        let document: Value = match serde_json::from_str(declaration) {
            Ok(document) => document,
            Err(_) => return PostResponse::rejected(PostEvent::UnprocessableEntity),
        };

        let mut tenants = self.tenants.lock().unwrap();
        let mut deleted = Vec::new();
        for name in as3_reconciler::tenant_names(&document, false) {
            let body = document["declaration"][&name].clone();
            if body == as3_reconciler::tenant_stub() {
                if tenants.remove(&name).is_some() {
                    deleted.push(name);
                }
            } else {
                tenants.insert(name, body);
            }
        }
        self.deletions.lock().unwrap().push(deleted);

        PostResponse::accepted()
    }
}
