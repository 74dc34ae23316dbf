//! Test doubles for pool and facade tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::factory::{ClientConfig, ClientFactory, LogicalClient};
use crate::error::{ConstructionError, ReleaseError};
use crate::services::graphql::{GraphqlRequest, GraphqlResponse};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mock failure: {0}")]
pub struct MockError(pub String);

/// Client that echoes its identity and records release calls
#[derive(Debug)]
pub struct MockClient {
    pub serial: usize,
    pub credential: Option<String>,
    pub released: AtomicBool,
    pub cache_clears: AtomicUsize,
    fail_release: bool,
    panic_on_release: bool,
}

impl MockClient {
    pub fn was_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn answer(&self, kind: &str, request: &GraphqlRequest) -> Result<GraphqlResponse, MockError> {
        if request.query.contains("fail") {
            return Err(MockError(format!("{} rejected by client {}", kind, self.serial)));
        }
        Ok(GraphqlResponse {
            data: Some(serde_json::json!({
                "kind": kind,
                "serial": self.serial,
                "credential": self.credential,
            })),
            ..Default::default()
        })
    }
}

#[async_trait]
impl LogicalClient for MockClient {
    type Error = MockError;

    async fn query(&self, request: GraphqlRequest) -> Result<GraphqlResponse, MockError> {
        self.answer("query", &request)
    }

    async fn mutate(&self, request: GraphqlRequest) -> Result<GraphqlResponse, MockError> {
        self.answer("mutate", &request)
    }

    async fn clear_cache(&self) -> Result<(), MockError> {
        self.cache_clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) -> Result<(), ReleaseError> {
        self.released.store(true, Ordering::SeqCst);
        if self.panic_on_release {
            panic!("release exploded for client {}", self.serial);
        }
        if self.fail_release {
            return Err(ReleaseError::new(format!("client {} refused", self.serial)));
        }
        Ok(())
    }
}

/// Factory that counts constructions and can be told to misbehave
#[derive(Debug, Clone, Default)]
pub struct MockFactory {
    pub created: Arc<AtomicUsize>,
    /// Credentials whose construction fails
    pub reject: Arc<std::sync::Mutex<Vec<String>>>,
    /// Credentials whose clients fail to release
    pub fail_release_for: Vec<String>,
    /// Credentials whose clients panic while releasing
    pub panic_release_for: Vec<String>,
    /// Simulated construction latency
    pub delay: Option<Duration>,
}

impl MockFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn reject(&self, credential: &str) {
        self.reject.lock().unwrap().push(credential.to_string());
    }

    pub fn accept_all(&self) {
        self.reject.lock().unwrap().clear();
    }
}

impl ClientFactory for MockFactory {
    type Client = MockClient;

    fn create(&self, config: &ClientConfig) -> Result<MockClient, ConstructionError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let credential = config.credential.clone();
        let listed = |list: &[String]| {
            credential
                .as_ref()
                .map(|c| list.iter().any(|x| x == c))
                .unwrap_or(false)
        };
        if listed(self.reject.lock().unwrap().as_slice()) {
            return Err(ConstructionError::HttpClient("rejected by mock".to_string()));
        }
        let serial = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockClient {
            serial,
            fail_release: listed(self.fail_release_for.as_slice()),
            panic_on_release: listed(self.panic_release_for.as_slice()),
            credential,
            released: AtomicBool::new(false),
            cache_clears: AtomicUsize::new(0),
        })
    }
}
