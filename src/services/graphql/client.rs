//! GraphQL HTTP client bound to a single credential
//!
//! Every client talks to two endpoints derived from the base URL:
//! `<base>/graphql` for content and `<base>/graphql/system` for system
//! collections. The operation context picks one per request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use tracing::debug;
use uuid::Uuid;

use super::cache::{CacheKey, ResponseCache};
use super::error::GraphqlClientError;
use super::operation::{GraphqlRequest, GraphqlResponse};
use super::policy::{CachePolicy, CredentialMode};
use crate::error::{ConstructionError, ReleaseError};
use crate::services::client_pool::{ClientConfig, LogicalClient};

const PUBLIC_PATH: &str = "graphql";
const SYSTEM_PATH: &str = "graphql/system";

/// GraphQL client with its own HTTP connection pool and response cache
#[derive(Debug)]
pub struct GraphqlClient {
    id: Uuid,
    public_url: Url,
    system_url: Url,
    http: reqwest::Client,
    cache_policy: CachePolicy,
    authenticated: bool,
    cache: ResponseCache,
    created_at: DateTime<Utc>,
}

impl GraphqlClient {
    /// Build a client from its configuration
    ///
    /// Fails if the endpoint is missing or not an absolute http(s) URL, if the
    /// credential cannot be encoded as a header, or if the HTTP client cannot
    /// be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ConstructionError> {
        let base = parse_endpoint(&config.endpoint)?;
        let public_url = join_endpoint(&base, PUBLIC_PATH, &config.endpoint)?;
        let system_url = join_endpoint(&base, SYSTEM_PATH, &config.endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let authenticated = match (config.credential_mode, config.credential.as_deref()) {
            (CredentialMode::Include, Some(token)) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                    ConstructionError::InvalidCredential(
                        "contains characters not allowed in HTTP headers".to_string(),
                    )
                })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                true
            }
            _ => false,
        };

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConstructionError::HttpClient(e.to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            public_url,
            system_url,
            http,
            cache_policy: config.cache_policy,
            authenticated,
            cache: ResponseCache::new(),
            created_at: Utc::now(),
        })
    }

    /// Unique identifier of this client instance
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn public_url(&self) -> &Url {
        &self.public_url
    }

    pub fn system_url(&self) -> &Url {
        &self.system_url
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    /// Whether requests carry a bearer credential
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    /// Run a query, honouring the request's fetch policy or the client default
    pub async fn execute_query(
        &self,
        request: &GraphqlRequest,
    ) -> Result<GraphqlResponse, GraphqlClientError> {
        let policy = request.fetch_policy.unwrap_or(self.cache_policy);
        let key = CacheKey::for_request(request);

        if policy.reads_cache() {
            if let Some(cached) = self.cache.get(&key) {
                debug!(
                    client_id = %self.id,
                    operation = request.display_name(),
                    policy = %policy,
                    "Serving GraphQL response from cache"
                );
                return Ok(cached);
            }
        }

        if !policy.allows_network() {
            return Err(GraphqlClientError::CacheMiss {
                operation: request.display_name().to_string(),
            });
        }

        let response = self.send(request).await?;
        if policy.writes_cache() && response.is_ok() && response.data.is_some() {
            self.cache.insert(key, response.clone());
        }
        Ok(response)
    }

    async fn send(&self, request: &GraphqlRequest) -> Result<GraphqlResponse, GraphqlClientError> {
        let url = if request.context.system {
            &self.system_url
        } else {
            &self.public_url
        };

        debug!(
            client_id = %self.id,
            url = %url,
            operation = request.display_name(),
            "Sending GraphQL request"
        );

        let response = self.http.post(url.clone()).json(request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            // Servers may answer 4xx with a regular GraphQL error body
            if let Ok(body) = serde_json::from_slice::<GraphqlResponse>(&bytes) {
                if !body.errors.is_empty() {
                    return Ok(body);
                }
            }
            return Err(GraphqlClientError::http_status(status.as_u16(), &bytes));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl LogicalClient for GraphqlClient {
    type Error = GraphqlClientError;

    async fn query(&self, request: GraphqlRequest) -> Result<GraphqlResponse, Self::Error> {
        self.execute_query(&request).await
    }

    async fn mutate(&self, request: GraphqlRequest) -> Result<GraphqlResponse, Self::Error> {
        self.send(&request).await
    }

    async fn clear_cache(&self) -> Result<(), Self::Error> {
        let cleared = self.cache.clear();
        debug!(client_id = %self.id, cleared, "Cleared response cache");
        Ok(())
    }

    fn release(&self) -> Result<(), ReleaseError> {
        let cleared = self.cache.clear();
        debug!(client_id = %self.id, cleared, "Released response cache");
        Ok(())
    }
}

/// Validate a base endpoint such as `https://api.example.com`
fn parse_endpoint(endpoint: &str) -> Result<Url, ConstructionError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConstructionError::MissingEndpoint);
    }

    let invalid = |reason: String| ConstructionError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query strings and fragments are not allowed".to_string()));
    }
    Ok(url)
}

fn join_endpoint(base: &Url, path: &str, original: &str) -> Result<Url, ConstructionError> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| ConstructionError::InvalidEndpoint {
        endpoint: original.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: &str, credential: Option<&str>) -> ClientConfig {
        ClientConfig {
            endpoint: endpoint.to_string(),
            credential: credential.map(str::to_string),
            cache_policy: CachePolicy::CacheFirst,
            credential_mode: CredentialMode::Include,
            timeout: Duration::from_secs(5),
        }
    }

    async fn mount_posts(server: &MockServer, route: &str) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"posts": [{"id": "1"}]}})),
            )
            .mount(server)
            .await;
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.map(|r| r.len()).unwrap_or(0)
    }

    #[test]
    fn test_endpoint_urls() {
        let client = GraphqlClient::new(&config("https://cms.example.com/", None)).unwrap();
        assert_eq!(client.public_url().as_str(), "https://cms.example.com/graphql");
        assert_eq!(
            client.system_url().as_str(),
            "https://cms.example.com/graphql/system"
        );

        let nested = GraphqlClient::new(&config("http://localhost:8055/api", None)).unwrap();
        assert_eq!(nested.public_url().as_str(), "http://localhost:8055/api/graphql");
    }

    #[test]
    fn test_missing_and_invalid_endpoints() {
        assert_eq!(
            GraphqlClient::new(&config("  ", None)).unwrap_err(),
            ConstructionError::MissingEndpoint
        );
        assert!(matches!(
            GraphqlClient::new(&config("not a url", None)),
            Err(ConstructionError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            GraphqlClient::new(&config("ftp://cms.example.com", None)),
            Err(ConstructionError::InvalidEndpoint { reason, .. }) if reason.contains("ftp")
        ));
        assert!(matches!(
            GraphqlClient::new(&config("https://cms.example.com?x=1", None)),
            Err(ConstructionError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_invalid_credential() {
        assert!(matches!(
            GraphqlClient::new(&config("https://cms.example.com", Some("bad\ntoken"))),
            Err(ConstructionError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_credential_mode_controls_authentication() {
        let included = GraphqlClient::new(&config("https://cms.example.com", Some("tok"))).unwrap();
        assert!(included.is_authenticated());

        let mut omitted = config("https://cms.example.com", Some("tok"));
        omitted.credential_mode = CredentialMode::Omit;
        assert!(!GraphqlClient::new(&omitted).unwrap().is_authenticated());

        let anonymous = GraphqlClient::new(&config("https://cms.example.com", None)).unwrap();
        assert!(!anonymous.is_authenticated());
    }

    #[tokio::test]
    async fn test_query_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_partial_json(json!({"operationName": "Posts"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"posts": []}})))
            .mount(&server)
            .await;

        let client = GraphqlClient::new(&config(&server.uri(), Some("secret-token"))).unwrap();
        let response = client
            .query(GraphqlRequest::new("query Posts { posts { id } }").with_operation_name("Posts"))
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!({"posts": []})));
    }

    #[tokio::test]
    async fn test_omit_mode_sends_no_authorization() {
        let server = MockServer::start().await;
        mount_posts(&server, "/graphql").await;

        let mut cfg = config(&server.uri(), Some("secret-token"));
        cfg.credential_mode = CredentialMode::Omit;
        let client = GraphqlClient::new(&cfg).unwrap();
        client.query(GraphqlRequest::new("{ posts { id } }")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_system_context_routes_to_system_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql/system"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"users_me": {"id": "u1"}}})),
            )
            .mount(&server)
            .await;

        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();
        let response = client
            .query(GraphqlRequest::new("{ users_me { id } }").system())
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!({"users_me": {"id": "u1"}})));
    }

    #[tokio::test]
    async fn test_cache_first_reuses_response() {
        let server = MockServer::start().await;
        mount_posts(&server, "/graphql").await;
        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();

        let first = client.query(GraphqlRequest::new("{ posts { id } }")).await.unwrap();
        let second = client.query(GraphqlRequest::new("{ posts { id } }")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(request_count(&server).await, 1);
        assert_eq!(client.cached_responses(), 1);
    }

    #[tokio::test]
    async fn test_network_only_and_no_cache_policies() {
        let server = MockServer::start().await;
        mount_posts(&server, "/graphql").await;
        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();

        let network_only =
            GraphqlRequest::new("{ posts { id } }").with_fetch_policy(CachePolicy::NetworkOnly);
        client.query(network_only.clone()).await.unwrap();
        client.query(network_only).await.unwrap();
        assert_eq!(request_count(&server).await, 2);
        assert_eq!(client.cached_responses(), 1);

        client.release().unwrap();
        let no_cache = GraphqlRequest::new("{ posts { id } }").with_fetch_policy(CachePolicy::NoCache);
        client.query(no_cache).await.unwrap();
        assert_eq!(request_count(&server).await, 3);
        assert_eq!(client.cached_responses(), 0);
    }

    #[tokio::test]
    async fn test_cache_only_miss_and_hit() {
        let server = MockServer::start().await;
        mount_posts(&server, "/graphql").await;
        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();

        let cache_only = GraphqlRequest::new("{ posts { id } }")
            .with_operation_name("Posts")
            .with_fetch_policy(CachePolicy::CacheOnly);
        assert_eq!(
            client.query(cache_only.clone()).await.unwrap_err(),
            GraphqlClientError::CacheMiss {
                operation: "Posts".to_string()
            }
        );
        assert_eq!(request_count(&server).await, 0);

        client
            .query(GraphqlRequest::new("{ posts { id } }").with_operation_name("Posts"))
            .await
            .unwrap();
        assert!(client.query(cache_only).await.is_ok());
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let server = MockServer::start().await;
        mount_posts(&server, "/graphql").await;
        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();

        client.query(GraphqlRequest::new("{ posts { id } }")).await.unwrap();
        client.clear_cache().await.unwrap();
        assert_eq!(client.cached_responses(), 0);
        client.query(GraphqlRequest::new("{ posts { id } }")).await.unwrap();
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_mutations_bypass_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"create_posts_item": {"id": "9"}}})),
            )
            .mount(&server)
            .await;
        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();

        let mutation = GraphqlRequest::new("mutation { create_posts_item(data: {}) { id } }");
        client.mutate(mutation.clone()).await.unwrap();
        client.mutate(mutation).await.unwrap();
        assert_eq!(request_count(&server).await, 2);
        assert_eq!(client.cached_responses(), 0);
    }

    #[tokio::test]
    async fn test_graphql_errors_are_returned_but_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{"message": "You don't have permission to access this."}]
            })))
            .mount(&server)
            .await;
        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();

        let response = client.query(GraphqlRequest::new("{ secrets { id } }")).await.unwrap();
        assert!(!response.is_ok());
        assert_eq!(client.cached_responses(), 0);
    }

    #[tokio::test]
    async fn test_error_status_with_graphql_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{"message": "Syntax Error: Unexpected Name \"bogus\"."}]
            })))
            .mount(&server)
            .await;
        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();

        let response = client.query(GraphqlRequest::new("bogus")).await.unwrap();
        assert_eq!(response.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;
        let client = GraphqlClient::new(&config(&server.uri(), None)).unwrap();

        let err = client.query(GraphqlRequest::new("{ posts { id } }")).await.unwrap_err();
        assert_eq!(
            err,
            GraphqlClientError::HttpStatus {
                status: 503,
                body: "upstream unavailable".to_string()
            }
        );
    }
}
