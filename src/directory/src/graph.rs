//! HTTP directory client for role management policy endpoints

use crate::config::{DirectoryConfig, RetryPolicy};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::StatusCode;
use rolepolicy_core::{
    AssignmentQuery, DirectoryClient, DirectoryError, PolicyAssignment, RequestContext, Result,
    RetryControl, RoleManagementPolicy,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Upper bound on followed `@odata.nextLink` pages
const MAX_PAGES: usize = 100;

/// Path of the policy assignment collection
const ASSIGNMENTS_PATH: &str = "policies/roleManagementPolicyAssignments";

/// Path of the policy collection
const POLICIES_PATH: &str = "policies/roleManagementPolicies";

/// One page of an OData collection
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,

    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

/// Status, headers of interest, and body of a completed request
#[derive(Debug)]
struct RawResponse {
    status: StatusCode,
    retry_after: Option<Duration>,
    body: Vec<u8>,
}

impl RawResponse {
    fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| DirectoryError::Decode(format!("invalid response body: {e}")))
    }

    fn into_status_error(self) -> DirectoryError {
        DirectoryError::Status {
            status: self.status.as_u16(),
            body: String::from_utf8_lossy(&self.body).into_owned(),
        }
    }
}

/// Directory client speaking the policy endpoints over HTTP
///
/// Requests are retried according to [`RetryPolicy`] unless the shared
/// [`RetryControl`] has retries disabled, in which case each request is sent
/// exactly once.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
    retry: RetryPolicy,
    retry_control: RetryControl,
}

impl GraphClient {
    /// Build a client from configuration
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("rolepolicy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DirectoryError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            access_token: config.access_token,
            retry: config.retry,
            retry_control: RetryControl::new(),
        })
    }

    /// Versioned base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn assignments_url(&self, query: &AssignmentQuery) -> Result<Url> {
        let mut url = self.join(ASSIGNMENTS_PATH)?;
        url.query_pairs_mut().append_pair("$filter", &query.filter());
        Ok(url)
    }

    fn policy_url(&self, policy_id: &str) -> Result<Url> {
        let mut url = self.join(POLICIES_PATH)?;
        url.path_segments_mut()
            .map_err(|_| DirectoryError::Configuration("endpoint cannot be a base URL".to_string()))?
            .push(policy_id);
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DirectoryError::Configuration(format!("invalid path {path:?}: {e}")))
    }

    /// Only follow pagination links that stay on the configured endpoint
    fn next_page_url(&self, link: &str) -> Result<Url> {
        let url = Url::parse(link)
            .map_err(|e| DirectoryError::Decode(format!("invalid @odata.nextLink: {e}")))?;
        if url.origin() != self.base_url.origin() {
            return Err(DirectoryError::Decode(format!(
                "@odata.nextLink leaves the directory endpoint: {url}"
            )));
        }
        Ok(url)
    }

    fn is_retryable(&self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
            || (status == StatusCode::NOT_FOUND && self.retry.retry_not_found)
    }

    async fn send_once(&self, url: &Url) -> Result<RawResponse> {
        let mut request = self
            .http
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response
            .bytes()
            .await
            .map_err(|e| DirectoryError::Transport(format!("read body failed: {e}")))?
            .to_vec();

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }

    /// Send a GET, retrying transient failures unless retries are suppressed
    ///
    /// Returns the last response even when its status is not a success; the
    /// caller decides what a 404 means for its endpoint. Waits are capped by
    /// the retry policy, and a wait that would outlast the context deadline
    /// is skipped in favour of returning what the last attempt produced.
    #[instrument(name = "directory_get", skip(self, ctx, url), fields(url = %url))]
    async fn get_with_retry(&self, ctx: &RequestContext, url: &Url) -> Result<RawResponse> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let may_retry =
                !self.retry_control.retries_disabled() && attempt < self.retry.max_attempts;

            let outcome = ctx.run(self.send_once(url)).await;
            let delay = match &outcome {
                Ok(response) if response.status.is_success() => None,
                Ok(response) if may_retry && self.is_retryable(response.status) => {
                    debug!(attempt, status = %response.status, "Retrying directory request");
                    Some(self.retry.delay(attempt, response.retry_after))
                }
                Ok(_) => None,
                Err(DirectoryError::Cancelled | DirectoryError::DeadlineExceeded) => None,
                Err(e) if may_retry => {
                    warn!(attempt, error = %e, "Directory request failed, retrying");
                    Some(self.retry.delay(attempt, None))
                }
                Err(_) => None,
            };

            let Some(delay) = delay else {
                return outcome;
            };
            if ctx.remaining().is_some_and(|left| delay >= left) {
                debug!(attempt, ?delay, "Retry wait exceeds deadline, giving up");
                return outcome;
            }

            ctx.sleep(delay).await?;
        }
    }
}

#[async_trait]
impl DirectoryClient for GraphClient {
    fn retry_control(&self) -> &RetryControl {
        &self.retry_control
    }

    #[instrument(
        name = "list_policy_assignments",
        skip(self, ctx, query),
        fields(group_id = %query.group_id, role_id = %query.role_id)
    )]
    async fn list_policy_assignments(
        &self,
        ctx: &RequestContext,
        query: &AssignmentQuery,
    ) -> Result<Vec<PolicyAssignment>> {
        let mut url = self.assignments_url(query)?;
        let mut assignments = Vec::new();

        for page_number in 1..=MAX_PAGES {
            let response = self.get_with_retry(ctx, &url).await?;
            if response.status == StatusCode::NOT_FOUND {
                return Err(DirectoryError::NotFound(
                    "role management policy assignments".to_string(),
                ));
            }
            if !response.status.is_success() {
                return Err(response.into_status_error());
            }

            let page: Page<PolicyAssignment> = response.decode()?;
            debug!(page_number, records = page.value.len(), "Fetched assignment page");
            assignments.extend(page.value);

            match page.next_link {
                Some(link) => url = self.next_page_url(&link)?,
                None => return Ok(assignments),
            }
        }

        Err(DirectoryError::Decode(format!(
            "assignment listing exceeded {MAX_PAGES} pages"
        )))
    }

    #[instrument(name = "get_policy", skip(self, ctx))]
    async fn get_policy(
        &self,
        ctx: &RequestContext,
        policy_id: &str,
    ) -> Result<Option<RoleManagementPolicy>> {
        let url = self.policy_url(policy_id)?;
        let response = self.get_with_retry(ctx, &url).await?;

        if response.status == StatusCode::NOT_FOUND {
            debug!("Policy not found");
            return Ok(None);
        }
        if !response.status.is_success() {
            return Err(response.into_status_error());
        }
        response.decode().map(Some)
    }

    fn backend_tag(&self) -> &'static str {
        "graph"
    }
}
