//! In-memory directory implementation

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rolepolicy_core::{
    AssignmentQuery, DirectoryClient, DirectoryError, GroupId, PolicyAssignment, RequestContext,
    Result, RetryControl, RoleKind, RoleManagementPolicy,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Failure injected into the next call(s)
#[derive(Debug, Clone)]
struct InjectedFailure {
    error: DirectoryError,
    /// Calls left to fail; `None` fails forever
    remaining: Option<usize>,
}

/// Deterministic in-process directory
///
/// Answers exactly like a consistent directory would, with hooks for
/// latency, injected failures and call accounting. It never retries, so it
/// records whether retries were suppressed at the time of each call instead.
#[derive(Default)]
pub struct InMemoryDirectory {
    assignments: RwLock<Vec<PolicyAssignment>>,
    policies: RwLock<HashMap<String, RoleManagementPolicy>>,
    failure: Mutex<Option<InjectedFailure>>,
    latency: RwLock<Option<Duration>>,
    calls: AtomicUsize,
    suppressed_calls: AtomicUsize,
    retry_control: RetryControl,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group policy and the assignment that points at it
    pub fn with_group_policy(self, group_id: &GroupId, role_id: RoleKind, policy_id: &str) -> Self {
        self.insert_assignment(PolicyAssignment::for_group(group_id, role_id, policy_id));
        self.insert_policy(RoleManagementPolicy::for_group(policy_id, group_id));
        self
    }

    /// Store an assignment record
    pub fn insert_assignment(&self, assignment: PolicyAssignment) {
        self.assignments.write().push(assignment);
    }

    /// Store a policy, keyed by its id
    pub fn insert_policy(&self, policy: RoleManagementPolicy) {
        let key = policy.id.clone().unwrap_or_default();
        self.policies.write().insert(key, policy);
    }

    /// Store a policy under an explicit key, whatever its `id` field says
    pub fn insert_policy_as(&self, key: impl Into<String>, policy: RoleManagementPolicy) {
        self.policies.write().insert(key.into(), policy);
    }

    /// Remove a policy, leaving any assignments that reference it
    pub fn remove_policy(&self, policy_id: &str) -> Option<RoleManagementPolicy> {
        self.policies.write().remove(policy_id)
    }

    /// Fail every call with `error` until [`InMemoryDirectory::clear_failure`]
    pub fn fail_with(&self, error: DirectoryError) {
        *self.failure.lock() = Some(InjectedFailure {
            error,
            remaining: None,
        });
    }

    /// Fail the next `times` calls with `error`
    pub fn fail_times(&self, error: DirectoryError, times: usize) {
        *self.failure.lock() = (times > 0).then_some(InjectedFailure {
            error,
            remaining: Some(times),
        });
    }

    /// Stop injecting failures
    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    /// Number of calls received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls received while retries were suppressed
    pub fn suppressed_call_count(&self) -> usize {
        self.suppressed_calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.retry_control.retries_disabled() {
            self.suppressed_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn take_failure(&self) -> Option<DirectoryError> {
        let mut slot = self.failure.lock();
        let injected = slot.as_mut()?;
        let error = injected.error.clone();
        let exhausted = match &mut injected.remaining {
            None => false,
            Some(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
        };
        if exhausted {
            *slot = None;
        }
        Some(error)
    }

    async fn simulate(&self, ctx: &RequestContext) -> Result<()> {
        self.record_call();
        let latency = *self.latency.read();
        ctx.run(async {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            match self.take_failure() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        })
        .await
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    fn retry_control(&self) -> &RetryControl {
        &self.retry_control
    }

    async fn list_policy_assignments(
        &self,
        ctx: &RequestContext,
        query: &AssignmentQuery,
    ) -> Result<Vec<PolicyAssignment>> {
        self.simulate(ctx).await?;
        Ok(self
            .assignments
            .read()
            .iter()
            .filter(|a| a.matches(query))
            .cloned()
            .collect())
    }

    async fn get_policy(
        &self,
        ctx: &RequestContext,
        policy_id: &str,
    ) -> Result<Option<RoleManagementPolicy>> {
        self.simulate(ctx).await?;
        Ok(self.policies.read().get(policy_id).cloned())
    }

    fn backend_tag(&self) -> &'static str {
        "memory"
    }
}
