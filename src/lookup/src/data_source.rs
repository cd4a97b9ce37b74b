//! Group role management policy data source
//!
//! Read-only entry point for the configuration layer. One invocation
//! validates the raw attributes, resolves the policy with directory retries
//! suppressed for the duration of the lookup, and either assigns the policy
//! id as the resource identity or reports a single error diagnostic.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::locator;
use crate::metrics::LookupMetrics;
use crate::resource::ResourceData;
use crate::schema::{
    group_role_management_policy_schema, DataSourceSchema, LookupInput, GROUP_ID_FIELD,
    ROLE_ID_FIELD,
};
use rolepolicy_core::{DirectoryClient, PolicyId, RequestContext, ResolutionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Summary of every read failure diagnostic
pub const READ_FAILURE_SUMMARY: &str = "ID is nil for returned Group Role Management Policy";

/// Detail of every read failure diagnostic
pub const READ_FAILURE_DETAIL: &str = "Bad API response";

/// Data source exposing the policy id of a (group, role relationship) pair
#[derive(Debug, Clone)]
pub struct GroupRoleManagementPolicyDataSource {
    schema: DataSourceSchema,
    metrics: Arc<LookupMetrics>,
}

impl GroupRoleManagementPolicyDataSource {
    /// Data source with the default schema and read timeout, recording
    /// metrics on a registry of its own
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self::with_metrics(Arc::new(LookupMetrics::new()?)))
    }

    /// Data source recording into shared `metrics`
    pub fn with_metrics(metrics: Arc<LookupMetrics>) -> Self {
        Self {
            schema: group_role_management_policy_schema(),
            metrics,
        }
    }

    /// Override the read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.schema.read_timeout = timeout;
        self
    }

    /// Declared schema
    pub fn schema(&self) -> &DataSourceSchema {
        &self.schema
    }

    /// Lookup counters
    pub fn metrics(&self) -> &Arc<LookupMetrics> {
        &self.metrics
    }

    /// Validate `data`, resolve the policy and assign its id to `data`
    ///
    /// Invalid input is reported without contacting the directory. On any
    /// failure `data` is left without an identity, even if an earlier read
    /// had set one.
    pub async fn invoke(
        &self,
        ctx: &RequestContext,
        data: &mut ResourceData,
        client: &dyn DirectoryClient,
    ) -> Diagnostics {
        let input = match LookupInput::from_resource(&self.schema, data) {
            Ok(input) => input,
            Err(errors) => {
                data.clear_id();
                self.metrics.record_rejected();
                warn!(errors = errors.len(), "Rejected lookup input");
                return errors.iter().map(Diagnostic::validation).collect();
            }
        };

        match self.read(ctx, &input, client).await {
            Ok(policy_id) => {
                data.set_id(policy_id.as_str());
                Diagnostics::new()
            }
            Err(diagnostics) => {
                data.clear_id();
                diagnostics
            }
        }
    }

    /// Resolve the policy id for already-validated input
    ///
    /// Bounded by the schema's read timeout. Every failure is reported as
    /// the same error diagnostic carrying the group and role ids; the
    /// underlying cause is logged and recorded in [`Diagnostic::kind`].
    #[instrument(
        name = "read_group_role_management_policy",
        skip(self, ctx, input, client),
        fields(group_id = %input.group_id, role_id = %input.role_id)
    )]
    pub async fn read(
        &self,
        ctx: &RequestContext,
        input: &LookupInput,
        client: &dyn DirectoryClient,
    ) -> Result<PolicyId, Diagnostics> {
        let ctx = ctx.with_timeout(self.schema.read_timeout);
        let started = Instant::now();

        match resolve_suppressed(&ctx, input, client).await {
            Ok(policy_id) => {
                self.metrics.record_success(started.elapsed());
                info!(policy_id = %policy_id, "Resolved group role management policy");
                Ok(policy_id)
            }
            Err(err) => {
                let kind = err.kind();
                self.metrics.record_failure(kind, started.elapsed());
                warn!(error = %err, kind = %kind, "Group role management policy lookup failed");

                let diagnostic = Diagnostic::error(READ_FAILURE_SUMMARY, READ_FAILURE_DETAIL)
                    .with_attribute(GROUP_ID_FIELD, input.group_id.as_str())
                    .with_attribute(ROLE_ID_FIELD, input.role_id.as_str())
                    .with_kind(kind);
                Err(diagnostic.into())
            }
        }
    }
}

/// Run the locator with the client's retries disabled
///
/// The guard restores the prior retry setting when it goes out of scope,
/// whether the lookup succeeds, fails, or is dropped mid-flight.
async fn resolve_suppressed(
    ctx: &RequestContext,
    input: &LookupInput,
    client: &dyn DirectoryClient,
) -> Result<PolicyId, ResolutionError> {
    let _suppression = client.retry_control().suppress(ctx).await?;
    debug!(backend = client.backend_tag(), "Directory retries suppressed for lookup");
    locator::resolve(ctx, client, &input.group_id, input.role_id).await
}
