//! Drives a cloud resource toward its desired state
//!
//! A [`ResourceDefinition`] describes one resource type: its schema, how its
//! identity is formed and which API calls create, describe, modify and delete
//! it. [`ResourceReconciler`] runs those calls through the bounded-retry loop,
//! enforces immutable attributes before any request is sent, and folds
//! describe responses back into state.

pub mod adapter;
pub mod flatten;
pub mod retry;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tfplug::{AttributePath, Context, Dynamic, DynamicValue, Schema, TfplugError};
use tokio::time::Instant;
use tracing::Instrument;

use crate::api::{ApiCall, ApiError, CloudApi, ErrorClass, RateLimiter};
use retry::{Attempt, RetryError, RetryPolicy};

pub use adapter::ReconciledResource;

/// Separator between the parts of a composite identity
pub const ID_SEPARATOR: char = '#';

/// Timeouts, backoff and the shared rate limiter handed to every reconciler
#[derive(Clone)]
pub struct ReconcilerConfig {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub retry: RetryPolicy,
    pub rate_limiter: Arc<RateLimiter>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(3 * 60),
            write_timeout: Duration::from_secs(5 * 60),
            retry: RetryPolicy::default(),
            rate_limiter: Arc::new(RateLimiter::default()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("attribute \"{attribute}\" cannot be changed after creation")]
    ImmutableViolation { attribute: String },

    #[error("{action} did not succeed within {elapsed:?} after {attempts} attempts, last error: {last}")]
    TimeoutExceeded {
        action: String,
        elapsed: Duration,
        attempts: u32,
        last: ApiError,
    },

    #[error("{action} failed: {source}")]
    Api { action: String, source: ApiError },

    #[error("invalid state: {0}")]
    InvalidState(#[from] TfplugError),

    #[error("{action} response carries no identity at {pointer}")]
    MissingIdentity { action: String, pointer: String },

    #[error("malformed identity \"{id}\", expected {expected}")]
    MalformedIdentity { id: String, expected: String },

    #[error("{0}")]
    Inconsistent(String),

    /// The create call went through but the follow-up read did not; `state`
    /// is the desired state carrying the new identity
    #[error("{id} was created but could not be read back: {source}")]
    CreatedButUnread {
        id: ResourceId,
        state: Box<DynamicValue>,
        source: Box<ReconcileError>,
    },

    #[error("failed to build request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ReconcileError {
    /// The API reported that the addressed resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::Api { source, .. } if source.is_not_found())
    }
}

/// Stable key of a provisioned resource, stored as the `id` attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Joins parts with [`ID_SEPARATOR`]
    pub fn compose(parts: &[&str]) -> Self {
        Self(parts.join(&ID_SEPARATOR.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits a composite identity, requiring exactly `count` non-empty parts
    pub fn parts(&self, count: usize) -> Result<Vec<&str>, ReconcileError> {
        let parts: Vec<&str> = self.0.split(ID_SEPARATOR).collect();
        if parts.len() != count || parts.iter().any(|p| p.is_empty()) {
            return Err(ReconcileError::MalformedIdentity {
                id: self.0.clone(),
                expected: format!("{} parts joined by '{}'", count, ID_SEPARATOR),
            });
        }
        Ok(parts)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a resource's identity comes from
#[derive(Debug, Clone, Copy)]
pub enum IdentityStrategy {
    /// JSON pointer into the create response, e.g. `/TemplateId`
    ServerAssigned(&'static str),
    /// Desired-state attributes joined with [`ID_SEPARATOR`]
    Composite(&'static [&'static str]),
}

/// Per-type knowledge the generic reconciler needs
pub trait ResourceDefinition: Default + Send + Sync + 'static {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn identity(&self) -> IdentityStrategy;

    fn create_call(&self, desired: &DynamicValue) -> Result<ApiCall, ReconcileError>;

    fn read_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError>;

    /// Picks the resource object out of a describe response; `None` means
    /// the resource no longer exists
    fn extract_observed(
        &self,
        id: &ResourceId,
        response: Value,
    ) -> Result<Option<Value>, ReconcileError>;

    /// Builds the modify request for the `changed` attributes; `None` when the
    /// API has no in-place update for this type
    fn update_call(
        &self,
        id: &ResourceId,
        desired: &DynamicValue,
        changed: &[&str],
    ) -> Result<Option<ApiCall>, ReconcileError>;

    fn delete_call(&self, id: &ResourceId) -> Result<ApiCall, ReconcileError>;

    /// `(flattened_key, attribute_name)` pairs for describe fields whose
    /// snake_case name differs from the attribute
    fn renames(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Error codes this type treats as transient on top of the common set
    fn extra_retryable_codes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Error codes that end the retry loop even though their prefix is
    /// retryable
    fn fatal_codes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Rejects a create response that succeeded at the transport level but
    /// reports that nothing was created
    fn verify_created(&self, _response: &Value) -> Result<(), ReconcileError> {
        Ok(())
    }

    /// Next describe page when the resource was not on the one just read;
    /// `None` ends the search and the resource counts as gone
    fn next_read_call(
        &self,
        _id: &ResourceId,
        _previous: &ApiCall,
        _response: &Value,
    ) -> Result<Option<ApiCall>, ReconcileError> {
        Ok(None)
    }
}

/// Deserializes a request from state, keeping only `only` attributes when
/// given. Unknown values are sent as absent.
pub fn request_from_state<T: DeserializeOwned>(
    state: &DynamicValue,
    only: Option<&[&str]>,
) -> Result<T, ReconcileError> {
    let mut value = state.value.clone();
    value.resolve_unknowns();

    let mut json = serde_json::to_value(&value)?;
    if let (Some(only), Value::Object(fields)) = (only, &mut json) {
        fields.retain(|key, _| only.contains(&key.as_str()));
    }

    Ok(serde_json::from_value(json)?)
}

/// Invokes `call` inside the bounded-retry loop, pacing through the rate
/// limiter on every attempt
pub(crate) async fn call_with_retry(
    api: &dyn CloudApi,
    config: &ReconcilerConfig,
    call: &ApiCall,
    ceiling: Duration,
    extra_retryable: &[&str],
    fatal: &[&str],
) -> Result<Value, ReconcileError> {
    let result = retry::retry(&config.retry, ceiling, move || async move {
        config.rate_limiter.acquire(call.action).await;
        api.invoke(call).await.map_err(|e| {
            if e.code().is_some_and(|code| fatal.contains(&code)) {
                return Attempt::NonRetryable(e);
            }
            match e.classify(extra_retryable) {
                ErrorClass::Transient => Attempt::Retryable(e),
                ErrorClass::NotFound | ErrorClass::Fatal => Attempt::NonRetryable(e),
            }
        })
    })
    .await;

    result.map_err(|e| match e {
        RetryError::Timeout {
            elapsed,
            attempts,
            last,
        } => {
            tracing::error!(
                action = call.action,
                attempts,
                "api[{}] timed out after {:?}, request body [{}], reason[{}]",
                call.action,
                elapsed,
                call.payload,
                last
            );
            ReconcileError::TimeoutExceeded {
                action: call.action.to_string(),
                elapsed,
                attempts,
                last,
            }
        }
        RetryError::Permanent { error, .. } => {
            if !error.is_not_found() {
                tracing::error!(
                    action = call.action,
                    "api[{}] fail, request body [{}], reason[{}]",
                    call.action,
                    call.payload,
                    error
                );
            }
            ReconcileError::Api {
                action: call.action.to_string(),
                source: error,
            }
        }
    })
}

/// Logs how long an operation took when dropped
pub(crate) struct ElapsedLog {
    label: String,
    started: Instant,
}

impl ElapsedLog {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }
}

impl Drop for ElapsedLog {
    fn drop(&mut self) {
        tracing::debug!(
            "[ELAPSED] {} elapsed {} ms",
            self.label,
            self.started.elapsed().as_millis()
        );
    }
}

pub struct ResourceReconciler<D: ResourceDefinition> {
    api: Arc<dyn CloudApi>,
    definition: D,
    schema: Schema,
    config: ReconcilerConfig,
}

impl<D: ResourceDefinition> ResourceReconciler<D> {
    pub fn new(api: Arc<dyn CloudApi>, definition: D, config: ReconcilerConfig) -> Self {
        let schema = definition.schema();
        Self {
            api,
            definition,
            schema,
            config,
        }
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Creates the resource and returns its identity with the state read back
    pub async fn create(
        &self,
        ctx: &Context,
        desired: &DynamicValue,
    ) -> Result<(ResourceId, DynamicValue), ReconcileError> {
        self.create_inner(desired)
            .instrument(self.span(ctx, "create"))
            .await
    }

    /// Reads the resource; `Ok(None)` when it no longer exists
    pub async fn read(
        &self,
        ctx: &Context,
        id: &ResourceId,
        current: &DynamicValue,
    ) -> Result<Option<DynamicValue>, ReconcileError> {
        self.read_inner(id, current)
            .instrument(self.span(ctx, "read"))
            .await
    }

    /// Applies the difference between `previous` and `desired`; immutable
    /// attributes are checked before any request is made
    pub async fn update(
        &self,
        ctx: &Context,
        id: &ResourceId,
        desired: &DynamicValue,
        previous: &DynamicValue,
    ) -> Result<DynamicValue, ReconcileError> {
        self.update_inner(id, desired, previous)
            .instrument(self.span(ctx, "update"))
            .await
    }

    /// Deletes the resource; a resource that is already gone counts as deleted
    pub async fn delete(&self, ctx: &Context, id: &ResourceId) -> Result<(), ReconcileError> {
        self.delete_inner(id)
            .instrument(self.span(ctx, "delete"))
            .await
    }

    async fn create_inner(
        &self,
        desired: &DynamicValue,
    ) -> Result<(ResourceId, DynamicValue), ReconcileError> {
        let _elapsed = ElapsedLog::new(format!("resource.{}.create", self.type_name()));
        let mut desired = desired.clone();
        self.schema.apply_defaults(&mut desired);

        let composed = match self.definition.identity() {
            IdentityStrategy::Composite(attributes) => {
                Some(compose_identity(&desired, attributes)?)
            }
            IdentityStrategy::ServerAssigned(_) => None,
        };

        let call = self.definition.create_call(&desired)?;
        let response = self.call(&call, self.config.write_timeout).await?;
        self.definition.verify_created(&response)?;

        let id = match (composed, self.definition.identity()) {
            (Some(id), _) => id,
            (None, IdentityStrategy::ServerAssigned(pointer)) => {
                identity_from_response(call.action, &response, pointer)?
            }
            (None, IdentityStrategy::Composite(attributes)) => {
                compose_identity(&desired, attributes)?
            }
        };
        tracing::info!(id = %id, "created {}", self.type_name());

        // From here on the resource exists, so every failure carries its id
        let unread = match self.refresh(&id, &desired).await {
            Ok(Some(observed)) => return Ok((id, observed)),
            Ok(None) => ReconcileError::Inconsistent(format!(
                "{} {} was not found right after it was created",
                self.type_name(),
                id
            )),
            Err(e) => e,
        };

        let mut state = desired;
        state.set_string(&AttributePath::new("id"), id.to_string())?;
        state.value.resolve_unknowns();
        Err(ReconcileError::CreatedButUnread {
            id,
            state: Box::new(state),
            source: Box::new(unread),
        })
    }

    async fn read_inner(
        &self,
        id: &ResourceId,
        current: &DynamicValue,
    ) -> Result<Option<DynamicValue>, ReconcileError> {
        let _elapsed = ElapsedLog::new(format!("resource.{}.read", self.type_name()));
        let observed = self.refresh(id, current).await?;
        if observed.is_none() {
            tracing::warn!(id = %id, "{} not found, removing from state", self.type_name());
        }
        Ok(observed)
    }

    async fn update_inner(
        &self,
        id: &ResourceId,
        desired: &DynamicValue,
        previous: &DynamicValue,
    ) -> Result<DynamicValue, ReconcileError> {
        let _elapsed = ElapsedLog::new(format!("resource.{}.update", self.type_name()));
        let mut desired = desired.clone();
        self.schema.apply_defaults(&mut desired);

        self.check_immutable(&desired, previous)?;

        let changed = self.changed_attributes(&desired, previous);
        if changed.is_empty() {
            tracing::debug!(id = %id, "no attribute changed, refreshing only");
        } else {
            tracing::info!(id = %id, changed = ?changed, "updating {}", self.type_name());
            let call = self
                .definition
                .update_call(id, &desired, &changed)?
                .ok_or_else(|| {
                    ReconcileError::Inconsistent(format!(
                        "{} cannot be updated in place, changed: {}",
                        self.type_name(),
                        changed.join(", ")
                    ))
                })?;
            self.call(&call, self.config.write_timeout).await?;
        }

        self.refresh(id, &desired).await?.ok_or_else(|| {
            ReconcileError::Inconsistent(format!(
                "{} {} disappeared during update",
                self.type_name(),
                id
            ))
        })
    }

    async fn delete_inner(&self, id: &ResourceId) -> Result<(), ReconcileError> {
        let _elapsed = ElapsedLog::new(format!("resource.{}.delete", self.type_name()));
        let call = self.definition.delete_call(id)?;
        match self.call(&call, self.config.write_timeout).await {
            Ok(_) => {
                tracing::info!(id = %id, "deleted {}", self.type_name());
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(id = %id, "{} already gone", self.type_name());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn type_name(&self) -> &'static str {
        self.definition.type_name()
    }

    fn span(&self, ctx: &Context, operation: &'static str) -> tracing::Span {
        tracing::info_span!(
            "reconcile",
            resource = self.type_name(),
            operation,
            log_id = %ctx.log_id()
        )
    }

    async fn call(&self, call: &ApiCall, ceiling: Duration) -> Result<Value, ReconcileError> {
        call_with_retry(
            self.api.as_ref(),
            &self.config,
            call,
            ceiling,
            self.definition.extra_retryable_codes(),
            self.definition.fatal_codes(),
        )
        .await
    }

    /// Describes the resource and merges the response into `local`
    async fn refresh(
        &self,
        id: &ResourceId,
        local: &DynamicValue,
    ) -> Result<Option<DynamicValue>, ReconcileError> {
        let mut call = self.definition.read_call(id)?;
        let raw = loop {
            let response = match self.call(&call, self.config.read_timeout).await {
                Ok(response) => response,
                Err(e) if e.is_not_found() => return Ok(None),
                Err(e) => return Err(e),
            };

            let next = self.definition.next_read_call(id, &call, &response)?;
            if let Some(raw) = self.definition.extract_observed(id, response)? {
                break raw;
            }
            match next {
                Some(next) => call = next,
                None => return Ok(None),
            }
        };
        let Dynamic::Map(fragment) = flatten::flatten(&raw) else {
            return Err(ReconcileError::Inconsistent(format!(
                "{} returned a non-object resource",
                call.action
            )));
        };
        let observed = flatten::conform(&self.schema.block, fragment, self.definition.renames());

        let mut state = local.clone();
        if !matches!(state.value, Dynamic::Map(_)) {
            state = DynamicValue::object();
        }
        flatten::merge_non_null(&mut state.value, Dynamic::Map(observed));

        state.set_string(&AttributePath::new("id"), id.to_string())?;
        if let IdentityStrategy::Composite(attributes) = self.definition.identity() {
            for (name, part) in attributes.iter().zip(id.parts(attributes.len())?) {
                state.set_string(&AttributePath::new(name), part.to_string())?;
            }
        }

        Ok(Some(state))
    }

    fn check_immutable(
        &self,
        desired: &DynamicValue,
        previous: &DynamicValue,
    ) -> Result<(), ReconcileError> {
        for name in self.schema.immutable_attributes() {
            let path = AttributePath::new(name);
            let wanted = known(desired, &path);
            if self.left_to_server(name, wanted) {
                continue;
            }
            if wanted != known(previous, &path) {
                tracing::error!(attribute = name, "immutable attribute changed");
                return Err(ReconcileError::ImmutableViolation {
                    attribute: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn changed_attributes(&self, desired: &DynamicValue, previous: &DynamicValue) -> Vec<&str> {
        let immutable = self.schema.immutable_attributes();
        self.schema
            .configurable_attributes()
            .into_iter()
            .filter(|name| !immutable.contains(name))
            .filter(|name| {
                let path = AttributePath::new(name);
                let wanted = known(desired, &path);
                !self.left_to_server(name, wanted) && wanted != known(previous, &path)
            })
            .collect()
    }

    /// An unknown value, or an unset computed one, is whatever the API
    /// reports and never counts as a change
    fn left_to_server(&self, name: &str, wanted: Option<&Dynamic>) -> bool {
        match wanted {
            Some(value) => value.is_unknown(),
            None => self.schema.attribute(name).is_some_and(|a| a.computed),
        }
    }
}

/// Present, non-null value at `path`
fn known<'a>(state: &'a DynamicValue, path: &AttributePath) -> Option<&'a Dynamic> {
    state.get(path).filter(|v| !v.is_null())
}

fn compose_identity(
    desired: &DynamicValue,
    attributes: &[&str],
) -> Result<ResourceId, ReconcileError> {
    let parts = attributes
        .iter()
        .map(|name| desired.get_string(&AttributePath::new(name)))
        .collect::<Result<Vec<_>, _>>()?;
    let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
    Ok(ResourceId::compose(&parts))
}

fn identity_from_response(
    action: &str,
    response: &Value,
    pointer: &str,
) -> Result<ResourceId, ReconcileError> {
    let id = match response.pointer(pointer) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(ReconcileError::MissingIdentity {
                action: action.to_string(),
                pointer: pointer.to_string(),
            })
        }
    };
    Ok(ResourceId::new(id))
}
