//! Managed resources: the CRUD surface the plugin host drives
//!
//! A resource answers one request per lifecycle step. Failures are reported
//! through diagnostics on the response, never by panicking or returning `Err`,
//! and the state a failed step returns is what the host keeps.

use crate::context::Context;
use crate::import::import_state_passthrough_id;
use crate::schema::Schema;
use crate::types::{AttributePath, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[async_trait]
pub trait Resource: Send + Sync {
    /// Registered name, e.g. "tencentcloud_live_callback_rule"
    fn type_name(&self) -> &str;

    async fn schema(&self, ctx: Context, request: ResourceSchemaRequest) -> ResourceSchemaResponse;

    /// Plan-time check of the user's configuration; no API calls
    async fn validate(
        &self,
        ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse;

    /// Returned state must carry every computed attribute, `id` included
    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse;

    /// `new_state: None` tells the host the object is gone
    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse;

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse;

    /// Deleting something already gone is a success
    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse;
}

pub struct ResourceSchemaRequest;

pub struct ResourceSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ValidateResourceConfigRequest {
    pub type_name: String,
    pub config: DynamicValue,
}

pub struct ValidateResourceConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

pub struct CreateResourceRequest {
    pub type_name: String,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct CreateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

impl CreateResourceResponse {
    pub fn created(new_state: DynamicValue) -> Self {
        Self {
            new_state,
            diagnostics: vec![],
        }
    }

    /// Nothing was created, so the host records no state
    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            new_state: DynamicValue::null(),
            diagnostics: vec![diagnostic],
        }
    }
    /// The object exists but the step did not finish; the host keeps
    /// `new_state` so the next plan can refresh or destroy it
    pub fn incomplete(new_state: DynamicValue, diagnostic: Diagnostic) -> Self {
        Self {
            new_state,
            diagnostics: vec![diagnostic],
        }
    }
}

pub struct ReadResourceRequest {
    pub type_name: String,
    pub current_state: DynamicValue,
}

pub struct ReadResourceResponse {
    pub new_state: Option<DynamicValue>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReadResourceResponse {
    pub fn refreshed(new_state: Option<DynamicValue>) -> Self {
        Self {
            new_state,
            diagnostics: vec![],
        }
    }

    /// A failed refresh keeps the state it was given
    pub fn failed(current_state: DynamicValue, diagnostic: Diagnostic) -> Self {
        Self {
            new_state: Some(current_state),
            diagnostics: vec![diagnostic],
        }
    }
}

pub struct UpdateResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct UpdateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

impl UpdateResourceResponse {
    pub fn updated(new_state: DynamicValue) -> Self {
        Self {
            new_state,
            diagnostics: vec![],
        }
    }

    pub fn failed(prior_state: DynamicValue, diagnostic: Diagnostic) -> Self {
        Self {
            new_state: prior_state,
            diagnostics: vec![diagnostic],
        }
    }
}

pub struct DeleteResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
}

#[derive(Default)]
pub struct DeleteResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

impl DeleteResourceResponse {
    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

/// Receives the provider's configured data right after the factory builds the resource
#[async_trait]
pub trait ResourceWithConfigure: Resource {
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse;
}

pub struct ConfigureResourceRequest {
    /// Downcast to the provider's own data type
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

pub struct ConfigureResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// `terraform import` support
///
/// The default copies the import id into `id` and leaves the rest to the
/// read that follows, which suits every resource whose identity is its id.
#[async_trait]
pub trait ResourceWithImportState: Resource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

pub struct ImportResourceStateRequest {
    pub type_name: String,
    pub id: String,
}

#[derive(Default)]
pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ImportedResource {
    pub type_name: String,
    pub state: DynamicValue,
}

/// What a provider hands out for each registered resource type
pub trait ProviderResource: ResourceWithConfigure + ResourceWithImportState {}

impl<T: ResourceWithConfigure + ResourceWithImportState> ProviderResource for T {}
