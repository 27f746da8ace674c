//! Provider trait and related types

use crate::context::Context;
use crate::data_source::DataSourceWithConfigure;
use crate::resource::ProviderResource;
use crate::schema::Schema;
use crate::types::{Diagnostic, DynamicValue};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Entry point of a provider: configuration plus resource and data source factories
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider type name (e.g., "tencentcloud")
    fn type_name(&self) -> &str;

    /// Provider-level configuration schema
    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    /// Called once with the provider block; errors are reported as diagnostics
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    /// Creates a resource already configured with this provider's data
    /// MUST fail with ProviderNotConfigured before configure succeeded
    async fn create_resource(&self, ctx: Context, name: &str) -> Result<Box<dyn ProviderResource>>;

    /// Creates a data source already configured with this provider's data
    async fn create_data_source(
        &self,
        ctx: Context,
        name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>>;

    /// Schemas of every resource type - cache these in your implementation
    async fn resource_schemas(&self) -> HashMap<String, Schema>;

    /// Schemas of every data source type
    async fn data_source_schemas(&self) -> HashMap<String, Schema>;
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
}
