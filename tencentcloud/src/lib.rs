pub mod api;
pub mod data_sources;
pub mod logging;
pub mod provider_data;
pub mod reconcile;
pub mod resources;

pub use provider_data::TencentCloudProviderData;

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tfplug::context::Context;
use tfplug::data_source::ConfigureDataSourceRequest;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, ProviderSchemaRequest,
    ProviderSchemaResponse,
};
use tfplug::resource::ConfigureResourceRequest;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::OneOfValidator;
use tfplug::{
    DataSourceWithConfigure, Provider, ProviderResource, ResourceWithConfigure, TfplugError,
};

use api::{Client, ClientConfig, Credential};
use data_sources::{ListingDataSource, TsfCluster, TsfGroupInstances};
use reconcile::ReconciledResource;
use resources::{
    LiveCallbackRule, LiveCallbackTemplate, LiveRecordTemplate, LiveStreamMonitor, TsfApiGroup,
    TsfContainGroup, TsfGroup, TsfInstancesAttachment, TsfNamespace, TsfTask,
};

pub const SECRET_ID_ENV: &str = "TENCENTCLOUD_SECRET_ID";
pub const SECRET_KEY_ENV: &str = "TENCENTCLOUD_SECRET_KEY";
pub const SECURITY_TOKEN_ENV: &str = "TENCENTCLOUD_SECURITY_TOKEN";
pub const REGION_ENV: &str = "TENCENTCLOUD_REGION";

pub struct TencentCloudProvider {
    provider_data: Option<TencentCloudProviderData>,
}

impl Default for TencentCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TencentCloudProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    /// A provider already configured with `provider_data`, skipping the
    /// credential lookup
    pub fn with_provider_data(provider_data: TencentCloudProviderData) -> Self {
        Self {
            provider_data: Some(provider_data),
        }
    }

    fn shared_data(&self) -> tfplug::Result<Arc<dyn Any + Send + Sync>> {
        let data = self
            .provider_data
            .clone()
            .ok_or(TfplugError::ProviderNotConfigured)?;
        Ok(Arc::new(data))
    }
}

/// Config value, falling back to `env` when unset
fn setting(config: &DynamicValue, name: &str, env: Option<&str>) -> Option<String> {
    config
        .get_opt_string(&AttributePath::new(name))
        .ok()
        .flatten()
        .filter(|v| !v.is_empty())
        .or_else(|| env.and_then(|var| std::env::var(var).ok()))
        .filter(|v| !v.is_empty())
}

fn missing(name: &str, env: &str) -> Diagnostic {
    Diagnostic::error(
        format!(
            "{} is required (set in provider config or {} env var)",
            name, env
        ),
        "",
    )
    .with_attribute(AttributePath::new(name))
}

fn provider_schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("TencentCloud Live and TSF provider")
        .attribute(
            AttributeBuilder::new("secret_id", AttributeType::String)
                .description("API secret id, can also be set with TENCENTCLOUD_SECRET_ID")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("secret_key", AttributeType::String)
                .description("API secret key, can also be set with TENCENTCLOUD_SECRET_KEY")
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("security_token", AttributeType::String)
                .description("Temporary credential token, can also be set with TENCENTCLOUD_SECURITY_TOKEN")
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("region", AttributeType::String)
                .description("Region to operate in, can also be set with TENCENTCLOUD_REGION")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("protocol", AttributeType::String)
                .description("HTTPS or HTTP, HTTPS by default")
                .optional()
                .validator(OneOfValidator::new(&["HTTPS", "HTTP"]))
                .default_value("HTTPS")
                .build(),
        )
        .attribute(
            AttributeBuilder::new("domain", AttributeType::String)
                .description("Root domain of the API, tencentcloudapi.com by default")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("endpoint", AttributeType::String)
                .description("Sends every request to this URL instead of the service domain")
                .optional()
                .build(),
        )
        .build()
}

#[async_trait]
impl Provider for TencentCloudProvider {
    fn type_name(&self) -> &str {
        "tencentcloud"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        logging::init();

        let config = &request.config;
        let mut diagnostics = vec![];

        let secret_id = setting(config, "secret_id", Some(SECRET_ID_ENV));
        let secret_key = setting(config, "secret_key", Some(SECRET_KEY_ENV));
        let token = setting(config, "security_token", Some(SECURITY_TOKEN_ENV));
        let region = setting(config, "region", Some(REGION_ENV));

        if secret_id.is_none() {
            diagnostics.push(missing("secret_id", SECRET_ID_ENV));
        }
        if secret_key.is_none() {
            diagnostics.push(missing("secret_key", SECRET_KEY_ENV));
        }
        if region.is_none() {
            diagnostics.push(missing("region", REGION_ENV));
        }

        let (Some(secret_id), Some(secret_key), Some(region)) = (secret_id, secret_key, region)
        else {
            return ConfigureProviderResponse { diagnostics };
        };

        let mut client_config = ClientConfig::new(
            Credential {
                secret_id,
                secret_key,
                token,
            },
            region,
        );
        if let Some(protocol) = setting(config, "protocol", None) {
            client_config.protocol = protocol;
        }
        if let Some(domain) = setting(config, "domain", None) {
            client_config.domain = domain;
        }
        client_config.endpoint = setting(config, "endpoint", None);

        match Client::new(client_config) {
            Ok(client) => {
                tracing::info!(region = client.region(), "configured tencentcloud provider");
                self.provider_data = Some(TencentCloudProviderData::new(client));
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                ));
            }
        }

        ConfigureProviderResponse { diagnostics }
    }

    async fn create_resource(
        &self,
        ctx: Context,
        name: &str,
    ) -> tfplug::Result<Box<dyn ProviderResource>> {
        let provider_data = self.shared_data()?;

        let mut resource: Box<dyn ProviderResource> = match name {
            resources::live_callback_rule::TYPE_NAME => {
                Box::new(ReconciledResource::<LiveCallbackRule>::new())
            }
            resources::live_callback_template::TYPE_NAME => {
                Box::new(ReconciledResource::<LiveCallbackTemplate>::new())
            }
            resources::live_record_template::TYPE_NAME => {
                Box::new(ReconciledResource::<LiveRecordTemplate>::new())
            }
            resources::live_stream_monitor::TYPE_NAME => {
                Box::new(ReconciledResource::<LiveStreamMonitor>::new())
            }
            resources::tsf_namespace::TYPE_NAME => {
                Box::new(ReconciledResource::<TsfNamespace>::new())
            }
            resources::tsf_group::TYPE_NAME => Box::new(ReconciledResource::<TsfGroup>::new()),
            resources::tsf_api_group::TYPE_NAME => {
                Box::new(ReconciledResource::<TsfApiGroup>::new())
            }
            resources::tsf_contain_group::TYPE_NAME => {
                Box::new(ReconciledResource::<TsfContainGroup>::new())
            }
            resources::tsf_instances_attachment::TYPE_NAME => {
                Box::new(ReconciledResource::<TsfInstancesAttachment>::new())
            }
            resources::tsf_task::TYPE_NAME => Box::new(ReconciledResource::<TsfTask>::new()),
            _ => return Err(TfplugError::ResourceNotFound(name.to_string())),
        };

        let response = resource
            .configure(
                ctx,
                ConfigureResourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await;
        if let Some(error) = response.diagnostics.iter().find(|d| d.is_error()) {
            return Err(TfplugError::InvalidConfiguration(error.summary.clone()));
        }

        Ok(resource)
    }

    async fn create_data_source(
        &self,
        ctx: Context,
        name: &str,
    ) -> tfplug::Result<Box<dyn DataSourceWithConfigure>> {
        let provider_data = self.shared_data()?;

        let mut data_source: Box<dyn DataSourceWithConfigure> = match name {
            data_sources::tsf_cluster::TYPE_NAME => {
                Box::new(ListingDataSource::<TsfCluster>::new())
            }
            data_sources::tsf_group_instances::TYPE_NAME => {
                Box::new(ListingDataSource::<TsfGroupInstances>::new())
            }
            _ => return Err(TfplugError::DataSourceNotFound(name.to_string())),
        };

        let response = data_source
            .configure(
                ctx,
                ConfigureDataSourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await;
        if let Some(error) = response.diagnostics.iter().find(|d| d.is_error()) {
            return Err(TfplugError::InvalidConfiguration(error.summary.clone()));
        }

        Ok(data_source)
    }

    async fn resource_schemas(&self) -> HashMap<String, Schema> {
        static SCHEMAS: OnceLock<HashMap<String, Schema>> = OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (
                        resources::live_callback_rule::TYPE_NAME.to_string(),
                        ReconciledResource::<LiveCallbackRule>::schema_static(),
                    ),
                    (
                        resources::live_callback_template::TYPE_NAME.to_string(),
                        ReconciledResource::<LiveCallbackTemplate>::schema_static(),
                    ),
                    (
                        resources::live_record_template::TYPE_NAME.to_string(),
                        ReconciledResource::<LiveRecordTemplate>::schema_static(),
                    ),
                    (
                        resources::live_stream_monitor::TYPE_NAME.to_string(),
                        ReconciledResource::<LiveStreamMonitor>::schema_static(),
                    ),
                    (
                        resources::tsf_namespace::TYPE_NAME.to_string(),
                        ReconciledResource::<TsfNamespace>::schema_static(),
                    ),
                    (
                        resources::tsf_group::TYPE_NAME.to_string(),
                        ReconciledResource::<TsfGroup>::schema_static(),
                    ),
                    (
                        resources::tsf_api_group::TYPE_NAME.to_string(),
                        ReconciledResource::<TsfApiGroup>::schema_static(),
                    ),
                    (
                        resources::tsf_contain_group::TYPE_NAME.to_string(),
                        ReconciledResource::<TsfContainGroup>::schema_static(),
                    ),
                    (
                        resources::tsf_instances_attachment::TYPE_NAME.to_string(),
                        ReconciledResource::<TsfInstancesAttachment>::schema_static(),
                    ),
                    (
                        resources::tsf_task::TYPE_NAME.to_string(),
                        ReconciledResource::<TsfTask>::schema_static(),
                    ),
                ])
            })
            .clone()
    }

    async fn data_source_schemas(&self) -> HashMap<String, Schema> {
        static SCHEMAS: OnceLock<HashMap<String, Schema>> = OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (
                        data_sources::tsf_cluster::TYPE_NAME.to_string(),
                        ListingDataSource::<TsfCluster>::schema_static(),
                    ),
                    (
                        data_sources::tsf_group_instances::TYPE_NAME.to_string(),
                        ListingDataSource::<TsfGroupInstances>::schema_static(),
                    ),
                ])
            })
            .clone()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::types::has_errors;
    use tfplug::{DataSource, Resource};

    fn clear_env() {
        for var in [SECRET_ID_ENV, SECRET_KEY_ENV, SECURITY_TOKEN_ENV, REGION_ENV] {
            std::env::remove_var(var);
        }
    }

    async fn configure(provider: &mut TencentCloudProvider, config: DynamicValue) -> Vec<Diagnostic> {
        provider
            .configure(Context::new(), ConfigureProviderRequest { config })
            .await
            .diagnostics
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_successfully_with_env_vars() {
        clear_env();
        std::env::set_var(SECRET_ID_ENV, "AKIDexample");
        std::env::set_var(SECRET_KEY_ENV, "secret");
        std::env::set_var(REGION_ENV, "ap-guangzhou");

        let mut provider = TencentCloudProvider::new();
        let diagnostics = configure(&mut provider, DynamicValue::object()).await;
        assert!(!has_errors(&diagnostics));
        assert!(provider.provider_data.is_some());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn configure_installs_logging_once() {
        clear_env();
        std::env::remove_var(logging::LOG_ENV);

        let mut provider = TencentCloudProvider::new();
        configure(&mut provider, DynamicValue::object()).await;
        assert!(tracing::enabled!(tracing::Level::ERROR));

        configure(&mut provider, DynamicValue::object()).await;
        assert!(tracing::enabled!(tracing::Level::INFO));
    }

    #[tokio::test]
    #[serial]
    async fn config_values_take_precedence_over_env() {
        clear_env();
        std::env::set_var(REGION_ENV, "ap-guangzhou");

        let mut config = DynamicValue::object();
        for (name, value) in [
            ("secret_id", "AKIDconfig"),
            ("secret_key", "secret"),
            ("region", "ap-shanghai"),
        ] {
            config
                .set_string(&AttributePath::new(name), value.to_string())
                .unwrap();
        }

        let mut provider = TencentCloudProvider::new();
        let diagnostics = configure(&mut provider, config).await;
        assert!(!has_errors(&diagnostics));

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_reports_every_missing_setting() {
        clear_env();

        let mut provider = TencentCloudProvider::new();
        let diagnostics = configure(&mut provider, DynamicValue::object()).await;

        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics[0].summary.contains("secret_id is required"));
        assert!(diagnostics[0].summary.contains(SECRET_ID_ENV));
        assert!(diagnostics[2].summary.contains("region is required"));
        assert!(provider.provider_data.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn factories_require_configuration() {
        clear_env();
        let provider = TencentCloudProvider::new();

        let resource = provider
            .create_resource(Context::new(), resources::tsf_group::TYPE_NAME)
            .await;
        assert!(matches!(resource, Err(TfplugError::ProviderNotConfigured)));

        let data_source = provider
            .create_data_source(Context::new(), data_sources::tsf_cluster::TYPE_NAME)
            .await;
        assert!(matches!(data_source, Err(TfplugError::ProviderNotConfigured)));
    }

    #[tokio::test]
    #[serial]
    async fn provider_creates_resources_after_configuration() {
        clear_env();
        std::env::set_var(SECRET_ID_ENV, "AKIDexample");
        std::env::set_var(SECRET_KEY_ENV, "secret");
        std::env::set_var(REGION_ENV, "ap-guangzhou");

        let mut provider = TencentCloudProvider::new();
        configure(&mut provider, DynamicValue::object()).await;

        for name in provider.resource_schemas().await.keys() {
            let resource = provider.create_resource(Context::new(), name).await.unwrap();
            assert_eq!(resource.type_name(), name);
        }
        for name in provider.data_source_schemas().await.keys() {
            let data_source = provider
                .create_data_source(Context::new(), name)
                .await
                .unwrap();
            assert_eq!(data_source.type_name(), name);
        }

        assert!(matches!(
            provider.create_resource(Context::new(), "unknown_resource").await,
            Err(TfplugError::ResourceNotFound(_))
        ));

        clear_env();
    }

    #[tokio::test]
    async fn schemas_cover_every_type() {
        let provider = TencentCloudProvider::new();
        assert_eq!(provider.resource_schemas().await.len(), 10);
        assert_eq!(provider.data_source_schemas().await.len(), 2);

        let schema = provider
            .schema(Context::new(), ProviderSchemaRequest)
            .await
            .schema;
        assert!(schema.block.attribute("secret_key").unwrap().sensitive);
    }
}
