//! Drives a small in-memory provider through the framework traits the way a
//! plugin host would

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSourceSchemaRequest,
    DataSourceSchemaResponse, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, ProviderSchemaRequest,
    ProviderSchemaResponse,
};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, ResourceSchemaRequest, ResourceSchemaResponse, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::types::has_errors;
use tfplug::{
    import_state_passthrough_id, AttributeBuilder, AttributePath, AttributeType, Context,
    DataSource, DataSourceWithConfigure, Diagnostic, DynamicValue, Provider, ProviderResource,
    Resource, ResourceWithConfigure, ResourceWithImportState, Schema, SchemaBuilder, TfplugError,
};
use tokio_test::assert_ok;

type Store = Arc<Mutex<HashMap<String, String>>>;

fn item_schema() -> Schema {
    SchemaBuilder::new()
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("value", AttributeType::String)
                .required()
                .build(),
        )
        .build()
}

#[derive(Default)]
struct MemoryProvider {
    store: Option<Store>,
}

#[async_trait]
impl Provider for MemoryProvider {
    fn type_name(&self) -> &str {
        "memory"
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new().build(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        self.store = Some(Arc::new(Mutex::new(HashMap::new())));
        ConfigureProviderResponse {
            diagnostics: vec![],
        }
    }

    async fn create_resource(
        &self,
        ctx: Context,
        name: &str,
    ) -> tfplug::Result<Box<dyn ProviderResource>> {
        let store = self.store.clone().ok_or(TfplugError::ProviderNotConfigured)?;
        let mut resource: Box<dyn ProviderResource> = match name {
            "memory_item" => Box::new(ItemResource::default()),
            _ => return Err(TfplugError::ResourceNotFound(name.to_string())),
        };
        let provider_data: Arc<dyn Any + Send + Sync> = Arc::new(store);
        resource
            .configure(
                ctx,
                ConfigureResourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await;
        Ok(resource)
    }

    async fn create_data_source(
        &self,
        _ctx: Context,
        name: &str,
    ) -> tfplug::Result<Box<dyn DataSourceWithConfigure>> {
        let store = self.store.clone().ok_or(TfplugError::ProviderNotConfigured)?;
        match name {
            "memory_count" => Ok(Box::new(CountDataSource { store: Some(store) })),
            _ => Err(TfplugError::DataSourceNotFound(name.to_string())),
        }
    }

    async fn resource_schemas(&self) -> HashMap<String, Schema> {
        HashMap::from([("memory_item".to_string(), item_schema())])
    }

    async fn data_source_schemas(&self) -> HashMap<String, Schema> {
        HashMap::new()
    }
}

#[derive(Default)]
struct ItemResource {
    store: Option<Store>,
}

impl ItemResource {
    fn store(&self) -> Store {
        self.store.clone().expect("configured")
    }
}

#[async_trait]
impl Resource for ItemResource {
    fn type_name(&self) -> &str {
        "memory_item"
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: item_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: item_schema().validate(&request.config),
        }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let value = request
            .planned_state
            .get_string(&AttributePath::new("value"))
            .unwrap();
        let id = format!("item-{}", self.store().lock().unwrap().len() + 1);
        self.store().lock().unwrap().insert(id.clone(), value);

        let mut new_state = request.planned_state;
        new_state.set_string(&AttributePath::new("id"), id).unwrap();
        CreateResourceResponse {
            new_state,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let id = request
            .current_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let new_state = self.store().lock().unwrap().get(&id).map(|value| {
            let mut state = DynamicValue::object();
            state.set_string(&AttributePath::new("id"), id.clone()).unwrap();
            state
                .set_string(&AttributePath::new("value"), value.clone())
                .unwrap();
            state
        });
        ReadResourceResponse {
            new_state,
            diagnostics: vec![],
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let value = request
            .planned_state
            .get_string(&AttributePath::new("value"))
            .unwrap();
        self.store().lock().unwrap().insert(id, value);
        UpdateResourceResponse {
            new_state: request.planned_state,
            diagnostics: vec![],
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        self.store().lock().unwrap().remove(&id);
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for ItemResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match request
            .provider_data
            .and_then(|data| data.downcast_ref::<Store>().cloned())
        {
            Some(store) => self.store = Some(store),
            None => diagnostics.push(Diagnostic::error("Unexpected provider data", "")),
        }
        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithImportState for ItemResource {
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

struct CountDataSource {
    store: Option<Store>,
}

#[async_trait]
impl DataSource for CountDataSource {
    fn type_name(&self) -> &str {
        "memory_count"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: SchemaBuilder::new().build(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let count = self
            .store
            .as_ref()
            .map(|s| s.lock().unwrap().len())
            .unwrap_or_default();
        let mut state = DynamicValue::object();
        state
            .set_int(&AttributePath::new("count"), count as i64)
            .unwrap();
        ReadDataSourceResponse {
            state,
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for CountDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        ConfigureDataSourceResponse {
            diagnostics: vec![],
        }
    }
}

fn state_with(pairs: &[(&str, &str)]) -> DynamicValue {
    let mut state = DynamicValue::object();
    for (k, v) in pairs {
        state
            .set_string(&AttributePath::new(k), v.to_string())
            .unwrap();
    }
    state
}

#[tokio::test]
async fn factories_require_configuration() {
    let provider = MemoryProvider::default();

    let result = provider.create_resource(Context::new(), "memory_item").await;
    assert!(matches!(result, Err(TfplugError::ProviderNotConfigured)));
}

#[tokio::test]
async fn unknown_types_are_reported_by_name() {
    let mut provider = MemoryProvider::default();
    provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                config: DynamicValue::object(),
            },
        )
        .await;

    match provider.create_resource(Context::new(), "memory_nope").await {
        Err(TfplugError::ResourceNotFound(name)) => assert_eq!(name, "memory_nope"),
        _ => panic!("expected ResourceNotFound"),
    }
    assert!(provider.create_data_source(Context::new(), "memory_nope").await.is_err());
}

#[tokio::test]
async fn resource_lifecycle_through_trait_objects() {
    let mut provider = MemoryProvider::default();
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                config: DynamicValue::object(),
            },
        )
        .await;
    assert!(!has_errors(&response.diagnostics));

    let resource = assert_ok!(provider.create_resource(Context::new(), "memory_item").await);

    let validated = resource
        .validate(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "memory_item".to_string(),
                config: DynamicValue::object(),
            },
        )
        .await;
    assert!(has_errors(&validated.diagnostics));

    let planned = state_with(&[("value", "one")]);
    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "memory_item".to_string(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;
    let id = created
        .new_state
        .get_string(&AttributePath::new("id"))
        .unwrap();

    let updated = resource
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "memory_item".to_string(),
                prior_state: created.new_state.clone(),
                planned_state: state_with(&[("id", &id), ("value", "two")]),
                config: state_with(&[("value", "two")]),
            },
        )
        .await;
    assert!(updated.diagnostics.is_empty());

    let imported = resource
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "memory_item".to_string(),
                id: id.clone(),
            },
        )
        .await;
    let read = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "memory_item".to_string(),
                current_state: imported.imported_resources[0].state.clone(),
            },
        )
        .await;
    assert_eq!(
        read.new_state
            .unwrap()
            .get_string(&AttributePath::new("value"))
            .unwrap(),
        "two"
    );

    let count = assert_ok!(provider.create_data_source(Context::new(), "memory_count").await);
    let counted = count
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "memory_count".to_string(),
                config: DynamicValue::object(),
            },
        )
        .await;
    assert_eq!(counted.state.get_int(&AttributePath::new("count")).unwrap(), 1);

    resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "memory_item".to_string(),
                prior_state: state_with(&[("id", &id)]),
            },
        )
        .await;
    let gone = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "memory_item".to_string(),
                current_state: state_with(&[("id", &id)]),
            },
        )
        .await;
    assert!(gone.new_state.is_none());
}
