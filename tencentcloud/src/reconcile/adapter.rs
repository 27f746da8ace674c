//! Exposes any [`ResourceDefinition`] as a Terraform resource

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::Schema;
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use super::{ReconcileError, ResourceDefinition, ResourceId, ResourceReconciler};
use crate::provider_data::TencentCloudProviderData;

pub struct ReconciledResource<D: ResourceDefinition> {
    definition: D,
    schema: Schema,
    reconciler: Option<ResourceReconciler<D>>,
}

impl<D: ResourceDefinition> ReconciledResource<D> {
    pub fn new() -> Self {
        let definition = D::default();
        let schema = definition.schema();
        Self {
            definition,
            schema,
            reconciler: None,
        }
    }

    pub fn schema_static() -> Schema {
        D::default().schema()
    }

    fn reconciler(&self) -> Result<&ResourceReconciler<D>, Diagnostic> {
        self.reconciler.as_ref().ok_or_else(|| {
            Diagnostic::error(
                "Provider not configured",
                "Provider data was not properly configured",
            )
        })
    }

    fn summary(&self, operation: &str) -> String {
        format!("Failed to {} {}", operation, self.definition.type_name())
    }
}

impl<D: ResourceDefinition> Default for ReconciledResource<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn diagnostic(summary: String, error: &ReconcileError) -> Diagnostic {
    let diagnostic = Diagnostic::error(summary, error.to_string());
    match error {
        ReconcileError::ImmutableViolation { attribute } => {
            diagnostic.with_attribute(AttributePath::new(attribute))
        }
        _ => diagnostic,
    }
}

fn identity(state: &DynamicValue) -> Result<ResourceId, Diagnostic> {
    state
        .get_string(&AttributePath::new("id"))
        .map(ResourceId::new)
        .map_err(|e| {
            Diagnostic::error("Missing resource id", e.to_string())
                .with_attribute(AttributePath::new("id"))
        })
}

#[async_trait]
impl<D: ResourceDefinition> Resource for ReconciledResource<D> {
    fn type_name(&self) -> &str {
        self.definition.type_name()
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: self.schema.clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: self.schema.validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let reconciler = match self.reconciler() {
            Ok(reconciler) => reconciler,
            Err(diagnostic) => return CreateResourceResponse::failed(diagnostic),
        };

        match reconciler.create(&ctx, &request.planned_state).await {
            Ok((_, mut new_state)) => {
                new_state.value.resolve_unknowns();
                CreateResourceResponse::created(new_state)
            }
            Err(e) => {
                let diagnostic = diagnostic(self.summary("create"), &e);
                match e {
                    ReconcileError::CreatedButUnread { state, .. } => {
                        CreateResourceResponse::incomplete(*state, diagnostic)
                    }
                    _ => CreateResourceResponse::failed(diagnostic),
                }
            }
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let prepared = self
            .reconciler()
            .and_then(|r| identity(&request.current_state).map(|id| (r, id)));
        let (reconciler, id) = match prepared {
            Ok(prepared) => prepared,
            Err(diagnostic) => return ReadResourceResponse::failed(request.current_state, diagnostic),
        };

        match reconciler.read(&ctx, &id, &request.current_state).await {
            Ok(new_state) => ReadResourceResponse::refreshed(new_state),
            Err(e) => ReadResourceResponse::failed(
                request.current_state,
                diagnostic(self.summary("read"), &e),
            ),
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let prepared = self
            .reconciler()
            .and_then(|r| identity(&request.prior_state).map(|id| (r, id)));
        let (reconciler, id) = match prepared {
            Ok(prepared) => prepared,
            Err(diagnostic) => return UpdateResourceResponse::failed(request.prior_state, diagnostic),
        };

        match reconciler
            .update(&ctx, &id, &request.planned_state, &request.prior_state)
            .await
        {
            Ok(mut new_state) => {
                new_state.value.resolve_unknowns();
                UpdateResourceResponse::updated(new_state)
            }
            Err(e) => UpdateResourceResponse::failed(
                request.prior_state,
                diagnostic(self.summary("update"), &e),
            ),
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let prepared = self
            .reconciler()
            .and_then(|r| identity(&request.prior_state).map(|id| (r, id)));
        let (reconciler, id) = match prepared {
            Ok(prepared) => prepared,
            Err(diagnostic) => return DeleteResourceResponse::failed(diagnostic),
        };

        match reconciler.delete(&ctx, &id).await {
            Ok(()) => DeleteResourceResponse::default(),
            Err(e) => DeleteResourceResponse::failed(diagnostic(self.summary("delete"), &e)),
        }
    }
}

#[async_trait]
impl<D: ResourceDefinition> ResourceWithConfigure for ReconciledResource<D> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<TencentCloudProviderData>() {
                self.reconciler = Some(ResourceReconciler::new(
                    provider_data.client.clone(),
                    D::default(),
                    provider_data.reconciler_config.clone(),
                ));
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract TencentCloudProviderData from provider data",
                ));
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}

impl<D: ResourceDefinition> ResourceWithImportState for ReconciledResource<D> {}
