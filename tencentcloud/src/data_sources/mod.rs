//! Read-only TSF listings
//!
//! A [`Listing`] names one paginated describe action and the schema its
//! results are shaped into. [`ListingDataSource`] pages through the action
//! under the read ceiling, conforms the collected items to the `result`
//! attribute, and derives a stable id from the item ids.

pub mod tsf_cluster;
pub mod tsf_group_instances;

pub use tsf_cluster::TsfCluster;
pub use tsf_group_instances::TsfGroupInstances;

use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tracing::Instrument;

use crate::api::{ApiCall, CloudApi};
use crate::provider_data::TencentCloudProviderData;
use crate::reconcile::{call_with_retry, flatten, ElapsedLog, ReconcileError, ReconcilerConfig};

/// Items requested per describe call
pub const PAGE_SIZE: i64 = 20;

/// Per-type knowledge the listing adapter needs
pub trait Listing: Default + Send + Sync + 'static {
    fn type_name(&self) -> &'static str;

    /// Must declare `id`, `result` and `result_output_file`
    fn schema(&self) -> Schema;

    /// Builds the describe request for one page, filters taken from `config`
    fn page_call(
        &self,
        config: &DynamicValue,
        offset: i64,
        limit: i64,
    ) -> Result<ApiCall, ReconcileError>;

    /// Response field naming each item, hashed into the data source id
    fn item_key(&self) -> &'static str;
}

/// Everything a paginated describe returned
#[derive(Debug, Default)]
pub struct Collected {
    pub total_count: Option<i64>,
    pub items: Vec<Value>,
}

impl Collected {
    /// Values of `key` across the items, in the order returned
    pub fn ids(&self, key: &str) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| match item.get(key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// Pages through a `Result { TotalCount, Content }` describe action until a
/// short page comes back or `TotalCount` items have been seen
pub async fn collect_pages<L: Listing>(
    listing: &L,
    api: &dyn CloudApi,
    config: &ReconcilerConfig,
    query: &DynamicValue,
) -> Result<Collected, ReconcileError> {
    let mut collected = Collected::default();
    let mut offset = 0;

    loop {
        let call = listing.page_call(query, offset, PAGE_SIZE)?;
        let response = call_with_retry(api, config, &call, config.read_timeout, &[], &[]).await?;

        if collected.total_count.is_none() {
            collected.total_count = response.pointer("/Result/TotalCount").and_then(Value::as_i64);
        }
        let page = match response.pointer("/Result/Content") {
            Some(Value::Array(items)) => items.clone(),
            _ => vec![],
        };
        let page_len = page.len() as i64;
        collected.items.extend(page);
        tracing::debug!(offset, page_len, "fetched {} page", call.action);

        let exhausted = collected
            .total_count
            .is_some_and(|total| collected.items.len() as i64 >= total);
        if page_len < PAGE_SIZE || exhausted {
            break;
        }
        offset += PAGE_SIZE;
    }

    Ok(collected)
}

/// Hex SHA-256 over the ids joined with `-`
pub fn ids_hash(ids: &[String]) -> String {
    hex::encode(Sha256::digest(ids.join("-").as_bytes()))
}

/// Query attributes plus the conformed `result` and the derived `id`
pub fn listing_state(
    schema: &Schema,
    config: &DynamicValue,
    collected: &Collected,
    id: String,
) -> Result<DynamicValue, ReconcileError> {
    let raw = json!({
        "Result": [{
            "TotalCount": collected.total_count,
            "Content": collected.items,
        }],
    });
    let Dynamic::Map(fragment) = flatten::flatten(&raw) else {
        return Err(ReconcileError::Inconsistent(
            "listing result is not an object".to_string(),
        ));
    };
    let mut observed = flatten::conform(&schema.block, fragment, &[]);

    let mut state = config.clone();
    state.value.resolve_unknowns();
    if !matches!(state.value, Dynamic::Map(_)) {
        state = DynamicValue::object();
    }
    let result = match observed.remove("result") {
        Some(Dynamic::List(pages)) => pages,
        _ => vec![],
    };
    state.set_list(&AttributePath::new("result"), result)?;
    state.set_string(&AttributePath::new("id"), id)?;
    Ok(state)
}

/// Writes the `result` list of `state` to `path` as pretty JSON
pub fn write_result_file(path: &str, state: &DynamicValue) -> std::io::Result<()> {
    let result = state
        .get(&AttributePath::new("result"))
        .cloned()
        .unwrap_or(Dynamic::List(vec![]));
    let body = serde_json::to_string_pretty(&result)?;
    std::fs::write(path, body)
}

pub(crate) fn id_attribute() -> Attribute {
    AttributeBuilder::new("id", AttributeType::String)
        .description("Hash of the returned ids")
        .computed()
        .build()
}

pub(crate) fn output_file_attribute() -> Attribute {
    AttributeBuilder::new("result_output_file", AttributeType::String)
        .description("Used to save results")
        .optional()
        .build()
}

/// `result` as a one-element list of `{ total_count, content }`
pub(crate) fn result_attribute(item: AttributeType, description: &str) -> Attribute {
    let page = AttributeType::Object(
        [
            ("total_count".to_string(), AttributeType::Int),
            ("content".to_string(), AttributeType::List(Box::new(item))),
        ]
        .into_iter()
        .collect(),
    );
    AttributeBuilder::new("result", AttributeType::List(Box::new(page)))
        .description(description)
        .computed()
        .build()
}

/// Object type from `(name, type)` pairs
pub(crate) fn object(fields: &[(&str, AttributeType)]) -> AttributeType {
    AttributeType::Object(
        fields
            .iter()
            .map(|(name, ty)| (name.to_string(), ty.clone()))
            .collect(),
    )
}

pub struct ListingDataSource<L: Listing> {
    listing: L,
    schema: Schema,
    provider_data: Option<TencentCloudProviderData>,
}

impl<L: Listing> ListingDataSource<L> {
    pub fn new() -> Self {
        let listing = L::default();
        let schema = listing.schema();
        Self {
            listing,
            schema,
            provider_data: None,
        }
    }

    pub fn schema_static() -> Schema {
        L::default().schema()
    }

    async fn fetch(
        &self,
        provider_data: &TencentCloudProviderData,
        config: &DynamicValue,
    ) -> Result<DynamicValue, ReconcileError> {
        let _elapsed = ElapsedLog::new(format!("data_source.{}.read", self.listing.type_name()));
        let collected = collect_pages(
            &self.listing,
            provider_data.client.as_ref(),
            &provider_data.reconciler_config,
            config,
        )
        .await?;

        let ids = collected.ids(self.listing.item_key());
        tracing::info!(count = collected.items.len(), "read {}", self.listing.type_name());
        listing_state(&self.schema, config, &collected, ids_hash(&ids))
    }
}

impl<L: Listing> Default for ListingDataSource<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<L: Listing> DataSource for ListingDataSource<L> {
    fn type_name(&self) -> &str {
        self.listing.type_name()
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: self.schema.clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: self.schema.validate(&request.config),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                return ReadDataSourceResponse::failed(Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                ))
            }
        };

        let span = tracing::info_span!(
            "listing",
            data_source = self.listing.type_name(),
            log_id = %ctx.log_id()
        );
        let state = match self.fetch(provider_data, &request.config).instrument(span).await {
            Ok(state) => state,
            Err(e) => {
                return ReadDataSourceResponse::failed(Diagnostic::error(
                    format!("Failed to read {}", self.listing.type_name()),
                    e.to_string(),
                ))
            }
        };

        let mut diagnostics = vec![];

        let output = AttributePath::new("result_output_file");
        if let Ok(Some(path)) = state.get_opt_string(&output) {
            if let Err(e) = write_result_file(&path, &state) {
                diagnostics.push(
                    Diagnostic::error(
                        "Failed to write result file",
                        format!("{}: {}", path, e),
                    )
                    .with_attribute(output),
                );
            }
        }

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl<L: Listing> DataSourceWithConfigure for ListingDataSource<L> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<TencentCloudProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                tracing::error!("Failed to downcast provider data to TencentCloudProviderData");
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract TencentCloudProviderData from provider data",
                ));
            }
        } else {
            tracing::warn!("No provider data provided to {}", self.listing.type_name());
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the data source",
            ));
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
