//! TSF clusters

use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::DynamicValue;

use super::{id_attribute, object, output_file_attribute, result_attribute, Listing};
use crate::api::tsf::{DescribeClustersRequest, DESCRIBE_CLUSTERS};
use crate::api::{ApiCall, Service};
use crate::reconcile::{request_from_state, ReconcileError};

pub const TYPE_NAME: &str = "tencentcloud_tsf_cluster";

/// `{ disabled_reason, enabled, supported }`, shared by each operation entry
fn operation() -> AttributeType {
    AttributeType::List(Box::new(object(&[
        ("disabled_reason", AttributeType::String),
        ("enabled", AttributeType::Bool),
        ("supported", AttributeType::Bool),
    ])))
}

fn cluster() -> AttributeType {
    let operation_info = object(&[
        ("init", operation()),
        ("add_instance", operation()),
        ("destroy", operation()),
    ]);

    object(&[
        ("cluster_id", AttributeType::String),
        ("cluster_name", AttributeType::String),
        ("cluster_desc", AttributeType::String),
        ("cluster_type", AttributeType::String),
        ("vpc_id", AttributeType::String),
        ("cluster_status", AttributeType::String),
        ("cluster_cidr", AttributeType::String),
        ("cluster_total_cpu", AttributeType::Float),
        ("cluster_total_mem", AttributeType::Float),
        ("cluster_used_cpu", AttributeType::Float),
        ("cluster_used_mem", AttributeType::Float),
        ("instance_count", AttributeType::Int),
        ("run_instance_count", AttributeType::Int),
        ("normal_instance_count", AttributeType::Int),
        ("delete_flag", AttributeType::Bool),
        ("create_time", AttributeType::String),
        ("update_time", AttributeType::String),
        ("tsf_region_id", AttributeType::String),
        ("tsf_region_name", AttributeType::String),
        ("tsf_zone_id", AttributeType::String),
        ("tsf_zone_name", AttributeType::String),
        ("delete_flag_reason", AttributeType::String),
        ("cluster_limit_cpu", AttributeType::Float),
        ("cluster_limit_mem", AttributeType::Float),
        ("run_service_instance_count", AttributeType::Int),
        ("subnet_id", AttributeType::String),
        (
            "operation_info",
            AttributeType::List(Box::new(operation_info)),
        ),
        ("cluster_version", AttributeType::String),
    ])
}

#[derive(Default)]
pub struct TsfCluster;

impl Listing for TsfCluster {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Lists TSF clusters")
            .attribute(id_attribute())
            .attribute(
                AttributeBuilder::new(
                    "cluster_id_list",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .description("Cluster ids to look up")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("cluster_type", AttributeType::String)
                    .description("C for container clusters, V for virtual machine clusters")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("search_word", AttributeType::String)
                    .description("Matches cluster ids and names")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("disable_program_auth_check", AttributeType::Bool)
                    .description("Whether to skip the dataset permission check")
                    .optional()
                    .build(),
            )
            .attribute(result_attribute(cluster(), "Paginated cluster information"))
            .attribute(output_file_attribute())
            .build()
    }

    fn page_call(
        &self,
        config: &DynamicValue,
        offset: i64,
        limit: i64,
    ) -> Result<ApiCall, ReconcileError> {
        let mut request: DescribeClustersRequest = request_from_state(
            config,
            Some(&[
                "cluster_id_list",
                "cluster_type",
                "search_word",
                "disable_program_auth_check",
            ]),
        )?;
        request.offset = offset;
        request.limit = limit;
        Ok(ApiCall::new(Service::Tsf, DESCRIBE_CLUSTERS, &request)?)
    }

    fn item_key(&self) -> &'static str {
        "ClusterId"
    }
}
