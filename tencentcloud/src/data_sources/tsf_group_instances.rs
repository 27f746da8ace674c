//! Instances of a TSF deployment group

use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::validator::IntRangeValidator;
use tfplug::DynamicValue;

use super::{id_attribute, object, output_file_attribute, result_attribute, Listing};
use crate::api::tsf::{DescribeGroupInstancesRequest, DESCRIBE_GROUP_INSTANCES};
use crate::api::{ApiCall, Service};
use crate::reconcile::{request_from_state, ReconcileError};

pub const TYPE_NAME: &str = "tencentcloud_tsf_group_instances";

fn instance() -> AttributeType {
    let strings = [
        "instance_id",
        "instance_name",
        "lan_ip",
        "wan_ip",
        "instance_desc",
        "cluster_id",
        "cluster_name",
        "instance_status",
        "instance_available_status",
        "service_instance_status",
        "group_id",
        "application_id",
        "application_name",
        "instance_created_time",
        "instance_expired_time",
        "instance_charge_type",
        "instance_pkg_version",
        "cluster_type",
        "restrict_state",
        "update_time",
        "namespace_id",
        "instance_zone_id",
        "instance_import_mode",
        "application_type",
        "application_resource_type",
        "service_sidecar_status",
        "group_name",
        "namespace_name",
        "reason",
        "agent_version",
        "node_instance_id",
    ];
    let floats = [
        "instance_total_cpu",
        "instance_total_mem",
        "instance_used_cpu",
        "instance_used_mem",
        "instance_limit_cpu",
        "instance_limit_mem",
    ];

    let mut fields: Vec<(&str, AttributeType)> = strings
        .iter()
        .map(|name| (*name, AttributeType::String))
        .chain(floats.iter().map(|name| (*name, AttributeType::Float)))
        .collect();
    fields.push(("count_in_tsf", AttributeType::Int));
    fields.push(("operation_state", AttributeType::Int));

    object(&fields)
}

#[derive(Default)]
pub struct TsfGroupInstances;

impl Listing for TsfGroupInstances {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Lists the machine instances of a TSF deployment group")
            .attribute(id_attribute())
            .attribute(
                AttributeBuilder::new("group_id", AttributeType::String)
                    .description("Group id")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("search_word", AttributeType::String)
                    .description("Search keyword")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("order_by", AttributeType::String)
                    .description("Field to sort by")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("order_type", AttributeType::Int)
                    .description("0 for ascending, 1 for descending")
                    .optional()
                    .validator(IntRangeValidator::new(Some(0), Some(1)))
                    .build(),
            )
            .attribute(result_attribute(instance(), "Paginated instance information"))
            .attribute(output_file_attribute())
            .build()
    }

    fn page_call(
        &self,
        config: &DynamicValue,
        offset: i64,
        limit: i64,
    ) -> Result<ApiCall, ReconcileError> {
        let mut request: DescribeGroupInstancesRequest = request_from_state(
            config,
            Some(&["group_id", "search_word", "order_by", "order_type"]),
        )?;
        request.offset = offset;
        request.limit = limit;
        Ok(ApiCall::new(Service::Tsf, DESCRIBE_GROUP_INSTANCES, &request)?)
    }

    fn item_key(&self) -> &'static str {
        "InstanceId"
    }
}
