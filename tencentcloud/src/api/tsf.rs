//! TSF (Tencent Service Framework) API actions

use serde::{Deserialize, Serialize};

use super::{integer_string, single_block};

pub const CREATE_NAMESPACE: &str = "CreateNamespace";
pub const DESCRIBE_SIMPLE_NAMESPACES: &str = "DescribeSimpleNamespaces";
pub const MODIFY_NAMESPACE: &str = "ModifyNamespace";
pub const DELETE_NAMESPACE: &str = "DeleteNamespace";

pub const CREATE_GROUP: &str = "CreateGroup";
pub const DESCRIBE_GROUP: &str = "DescribeGroup";
pub const MODIFY_GROUP: &str = "ModifyGroup";
pub const DELETE_GROUP: &str = "DeleteGroup";

pub const CREATE_API_GROUP: &str = "CreateApiGroup";
pub const DESCRIBE_API_GROUP: &str = "DescribeApiGroup";
pub const UPDATE_API_GROUP: &str = "UpdateApiGroup";
pub const DELETE_API_GROUP: &str = "DeleteApiGroup";

pub const DESCRIBE_CLUSTERS: &str = "DescribeClusters";
pub const DESCRIBE_GROUP_INSTANCES: &str = "DescribeGroupInstances";

pub const CREATE_CONTAIN_GROUP: &str = "CreateContainGroup";
pub const DESCRIBE_CONTAINER_GROUP_DETAIL: &str = "DescribeContainerGroupDetail";
pub const MODIFY_CONTAINER_GROUP: &str = "ModifyContainerGroup";
pub const DELETE_CONTAINER_GROUP: &str = "DeleteContainerGroup";

pub const ADD_INSTANCES: &str = "AddInstances";
pub const DESCRIBE_CLUSTER_INSTANCES: &str = "DescribeClusterInstances";
pub const REMOVE_INSTANCES: &str = "RemoveInstances";

pub const CREATE_TASK: &str = "CreateTask";
pub const DESCRIBE_TASK_DETAIL: &str = "DescribeTaskDetail";
pub const MODIFY_TASK: &str = "ModifyTask";
pub const DELETE_TASK: &str = "DeleteTask";

/// Page size of the cluster instance listing
pub const CLUSTER_INSTANCES_PAGE: i64 = 20;

/// Create and modify share one shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct NamespaceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ha_enable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamespaceIdRequest {
    pub namespace_id: String,
}

/// Create and modify share one shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct GroupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Addresses a deployment group or an API group
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupIdRequest {
    pub group_id: String,
}

/// Create and update share one shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct ApiGroupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_name_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_name_key_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name_key_position: Option<String>,
}

/// Cluster listing filters; paging fields are filled in by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct DescribeClustersRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_program_auth_check: Option<bool>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct DescribeGroupInstancesRequest {
    #[serde(default)]
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<i64>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
}

/// A zero or negative node port means "let the cluster pick one"
fn unassigned_port(port: &Option<i64>) -> bool {
    !port.is_some_and(|port| port > 0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct ProtocolPort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<i64>,
    #[serde(default, skip_serializing_if = "unassigned_port")]
    pub node_port: Option<i64>,
}

/// Create and modify share one shape; `group_id` is only sent on modify
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct ContainGroupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_num: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_ports: Option<Vec<ProtocolPort>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_ivl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_cpu_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_cpu_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_mem_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_mem_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub istio_cpu_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub istio_cpu_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub istio_mem_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub istio_mem_limit: Option<String>,
}

/// Imports cloud hosts into a cluster; state names one `instance_id`, the
/// caller fills `instance_id_list` from it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct AddInstancesRequest {
    pub cluster_id: String,
    #[serde(default, skip_deserializing)]
    pub instance_id_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_import_mode: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoveInstancesRequest {
    pub cluster_id: String,
    pub instance_id_list: Vec<String>,
}

/// One page of a cluster's instances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeClusterInstancesRequest {
    pub cluster_id: String,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct TaskRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct ShardArgument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_key: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct AdvanceSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_task_concurrency: Option<i64>,
}

/// Create and modify share one shape; `task_id` is only sent on modify
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct TaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_out: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub task_rule: Option<TaskRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_arguments: Option<Vec<ShardArgument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_operator: Option<String>,
    #[serde(default, deserialize_with = "integer_string", skip_serializing_if = "Option::is_none")]
    pub success_ratio: Option<i64>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub advance_settings: Option<AdvanceSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_argument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskIdRequest {
    pub task_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_optionals_are_omitted_not_zeroed() {
        let state = json!({
            "application_id": "application-1",
            "namespace_id": "namespace-1",
            "group_name": "web",
            "cluster_id": "cluster-1",
            "group_desc": null,
            "group_resource_type": "DEF",
            "group_status": "Running",
        });

        let request: GroupRequest = serde_json::from_value(state).unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "ApplicationId": "application-1",
                "NamespaceId": "namespace-1",
                "GroupName": "web",
                "ClusterId": "cluster-1",
                "GroupResourceType": "DEF",
            })
        );
    }

    #[test]
    fn paging_fields_are_always_sent() {
        let request = DescribeGroupInstancesRequest {
            group_id: "group-1".to_string(),
            limit: 20,
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"GroupId": "group-1", "Offset": 0, "Limit": 20})
        );
    }

    #[test]
    fn node_port_is_only_sent_when_assigned() {
        let ports: Vec<ProtocolPort> = serde_json::from_value(json!([
            {"protocol": "TCP", "port": 80, "target_port": 8080, "node_port": 0},
            {"protocol": "TCP", "port": 443, "target_port": 8443, "node_port": 30443},
        ]))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&ports).unwrap(),
            json!([
                {"Protocol": "TCP", "Port": 80, "TargetPort": 8080},
                {"Protocol": "TCP", "Port": 443, "TargetPort": 8443, "NodePort": 30443},
            ])
        );
    }

    #[test]
    fn task_blocks_and_ratio_take_the_api_shape() {
        let state = json!({
            "task_name": "nightly",
            "task_rule": [{"rule_type": "Cron", "expression": "0 0 2 * * ?"}],
            "success_ratio": "100",
            "advance_settings": [],
            "task_state": "ENABLED",
        });

        let request: TaskRequest = serde_json::from_value(state).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "TaskName": "nightly",
                "TaskRule": {"RuleType": "Cron", "Expression": "0 0 2 * * ?"},
                "SuccessRatio": 100,
            })
        );
    }
}
