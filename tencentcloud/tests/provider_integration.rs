//! Provider lifecycle against a mock TencentCloud API endpoint

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use mockito::{Matcher, Server};
use serde_json::json;
use tencentcloud::data_sources::ids_hash;
use tencentcloud::TencentCloudProvider;
use tfplug::data_source::ReadDataSourceRequest;
use tfplug::provider::ConfigureProviderRequest;
use tfplug::resource::{
    CreateResourceRequest, DeleteResourceRequest, ImportResourceStateRequest, ReadResourceRequest,
};
use tfplug::types::has_errors;
use tfplug::{AttributePath, Context, DataSource, DynamicValue, Provider, Resource, ResourceWithImportState};

async fn configured_provider(url: &str) -> TencentCloudProvider {
    let mut config = DynamicValue::object();
    for (name, value) in [
        ("secret_id", "AKIDtest"),
        ("secret_key", "secret"),
        ("region", "ap-guangzhou"),
        ("endpoint", url),
    ] {
        config
            .set_string(&AttributePath::new(name), value.to_string())
            .unwrap();
    }

    let mut provider = TencentCloudProvider::new();
    let response = provider
        .configure(Context::new(), ConfigureProviderRequest { config })
        .await;
    assert!(!has_errors(&response.diagnostics), "{:?}", response.diagnostics);
    provider
}

#[tokio::test(flavor = "multi_thread")]
async fn namespace_lifecycle_with_mock_server() {
    let mut server = Server::new_async().await;

    let create = server
        .mock("POST", "/")
        .match_header("x-tc-action", "CreateNamespace")
        .match_header("x-tc-region", "ap-guangzhou")
        .match_body(Matcher::Json(json!({"NamespaceName": "dev", "NamespaceDesc": "shared"})))
        .with_body(r#"{"Response":{"Result":"namespace-abc","RequestId":"req-1"}}"#)
        .create_async()
        .await;
    let describe = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeSimpleNamespaces")
        .match_body(Matcher::Json(json!({"NamespaceId": "namespace-abc"})))
        .with_body(
            r#"{"Response":{"Result":{"TotalCount":1,"Content":[{"NamespaceId":"namespace-abc","NamespaceName":"dev","NamespaceDesc":"shared","ClusterId":"cls-1","NamespaceType":"DEF","NamespaceStatus":"Running","DeleteFlag":true,"ClusterList":[{"ClusterId":"cls-1","ClusterName":"main"}]}]},"RequestId":"req-2"}}"#,
        )
        .expect_at_least(2)
        .create_async()
        .await;
    let delete = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DeleteNamespace")
        .match_body(Matcher::Json(json!({"NamespaceId": "namespace-abc"})))
        .with_body(r#"{"Response":{"Result":true,"RequestId":"req-3"}}"#)
        .create_async()
        .await;

    let provider = configured_provider(&server.url()).await;
    let resource = provider
        .create_resource(Context::new(), "tencentcloud_tsf_namespace")
        .await
        .unwrap();

    let mut planned = DynamicValue::object();
    planned
        .set_string(&AttributePath::new("namespace_name"), "dev".to_string())
        .unwrap();
    planned
        .set_string(&AttributePath::new("namespace_desc"), "shared".to_string())
        .unwrap();
    planned.mark_unknown(&AttributePath::new("id")).unwrap();
    planned.mark_unknown(&AttributePath::new("namespace_status")).unwrap();

    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "tencentcloud_tsf_namespace".to_string(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;
    assert!(!has_errors(&created.diagnostics), "{:?}", created.diagnostics);
    let state = created.new_state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "namespace-abc");
    assert_eq!(
        state.get_string(&AttributePath::new("namespace_status")).unwrap(),
        "Running"
    );
    assert_eq!(state.get_string(&AttributePath::new("cluster_id")).unwrap(), "cls-1");
    let clusters = state.get_list(&AttributePath::new("cluster_list")).unwrap();
    assert_eq!(clusters.len(), 1);

    let read = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "tencentcloud_tsf_namespace".to_string(),
                current_state: state.clone(),
            },
        )
        .await;
    assert!(!has_errors(&read.diagnostics));
    assert_eq!(read.new_state.unwrap(), state);

    let deleted = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "tencentcloud_tsf_namespace".to_string(),
                prior_state: state,
            },
        )
        .await;
    assert!(!has_errors(&deleted.diagnostics));

    create.assert_async().await;
    describe.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn service_errors_surface_as_diagnostics() {
    let mut server = Server::new_async().await;
    let _create = server
        .mock("POST", "/")
        .match_header("x-tc-action", "CreateLiveRecordTemplate")
        .with_body(
            r#"{"Response":{"Error":{"Code":"InvalidParameter.TemplateNameInvalid","Message":"bad name"},"RequestId":"req-1"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let provider = configured_provider(&server.url()).await;
    let resource = provider
        .create_resource(Context::new(), "tencentcloud_live_record_template")
        .await
        .unwrap();

    let mut planned = DynamicValue::object();
    planned
        .set_string(&AttributePath::new("template_name"), "bad name".to_string())
        .unwrap();

    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "tencentcloud_live_record_template".to_string(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    assert!(has_errors(&created.diagnostics));
    assert_eq!(
        created.diagnostics[0].summary,
        "Failed to create tencentcloud_live_record_template"
    );
    assert!(created.diagnostics[0]
        .detail
        .contains("InvalidParameter.TemplateNameInvalid"));
    assert!(created.new_state.is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_read_back_after_create_still_records_the_id() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/")
        .match_header("x-tc-action", "CreateGroup")
        .with_body(r#"{"Response":{"Result":"group-1","RequestId":"req-1"}}"#)
        .expect(1)
        .create_async()
        .await;
    let describe = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeGroup")
        .with_body(
            r#"{"Response":{"Error":{"Code":"UnauthorizedOperation","Message":"no read permission"},"RequestId":"req-2"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let provider = configured_provider(&server.url()).await;
    let resource = provider
        .create_resource(Context::new(), "tencentcloud_tsf_group")
        .await
        .unwrap();

    let mut planned = DynamicValue::object();
    for (name, value) in [
        ("application_id", "application-1"),
        ("namespace_id", "namespace-1"),
        ("group_name", "web"),
        ("cluster_id", "cluster-1"),
    ] {
        planned
            .set_string(&AttributePath::new(name), value.to_string())
            .unwrap();
    }
    planned.mark_unknown(&AttributePath::new("id")).unwrap();
    planned.mark_unknown(&AttributePath::new("group_status")).unwrap();

    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "tencentcloud_tsf_group".to_string(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    assert!(has_errors(&created.diagnostics));
    assert!(created.diagnostics[0].detail.contains("UnauthorizedOperation"));
    let state = created.new_state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "group-1");
    assert_eq!(state.get_string(&AttributePath::new("cluster_id")).unwrap(), "cluster-1");
    assert!(state
        .get(&AttributePath::new("group_status"))
        .is_some_and(|status| status.is_null()));

    create.assert_async().await;
    describe.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn cluster_data_source_reads_and_writes_result_file() {
    let mut server = Server::new_async().await;
    let _describe = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeClusters")
        .match_body(Matcher::Json(json!({"ClusterType": "V", "Offset": 0, "Limit": 20})))
        .with_body(
            r#"{"Response":{"Result":{"TotalCount":2,"Content":[{"ClusterId":"cls-1","ClusterName":"main","ClusterType":"V","InstanceCount":3},{"ClusterId":"cls-2","ClusterName":"spare","ClusterType":"V","InstanceCount":0}]},"RequestId":"req-1"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let provider = configured_provider(&server.url()).await;
    let data_source = provider
        .create_data_source(Context::new(), "tencentcloud_tsf_cluster")
        .await
        .unwrap();

    let output = std::env::temp_dir().join(format!("tsf-cluster-{}.json", std::process::id()));
    let mut config = DynamicValue::object();
    config
        .set_string(&AttributePath::new("cluster_type"), "V".to_string())
        .unwrap();
    config
        .set_string(
            &AttributePath::new("result_output_file"),
            output.to_string_lossy().to_string(),
        )
        .unwrap();

    let response = data_source
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "tencentcloud_tsf_cluster".to_string(),
                config,
            },
        )
        .await;
    assert!(!has_errors(&response.diagnostics), "{:?}", response.diagnostics);

    let state = response.state;
    assert_eq!(
        state.get_string(&AttributePath::new("id")).unwrap(),
        ids_hash(&["cls-1".to_string(), "cls-2".to_string()])
    );
    let result = state.get_list(&AttributePath::new("result")).unwrap();
    let page = result[0].as_map().unwrap();
    assert_eq!(page["content"].as_list().unwrap().len(), 2);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written[0]["total_count"], 2);
    assert_eq!(written[0]["content"][1]["cluster_name"], "spare");
    std::fs::remove_file(&output).unwrap();
}

#[tokio::test]
async fn import_copies_the_id() {
    let provider = configured_provider("http://127.0.0.1:9").await;
    let resource = provider
        .create_resource(Context::new(), "tencentcloud_live_callback_rule")
        .await
        .unwrap();

    let response = resource
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "tencentcloud_live_callback_rule".to_string(),
                id: "5000.livepush.myqcloud.com#live".to_string(),
            },
        )
        .await;

    assert!(!has_errors(&response.diagnostics));
    let imported = &response.imported_resources[0];
    assert_eq!(
        imported.state.get_string(&AttributePath::new("id")).unwrap(),
        "5000.livepush.myqcloud.com#live"
    );
}
