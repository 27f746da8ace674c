//! Live (video streaming) API actions
//!
//! Request structs serialize in the API's PascalCase and deserialize from the
//! snake_case attribute names of Terraform state, so a resource's desired
//! state converts into a request without per-field copying.

use serde::{Deserialize, Serialize};

use super::single_block;

pub const CREATE_LIVE_CALLBACK_RULE: &str = "CreateLiveCallbackRule";
pub const DESCRIBE_LIVE_CALLBACK_RULES: &str = "DescribeLiveCallbackRules";
pub const DELETE_LIVE_CALLBACK_RULE: &str = "DeleteLiveCallbackRule";

pub const CREATE_LIVE_CALLBACK_TEMPLATE: &str = "CreateLiveCallbackTemplate";
pub const DESCRIBE_LIVE_CALLBACK_TEMPLATE: &str = "DescribeLiveCallbackTemplate";
pub const MODIFY_LIVE_CALLBACK_TEMPLATE: &str = "ModifyLiveCallbackTemplate";
pub const DELETE_LIVE_CALLBACK_TEMPLATE: &str = "DeleteLiveCallbackTemplate";

pub const CREATE_LIVE_RECORD_TEMPLATE: &str = "CreateLiveRecordTemplate";
pub const DESCRIBE_LIVE_RECORD_TEMPLATE: &str = "DescribeLiveRecordTemplate";
pub const MODIFY_LIVE_RECORD_TEMPLATE: &str = "ModifyLiveRecordTemplate";
pub const DELETE_LIVE_RECORD_TEMPLATE: &str = "DeleteLiveRecordTemplate";

pub const CREATE_LIVE_STREAM_MONITOR: &str = "CreateLiveStreamMonitor";
pub const DESCRIBE_LIVE_STREAM_MONITOR: &str = "DescribeLiveStreamMonitor";
pub const MODIFY_LIVE_STREAM_MONITOR: &str = "ModifyLiveStreamMonitor";
pub const DELETE_LIVE_STREAM_MONITOR: &str = "DeleteLiveStreamMonitor";

/// Binds a callback template to a push domain and app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct CallbackRuleRequest {
    pub domain_name: String,
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
}

/// Lists every callback rule of the account
#[derive(Debug, Clone, Default, Serialize)]
pub struct DescribeLiveCallbackRulesRequest {}

/// Create and modify share one shape; `template_id` is only sent on modify
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct CallbackTemplateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_begin_notify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_end_notify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_notify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_notify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub porn_censorship_notify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_mix_notify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_exception_notify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_audit_notify_url: Option<String>,
}

/// Addresses a callback or record template
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateIdRequest {
    pub template_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct RecordParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vod_sub_app_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vod_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct HlsSpecialParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_continue_duration: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct FlvSpecialParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_in_recording: Option<bool>,
}

/// Create and modify share one shape; `template_id` is only sent on modify
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct RecordTemplateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub flv_param: Option<RecordParam>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub hls_param: Option<RecordParam>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub mp4_param: Option<RecordParam>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub aac_param: Option<RecordParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_delay_live: Option<i64>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub hls_special_param: Option<HlsSpecialParam>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub mp3_param: Option<RecordParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_watermark: Option<bool>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub flv_special_param: Option<FlvSpecialParam>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct MonitorOutputInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_stream_width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_stream_height: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_stream_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_app: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct MonitorInputInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_stream_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct MonitorNotifyPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_policy_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// Create and modify share one shape; `monitor_id` is only sent on modify
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct StreamMonitorRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<String>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub output_info: Option<MonitorOutputInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_list: Option<Vec<MonitorInputInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_name: Option<String>,
    #[serde(default, deserialize_with = "single_block", skip_serializing_if = "Option::is_none")]
    pub notify_policy: Option<MonitorNotifyPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asr_language: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_language: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_asr_input_index_list: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_ocr_input_index_list: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_stream_broken: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_stream_low_frame_rate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_monitor_report: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_format_diagnose: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitorIdRequest {
    pub monitor_id: String,
}
