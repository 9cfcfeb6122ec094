//! Parameter and result types for the task API, plus the wire shapes
//! they serialize into.

use crate::error::Error;
use crate::hash::base64_decode;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Parameters for submitting a text-to-image generation task.
#[derive(Debug, Clone, Default)]
pub struct SubmitTaskParams {
    /// Prompt text describing the image to generate.
    pub prompt: String,
    /// Whether the service expands the prompt with its rewriter model.
    /// Defaults to `true`.
    pub use_pre_llm: Option<bool>,
    /// Generation seed. Defaults to `-1`, which asks the service to pick
    /// one.
    pub seed: Option<i64>,
    /// Output width in pixels. Only sent when `height` is present too.
    pub width: Option<u32>,
    /// Output height in pixels. Only sent when `width` is present too.
    pub height: Option<u32>,
}

impl SubmitTaskParams {
    /// Create parameters with the given prompt and all defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Watermark options, forwarded verbatim inside the nested `req_json`
/// field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogoInfo {
    /// Whether to stamp a logo onto the generated images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_logo: Option<bool>,
    /// Logo position code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    /// Logo language code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<i32>,
    /// Logo opacity, 0.0 to 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// Custom logo text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_text_content: Option<String>,
}

/// Parameters for a single result query.
#[derive(Debug, Clone, Default)]
pub struct GetTaskResultParams {
    /// Identifier returned by task submission.
    pub task_id: String,
    /// Ask the service for image URLs instead of inline base64 data.
    pub return_url: Option<bool>,
    /// Watermark options.
    pub logo_info: Option<LogoInfo>,
}

impl GetTaskResultParams {
    /// Create parameters for the given task with all defaults.
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }
}

/// Parameters for the bounded polling loop.
#[derive(Debug, Clone, Default)]
pub struct PollTaskParams {
    /// Identifier returned by task submission.
    pub task_id: String,
    /// Ask the service for image URLs instead of inline base64 data.
    pub return_url: Option<bool>,
    /// Watermark options.
    pub logo_info: Option<LogoInfo>,
    /// Overall polling budget. Defaults to 300 seconds.
    pub max_polling_time: Option<Duration>,
    /// Wait between poll attempts. Defaults to 3 seconds.
    pub polling_interval: Option<Duration>,
}

impl PollTaskParams {
    /// Create parameters for the given task with all defaults.
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }
}

/// Submission handle, the only state carried between submit and poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Identifier of the generation task.
    pub task_id: String,
    /// Request id of the submission call, for correlation with
    /// provider-side logs.
    pub request_id: String,
}

/// Status reported by the service for a generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting for a worker.
    InQueue,
    /// Generation in progress.
    Generating,
    /// Generation finished. Terminal.
    Done,
    /// The task does not exist. Terminal.
    NotFound,
    /// The task's result fell out of the retention window. Terminal.
    Expired,
}

impl TaskStatus {
    /// The wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InQueue => "in_queue",
            TaskStatus::Generating => "generating",
            TaskStatus::Done => "done",
            TaskStatus::NotFound => "not_found",
            TaskStatus::Expired => "expired",
        }
    }

    /// Whether no further polling happens after this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Done | TaskStatus::NotFound | TaskStatus::Expired
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_queue" => Ok(TaskStatus::InQueue),
            "generating" => Ok(TaskStatus::Generating),
            "done" => Ok(TaskStatus::Done),
            "not_found" => Ok(TaskStatus::NotFound),
            "expired" => Ok(TaskStatus::Expired),
            other => Err(Error::malformed_response(format!(
                "unknown task status {other:?}"
            ))),
        }
    }
}

/// Outcome of a task query.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Status reported by the service.
    pub status: TaskStatus,
    /// Identifier of the queried task.
    pub task_id: String,
    /// Request id of the query call.
    pub request_id: String,
    /// Envelope code of the query call.
    pub status_code: Option<i64>,
    /// Envelope message of the query call, when present.
    pub status_message: Option<String>,
    /// Generated image URLs, populated on successful completion when
    /// `return_url` was requested.
    pub image_urls: Option<Vec<String>>,
    /// Generated images as base64 strings, populated on successful
    /// completion.
    pub binary_images: Option<Vec<String>>,
}

impl TaskResult {
    /// Whether the result carries any image output.
    pub fn has_output(&self) -> bool {
        self.image_urls.as_ref().is_some_and(|v| !v.is_empty())
            || self.binary_images.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Decode the base64 image payloads into raw bytes, preserving order.
    pub fn decode_binary_images(&self) -> crate::Result<Vec<Vec<u8>>> {
        self.binary_images
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|s| base64_decode(s))
            .collect()
    }
}

// ---------------------------------------------------------------------
// Wire shapes. Field order in the serialized bodies follows the remote
// API examples.
// ---------------------------------------------------------------------

/// Response envelope shared by all CV operations.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitTaskBody<'a> {
    pub req_key: &'static str,
    pub prompt: &'a str,
    pub use_pre_llm: bool,
    pub seed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitTaskData {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetResultBody<'a> {
    pub req_key: &'static str,
    pub task_id: &'a str,
    // The service expects the nested options as a JSON-encoded string,
    // not as a nested object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_json: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct ReqJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_info: Option<&'a LogoInfo>,
}

impl ReqJson<'_> {
    pub(crate) fn is_empty(&self) -> bool {
        self.return_url.is_none() && self.logo_info.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResultData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub binary_data_base64: Option<Vec<String>>,
}
