//! Task submission and polling on top of the signer.

use crate::constants::{
    ACTION_GET_RESULT, ACTION_SUBMIT_TASK, API_VERSION, DEFAULT_MAX_POLLING_TIME,
    DEFAULT_POLLING_INTERVAL, REGION, REQ_KEY, RESULT_RETENTION_HOURS, SERVICE, SUCCESS_CODE,
};
use crate::credential::Credential;
use crate::error::Error;
use crate::http::{HttpSend, ReqwestHttpSend};
use crate::sign::Signer;
use crate::types::{
    Envelope, GetResultBody, GetTaskResultParams, PollTaskParams, ReqJson, SubmitTaskBody,
    SubmitTaskParams, SubmitTaskData, Task, TaskResult, TaskResultData, TaskStatus,
};
use bytes::Bytes;
use http::Method;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tokio::time::{sleep, Instant};

/// Progress sink invoked with human-readable status lines while polling.
///
/// No contract beyond "called zero or more times before a terminal
/// outcome".
pub type ProgressFn<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Client for the asynchronous CV image generation API.
///
/// Holds nothing mutable beyond the immutable credential pair, so one
/// instance (or cheap clones of it) can drive many independent tasks
/// concurrently.
#[derive(Clone)]
pub struct TaskClient {
    credential: Credential,
    signer: Signer,
    http: Arc<dyn HttpSend>,
}

impl Debug for TaskClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("credential", &self.credential)
            .field("signer", &self.signer)
            .finish()
    }
}

impl TaskClient {
    /// Create a client against the production endpoint.
    pub fn new(credential: Credential) -> Self {
        Self::with_http_send(credential, ReqwestHttpSend::default())
    }

    /// Create a client with a custom transport.
    pub fn with_http_send(credential: Credential, http: impl HttpSend) -> Self {
        Self {
            credential,
            signer: Signer::default(),
            http: Arc::new(http),
        }
    }

    /// Override the endpoint host. Signing follows the new host.
    pub fn with_endpoint(mut self, host: &str) -> Self {
        self.signer = Signer::new(host, REGION, SERVICE);
        self
    }

    /// Sign and send one JSON POST request, returning the parsed
    /// response envelope.
    async fn send_request<T: DeserializeOwned>(
        &self,
        query: &[(&str, &str)],
        payload: String,
    ) -> crate::Result<Envelope<T>> {
        if !self.credential.is_valid() {
            return Err(Error::credential_invalid(
                "access key id and secret access key must be non-empty",
            ));
        }

        let signed = self
            .signer
            .sign(&self.credential, &Method::POST, "/", query, &payload)?;

        let uri = if signed.query_string.is_empty() {
            format!("https://{}/", self.signer.host())
        } else {
            format!("https://{}/?{}", self.signer.host(), signed.query_string)
        };

        let mut req = http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Bytes::from(payload))?;
        *req.headers_mut() = signed.headers;

        let resp = self.http.http_send(req).await?;

        let status = resp.status();
        let body = resp.into_body();
        if !status.is_success() {
            return Err(Error::protocol(format!(
                "unexpected http status {status}: {}",
                body_excerpt(&body)
            )));
        }

        serde_json::from_slice(&body).map_err(|e| {
            Error::protocol(format!(
                "failed to parse response body: {}",
                body_excerpt(&body)
            ))
            .with_source(e)
        })
    }

    /// Submit a generation task.
    ///
    /// Returns the handle carried into [`poll_task_result`][Self::poll_task_result].
    pub async fn submit_task(&self, params: &SubmitTaskParams) -> crate::Result<Task> {
        self.submit_task_inner(params)
            .await
            .map_err(|e| e.context("submit task"))
    }

    async fn submit_task_inner(&self, params: &SubmitTaskParams) -> crate::Result<Task> {
        let body = SubmitTaskBody {
            req_key: REQ_KEY,
            prompt: &params.prompt,
            use_pre_llm: params.use_pre_llm.unwrap_or(true),
            seed: params.seed.unwrap_or(-1),
            // Width and height only travel together.
            width: params.height.and(params.width),
            height: params.width.and(params.height),
        };
        let payload = serde_json::to_string(&body)
            .map_err(|e| Error::request_invalid("failed to serialize request body").with_source(e))?;

        let envelope: Envelope<SubmitTaskData> = self
            .send_request(
                &[("Action", ACTION_SUBMIT_TASK), ("Version", API_VERSION)],
                payload,
            )
            .await?;
        ensure_success(&envelope)?;

        let task_id = envelope
            .data
            .and_then(|d| d.task_id)
            .ok_or_else(|| Error::malformed_response("success envelope is missing task_id"))?;
        debug!("submitted task {task_id}");

        Ok(Task {
            task_id,
            request_id: envelope.request_id.unwrap_or_default(),
        })
    }

    /// Query the current result of a task once.
    ///
    /// A `done` status without any image output is reported as a
    /// [`TaskFailed`](crate::ErrorKind::TaskFailed) error, never accepted
    /// silently.
    pub async fn get_task_result(
        &self,
        params: &GetTaskResultParams,
    ) -> crate::Result<TaskResult> {
        self.get_task_result_inner(params)
            .await
            .map_err(|e| e.context("query task result"))
    }

    async fn get_task_result_inner(
        &self,
        params: &GetTaskResultParams,
    ) -> crate::Result<TaskResult> {
        let req_json = ReqJson {
            return_url: params.return_url,
            logo_info: params.logo_info.as_ref(),
        };
        let req_json = if req_json.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&req_json).map_err(|e| {
                Error::request_invalid("failed to serialize req_json").with_source(e)
            })?)
        };

        let body = GetResultBody {
            req_key: REQ_KEY,
            task_id: &params.task_id,
            req_json,
        };
        let payload = serde_json::to_string(&body)
            .map_err(|e| Error::request_invalid("failed to serialize request body").with_source(e))?;

        let envelope: Envelope<TaskResultData> = self
            .send_request(
                &[("Action", ACTION_GET_RESULT), ("Version", API_VERSION)],
                payload,
            )
            .await?;
        ensure_success(&envelope)?;

        let data = envelope
            .data
            .ok_or_else(|| Error::malformed_response("success envelope is missing data"))?;
        let status = data
            .status
            .as_deref()
            .ok_or_else(|| Error::malformed_response("success envelope is missing status"))?
            .parse::<TaskStatus>()?;

        let result = TaskResult {
            status,
            task_id: params.task_id.clone(),
            request_id: envelope.request_id.unwrap_or_default(),
            status_code: Some(envelope.code),
            status_message: envelope.message,
            image_urls: data.image_urls,
            binary_images: data.binary_data_base64,
        };

        if status == TaskStatus::Done && !result.has_output() {
            return Err(Error::task_failed(format!(
                "task {} completed but produced no image output",
                params.task_id
            )));
        }

        Ok(result)
    }

    /// Poll until the task reaches a terminal state or the polling budget
    /// elapses.
    ///
    /// Transient transport failures during a poll are logged and retried
    /// within the budget; every other failure aborts the loop
    /// immediately. The wait between attempts is a non-blocking
    /// suspension point, so unrelated work in the same runtime keeps
    /// running.
    pub async fn poll_task_result(
        &self,
        params: &PollTaskParams,
        on_progress: Option<ProgressFn<'_>>,
    ) -> crate::Result<TaskResult> {
        let max_polling_time = params.max_polling_time.unwrap_or(DEFAULT_MAX_POLLING_TIME);
        let polling_interval = params.polling_interval.unwrap_or(DEFAULT_POLLING_INTERVAL);
        let start = Instant::now();
        let mut attempts: u32 = 0;

        let progress = |message: &str| {
            if let Some(f) = on_progress {
                f(message)
            }
        };

        progress(&format!(
            "polling task {} (budget {}s, interval {}s)",
            params.task_id,
            max_polling_time.as_secs_f64(),
            polling_interval.as_secs_f64()
        ));

        let query = GetTaskResultParams {
            task_id: params.task_id.clone(),
            return_url: params.return_url,
            logo_info: params.logo_info.clone(),
        };

        while start.elapsed() < max_polling_time {
            attempts += 1;
            let elapsed = start.elapsed().as_secs();
            debug!(
                "poll attempt {attempts} for task {} ({elapsed}s elapsed)",
                params.task_id
            );

            match self.get_task_result(&query).await {
                Ok(result) => match result.status {
                    TaskStatus::Done => {
                        return if result.status_code == Some(SUCCESS_CODE) {
                            progress(&format!(
                                "task {} done after {attempts} queries ({elapsed}s)",
                                params.task_id
                            ));
                            Ok(result)
                        } else {
                            let code = result.status_code.unwrap_or_default();
                            let message =
                                result.status_message.as_deref().unwrap_or("unknown error");
                            Err(Error::task_failed(format!(
                                "image generation failed [{code}]: {message}"
                            )))
                        };
                    }
                    TaskStatus::NotFound => {
                        return Err(Error::task_not_found(format!(
                            "task {} not found",
                            params.task_id
                        )))
                    }
                    TaskStatus::Expired => {
                        return Err(Error::task_expired(format!(
                            "task {} expired, results are retained for {RESULT_RETENTION_HOURS} hours",
                            params.task_id
                        )))
                    }
                    TaskStatus::InQueue | TaskStatus::Generating => {
                        progress(&format!(
                            "task {} is {}, retrying in {}s",
                            params.task_id,
                            result.status,
                            polling_interval.as_secs_f64()
                        ));
                        sleep(polling_interval).await;
                    }
                },
                Err(e) if e.is_retryable() => {
                    warn!("transient failure while polling task {}: {e}", params.task_id);
                    progress(&format!("query failed ({e}), retrying"));
                    sleep(polling_interval).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::poll_timeout(format!(
            "task {} did not complete within {}s ({attempts} queries), raise the polling budget or query the result later",
            params.task_id,
            start.elapsed().as_secs()
        )))
    }
}

fn ensure_success<T>(envelope: &Envelope<T>) -> crate::Result<()> {
    if envelope.code != SUCCESS_CODE {
        let message = envelope.message.as_deref().unwrap_or("unknown error");
        let mut rendered = format!("service returned [{}]: {message}", envelope.code);
        if let Some(id) = &envelope.request_id {
            rendered.push_str(&format!(" (request id: {id})"));
        }
        return Err(Error::api(rendered));
    }
    Ok(())
}

/// First 200 characters of the body, for diagnostics.
fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use ::http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
    use ::http::{HeaderMap, Request, Response};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted transport: pops one canned response per request and
    /// records everything it was asked to send.
    #[derive(Debug, Default)]
    struct MockHttpSend {
        requests: Mutex<Vec<(String, HeaderMap, Bytes)>>,
        responses: Mutex<VecDeque<crate::Result<Response<Bytes>>>>,
    }

    impl MockHttpSend {
        fn with_responses(
            responses: Vec<crate::Result<Response<Bytes>>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request_uri(&self, idx: usize) -> String {
            self.requests.lock().unwrap()[idx].0.clone()
        }

        fn request_headers(&self, idx: usize) -> HeaderMap {
            self.requests.lock().unwrap()[idx].1.clone()
        }

        fn request_body(&self, idx: usize) -> Value {
            let requests = self.requests.lock().unwrap();
            serde_json::from_slice(&requests[idx].2).expect("request body must be json")
        }
    }

    #[async_trait]
    impl HttpSend for Arc<MockHttpSend> {
        async fn http_send(
            &self,
            req: Request<Bytes>,
        ) -> crate::Result<Response<Bytes>> {
            let (parts, body) = req.into_parts();
            self.requests
                .lock()
                .unwrap()
                .push((parts.uri.to_string(), parts.headers, body));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("mock transport ran out of responses")
        }
    }

    fn ok_json(body: &str) -> crate::Result<Response<Bytes>> {
        response(200, body)
    }

    fn response(status: u16, body: &str) -> crate::Result<Response<Bytes>> {
        Ok(Response::builder()
            .status(status)
            .body(Bytes::from(body.to_string()))
            .expect("response must build"))
    }

    fn client_with(mock: &Arc<MockHttpSend>) -> TaskClient {
        let _ = env_logger::builder().is_test(true).try_init();
        TaskClient::with_http_send(Credential::new("ak", "sk"), Arc::clone(mock))
    }

    fn status_body(status: &str) -> crate::Result<Response<Bytes>> {
        ok_json(&format!(
            r#"{{"code":10000,"message":"Success","request_id":"rid","data":{{"status":"{status}"}}}}"#
        ))
    }

    fn done_body() -> crate::Result<Response<Bytes>> {
        ok_json(
            r#"{"code":10000,"message":"Success","request_id":"rid","data":{"status":"done","image_urls":["https://example.com/1.png"]}}"#,
        )
    }

    #[tokio::test]
    async fn test_submit_task_sends_default_body() {
        let mock = MockHttpSend::with_responses(vec![ok_json(
            r#"{"code":10000,"message":"Success","request_id":"rid","data":{"task_id":"tid"}}"#,
        )]);
        let client = client_with(&mock);

        let task = client
            .submit_task(&SubmitTaskParams::new("测试"))
            .await
            .expect("submit must succeed");

        assert_eq!(
            task,
            Task {
                task_id: "tid".to_string(),
                request_id: "rid".to_string(),
            }
        );
        assert_eq!(
            mock.request_uri(0),
            "https://visual.volcengineapi.com/?Action=CVSync2AsyncSubmitTask&Version=2022-08-31"
        );

        let headers = mock.request_headers(0);
        assert_eq!(headers[HOST], "visual.volcengineapi.com");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(headers.contains_key("x-date"));
        assert!(headers.contains_key("x-content-sha256"));
        let authorization = headers[AUTHORIZATION]
            .to_str()
            .expect("authorization must be ascii");
        assert!(
            authorization.starts_with("HMAC-SHA256 Credential=ak/"),
            "{authorization}"
        );

        assert_eq!(
            mock.request_body(0),
            json!({
                "req_key": "jimeng_t2i_v31",
                "prompt": "测试",
                "use_pre_llm": true,
                "seed": -1,
            })
        );
    }

    #[tokio::test]
    async fn test_submit_task_sends_size_only_when_both_present() {
        let mock = MockHttpSend::with_responses(vec![
            ok_json(r#"{"code":10000,"request_id":"r","data":{"task_id":"t"}}"#),
            ok_json(r#"{"code":10000,"request_id":"r","data":{"task_id":"t"}}"#),
        ]);
        let client = client_with(&mock);

        let mut params = SubmitTaskParams::new("prompt");
        params.width = Some(512);
        client.submit_task(&params).await.expect("submit must succeed");

        params.height = Some(768);
        client.submit_task(&params).await.expect("submit must succeed");

        let lone_width = mock.request_body(0);
        assert!(lone_width.get("width").is_none(), "{lone_width}");
        assert!(lone_width.get("height").is_none(), "{lone_width}");

        let both = mock.request_body(1);
        assert_eq!(both["width"], json!(512));
        assert_eq!(both["height"], json!(768));
    }

    #[tokio::test]
    async fn test_submit_task_surfaces_remote_error() {
        let mock = MockHttpSend::with_responses(vec![ok_json(
            r#"{"code":50411,"message":"prompt blocked","request_id":"rid"}"#,
        )]);
        let client = client_with(&mock);

        let err = client
            .submit_task(&SubmitTaskParams::new("prompt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        let rendered = err.to_string();
        assert!(rendered.starts_with("submit task:"), "{rendered}");
        assert!(rendered.contains("50411"), "{rendered}");
        assert!(rendered.contains("prompt blocked"), "{rendered}");
        assert!(rendered.contains("rid"), "{rendered}");
    }

    #[tokio::test]
    async fn test_submit_task_missing_task_id_is_malformed() {
        let mock = MockHttpSend::with_responses(vec![ok_json(
            r#"{"code":10000,"request_id":"rid","data":{}}"#,
        )]);
        let client = client_with(&mock);

        let err = client
            .submit_task(&SubmitTaskParams::new("prompt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_non_2xx_status_is_protocol_error() {
        let mock = MockHttpSend::with_responses(vec![response(403, "forbidden")]);
        let client = client_with(&mock);

        let err = client
            .submit_task(&SubmitTaskParams::new("prompt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("403"), "{err}");
        assert!(err.to_string().contains("forbidden"), "{err}");
    }

    #[tokio::test]
    async fn test_non_json_body_is_protocol_error() {
        let mock = MockHttpSend::with_responses(vec![ok_json("<html>gateway error</html>")]);
        let client = client_with(&mock);

        let err = client
            .submit_task(&SubmitTaskParams::new("prompt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("<html>"), "{err}");
    }

    #[tokio::test]
    async fn test_empty_credential_is_rejected_before_sending() {
        let mock = MockHttpSend::with_responses(vec![]);
        let client = TaskClient::with_http_send(Credential::default(), Arc::clone(&mock));

        let err = client
            .submit_task(&SubmitTaskParams::new("prompt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_get_task_result_nests_options_in_req_json() {
        let mock = MockHttpSend::with_responses(vec![done_body()]);
        let client = client_with(&mock);

        let params = GetTaskResultParams {
            task_id: "tid".to_string(),
            return_url: Some(true),
            logo_info: Some(crate::LogoInfo {
                add_logo: Some(true),
                ..Default::default()
            }),
        };
        client
            .get_task_result(&params)
            .await
            .expect("query must succeed");

        assert_eq!(
            mock.request_uri(0),
            "https://visual.volcengineapi.com/?Action=CVSync2AsyncGetResult&Version=2022-08-31"
        );
        let body = mock.request_body(0);
        assert_eq!(body["req_key"], json!("jimeng_t2i_v31"));
        assert_eq!(body["task_id"], json!("tid"));

        // Nested options are a JSON-encoded string, not an object.
        let req_json: Value =
            serde_json::from_str(body["req_json"].as_str().expect("req_json must be a string"))
                .expect("req_json must hold json");
        assert_eq!(
            req_json,
            json!({"return_url": true, "logo_info": {"add_logo": true}})
        );
    }

    #[tokio::test]
    async fn test_get_task_result_omits_req_json_without_options() {
        let mock = MockHttpSend::with_responses(vec![done_body()]);
        let client = client_with(&mock);

        client
            .get_task_result(&GetTaskResultParams::new("tid"))
            .await
            .expect("query must succeed");

        let body = mock.request_body(0);
        assert!(body.get("req_json").is_none(), "{body}");
    }

    #[tokio::test]
    async fn test_done_without_output_fails() {
        let mock = MockHttpSend::with_responses(vec![status_body("done")]);
        let client = client_with(&mock);

        let err = client
            .get_task_result(&GetTaskResultParams::new("tid"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TaskFailed);
        assert!(err.to_string().contains("no image output"), "{err}");
    }

    #[tokio::test]
    async fn test_missing_status_is_malformed() {
        let mock = MockHttpSend::with_responses(vec![ok_json(
            r#"{"code":10000,"request_id":"rid","data":{}}"#,
        )]);
        let client = client_with(&mock);

        let err = client
            .get_task_result(&GetTaskResultParams::new("tid"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_unknown_status_is_malformed() {
        let mock = MockHttpSend::with_responses(vec![status_body("melting")]);
        let client = client_with(&mock);

        let err = client
            .get_task_result(&GetTaskResultParams::new("tid"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_done_after_three_queries() {
        let mock = MockHttpSend::with_responses(vec![
            status_body("in_queue"),
            status_body("generating"),
            done_body(),
        ]);
        let client = client_with(&mock);

        let lines = Mutex::new(Vec::new());
        let progress = |m: &str| lines.lock().unwrap().push(m.to_string());

        let result = client
            .poll_task_result(&PollTaskParams::new("tid"), Some(&progress))
            .await
            .expect("poll must succeed");

        assert_eq!(result.status, TaskStatus::Done);
        assert_eq!(
            result.image_urls,
            Some(vec!["https://example.com/1.png".to_string()])
        );
        assert_eq!(mock.request_count(), 3);

        let lines = lines.lock().unwrap();
        assert!(lines.iter().any(|l| l.contains("in_queue")), "{lines:?}");
        assert!(lines.iter().any(|l| l.contains("generating")), "{lines:?}");
        assert!(lines.iter().any(|l| l.contains("done")), "{lines:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out_when_never_terminal() {
        let mock = MockHttpSend::with_responses(vec![
            status_body("generating"),
            status_body("generating"),
            status_body("generating"),
            status_body("generating"),
        ]);
        let client = client_with(&mock);

        let mut params = PollTaskParams::new("tid");
        params.max_polling_time = Some(Duration::from_millis(500));
        params.polling_interval = Some(Duration::from_millis(200));

        let err = client.poll_task_result(&params, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PollTimeout);
        assert!(mock.request_count() >= 2, "{}", mock.request_count());
        assert!(err.to_string().contains("queries"), "{err}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_not_found_raises_after_one_query() {
        let mock = MockHttpSend::with_responses(vec![status_body("not_found")]);
        let client = client_with(&mock);

        let err = client
            .poll_task_result(&PollTaskParams::new("tid"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TaskNotFound);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_expired_raises_after_one_query() {
        let mock = MockHttpSend::with_responses(vec![status_body("expired")]);
        let client = client_with(&mock);

        let err = client
            .poll_task_result(&PollTaskParams::new("tid"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TaskExpired);
        assert!(err.to_string().contains("12 hours"), "{err}");
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_retries_transient_transport_failures() {
        let mock = MockHttpSend::with_responses(vec![
            Err(Error::transport("connection refused by visual.volcengineapi.com")),
            done_body(),
        ]);
        let client = client_with(&mock);

        let result = client
            .poll_task_result(&PollTaskParams::new("tid"), None)
            .await
            .expect("poll must ride out the transient failure");
        assert_eq!(result.status, TaskStatus::Done);
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_propagates_non_transient_failures() {
        let mock = MockHttpSend::with_responses(vec![ok_json(
            r#"{"code":50000,"message":"internal error","request_id":"rid"}"#,
        )]);
        let client = client_with(&mock);

        let err = client
            .poll_task_result(&PollTaskParams::new("tid"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_with_endpoint_changes_uri_and_signed_host() {
        let mock = MockHttpSend::with_responses(vec![done_body()]);
        let client = client_with(&mock).with_endpoint("gateway.internal");

        client
            .get_task_result(&GetTaskResultParams::new("tid"))
            .await
            .expect("query must succeed");

        assert!(
            mock.request_uri(0).starts_with("https://gateway.internal/?"),
            "{}",
            mock.request_uri(0)
        );
        assert_eq!(mock.request_headers(0)[HOST], "gateway.internal");
    }
}
