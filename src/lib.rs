//! Signed client for the Jimeng (Volcengine CV) asynchronous image
//! generation API.
//!
//! The crate has two layers:
//!
//! - [`Signer`]: a pure canonical-request / signature-derivation
//!   implementation compatible in structure with AWS Signature V4, which
//!   turns a request description into an `Authorization` header.
//! - [`TaskClient`]: the submit / poll lifecycle built on top of it,
//!   with a bounded polling loop that retries transient transport
//!   failures and classifies everything else as fatal.
//!
//! ## Example
//!
//! ```no_run
//! use jimeng_client::{Credential, PollTaskParams, SubmitTaskParams, TaskClient};
//!
//! # async fn example() -> jimeng_client::Result<()> {
//! let client = TaskClient::new(Credential::new("access_key_id", "secret_access_key"));
//!
//! let task = client
//!     .submit_task(&SubmitTaskParams::new("a lighthouse in a storm"))
//!     .await?;
//!
//! let result = client
//!     .poll_task_result(
//!         &PollTaskParams::new(task.task_id.as_str()),
//!         Some(&|message| log::info!("{message}")),
//!     )
//!     .await?;
//!
//! for url in result.image_urls.unwrap_or_default() {
//!     log::info!("generated: {url}");
//! }
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;

mod constants;

mod error;
pub use error::{Error, ErrorKind, Result};

mod credential;
pub use credential::Credential;

mod sign;
pub use sign::{percent_encode, SignedRequest, Signer};

mod http;
pub use http::{HttpSend, ReqwestHttpSend};

mod types;
pub use types::{
    GetTaskResultParams, LogoInfo, PollTaskParams, SubmitTaskParams, Task, TaskResult, TaskStatus,
};

mod client;
pub use client::{ProgressFn, TaskClient};
