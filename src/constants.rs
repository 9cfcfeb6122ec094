use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use std::time::Duration;

// Headers used by the Volcengine signing scheme.
pub const X_DATE: &str = "x-date";
pub const X_CONTENT_SHA_256: &str = "x-content-sha256";

// Integration constants for the Jimeng text-to-image service.
pub const DEFAULT_HOST: &str = "visual.volcengineapi.com";
pub const REGION: &str = "cn-north-1";
pub const SERVICE: &str = "cv";
pub const REQ_KEY: &str = "jimeng_t2i_v31";

// Remote operations, selected via `Action`/`Version` query parameters.
pub const ACTION_SUBMIT_TASK: &str = "CVSync2AsyncSubmitTask";
pub const ACTION_GET_RESULT: &str = "CVSync2AsyncGetResult";
pub const API_VERSION: &str = "2022-08-31";

/// Success code in the response envelope.
pub const SUCCESS_CODE: i64 = 10000;

/// Algorithm name, used both in the string to sign and the
/// `Authorization` header.
pub const ALGORITHM: &str = "HMAC-SHA256";

/// Terminal literal of the signing key chain and the credential scope.
pub const SCOPE_TERMINATOR: &str = "request";

/// Fixed signed-header list. The order matches the canonical header
/// block and is a protocol constant, not derived from the request.
pub const SIGNED_HEADERS: &str = "host;x-date;x-content-sha256;content-type";

/// Hard upper bound for a single transport call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default overall polling budget.
pub const DEFAULT_MAX_POLLING_TIME: Duration = Duration::from_secs(300);

/// Default wait between poll attempts.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(3);

/// Finished task results are retained by the service for this long.
pub const RESULT_RETENTION_HOURS: u64 = 12;

/// AsciiSet for the Volcengine variant of
/// [AWS UriEncode](https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html).
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z',
///   'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - Space becomes `%20` and `!`, `'`, `(`, `)`, `*` are forced to their
///   `%XX` form even though RFC 3986 allows them as sub-delims.
pub static QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
