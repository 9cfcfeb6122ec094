//! Access key pair for the Volcengine API.

use std::fmt::{Debug, Formatter};

/// Credential that holds the access key id and secret access key.
///
/// Immutable for the lifetime of a client instance. `Debug` output is
/// redacted so the pair never ends up in logs.
#[derive(Default, Clone)]
pub struct Credential {
    /// Access key id for the Volcengine account.
    pub access_key_id: String,
    /// Secret access key for the Volcengine account.
    pub secret_access_key: String,
}

impl Credential {
    /// Create a new credential pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Check that both halves are present.
    ///
    /// The keys are opaque to this crate; non-empty presence is the only
    /// validation performed before use.
    pub fn is_valid(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &Redact(&self.access_key_id))
            .field("secret_access_key", &Redact(&self.secret_access_key))
            .finish()
    }
}

/// Replaces all but the first and last three characters with asterisks,
/// or the whole value when it is shorter than 12 characters. Enough to
/// tell two keys apart without leaking either.
struct Redact<'a>(&'a str);

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let length = self.0.len();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 {
            f.write_str("***")
        } else {
            f.write_str(&self.0[..3])?;
            f.write_str("***")?;
            f.write_str(&self.0[length - 3..])
        }
    }
}
