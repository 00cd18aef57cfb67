//! Repository connection handle: a manifest index plus the identity of the
//! client that opened it.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::index::ManifestIndex;

const FALLBACK_USERNAME: &str = "unknown";
const FALLBACK_HOSTNAME: &str = "localhost";

/// Principal of the active repository connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// User name of the connected client.
    pub username: String,
    /// Host name of the connected client.
    pub hostname: String,
}

impl ClientIdentity {
    /// Build an identity from explicit parts.
    #[must_use]
    pub fn new(username: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            hostname: hostname.into(),
        }
    }

    /// Discover the identity of the running process.
    ///
    /// Reads `USER` (or `USERNAME`) for the user. The host is `HOSTNAME` when
    /// exported, otherwise the system host name. Fixed placeholders cover
    /// anything unset or empty.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_sources(|name| std::env::var(name).ok(), system_hostname)
    }

    fn from_sources(
        lookup: impl Fn(&str) -> Option<String>,
        system_host: impl FnOnce() -> Option<String>,
    ) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let username = non_empty("USER")
            .or_else(|| non_empty("USERNAME"))
            .unwrap_or_else(|| FALLBACK_USERNAME.to_string());
        let hostname = non_empty("HOSTNAME")
            .or_else(|| system_host().filter(|host| !host.trim().is_empty()))
            .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string());
        Self { username, hostname }
    }

    /// Render the identity as `user@host`.
    #[must_use]
    pub fn username_at_host(&self) -> String {
        format!("{}@{}", self.username, self.hostname)
    }
}

/// Host name reported by the operating system, if it is valid UTF-8.
fn system_hostname() -> Option<String> {
    gethostname::gethostname().into_string().ok()
}

impl Display for ClientIdentity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}@{}", self.username, self.hostname)
    }
}

/// An open repository: shared manifest index and the connecting principal.
#[derive(Clone)]
pub struct Repository {
    manifests: Arc<dyn ManifestIndex>,
    identity: ClientIdentity,
}

impl Repository {
    /// Wrap a manifest index opened by `identity`.
    #[must_use]
    pub fn new(manifests: Arc<dyn ManifestIndex>, identity: ClientIdentity) -> Self {
        Self {
            manifests,
            identity,
        }
    }

    /// Manifest index backing the repository.
    #[must_use]
    pub fn manifests(&self) -> &dyn ManifestIndex {
        self.manifests.as_ref()
    }

    /// Identity of the connected client.
    #[must_use]
    pub const fn identity(&self) -> &ClientIdentity {
        &self.identity
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Repository")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
