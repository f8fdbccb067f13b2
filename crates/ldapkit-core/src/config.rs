//! Configuration for directory sessions.
//!
//! [`DirectoryConfig`] is the resolved configuration object the engine consumes: where the
//! server lives, who to bind as, which subtrees hold people and groups, and where numeric
//! identifier allocation starts. Locating and reading the file is the caller's business; this
//! module only deserializes and validates its contents.

use crate::Error;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Resolved configuration for one directory.
///
/// Keys that are not recognized are retained; the ones spelled entirely in uppercase are
/// exposed to templates through [`DirectoryConfig::placeholders`].
#[derive(Debug, Deserialize, Validate)]
pub struct DirectoryConfig {
    /// LDAP URL of the directory server
    #[validate(url)]
    pub host: String,

    /// Bind identity; `None` binds anonymously
    #[serde(default, rename = "binddn")]
    pub bind_dn: Option<String>,

    /// Bind password; when absent a credential provider is consulted
    #[serde(default, rename = "bindpw")]
    pub bind_password: Option<SecretString>,

    /// Explicit base DN for sessions whose base cannot be inferred
    #[serde(default)]
    pub base: Option<String>,

    /// Subtree holding person entries
    #[serde(default, rename = "peopledn")]
    pub people_dn: Option<String>,

    /// Subtree holding group entries
    #[serde(default, rename = "groupdn")]
    pub group_dn: Option<String>,

    /// Subtree holding host entries; `ou=Hosts` under the base when absent
    #[serde(default, rename = "hostdn")]
    pub host_dn: Option<String>,

    /// Parent directory of new home directories
    #[serde(default = "default_home_dir", rename = "homedir")]
    pub home_dir: String,

    /// First uid number handed out in an empty directory
    #[serde(default = "default_id_start", rename = "uidstart")]
    pub uid_start: u32,

    /// First gid number handed out in an empty directory
    #[serde(default = "default_id_start", rename = "gidstart")]
    pub gid_start: u32,

    /// Connection timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Per-operation timeout in seconds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// Whether to verify TLS certificates on `ldaps://` connections
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Everything else found in the file
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_home_dir() -> String {
    "/home".to_string()
}

const fn default_id_start() -> u32 {
    10000
}

const fn default_connection_timeout_secs() -> u64 {
    10
}

const fn default_operation_timeout_secs() -> u64 {
    30
}

const fn default_tls_verify() -> bool {
    true
}

impl DirectoryConfig {
    /// Create a configuration for the given server with every other setting defaulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(host: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            host: host.into(),
            bind_dn: None,
            bind_password: None,
            base: None,
            people_dn: None,
            group_dn: None,
            host_dn: None,
            home_dir: default_home_dir(),
            uid_start: default_id_start(),
            gid_start: default_id_start(),
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
            tls_verify: default_tls_verify(),
            extra: BTreeMap::new(),
        };

        config.check()?;
        Ok(config)
    }

    /// Deserialize and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for malformed JSON or invalid settings.
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(input)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {}", e)))?;
        self.parse_host()?;
        Ok(())
    }

    /// Set the bind identity and password.
    #[must_use]
    pub fn with_bind(mut self, bind_dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = Some(bind_dn.into());
        self.bind_password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the bind identity without a password.
    #[must_use]
    pub fn with_bind_dn(mut self, bind_dn: impl Into<String>) -> Self {
        self.bind_dn = Some(bind_dn.into());
        self
    }

    /// Set the explicit base DN.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Set the people subtree.
    #[must_use]
    pub fn with_people_dn(mut self, dn: impl Into<String>) -> Self {
        self.people_dn = Some(dn.into());
        self
    }

    /// Set the group subtree.
    #[must_use]
    pub fn with_group_dn(mut self, dn: impl Into<String>) -> Self {
        self.group_dn = Some(dn.into());
        self
    }

    /// Set the host subtree.
    #[must_use]
    pub fn with_host_dn(mut self, dn: impl Into<String>) -> Self {
        self.host_dn = Some(dn.into());
        self
    }

    /// Set the uid and gid allocation floors.
    #[must_use]
    pub const fn with_id_floors(mut self, uid_start: u32, gid_start: u32) -> Self {
        self.uid_start = uid_start;
        self.gid_start = gid_start;
        self
    }

    /// Set the per-operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }

    /// Add a free-form setting (uppercase keys become template placeholders).
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Get the connection timeout as a Duration.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get the operation timeout as a Duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Parse and validate the server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or is not an LDAP URL.
    pub fn parse_host(&self) -> Result<Url, Error> {
        let url = Url::parse(&self.host)?;
        match url.scheme() {
            "ldap" | "ldaps" | "ldapi" => Ok(url),
            other => Err(Error::ConfigError(format!(
                "unsupported URL scheme `{other}` for directory host"
            ))),
        }
    }

    /// Uppercase settings, rendered as strings, for template resolution.
    ///
    /// Strings are taken verbatim; numbers and booleans use their JSON text. Arrays, objects
    /// and nulls are not placeholder material and are skipped.
    #[must_use]
    pub fn placeholders(&self) -> BTreeMap<String, String> {
        self.extra
            .iter()
            .filter(|(key, _)| is_placeholder_key(key))
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key.clone(), text))
            })
            .collect()
    }
}

fn is_placeholder_key(key: &str) -> bool {
    key.chars().any(|c| c.is_ascii_uppercase()) && key == key.to_ascii_uppercase()
}
