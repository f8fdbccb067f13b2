//! Directory sessions: connecting, binding and the primitive round trips.
//!
//! A [`DirectoryClient`] owns the configuration and knows how to open connections. Binding
//! yields a [`BindSession`], which carries the protocol handle and every operation the rest of
//! the crate builds on. Each operation is one awaited round trip on `&mut self`, so a session
//! never has two requests in flight.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use secrecy::ExposeSecret;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use ldapkit_core::{DirectoryConfig, Error};

use crate::changes::{self, ChangeSpec, ModOp, Modification};
use crate::credentials::{resolve_credentials, CredentialProvider, Credentials, PromptCredentials};
use crate::dn::{infer_base_dn, DistinguishedName};
use crate::record::{normalize, DirectoryRecord, RawEntry};
use crate::template::Placeholders;
use crate::Result;

/// LDAP result code for `noSuchObject`.
pub const NO_SUCH_OBJECT: u32 = 32;

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// Result code and diagnostic of a completed round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResult {
    /// LDAP result code, `0` on success.
    pub code: u32,
    /// Server diagnostic message.
    pub message: String,
}

impl OperationResult {
    /// A successful result.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// A result with the given code and message.
    #[must_use]
    pub fn failure(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether the server reported success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }

    fn into_protocol(self, operation: &str, dn: &str) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(Error::Protocol {
            operation: operation.to_string(),
            dn: dn.to_string(),
            code: self.code,
            message: self.message,
        })
    }
}

/// Entries returned by a search together with its final result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    /// Returned entries, in server order.
    pub entries: Vec<RawEntry>,
    /// Final search result.
    pub result: OperationResult,
}

/// Protocol handle for one connection.
///
/// Implementations report server-side outcomes through [`OperationResult`] and reserve `Err`
/// for transport failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapSession: Send {
    /// Simple bind; empty DN and password bind anonymously.
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<OperationResult>;
    /// WhoAmI extended operation; returns the raw authorization identity.
    async fn whoami(&mut self) -> Result<String>;
    /// Search; an empty attribute list requests all user attributes.
    async fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<SearchResponse>;
    /// Adds an entry.
    async fn add(&mut self, dn: &str, attributes: &[(String, Vec<Vec<u8>>)])
        -> Result<OperationResult>;
    /// Applies a change-list to an entry.
    async fn modify(&mut self, dn: &str, changes: &[Modification]) -> Result<OperationResult>;
    /// Deletes an entry.
    async fn delete(&mut self, dn: &str) -> Result<OperationResult>;
    /// Renames an entry, optionally under a new parent. The old RDN value is dropped.
    async fn rename(
        &mut self,
        dn: &str,
        new_rdn: &str,
        new_superior: Option<String>,
    ) -> Result<OperationResult>;
    /// Ends the session.
    async fn unbind(&mut self) -> Result<()>;
}

/// Opens protocol handles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapConnector: Send + Sync {
    /// Opens a new, unbound connection.
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Directory client with a pluggable connection backend.
pub struct DirectoryClient {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn LdapConnector>,
    passwords: Box<dyn CredentialProvider>,
}

impl DirectoryClient {
    /// Creates a client that connects with `ldap3` and prompts on the terminal when the
    /// configuration names a bind DN without a password.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        let config = Arc::new(config);
        let connector: Box<dyn LdapConnector> = Box::new(RealLdapConnector::new(config.clone()));
        Self {
            config,
            connector,
            passwords: Box::new(PromptCredentials),
        }
    }

    /// Creates a client over a custom connector and password source.
    #[must_use]
    pub fn with_connector(
        config: DirectoryConfig,
        connector: Box<dyn LdapConnector>,
        passwords: Box<dyn CredentialProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            passwords,
        }
    }

    /// The configuration this client binds with.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Connects and binds with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceUnavailable`] if the server cannot be reached and
    /// [`Error::Authentication`] if the bind is refused or no password is available.
    pub async fn bind(&self) -> Result<BindSession> {
        let credentials = resolve_credentials(&self.config, self.passwords.as_ref())?;
        self.bind_as(credentials).await
    }

    /// Connects and binds with explicit credentials.
    ///
    /// # Errors
    ///
    /// See [`DirectoryClient::bind`].
    pub async fn bind_as(&self, credentials: Credentials) -> Result<BindSession> {
        let session = self.connector.connect().await?;
        BindSession::establish(session, self.config.clone(), credentials).await
    }
}

/// An authenticated session and the operations it supports.
///
/// Dropping a session without calling [`BindSession::unbind`] releases the handle without the
/// unbind round trip.
pub struct BindSession {
    session: Option<Box<dyn LdapSession>>,
    config: Arc<DirectoryConfig>,
    identity: String,
    base_dn: Option<String>,
}

impl std::fmt::Debug for BindSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindSession")
            .field("identity", &self.identity)
            .field("base_dn", &self.base_dn)
            .field("open", &self.session.is_some())
            .finish()
    }
}

impl BindSession {
    /// Binds an already connected handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the server refuses the bind and
    /// [`Error::ServiceUnavailable`] if the bind round trip fails or times out.
    pub async fn establish(
        mut session: Box<dyn LdapSession>,
        config: Arc<DirectoryConfig>,
        credentials: Credentials,
    ) -> Result<Self> {
        let identity = credentials.identity().to_string();
        let outcome = match &credentials {
            Credentials::Anonymous => session.simple_bind("", "").await,
            Credentials::Simple { bind_dn, password } => {
                session.simple_bind(bind_dn, password.expose_secret()).await
            }
        }
        .map_err(|err| match err {
            Error::Transport { .. } | Error::Timeout(_) => {
                Error::ServiceUnavailable(format!("bind as `{identity}` failed: {err}"))
            }
            other => other,
        })?;

        if !outcome.is_success() {
            warn!(identity = %identity, code = outcome.code, "bind refused");
            if let Err(err) = session.unbind().await {
                warn!(identity = %identity, error = %err, "unbind after refused bind failed");
            }
            return Err(Error::Authentication {
                identity,
                message: format!("{} (result code {})", outcome.message, outcome.code),
            });
        }

        debug!(identity = %identity, "bound");
        Ok(Self {
            session: Some(session),
            config,
            identity,
            base_dn: None,
        })
    }

    /// The DN this session bound as, empty when anonymous.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The configuration the session was opened with.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Configuration-derived placeholder values for template rendering.
    #[must_use]
    pub fn placeholders(&self) -> Placeholders {
        Placeholders::with_defaults(self.config.placeholders())
    }

    fn handle(&mut self) -> Result<&mut (dyn LdapSession + 'static)> {
        self.session
            .as_deref_mut()
            .ok_or_else(|| Error::ServiceUnavailable("session already unbound".to_string()))
    }

    /// Asks the server who the session is bound as.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn whoami(&mut self) -> Result<String> {
        self.handle()?.whoami().await
    }

    /// The naming-context root derived from the bound identity. Computed once per session.
    ///
    /// Uses the WhoAmI identity, falling back to the bind DN when the server refuses WhoAmI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`] when the identity has no `dc=` component, and transport
    /// failures and timeouts of the WhoAmI round trip as they are.
    pub async fn base_dn(&mut self) -> Result<String> {
        if let Some(base_dn) = &self.base_dn {
            return Ok(base_dn.clone());
        }

        let identity = match self.whoami().await {
            Ok(identity) => identity,
            Err(err @ Error::Protocol { .. }) => {
                warn!(error = %err, "whoami refused, inferring base DN from bind DN");
                self.identity.clone()
            }
            Err(err) => return Err(err),
        };
        let base_dn = infer_base_dn(&identity)?;
        debug!(base_dn = %base_dn, "inferred base DN");
        self.base_dn = Some(base_dn.clone());
        Ok(base_dn)
    }

    /// Default search base: the inferred base DN, or the configured `base` when inference
    /// is impossible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`] when neither is available.
    pub async fn search_base(&mut self) -> Result<String> {
        match self.base_dn().await {
            Ok(base_dn) => Ok(base_dn),
            Err(Error::Inference(reason)) => self.config.base.clone().ok_or_else(|| {
                Error::Inference(format!("{reason}, and no base is configured"))
            }),
            Err(err) => Err(err),
        }
    }

    /// Searches and returns the raw entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] when the server completes the search with an error code,
    /// `noSuchObject` included.
    pub async fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<RawEntry>> {
        let attributes = attributes.iter().map(|a| (*a).to_string()).collect::<Vec<_>>();
        debug!(base = %base, ?scope, filter = %filter, "search");
        let response = self
            .handle()?
            .search(base, scope, filter, &attributes)
            .await?;
        response.result.into_protocol("search", base)?;
        debug!(base = %base, entries = response.entries.len(), "search complete");
        Ok(response.entries)
    }

    /// Searches and normalizes the entries into records.
    ///
    /// # Errors
    ///
    /// See [`BindSession::search`].
    pub async fn search_records(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<DirectoryRecord>> {
        self.search(base, scope, filter, attributes)
            .await
            .map(normalize)
    }

    /// Subtree search under [`BindSession::search_base`].
    ///
    /// # Errors
    ///
    /// See [`BindSession::search`] and [`BindSession::search_base`].
    pub async fn find(&mut self, filter: &str, attributes: &[&str]) -> Result<Vec<DirectoryRecord>> {
        let base = self.search_base().await?;
        self.search_records(&base, SearchScope::Subtree, filter, attributes)
            .await
    }

    /// Reads one entry by DN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the entry does not exist.
    pub async fn read(&mut self, dn: &str, attributes: &[&str]) -> Result<DirectoryRecord> {
        match self
            .search_records(dn, SearchScope::Base, "(objectClass=*)", attributes)
            .await
        {
            Ok(records) => records
                .into_iter()
                .next()
                .ok_or_else(|| Error::NotFound(dn.to_string())),
            Err(err) if err.result_code() == Some(NO_SUCH_OBJECT) => {
                Err(Error::NotFound(dn.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    /// Whether an entry exists at `dn`.
    ///
    /// # Errors
    ///
    /// Propagates failures other than `noSuchObject`.
    pub async fn exists(&mut self, dn: &str) -> Result<bool> {
        match self.read(dn, &["1.1"]).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Adds a record as a new entry at its DN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] with the server's result code, e.g. `68` when the entry
    /// already exists.
    pub async fn add(&mut self, record: &DirectoryRecord) -> Result<()> {
        let raw = record.to_raw();
        let attributes = raw.attributes.into_iter().collect::<Vec<_>>();
        let outcome = self.handle()?.add(&raw.dn, &attributes).await?;
        outcome.into_protocol("add", &raw.dn)?;
        info!(dn = %raw.dn, attributes = attributes.len(), "entry added");
        Ok(())
    }

    /// Sends a change-list as one modify request.
    ///
    /// An empty change-list succeeds without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChangeRejected`] carrying the result code, the diagnostic and, when
    /// the diagnostic names it, the change that was refused.
    pub async fn modify(&mut self, dn: &str, changes: &[Modification]) -> Result<()> {
        if changes.is_empty() {
            debug!(dn = %dn, "empty change-list, nothing to send");
            return Ok(());
        }

        let outcome = self.handle()?.modify(dn, changes).await?;
        if !outcome.is_success() {
            let rejected = changes::identify_rejected(changes, &outcome.message);
            warn!(dn = %dn, code = outcome.code, message = %outcome.message, "modify rejected");
            return Err(Error::ChangeRejected {
                dn: dn.to_string(),
                code: outcome.code,
                message: outcome.message,
                rejected,
            });
        }
        info!(dn = %dn, changes = changes.len(), "entry modified");
        Ok(())
    }

    /// Builds the change-list for `spec` and applies it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for a delete or add without values, otherwise see
    /// [`BindSession::modify`].
    pub async fn apply(&mut self, dn: &str, spec: &ChangeSpec) -> Result<()> {
        let changes = changes::build(spec)?;
        self.modify(dn, &changes).await
    }

    /// Deletes the entry at `dn`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`], e.g. `32` when the entry does not exist.
    pub async fn delete(&mut self, dn: &str) -> Result<()> {
        let outcome = self.handle()?.delete(dn).await?;
        outcome.into_protocol("delete", dn)?;
        info!(dn = %dn, "entry deleted");
        Ok(())
    }

    /// Renames an entry to `new_rdn`, optionally moving it under `new_superior`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] with the server's result code.
    pub async fn rename(&mut self, dn: &str, new_rdn: &str, new_superior: Option<&str>) -> Result<()> {
        let outcome = self
            .handle()?
            .rename(dn, new_rdn, new_superior.map(str::to_string))
            .await?;
        outcome.into_protocol("rename", dn)?;
        info!(dn = %dn, new_rdn = %new_rdn, new_superior = ?new_superior, "entry renamed");
        Ok(())
    }

    /// Moves an entry to a complete new DN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDn`] if `new_dn` has no parent, otherwise see
    /// [`BindSession::rename`].
    pub async fn move_entry(&mut self, dn: &str, new_dn: &str) -> Result<()> {
        let target = DistinguishedName::parse(new_dn)?;
        let parent = target
            .parent()
            .ok_or_else(|| Error::InvalidDn(format!("`{new_dn}` has no parent entry")))?;
        let current_parent = DistinguishedName::parse(dn)?.parent();

        let new_superior = if current_parent.as_ref() == Some(&parent) {
            None
        } else {
            Some(parent.as_str())
        };
        self.rename(dn, &target.leading_rdn(), new_superior).await
    }

    /// Adds each record, continuing past failures.
    pub async fn add_all(&mut self, records: &[DirectoryRecord]) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let result = self.add(record).await;
            outcomes.push(BatchOutcome {
                dn: record.dn.clone(),
                result,
            });
        }
        outcomes
    }

    /// Applies each `(dn, changes)` pair, continuing past failures.
    pub async fn modify_all(&mut self, changes: &[(String, ChangeSpec)]) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(changes.len());
        for (dn, spec) in changes {
            let result = self.apply(dn, spec).await;
            outcomes.push(BatchOutcome {
                dn: dn.clone(),
                result,
            });
        }
        outcomes
    }

    /// Ends the session with an unbind round trip.
    ///
    /// # Errors
    ///
    /// Propagates transport failures; the handle is released either way.
    pub async fn unbind(mut self) -> Result<()> {
        match self.session.take() {
            Some(mut session) => {
                debug!(identity = %self.identity, "unbind");
                session.unbind().await
            }
            None => Ok(()),
        }
    }
}

impl Drop for BindSession {
    fn drop(&mut self) {
        if self.session.take().is_some() {
            debug!(identity = %self.identity, "session dropped without unbind");
        }
    }
}

/// Per-entry result of a batch operation.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Entry the operation targeted.
    pub dn: String,
    /// What happened to it.
    pub result: Result<()>,
}

/// Splits batch outcomes into successes and failures.
#[must_use]
pub fn partition_outcomes(outcomes: Vec<BatchOutcome>) -> (Vec<String>, Vec<(String, Error)>) {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(()) => succeeded.push(outcome.dn),
            Err(err) => failed.push((outcome.dn, err)),
        }
    }
    (succeeded, failed)
}

/// Real LDAP connector backed by `ldap3`.
pub struct RealLdapConnector {
    config: Arc<DirectoryConfig>,
}

impl RealLdapConnector {
    /// Creates a new connector instance.
    #[must_use]
    pub fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connection_timeout())
            .set_no_tls_verify(!self.config.tls_verify);
        let url = self.config.parse_host()?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, url.as_str())
            .await
            .map_err(|err| {
                Error::ServiceUnavailable(format!("cannot connect to {}: {err}", self.config.host))
            })?;
        ldap3::drive!(conn);
        debug!(host = %self.config.host, "connected");
        Ok(Box::new(RealLdapSession {
            inner: ldap,
            operation_timeout: self.config.operation_timeout(),
        }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

async fn bounded<F, T>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: std::future::Future<Output = ldap3::result::Result<T>>,
{
    timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout(format!("{operation} timed out")))?
        .map_err(|err| map_ldap_error(operation, err))
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<OperationResult> {
        let result = bounded(
            self.operation_timeout,
            "bind",
            self.inner.simple_bind(dn, password),
        )
        .await?;
        Ok(operation_result(result))
    }

    async fn whoami(&mut self) -> Result<String> {
        let ldap3::result::ExopResult(exop, result) = bounded(
            self.operation_timeout,
            "whoami",
            self.inner.extended(ldap3::exop::WhoAmI),
        )
        .await?;
        operation_result(result).into_protocol("whoami", "")?;
        // Anonymous sessions get no value back.
        Ok(exop
            .val
            .map(|value| String::from_utf8_lossy(&value).into_owned())
            .unwrap_or_default())
    }

    async fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<SearchResponse> {
        let ldap3::SearchResult(entries, result) = bounded(
            self.operation_timeout,
            "search",
            self.inner
                .search(base, scope.into(), filter, attributes.to_vec()),
        )
        .await?;

        Ok(SearchResponse {
            entries: entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(raw_entry)
                .collect(),
            result: operation_result(result),
        })
    }

    async fn add(
        &mut self,
        dn: &str,
        attributes: &[(String, Vec<Vec<u8>>)],
    ) -> Result<OperationResult> {
        let attrs = attributes
            .iter()
            .map(|(name, values)| {
                (
                    name.as_bytes().to_vec(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                )
            })
            .collect::<Vec<_>>();
        let result = bounded(self.operation_timeout, "add", self.inner.add(dn, attrs)).await?;
        Ok(operation_result(result))
    }

    async fn modify(&mut self, dn: &str, changes: &[Modification]) -> Result<OperationResult> {
        let mods = changes
            .iter()
            .map(|change| {
                let attribute = change.attribute.clone();
                let values = change.values.iter().cloned().collect::<HashSet<_>>();
                match change.op {
                    ModOp::Delete => Mod::Delete(attribute, values),
                    ModOp::Replace => Mod::Replace(attribute, values),
                    ModOp::Add => Mod::Add(attribute, values),
                }
            })
            .collect::<Vec<_>>();
        let result = bounded(self.operation_timeout, "modify", self.inner.modify(dn, mods)).await?;
        Ok(operation_result(result))
    }

    async fn delete(&mut self, dn: &str) -> Result<OperationResult> {
        let result = bounded(self.operation_timeout, "delete", self.inner.delete(dn)).await?;
        Ok(operation_result(result))
    }

    async fn rename(
        &mut self,
        dn: &str,
        new_rdn: &str,
        new_superior: Option<String>,
    ) -> Result<OperationResult> {
        let result = bounded(
            self.operation_timeout,
            "rename",
            self.inner
                .modifydn(dn, new_rdn, true, new_superior.as_deref()),
        )
        .await?;
        Ok(operation_result(result))
    }

    async fn unbind(&mut self) -> Result<()> {
        bounded(self.operation_timeout, "unbind", self.inner.unbind()).await
    }
}

fn map_ldap_error(operation: &str, err: ldap3::LdapError) -> Error {
    Error::Transport {
        operation: operation.to_string(),
        message: err.to_string(),
    }
}

fn operation_result(result: ldap3::LdapResult) -> OperationResult {
    OperationResult {
        code: result.rc,
        message: result.text,
    }
}

fn raw_entry(entry: SearchEntry) -> RawEntry {
    let mut attributes: BTreeMap<String, Vec<Vec<u8>>> = BTreeMap::new();
    for (name, values) in entry.attrs {
        attributes
            .entry(name)
            .or_default()
            .extend(values.into_iter().map(String::into_bytes));
    }
    for (name, values) in entry.bin_attrs {
        attributes.entry(name).or_default().extend(values);
    }
    RawEntry {
        dn: entry.dn,
        attributes,
    }
}

/// Escapes a value for inclusion in a search filter.
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
