//! Convenience layer over an LDAP directory.
//!
//! Bind once with a [`DirectoryClient`], then work through the [`BindSession`] it returns:
//! search and normalize entries into [`DirectoryRecord`]s, render [`EntryTemplate`]s into new
//! entries, apply ordered change-lists built from a [`ChangeSpec`], and allocate the next free
//! POSIX uid or gid number. Users, groups and hosts have ready-made templates.

#![deny(missing_docs)]

mod accounts;
mod allocator;
mod changes;
mod client;
mod credentials;
mod dn;
mod ldif;
mod password;
mod record;
mod template;

pub use accounts::{
    default_group_template, default_host_template, default_user_template, group_placeholders,
    NewUser,
};
pub use allocator::next_identifier;
pub use changes::{build, identify_rejected, ChangeSpec, DeleteValues, ModOp, Modification};
pub use client::{
    escape_filter_value, partition_outcomes, BatchOutcome, BindSession, DirectoryClient,
    LdapConnector, LdapSession, OperationResult, RealLdapConnector, SearchResponse, SearchScope,
    NO_SUCH_OBJECT,
};
pub use credentials::{
    resolve_credentials, CredentialProvider, Credentials, PromptCredentials, StaticCredentials,
};
pub use dn::{
    dn_address, infer_base_dn, DistinguishedName, DistinguishedNameError,
    RelativeDistinguishedName,
};
pub use ldif::{parse_ldif, to_ldif};
pub use password::{ssha_check, ssha_hash};
pub use record::{
    normalize, project, tabulate, AttributeValues, DirectoryRecord, ProjectedValue, Projection,
    RawEntry,
};
pub use template::{EntryTemplate, Placeholders, Segment, ValueExpr};

pub use ldapkit_core::{DirectoryConfig, Error, RejectedChange};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = ldapkit_core::Result<T>;
