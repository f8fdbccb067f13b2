//! POSIX user, group and host conveniences built from templates, allocation and change-lists.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use ldapkit_core::Error;

use crate::changes::ChangeSpec;
use crate::client::{escape_filter_value, BindSession, SearchScope};
use crate::dn::dn_address;
use crate::password::ssha_hash;
use crate::record::DirectoryRecord;
use crate::template::{EntryTemplate, Placeholders};
use crate::Result;

/// Group template: `cn=GROUPNAME,GROUPDN` as a `posixGroup`.
#[must_use]
pub fn default_group_template() -> EntryTemplate {
    EntryTemplate::new("cn=GROUPNAME,GROUPDN")
        .attribute("objectClass", ["posixGroup", "top"])
        .attribute("cn", ["GROUPNAME"])
        .attribute("gidNumber", ["GIDNUMBER"])
}

/// User template: `uid=USERNAME,PEOPLEDN` as a `posixAccount`.
#[must_use]
pub fn default_user_template() -> EntryTemplate {
    EntryTemplate::new("uid=USERNAME,PEOPLEDN")
        .attribute(
            "objectClass",
            ["inetOrgPerson", "posixAccount", "shadowAccount", "top"],
        )
        .attribute("uid", ["USERNAME"])
        .attribute("cn", ["USERNAME"])
        .attribute("sn", ["USERNAME"])
        .attribute("uidNumber", ["UIDNUMBER"])
        .attribute("gidNumber", ["GIDNUMBER"])
        .attribute("homeDirectory", ["HOMEDIR"])
        .attribute("loginShell", ["/bin/bash"])
        .attribute("userPassword", ["PASSWORD"])
}

/// Host template: `cn=HOSTNAME,HOSTDN` as an `ipHost` named by its short and full names.
#[must_use]
pub fn default_host_template() -> EntryTemplate {
    EntryTemplate::new("cn=HOSTNAME,HOSTDN")
        .attribute("objectClass", ["device", "ipHost", "top"])
        .attribute("cn", ["HOSTNAME", "HOSTNAME_FQ"])
        .attribute("ipHostNumber", ["IPADDRESS"])
}

/// A user to create.
#[derive(Debug)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Initial password, handed to the template `{SSHA}`-hashed as `PASSWORD`.
    pub password: SecretString,
    /// Primary group, looked up by name when `gid` is not given.
    pub group: Option<String>,
    /// Primary gid.
    pub gid: Option<u32>,
    /// Operator-supplied pairs, exposed to the template under uppercased keys.
    pub extra: BTreeMap<String, String>,
}

impl NewUser {
    /// A user with no primary group yet.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            group: None,
            gid: None,
            extra: BTreeMap::new(),
        }
    }

    /// Uses the named group as primary group.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Uses `gid` as primary gid.
    #[must_use]
    pub const fn with_gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    /// Adds a free-form template value.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl BindSession {
    async fn people_base(&mut self) -> Result<String> {
        match self.config().people_dn.clone() {
            Some(dn) => Ok(dn),
            None => self.search_base().await,
        }
    }

    async fn group_base(&mut self) -> Result<String> {
        match self.config().group_dn.clone() {
            Some(dn) => Ok(dn),
            None => self.search_base().await,
        }
    }

    async fn host_base(&mut self) -> Result<String> {
        match self.config().host_dn.clone() {
            Some(dn) => Ok(dn),
            None => Ok(format!("ou=Hosts,{}", self.search_base().await?)),
        }
    }

    async fn first_match(&mut self, base: &str, filter: &str) -> Result<Option<DirectoryRecord>> {
        let records = self
            .search_records(base, SearchScope::Subtree, filter, &[])
            .await?;
        Ok(records.into_iter().next())
    }

    /// Looks a user up by `uid` under `peopledn`.
    ///
    /// # Errors
    ///
    /// Propagates search failures.
    pub async fn get_user(&mut self, uid: &str) -> Result<Option<DirectoryRecord>> {
        let base = self.people_base().await?;
        let filter = format!("(uid={})", escape_filter_value(uid));
        self.first_match(&base, &filter).await
    }

    /// Looks a group up by `cn` under `groupdn`.
    ///
    /// # Errors
    ///
    /// Propagates search failures.
    pub async fn get_group(&mut self, cn: &str) -> Result<Option<DirectoryRecord>> {
        let base = self.group_base().await?;
        let filter = format!("(cn={})", escape_filter_value(cn));
        self.first_match(&base, &filter).await
    }

    /// Creates a group from `template`, allocating a gid when none is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] without `groupdn`, [`Error::UnresolvedPlaceholder`] for
    /// template tokens nobody supplied, and the server's rejection of the add.
    pub async fn add_group(
        &mut self,
        name: &str,
        gid: Option<u32>,
        template: &EntryTemplate,
    ) -> Result<DirectoryRecord> {
        let group_dn = self
            .config()
            .group_dn
            .clone()
            .ok_or_else(|| Error::ConfigError("groupdn is not configured".to_string()))?;
        let gid = match gid {
            Some(gid) => gid,
            None => self.next_gid_number().await?,
        };

        let mut values = self.placeholders();
        values
            .insert("GROUPNAME", name)
            .insert("GIDNUMBER", gid.to_string())
            .insert("GROUPDN", group_dn);

        let record = template.render(&values)?;
        self.add(&record).await?;
        info!(group = %name, gid, dn = %record.dn, "group created");
        Ok(record)
    }

    /// Creates a user from `template`, allocating a uid number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] when neither a primary group nor a gid is given,
    /// [`Error::NotFound`] for an unknown primary group, [`Error::ConfigError`] without
    /// `peopledn`, and template or server failures.
    pub async fn add_user(&mut self, user: &NewUser, template: &EntryTemplate) -> Result<DirectoryRecord> {
        let people_dn = self
            .config()
            .people_dn
            .clone()
            .ok_or_else(|| Error::ConfigError("peopledn is not configured".to_string()))?;
        let gid = match (user.gid, &user.group) {
            (Some(gid), _) => gid,
            (None, Some(group)) => self.group_gid(group).await?,
            (None, None) => {
                return Err(Error::ValidationError(format!(
                    "user `{}` needs a primary group or gid",
                    user.username
                )))
            }
        };
        let uid = self.next_uid_number().await?;
        let home = format!(
            "{}/{}",
            self.config().home_dir.trim_end_matches('/'),
            user.username
        );

        let mut values = self.placeholders();
        values.extend_extra(&user.extra);
        values
            .insert("USERNAME", user.username.as_str())
            .insert("UIDNUMBER", uid.to_string())
            .insert("GIDNUMBER", gid.to_string())
            .insert("HOMEDIR", home)
            .insert("PEOPLEDN", people_dn)
            .insert("PASSWORD", ssha_hash(user.password.expose_secret()));

        let record = template.render(&values)?;
        self.add(&record).await?;
        info!(user = %user.username, uid, gid, dn = %record.dn, "user created");
        Ok(record)
    }

    /// Looks a host up by `cn` under `hostdn`.
    ///
    /// # Errors
    ///
    /// Propagates search failures.
    pub async fn get_host(&mut self, name: &str) -> Result<Option<DirectoryRecord>> {
        let base = self.host_base().await?;
        let filter = format!("(cn={})", escape_filter_value(name));
        self.first_match(&base, &filter).await
    }

    /// Creates a host entry named by `name` and its fully qualified name.
    ///
    /// Without `fqdn` the full name is `name` under the dotted form of the search base, so
    /// `web` under `dc=example,dc=org` becomes `web.example.org`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] when `address` is not a dotted IPv4 address, and
    /// template or server failures.
    pub async fn add_host(
        &mut self,
        name: &str,
        address: &str,
        fqdn: Option<&str>,
        template: &EntryTemplate,
    ) -> Result<DirectoryRecord> {
        let address: Ipv4Addr = address.parse().map_err(|_| {
            Error::ValidationError(format!("`{address}` does not appear to be an IPv4 address"))
        })?;
        let fqdn = match fqdn {
            Some(fqdn) => fqdn.to_string(),
            None => format!("{name}.{}", dn_address(&self.search_base().await?)?),
        };
        let host_dn = self.host_base().await?;

        let mut values = self.placeholders();
        values
            .insert("HOSTNAME", name)
            .insert("HOSTNAME_FQ", fqdn.as_str())
            .insert("IPADDRESS", address.to_string())
            .insert("HOSTDN", host_dn);

        let record = template.render(&values)?;
        self.add(&record).await?;
        info!(host = %name, fqdn = %fqdn, %address, dn = %record.dn, "host created");
        Ok(record)
    }

    async fn group_gid(&mut self, group: &str) -> Result<u32> {
        let record = self
            .get_group(group)
            .await?
            .ok_or_else(|| Error::NotFound(format!("group `{group}`")))?;
        let value = record
            .first_text("gidNumber")
            .ok_or_else(|| Error::InvalidValue {
                attribute: "gidNumber".to_string(),
                message: format!("{} has no gidNumber", record.dn),
            })?;
        value.parse().map_err(|err| Error::InvalidValue {
            attribute: "gidNumber".to_string(),
            message: format!("`{value}` on {}: {err}", record.dn),
        })
    }

    /// Adds `user` to the `memberUid` list of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown group and the server's rejection otherwise.
    pub async fn add_to_group(&mut self, user: &str, group: &str) -> Result<()> {
        let record = self
            .get_group(group)
            .await?
            .ok_or_else(|| Error::NotFound(format!("group `{group}`")))?;
        self.apply(&record.dn, &ChangeSpec::new().add("memberUid", [user]))
            .await
    }

    /// Adds one value to `attribute`.
    ///
    /// # Errors
    ///
    /// See [`BindSession::modify`].
    pub async fn modify_add(&mut self, dn: &str, attribute: &str, value: &str) -> Result<()> {
        self.apply(dn, &ChangeSpec::new().add(attribute, [value]))
            .await
    }

    /// Replaces every value of `attribute` with `value`.
    ///
    /// # Errors
    ///
    /// See [`BindSession::modify`].
    pub async fn modify_replace(&mut self, dn: &str, attribute: &str, value: &str) -> Result<()> {
        self.apply(dn, &ChangeSpec::new().replace(attribute, [value]))
            .await
    }

    /// Deletes one value of `attribute`, or the whole attribute when `value` is `None`.
    ///
    /// # Errors
    ///
    /// See [`BindSession::modify`]; deleting a value that is not present is rejected.
    pub async fn modify_delete(&mut self, dn: &str, attribute: &str, value: Option<&str>) -> Result<()> {
        let spec = match value {
            Some(value) => ChangeSpec::new().delete_values(attribute, [value]),
            None => ChangeSpec::new().delete_all(attribute),
        };
        self.apply(dn, &spec).await
    }
}

/// Placeholder bindings an operator would pass for a group, without a session.
#[must_use]
pub fn group_placeholders(name: &str, gid: u32, group_dn: &str) -> Placeholders {
    Placeholders::new()
        .with("GROUPNAME", name)
        .with("GIDNUMBER", gid.to_string())
        .with("GROUPDN", group_dn)
}
