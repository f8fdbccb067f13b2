//! Next-free numeric identifier allocation.
//!
//! Allocation is scan-then-compute: two sessions allocating at the same time can both pick the
//! same number. Unless the server enforces uniqueness on the attribute, both adds succeed.

use tracing::debug;

use ldapkit_core::Error;

use crate::client::BindSession;
use crate::record::DirectoryRecord;
use crate::Result;

/// Returns `max(attribute) + 1` over `records`, or `floor` when no record carries the attribute.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] for a value that is not an unsigned integer, or when the
/// maximum is already `u32::MAX`.
pub fn next_identifier(records: &[DirectoryRecord], attribute: &str, floor: u32) -> Result<u32> {
    let mut highest: Option<u32> = None;
    for record in records {
        let Some(values) = record.get(attribute).and_then(|values| values.as_text()) else {
            continue;
        };
        for value in values {
            let parsed = value.trim().parse::<u32>().map_err(|err| Error::InvalidValue {
                attribute: attribute.to_string(),
                message: format!("`{value}` on {}: {err}", record.dn),
            })?;
            highest = Some(highest.map_or(parsed, |current| current.max(parsed)));
        }
    }

    match highest {
        None => Ok(floor),
        Some(max) => max.checked_add(1).ok_or_else(|| Error::InvalidValue {
            attribute: attribute.to_string(),
            message: "identifier space exhausted".to_string(),
        }),
    }
}

impl BindSession {
    /// Scans the search base for `filter` and returns the next free value of `attribute`.
    ///
    /// # Errors
    ///
    /// Propagates search failures and [`next_identifier`] errors.
    pub async fn allocate(&mut self, filter: &str, attribute: &str, floor: u32) -> Result<u32> {
        let records = self.find(filter, &[attribute]).await?;
        let next = next_identifier(&records, attribute, floor)?;
        debug!(filter = %filter, attribute = %attribute, scanned = records.len(), next, "allocated identifier");
        Ok(next)
    }

    /// Next free `uidNumber` among posix accounts, starting at `uidstart`.
    ///
    /// # Errors
    ///
    /// See [`BindSession::allocate`].
    pub async fn next_uid_number(&mut self) -> Result<u32> {
        let floor = self.config().uid_start;
        self.allocate("(objectClass=posixAccount)", "uidNumber", floor)
            .await
    }

    /// Next free `gidNumber` among posix groups, starting at `gidstart`.
    ///
    /// # Errors
    ///
    /// See [`BindSession::allocate`].
    pub async fn next_gid_number(&mut self) -> Result<u32> {
        let floor = self.config().gid_start;
        self.allocate("(objectClass=posixGroup)", "gidNumber", floor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{bound_session, open, raw};
    use crate::client::{OperationResult, SearchResponse};

    fn with_gid(dn: &str, gid: &str) -> DirectoryRecord {
        let mut record = DirectoryRecord::new(dn);
        record.set_text("gidNumber", [gid]);
        record
    }

    #[test]
    fn empty_scan_returns_floor() {
        assert_eq!(next_identifier(&[], "gidNumber", 10000).unwrap(), 10000);
    }

    #[test]
    fn next_is_one_past_the_maximum() {
        let records = vec![
            with_gid("cn=a,dc=example,dc=org", "5"),
            with_gid("cn=b,dc=example,dc=org", "12"),
            with_gid("cn=c,dc=example,dc=org", "7"),
        ];
        assert_eq!(next_identifier(&records, "gidNumber", 10000).unwrap(), 13);
    }

    #[test]
    fn records_without_the_attribute_are_skipped() {
        let records = vec![
            DirectoryRecord::new("cn=nogid,dc=example,dc=org"),
            with_gid("cn=b,dc=example,dc=org", "41"),
        ];
        assert_eq!(next_identifier(&records, "gidNumber", 1).unwrap(), 42);
    }

    #[test]
    fn garbage_values_are_rejected() {
        let records = vec![with_gid("cn=a,dc=example,dc=org", "forty")];
        let err = next_identifier(&records, "gidNumber", 1).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref attribute, .. } if attribute == "gidNumber"));
    }

    #[test]
    fn overflow_is_an_error() {
        let records = vec![with_gid("cn=a,dc=example,dc=org", &u32::MAX.to_string())];
        assert!(next_identifier(&records, "gidNumber", 1).is_err());
    }

    #[tokio::test]
    async fn next_uid_number_scans_posix_accounts() {
        let mut session = bound_session();
        session
            .expect_whoami()
            .returning(|| Ok("dn:cn=Manager,dc=example,dc=org".to_string()));
        session
            .expect_search()
            .withf(|base, _, filter, attributes| {
                base == "dc=example,dc=org"
                    && filter == "(objectClass=posixAccount)"
                    && attributes == ["uidNumber".to_string()]
            })
            .returning(|_, _, _, _| {
                Ok(SearchResponse {
                    entries: vec![
                        raw("uid=a,dc=example,dc=org", &[("uidNumber", &["10000"])]),
                        raw("uid=b,dc=example,dc=org", &[("uidNumber", &["10004"])]),
                    ],
                    result: OperationResult::success(),
                })
            });
        let mut session = open(session).await;

        assert_eq!(session.next_uid_number().await.unwrap(), 10005);
    }

    #[tokio::test]
    async fn next_gid_number_starts_at_floor() {
        let mut session = bound_session();
        session
            .expect_whoami()
            .returning(|| Ok("dn:cn=Manager,dc=example,dc=org".to_string()));
        session.expect_search().returning(|_, _, _, _| {
            Ok(SearchResponse {
                entries: Vec::new(),
                result: OperationResult::success(),
            })
        });
        let mut session = open(session).await;

        assert_eq!(session.next_gid_number().await.unwrap(), 10000);
    }
}
