//! LDIF rendering and parsing of content records.
//!
//! Values that are not safe strings (binary data, leading spaces, colons or `<`, non-ASCII
//! text, trailing spaces) are written base64-encoded after `::`, so every attribute survives a
//! write/read cycle.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use base64::Engine;
use tracing::warn;

use ldapkit_core::Error;

use crate::record::{DirectoryRecord, RawEntry};
use crate::Result;

const LINE_WIDTH: usize = 76;

/// Renders records as LDIF, one blank line between records.
#[must_use]
pub fn to_ldif(records: &[DirectoryRecord]) -> String {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        write_line(&mut out, "dn", record.dn.as_bytes());
        for (name, values) in &record.attributes {
            for value in values.to_bytes() {
                write_line(&mut out, name, &value);
            }
        }
    }
    out
}

fn write_line(out: &mut String, name: &str, value: &[u8]) {
    let line = if is_safe_string(value) {
        // Safe strings are ASCII.
        format!("{name}: {}", String::from_utf8_lossy(value))
    } else {
        format!(
            "{name}:: {}",
            base64::engine::general_purpose::STANDARD.encode(value)
        )
    };
    fold(out, &line);
}

fn fold(out: &mut String, line: &str) {
    let mut rest = line;
    let mut first = true;
    while !rest.is_empty() {
        let width = if first { LINE_WIDTH } else { LINE_WIDTH - 1 };
        let mut cut = width.min(rest.len());
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        if !first {
            out.push(' ');
        }
        let _ = writeln!(out, "{head}");
        rest = tail;
        first = false;
    }
}

fn is_safe_string(value: &[u8]) -> bool {
    let Some((&first, _)) = value.split_first() else {
        return true;
    };
    if matches!(first, b' ' | b':' | b'<') || value.last() == Some(&b' ') {
        return false;
    }
    value
        .iter()
        .all(|&byte| byte.is_ascii() && !matches!(byte, b'\0' | b'\n' | b'\r'))
}

fn normalize_newlines(ldif: &str) -> Cow<'_, str> {
    if ldif.contains("\r\n") {
        Cow::Owned(ldif.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(ldif)
    }
}

/// Unfolds continuation lines and drops comments, grouping logical lines per record.
fn logical_records(ldif: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut in_comment = false;

    for line in ldif.split('\n') {
        if let Some(continuation) = line.strip_prefix(' ') {
            if in_comment {
                continue;
            }
            if let Some(last) = current.last_mut() {
                last.push_str(continuation);
            }
            continue;
        }

        in_comment = false;
        if line.is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
        } else if line.starts_with('#') {
            in_comment = true;
        } else {
            current.push(line.to_string());
        }
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

fn parse_line(line: &str) -> Result<(String, Vec<u8>)> {
    let (name, rest) = line
        .split_once(':')
        .ok_or_else(|| Error::ConfigError(format!("LDIF line missing colon: `{line}`")))?;

    let value = if let Some(encoded) = rest.strip_prefix(':') {
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|err| {
                Error::ConfigError(format!("invalid base64 value for `{name}`: {err}"))
            })?
    } else if rest.starts_with('<') {
        return Err(Error::ConfigError(format!(
            "URL values are not supported (`{name}`)"
        )));
    } else {
        rest.trim_start_matches(' ').as_bytes().to_vec()
    };
    Ok((name.trim().to_string(), value))
}

/// Parses LDIF content records.
///
/// A leading `version:` line and `changetype: add` lines are accepted and ignored.
///
/// # Errors
///
/// Returns [`Error::ConfigError`] for lines without a colon, records without a leading `dn:`,
/// bad base64, URL values and change types other than `add`.
pub fn parse_ldif(ldif: &str) -> Result<Vec<DirectoryRecord>> {
    let normalized = normalize_newlines(ldif);
    let mut records = Vec::new();

    for lines in logical_records(&normalized) {
        let mut lines = lines.into_iter().peekable();
        if let Some(first) = lines.peek() {
            if first.starts_with("version:") {
                lines.next();
            }
        }
        let Some(dn_line) = lines.next() else {
            continue;
        };

        let (key, dn) = parse_line(&dn_line)?;
        if !key.eq_ignore_ascii_case("dn") {
            return Err(Error::ConfigError(format!(
                "LDIF record must start with dn:, found `{key}`"
            )));
        }
        let dn = String::from_utf8(dn)
            .map_err(|_| Error::InvalidDn("LDIF dn is not UTF-8".to_string()))?;

        let mut attributes: BTreeMap<String, Vec<Vec<u8>>> = BTreeMap::new();
        for line in lines {
            let (name, value) = parse_line(&line)?;
            if name.eq_ignore_ascii_case("changetype") {
                if value != b"add" {
                    return Err(Error::ConfigError(format!(
                        "unsupported changetype `{}` for {dn}",
                        String::from_utf8_lossy(&value)
                    )));
                }
                continue;
            }
            attributes.entry(name).or_default().push(value);
        }

        if attributes.is_empty() {
            warn!(dn = %dn, "LDIF record has no attributes");
        }
        records.push(DirectoryRecord::from(RawEntry { dn, attributes }));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AttributeValues;

    fn sample() -> DirectoryRecord {
        let mut record = DirectoryRecord::new("uid=alice,ou=People,dc=example,dc=org");
        record.set_text("objectClass", ["inetOrgPerson", "posixAccount", "top"]);
        record.set_text("uid", ["alice"]);
        record.set_text("description", [" leading space"]);
        record.set_text("cn", ["Zoë"]);
        record
    }

    #[test]
    fn safe_values_are_written_plain() {
        let ldif = to_ldif(&[sample()]);
        assert!(ldif.starts_with("dn: uid=alice,ou=People,dc=example,dc=org\n"));
        assert!(ldif.contains("uid: alice\n"));
        assert!(ldif.contains("objectClass: posixAccount\n"));
    }

    #[test]
    fn unsafe_values_are_base64() {
        let ldif = to_ldif(&[sample()]);
        assert!(ldif.contains("description:: IGxlYWRpbmcgc3BhY2U=\n"));
        assert!(ldif.contains("cn:: Wm/Dqw==\n"));
    }

    #[test]
    fn multi_valued_and_binary_attributes_survive() {
        let mut record = sample();
        let hash = vec![0x7b, 0xff, 0x00, 0x53, 0x53, 0x48, 0x41, 0x7d];
        record.set_binary("jpegPhoto", vec![hash.clone(), vec![0xfe; 120]]);

        let mut other = DirectoryRecord::new("cn=admins,ou=Groups,dc=example,dc=org");
        other.set_text("memberUid", ["alice", "bob"]);

        let ldif = to_ldif(&[record.clone(), other.clone()]);
        let parsed = parse_ldif(&ldif).unwrap();
        assert_eq!(parsed, vec![record, other]);
        assert_eq!(
            parsed[0].get("jpegPhoto"),
            Some(&AttributeValues::Binary(vec![hash, vec![0xfe; 120]]))
        );
    }

    #[test]
    fn long_lines_are_folded() {
        let mut record = DirectoryRecord::new("cn=long,dc=example,dc=org");
        record.set_text("description", ["x".repeat(200)]);
        let ldif = to_ldif(&[record.clone()]);
        assert!(ldif.lines().all(|line| line.len() <= LINE_WIDTH));
        assert_eq!(parse_ldif(&ldif).unwrap(), vec![record]);
    }

    #[test]
    fn parses_comments_continuations_and_version() {
        let input = "version: 1\r\n\
                     # a comment\r\n  that continues\r\n\
                     dn: cn=testgroup,ou=Groups,dc=example,dc=org\r\n\
                     changetype: add\r\n\
                     objectClass: posixGroup\r\n\
                     description: split\r\n  value\r\n\
                     \r\n\
                     \r\n\
                     dn: cn=other,ou=Groups,dc=example,dc=org\r\n\
                     cn: other\r\n";
        let records = parse_ldif(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dn, "cn=testgroup,ou=Groups,dc=example,dc=org");
        assert_eq!(records[0].first_text("description"), Some("split value"));
        assert!(records[0].get("changetype").is_none());
        assert_eq!(records[1].first_text("cn"), Some("other"));
    }

    #[test]
    fn rejects_records_without_dn() {
        let err = parse_ldif("cn: orphan\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn rejects_modify_records() {
        let err = parse_ldif("dn: cn=x,dc=example,dc=org\nchangetype: modify\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
