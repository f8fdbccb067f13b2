//! Distinguished Name utilities: parsing, base-DN inference and dotted addresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use ldapkit_core::error::Error as CoreError;

use crate::Result;

/// Errors that can occur when parsing or manipulating distinguished names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistinguishedNameError {
    /// The distinguished name was empty.
    #[error("distinguished name cannot be empty")]
    Empty,
    /// A component in the distinguished name was invalid.
    #[error("invalid distinguished name component: {0}")]
    InvalidComponent(String),
    /// A component was missing the attribute name to the left of the `=`.
    #[error("distinguished name component missing attribute: {0}")]
    MissingAttribute(String),
    /// A component was missing the value to the right of the `=`.
    #[error("distinguished name component missing value for attribute {0}")]
    MissingValue(String),
    /// The distinguished name ended with an escape character.
    #[error("distinguished name contains an unterminated escape sequence")]
    UnterminatedEscape,
}

impl From<DistinguishedNameError> for CoreError {
    fn from(err: DistinguishedNameError) -> Self {
        CoreError::InvalidDn(err.to_string())
    }
}

/// Relative distinguished name (single attribute/value pair).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeDistinguishedName {
    attribute: String,
    value: String,
}

impl RelativeDistinguishedName {
    /// Create a new relative distinguished name.
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Attribute portion of the RDN (e.g. `cn`).
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Attribute value portion of the RDN, unescaped.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if this RDN matches the provided attribute name (case-insensitive).
    #[must_use]
    pub fn matches_attribute(&self, attribute: &str) -> bool {
        self.attribute.eq_ignore_ascii_case(attribute)
    }
}

/// Strongly-typed distinguished name wrapper.
///
/// Keeps a canonical string representation alongside the parsed relative distinguished names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    raw: String,
    rdns: Vec<Vec<RelativeDistinguishedName>>,
}

impl DistinguishedName {
    /// Parses a distinguished name from a string.
    ///
    /// # Errors
    ///
    /// Returns [`DistinguishedNameError`] if the distinguished name is empty or contains invalid
    /// syntax.
    pub fn parse(input: impl AsRef<str>) -> std::result::Result<Self, DistinguishedNameError> {
        let raw = input.as_ref().trim();
        if raw.is_empty() {
            return Err(DistinguishedNameError::Empty);
        }

        let mut rdns = Vec::new();
        for component in split_escaped(raw, ',')? {
            let mut rdn_components = Vec::new();
            for part in split_escaped(&component, '+')? {
                let (attribute, value) = split_attribute_value(&part)?;
                rdn_components.push(RelativeDistinguishedName::new(attribute, value));
            }
            rdns.push(rdn_components);
        }

        Ok(Self {
            raw: rdns_to_string(&rdns),
            rdns,
        })
    }

    /// Borrows the canonical distinguished name string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the RDN sets in order (each set represents a `+`-joined group).
    #[must_use]
    pub fn rdns(&self) -> &[Vec<RelativeDistinguishedName>] {
        &self.rdns
    }

    /// Returns an iterator over all relative distinguished names in order.
    pub fn components(&self) -> impl Iterator<Item = &RelativeDistinguishedName> + '_ {
        self.rdns.iter().flat_map(|rdn| rdn.iter())
    }

    /// Looks up the value for the first attribute that matches `attribute` (case-insensitive).
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.components()
            .find(|rdn| rdn.matches_attribute(attribute))
            .map(RelativeDistinguishedName::value)
    }

    /// The leading RDN in string form (`cn=group` of `cn=group,ou=Group,...`).
    #[must_use]
    pub fn leading_rdn(&self) -> String {
        rdns_to_string(&self.rdns[..1])
    }

    /// The entry's parent, or `None` for a single-RDN name.
    #[must_use]
    pub fn parent(&self) -> Option<DistinguishedName> {
        if self.rdns.len() < 2 {
            return None;
        }
        let rdns = self.rdns[1..].to_vec();
        Some(Self {
            raw: rdns_to_string(&rdns),
            rdns,
        })
    }

    /// The suffix starting at the first `dc=` component, if any.
    #[must_use]
    pub fn domain_suffix(&self) -> Option<DistinguishedName> {
        let start = self
            .rdns
            .iter()
            .position(|rdn| rdn.iter().any(|c| c.matches_attribute("dc")))?;
        let rdns = self.rdns[start..].to_vec();
        Some(Self {
            raw: rdns_to_string(&rdns),
            rdns,
        })
    }

    /// Creates a new distinguished name by prefixing the provided RDN.
    #[must_use]
    pub fn with_prefix(mut self, rdn: RelativeDistinguishedName) -> Self {
        self.rdns.insert(0, vec![rdn]);
        self.raw = rdns_to_string(&self.rdns);
        self
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DistinguishedName {
    type Err = DistinguishedNameError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DistinguishedName> for String {
    fn from(value: DistinguishedName) -> Self {
        value.raw
    }
}

/// Derives the base DN from an authenticated identity.
///
/// Accepts either a bare DN or the `dn:`-prefixed authorization identity a WhoAmI request
/// returns, and yields the suffix starting at the first `dc=` component.
///
/// # Errors
///
/// Returns [`CoreError::Inference`] for anonymous identities, non-DN identities and DNs with no
/// `dc=` component.
pub fn infer_base_dn(identity: &str) -> Result<String> {
    let identity = identity.trim();
    let dn = identity.strip_prefix("dn:").unwrap_or(identity).trim();
    if dn.is_empty() {
        return Err(CoreError::Inference(
            "anonymous identity carries no dc= component".to_string(),
        ));
    }

    let parsed = DistinguishedName::parse(dn)
        .map_err(|err| CoreError::Inference(format!("identity `{identity}` is not a DN: {err}")))?;
    parsed
        .domain_suffix()
        .map(String::from)
        .ok_or_else(|| CoreError::Inference(format!("identity `{identity}` has no dc= component")))
}

/// Converts a DN into a dotted address: `cn=spaces in,ou=Hosts,dc=ezldap,dc=io` becomes
/// `spaces-in.hosts.ezldap.io`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDn`] if `dn` does not parse.
pub fn dn_address(dn: &str) -> Result<String> {
    let parsed = DistinguishedName::parse(dn)?;
    Ok(parsed
        .rdns()
        .iter()
        .filter_map(|rdn| rdn.first())
        .map(|rdn| rdn.value().to_lowercase().replace(' ', "-"))
        .collect::<Vec<_>>()
        .join("."))
}

/// Splits on `delimiter` outside escapes. Escape sequences are kept intact in the pieces.
fn split_escaped(
    input: &str,
    delimiter: char,
) -> std::result::Result<Vec<String>, DistinguishedNameError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escape = false;

    for ch in input.chars() {
        if escape {
            current.push(ch);
            escape = false;
            continue;
        }

        if ch == '\\' {
            current.push(ch);
            escape = true;
            continue;
        }

        if ch == delimiter {
            parts.push(current.trim().to_string());
            current.clear();
            continue;
        }

        current.push(ch);
    }

    if escape {
        return Err(DistinguishedNameError::UnterminatedEscape);
    }

    parts.push(current.trim().to_string());
    if parts.iter().any(String::is_empty) {
        return Err(DistinguishedNameError::InvalidComponent(input.to_string()));
    }
    Ok(parts)
}

fn split_attribute_value(
    component: &str,
) -> std::result::Result<(String, String), DistinguishedNameError> {
    let mut escape = false;
    let mut index = None;

    for (i, ch) in component.char_indices() {
        if escape {
            escape = false;
            continue;
        }

        if ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '=' {
            index = Some(i);
            break;
        }
    }

    let idx =
        index.ok_or_else(|| DistinguishedNameError::InvalidComponent(component.to_string()))?;
    let attribute = component[..idx].trim();
    let value_part = component[idx + 1..].trim_start();

    if attribute.is_empty() {
        return Err(DistinguishedNameError::MissingAttribute(
            component.to_string(),
        ));
    }

    if value_part.is_empty() {
        return Err(DistinguishedNameError::MissingValue(attribute.to_string()));
    }

    Ok((attribute.to_string(), unescape(value_part)?))
}

/// Resolves `\,`-style and `\2C`-style escapes.
fn unescape(value: &str) -> std::result::Result<String, DistinguishedNameError> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let next = chars
            .next()
            .ok_or(DistinguishedNameError::UnterminatedEscape)?;
        let hex_pair = chars
            .peek()
            .filter(|second| next.is_ascii_hexdigit() && second.is_ascii_hexdigit())
            .copied();
        match hex_pair {
            Some(second) => {
                chars.next();
                let pair: String = [next, second].iter().collect();
                let byte = u8::from_str_radix(&pair, 16)
                    .map_err(|_| DistinguishedNameError::InvalidComponent(value.to_string()))?;
                bytes.push(byte);
            }
            None => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    String::from_utf8(bytes).map_err(|_| DistinguishedNameError::InvalidComponent(value.to_string()))
}

fn escape(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = value.chars().collect();
    let mut escaped = String::with_capacity(value.len());

    for (idx, ch) in chars.iter().enumerate() {
        let is_first = idx == 0;
        let is_last = idx == chars.len() - 1;
        let needs_escape = matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (is_first && (*ch == ' ' || *ch == '#'))
            || (is_last && *ch == ' ');

        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(*ch);
    }

    escaped
}

fn rdns_to_string(rdns: &[Vec<RelativeDistinguishedName>]) -> String {
    rdns.iter()
        .map(|rdn| {
            rdn.iter()
                .map(|component| format!("{}={}", component.attribute(), escape(component.value())))
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_dn() {
        let dn = DistinguishedName::parse("cn=John Doe,ou=People,dc=example,dc=com").unwrap();
        assert_eq!(dn.get("cn"), Some("John Doe"));
        assert_eq!(dn.get("ou"), Some("People"));
        assert_eq!(dn.to_string(), "cn=John Doe,ou=People,dc=example,dc=com");
    }

    #[test]
    fn parse_dn_with_escape() {
        let dn = DistinguishedName::parse("cn=Smith\\, John,ou=People,dc=example,dc=com").unwrap();
        assert_eq!(dn.get("cn"), Some("Smith, John"));
        assert!(dn.to_string().starts_with("cn=Smith\\, John,ou=People"));

        let dn = DistinguishedName::parse("cn=a\\+b,dc=example,dc=com").unwrap();
        assert_eq!(dn.get("cn"), Some("a+b"));
        assert_eq!(dn.rdns()[0].len(), 1);

        let dn = DistinguishedName::parse("cn=Smith\\2C John,dc=example,dc=com").unwrap();
        assert_eq!(dn.get("cn"), Some("Smith, John"));
    }

    #[test]
    fn parse_multi_valued_rdn() {
        let dn = DistinguishedName::parse("cn=John+uid=1234,ou=People,dc=example,dc=com").unwrap();
        assert_eq!(dn.rdns()[0].len(), 2);
        assert_eq!(dn.get("uid"), Some("1234"));
        assert_eq!(
            dn.to_string(),
            "cn=John+uid=1234,ou=People,dc=example,dc=com"
        );
    }

    #[test]
    fn invalid_trailing_delimiter() {
        let err = DistinguishedName::parse("cn=John,").unwrap_err();
        assert!(matches!(err, DistinguishedNameError::InvalidComponent(_)));
        assert_eq!(
            DistinguishedName::parse("cn=John\\").unwrap_err(),
            DistinguishedNameError::UnterminatedEscape
        );
    }

    #[test]
    fn parent_and_leading_rdn() {
        let dn = DistinguishedName::parse("cn=mdn,ou=Group,dc=ezldap,dc=io").unwrap();
        assert_eq!(dn.leading_rdn(), "cn=mdn");
        assert_eq!(
            dn.parent().unwrap().as_str(),
            "ou=Group,dc=ezldap,dc=io"
        );
        assert!(DistinguishedName::parse("dc=io").unwrap().parent().is_none());

        let prefixed = dn
            .parent()
            .unwrap()
            .with_prefix(RelativeDistinguishedName::new("cn", "other"));
        assert_eq!(prefixed.as_str(), "cn=other,ou=Group,dc=ezldap,dc=io");
    }

    #[test]
    fn infer_base_dn_from_bind_identity() {
        assert_eq!(
            infer_base_dn("cn=Manager,dc=example,dc=org").unwrap(),
            "dc=example,dc=org"
        );
        assert_eq!(
            infer_base_dn("dn:cn=Manager,dc=ezldap,dc=io").unwrap(),
            "dc=ezldap,dc=io"
        );
        assert_eq!(
            infer_base_dn("uid=jane,ou=People,DC=Example,DC=org").unwrap(),
            "DC=Example,DC=org"
        );
    }

    #[test]
    fn infer_base_dn_fails_for_anonymous() {
        assert!(matches!(infer_base_dn(""), Err(CoreError::Inference(_))));
        assert!(matches!(infer_base_dn("dn:"), Err(CoreError::Inference(_))));
        assert!(matches!(
            infer_base_dn("cn=Manager,o=example"),
            Err(CoreError::Inference(_))
        ));
        assert!(matches!(
            infer_base_dn("u:jane"),
            Err(CoreError::Inference(_))
        ));
    }

    #[test]
    fn dotted_addresses() {
        assert_eq!(dn_address("dc=ezldap,dc=io").unwrap(), "ezldap.io");
        assert_eq!(
            dn_address("ou=Hosts,dc=ezldap,dc=io").unwrap(),
            "hosts.ezldap.io"
        );
        assert_eq!(
            dn_address("cn=spaces in,ou=Hosts,dc=ezldap,dc=io").unwrap(),
            "spaces-in.hosts.ezldap.io"
        );
        assert!(matches!(dn_address(""), Err(CoreError::InvalidDn(_))));
    }
}
