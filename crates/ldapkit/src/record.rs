//! Directory records and the normalization of raw search results into them.
//!
//! The protocol hands back every attribute as an ordered list of byte strings. A
//! [`DirectoryRecord`] decodes an attribute to text when all of its values are valid UTF-8 and
//! otherwise keeps the bytes untouched, so password hashes and photos survive byte-for-byte.

use std::collections::BTreeMap;

/// A search result entry exactly as the protocol returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute name to values, in server order.
    pub attributes: BTreeMap<String, Vec<Vec<u8>>>,
}

/// The values of one attribute. Text and binary values are never mixed within an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValues {
    /// Every value decoded as UTF-8.
    Text(Vec<String>),
    /// At least one value was not UTF-8; all values kept as bytes.
    Binary(Vec<Vec<u8>>),
}

impl AttributeValues {
    /// Decodes raw values, falling back to binary when any value is not UTF-8.
    #[must_use]
    pub fn decode(raw: Vec<Vec<u8>>) -> Self {
        match raw
            .iter()
            .map(|value| std::str::from_utf8(value).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(text) => Self::Text(text),
            Err(_) => Self::Binary(raw),
        }
    }

    /// Number of values held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(values) => values.len(),
            Self::Binary(values) => values.len(),
        }
    }

    /// Returns true when no values are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The text values, or `None` for a binary attribute.
    #[must_use]
    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Self::Text(values) => Some(values),
            Self::Binary(_) => None,
        }
    }

    /// Every value as bytes, regardless of how it was decoded.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<Vec<u8>> {
        match self {
            Self::Text(values) => values.iter().map(|v| v.as_bytes().to_vec()).collect(),
            Self::Binary(values) => values.clone(),
        }
    }

    fn projected(&self) -> Vec<ProjectedValue> {
        match self {
            Self::Text(values) => values.iter().map(|v| ProjectedValue::from_text(v)).collect(),
            Self::Binary(values) => values.iter().cloned().map(ProjectedValue::Binary).collect(),
        }
    }
}

/// A distinguished name plus its multi-valued attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute name to values. Absent attributes are simply not present.
    pub attributes: BTreeMap<String, AttributeValues>,
}

impl DirectoryRecord {
    /// Creates an empty record for `dn`.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Returns the values of `attribute`, if present.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&AttributeValues> {
        self.attributes.get(attribute)
    }

    /// Returns the first text value of `attribute`.
    #[must_use]
    pub fn first_text(&self, attribute: &str) -> Option<&str> {
        self.get(attribute)
            .and_then(AttributeValues::as_text)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns true if `attribute` holds the text value `value`.
    #[must_use]
    pub fn contains_text(&self, attribute: &str, value: &str) -> bool {
        self.get(attribute)
            .and_then(AttributeValues::as_text)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    /// Replaces `attribute` with the given text values. An empty list removes it.
    pub fn set_text<I, S>(&mut self, attribute: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attribute = attribute.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.attributes.remove(&attribute);
        } else {
            self.attributes.insert(attribute, AttributeValues::Text(values));
        }
    }

    /// Appends one text value to `attribute`. A binary attribute takes the value as bytes.
    pub fn push_text(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .entry(attribute.into())
            .or_insert_with(|| AttributeValues::Text(Vec::new()))
        {
            AttributeValues::Text(values) => values.push(value),
            AttributeValues::Binary(values) => values.push(value.into_bytes()),
        }
    }

    /// Sets `attribute` to raw binary values.
    pub fn set_binary(&mut self, attribute: impl Into<String>, values: Vec<Vec<u8>>) {
        self.attributes
            .insert(attribute.into(), AttributeValues::Binary(values));
    }

    /// Re-encodes the record into the protocol shape.
    #[must_use]
    pub fn to_raw(&self) -> RawEntry {
        RawEntry {
            dn: self.dn.clone(),
            attributes: self
                .attributes
                .iter()
                .map(|(name, values)| (name.clone(), values.to_bytes()))
                .collect(),
        }
    }
}

impl From<RawEntry> for DirectoryRecord {
    fn from(raw: RawEntry) -> Self {
        Self {
            dn: raw.dn,
            attributes: raw
                .attributes
                .into_iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(name, values)| (name, AttributeValues::decode(values)))
                .collect(),
        }
    }
}

/// Normalizes a full search result.
#[must_use]
pub fn normalize(entries: Vec<RawEntry>) -> Vec<DirectoryRecord> {
    entries.into_iter().map(DirectoryRecord::from).collect()
}

/// One value in a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectedValue {
    /// Text value.
    Text(String),
    /// Text that is a canonical decimal integer (`gidNumber` and friends).
    Integer(i64),
    /// Undecodable value.
    Binary(Vec<u8>),
}

impl ProjectedValue {
    fn from_text(text: &str) -> Self {
        match text.parse::<i64>() {
            Ok(number) if number.to_string() == text => Self::Integer(number),
            _ => Self::Text(text.to_string()),
        }
    }

    /// The value as text, if it is not binary.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Integer(number) => Some(number.to_string()),
            Self::Binary(_) => None,
        }
    }
}

/// Values of a single attribute gathered across entries.
///
/// The shape depends on the data: when every entry that carries the attribute has exactly one
/// value, the projection is flattened to [`Projection::Scalars`]; a single multi-valued entry
/// keeps the whole projection as [`Projection::Lists`]. Callers that need a stable shape should
/// go through [`Projection::into_lists`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// One value per matching entry.
    Scalars(Vec<ProjectedValue>),
    /// All values per matching entry.
    Lists(Vec<Vec<ProjectedValue>>),
}

impl Projection {
    /// Number of entries that contributed.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalars(values) => values.len(),
            Self::Lists(values) => values.len(),
        }
    }

    /// Returns true if no entry carried the attribute.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts to the list shape regardless of how the projection was unwrapped.
    #[must_use]
    pub fn into_lists(self) -> Vec<Vec<ProjectedValue>> {
        match self {
            Self::Scalars(values) => values.into_iter().map(|v| vec![v]).collect(),
            Self::Lists(values) => values,
        }
    }

    /// Every value, flattened across entries.
    #[must_use]
    pub fn flatten(self) -> Vec<ProjectedValue> {
        self.into_lists().into_iter().flatten().collect()
    }
}

/// Gathers `attribute` across `records`. `dn` projects the distinguished names.
#[must_use]
pub fn project(records: &[DirectoryRecord], attribute: &str) -> Projection {
    let lists: Vec<Vec<ProjectedValue>> = if attribute.eq_ignore_ascii_case("dn") {
        records
            .iter()
            .map(|record| vec![ProjectedValue::Text(record.dn.clone())])
            .collect()
    } else {
        records
            .iter()
            .filter_map(|record| record.get(attribute))
            .filter(|values| !values.is_empty())
            .map(AttributeValues::projected)
            .collect()
    };

    if lists.iter().all(|values| values.len() == 1) {
        Projection::Scalars(lists.into_iter().flatten().collect())
    } else {
        Projection::Lists(lists)
    }
}

/// Column view over several attributes; `dn` is always included.
#[must_use]
pub fn tabulate(records: &[DirectoryRecord], attributes: &[&str]) -> BTreeMap<String, Projection> {
    let mut table = BTreeMap::new();
    table.insert("dn".to_string(), project(records, "dn"));
    for attribute in attributes {
        table.insert((*attribute).to_string(), project(records, attribute));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(dn: &str, attributes: &[(&str, &[&[u8]])]) -> RawEntry {
        RawEntry {
            dn: dn.to_string(),
            attributes: attributes
                .iter()
                .map(|(name, values)| {
                    (
                        (*name).to_string(),
                        values.iter().map(|v| v.to_vec()).collect(),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn normalize_decodes_text_and_keeps_binary() {
        let hash: &[u8] = &[0x7b, 0x53, 0xff, 0xfe, 0x00];
        let records = normalize(vec![raw(
            "uid=jane,ou=People,dc=example,dc=org",
            &[
                ("uid", &[b"jane"]),
                ("objectClass", &[b"posixAccount", b"inetOrgPerson"]),
                ("userPassword", &[hash]),
            ],
        )]);

        let record = &records[0];
        assert_eq!(record.first_text("uid"), Some("jane"));
        assert_eq!(
            record.get("objectClass"),
            Some(&AttributeValues::Text(vec![
                "posixAccount".to_string(),
                "inetOrgPerson".to_string()
            ]))
        );
        assert_eq!(
            record.get("userPassword"),
            Some(&AttributeValues::Binary(vec![hash.to_vec()]))
        );
    }

    #[test]
    fn one_bad_value_makes_whole_attribute_binary() {
        let records = normalize(vec![raw("cn=x", &[("jpegPhoto", &[b"ok", &[0xff, 0xd8]])])]);
        assert!(matches!(
            records[0].get("jpegPhoto"),
            Some(AttributeValues::Binary(values)) if values.len() == 2
        ));
    }

    #[test]
    fn decode_keeps_value_order_and_bytes() {
        assert_eq!(
            AttributeValues::decode(vec![b"b".to_vec(), "Zoë".as_bytes().to_vec()]),
            AttributeValues::Text(vec!["b".to_string(), "Zoë".to_string()])
        );
        let raw = vec![b"ok".to_vec(), vec![0xc3, 0x28]];
        assert_eq!(
            AttributeValues::decode(raw.clone()),
            AttributeValues::Binary(raw)
        );
    }

    #[test]
    fn empty_attributes_are_omitted() {
        let records = normalize(vec![raw("cn=x", &[("member", &[]), ("cn", &[b"x"])])]);
        assert!(records[0].get("member").is_none());
        assert!(records[0].get("cn").is_some());
    }

    #[test]
    fn raw_round_trip_is_byte_exact() {
        let photo: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0xff];
        let original = raw(
            "cn=x,dc=example,dc=org",
            &[("cn", &[b"x", b"y"]), ("jpegPhoto", &[photo])],
        );
        let record = DirectoryRecord::from(original.clone());
        assert_eq!(record.to_raw(), original);
        assert_eq!(DirectoryRecord::from(record.to_raw()), record);
    }

    #[test]
    fn projection_unwraps_single_values() {
        let records = normalize(vec![
            raw("ou=People", &[("ou", &[b"People"])]),
            raw("ou=Group", &[("ou", &[b"Group"])]),
            raw("ou=Hosts", &[]),
        ]);
        assert_eq!(
            project(&records, "ou"),
            Projection::Scalars(vec![
                ProjectedValue::Text("People".to_string()),
                ProjectedValue::Text("Group".to_string()),
            ])
        );
    }

    #[test]
    fn projection_keeps_lists_when_any_entry_is_multi_valued() {
        let records = normalize(vec![
            raw("cn=a", &[("memberUid", &[b"jane"])]),
            raw("cn=b", &[("memberUid", &[b"jane", b"joe"])]),
        ]);
        let projection = project(&records, "memberUid");
        assert!(matches!(projection, Projection::Lists(ref lists) if lists.len() == 2));
        assert_eq!(projection.flatten().len(), 3);
    }

    #[test]
    fn projection_parses_canonical_integers_only() {
        let records = normalize(vec![
            raw("cn=a", &[("gidNumber", &[b"50000"])]),
            raw("cn=b", &[("gidNumber", &[b"007"])]),
        ]);
        assert_eq!(
            project(&records, "gidNumber"),
            Projection::Scalars(vec![
                ProjectedValue::Integer(50000),
                ProjectedValue::Text("007".to_string()),
            ])
        );
    }

    #[test]
    fn tabulate_always_includes_dn() {
        let records = normalize(vec![raw("ou=People,dc=x", &[("ou", &[b"People"])])]);
        let table = tabulate(&records, &["ou"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table["dn"],
            Projection::Scalars(vec![ProjectedValue::Text("ou=People,dc=x".to_string())])
        );

        let empty = tabulate(&[], &[]);
        assert!(empty["dn"].is_empty());
    }

    #[test]
    fn record_mutators() {
        let mut record = DirectoryRecord::new("cn=g,dc=x");
        record.push_text("memberUid", "jane");
        record.push_text("memberUid", "joe");
        assert!(record.contains_text("memberUid", "joe"));
        record.set_text("memberUid", Vec::<String>::new());
        assert!(record.get("memberUid").is_none());
    }
}
