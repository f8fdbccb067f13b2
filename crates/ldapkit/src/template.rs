//! Entry templates with uppercase placeholder tokens.
//!
//! A template is a DN expression plus, per attribute, a list of value expressions. Rendering
//! substitutes every placeholder from a [`Placeholders`] mapping and yields a
//! [`DirectoryRecord`] ready for an add. Rendering never touches the directory.

use std::collections::BTreeMap;

use ldapkit_core::Error;

use crate::record::{AttributeValues, DirectoryRecord};
use crate::Result;

/// One piece of a value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Copied verbatim.
    Literal(String),
    /// Replaced by the value bound to the token.
    Placeholder(String),
}

/// A value expression: literal text interleaved with placeholder tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueExpr {
    segments: Vec<Segment>,
}

impl ValueExpr {
    /// Scans `input` for placeholders.
    ///
    /// A placeholder is a maximal run of `[A-Za-z0-9_]` that starts with `A-Z`, is at least two
    /// characters long and contains no lowercase letter. Everything else is literal, so
    /// `FNAME LNAME` has two placeholders and `posixGroup` has none.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = input;

        while let Some(start) = rest.find(is_word_char) {
            let (before, from_word) = rest.split_at(start);
            literal.push_str(before);
            let end = from_word
                .find(|c: char| !is_word_char(c))
                .unwrap_or(from_word.len());
            let (word, after) = from_word.split_at(end);

            if is_placeholder(word) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(word.to_string()));
            } else {
                literal.push_str(word);
            }
            rest = after;
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// A literal that is never scanned for placeholders.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Literal(value.into())],
        }
    }

    /// A lone placeholder.
    #[must_use]
    pub fn placeholder(token: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Placeholder(token.into())],
        }
    }

    /// The expression's segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Tokens referenced by the expression.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(token) => Some(token.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitutes every placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedPlaceholder`] naming the first token with no binding.
    pub fn render(&self, values: &Placeholders) -> Result<String> {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(token) => {
                    let value = values.resolve(token).ok_or_else(|| Error::UnresolvedPlaceholder {
                        token: token.clone(),
                    })?;
                    rendered.push_str(value);
                }
            }
        }
        Ok(rendered)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_placeholder(word: &str) -> bool {
    word.len() >= 2
        && word.starts_with(|c: char| c.is_ascii_uppercase())
        && !word.chars().any(|c| c.is_ascii_lowercase())
}

/// Placeholder bindings: caller values layered over session defaults.
///
/// Caller values win; session defaults (the uppercase configuration settings) fill the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
    defaults: BTreeMap<String, String>,
}

impl Placeholders {
    /// Empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings that fall back to `defaults`.
    #[must_use]
    pub fn with_defaults(defaults: BTreeMap<String, String>) -> Self {
        Self {
            values: BTreeMap::new(),
            defaults,
        }
    }

    /// Binds `token` to `value`, replacing any earlier binding.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(token.into(), value.into());
        self
    }

    /// Builder form of [`Placeholders::insert`].
    #[must_use]
    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(token, value);
        self
    }

    /// Binds an operator-supplied `--key value` pair.
    ///
    /// Tokens are uppercase, so the key is uppercased; the value is kept verbatim.
    pub fn insert_extra(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.insert(key.to_ascii_uppercase(), value)
    }

    /// Binds every pair of `extras` with [`Placeholders::insert_extra`].
    pub fn extend_extra<I, K, V>(&mut self, extras: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in extras {
            self.insert_extra(key.as_ref(), value);
        }
        self
    }

    /// Looks `token` up in caller values, then in defaults.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.values
            .get(token)
            .or_else(|| self.defaults.get(token))
            .map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Placeholders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            defaults: BTreeMap::new(),
        }
    }
}

/// A declarative entry skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTemplate {
    /// Expression for the new entry's DN.
    pub dn: ValueExpr,
    /// Attribute name to value expressions, in declaration order.
    pub attributes: Vec<(String, Vec<ValueExpr>)>,
}

impl EntryTemplate {
    /// Template with the given DN expression and no attributes.
    #[must_use]
    pub fn new(dn: &str) -> Self {
        Self {
            dn: ValueExpr::parse(dn),
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute whose values are scanned for placeholders.
    #[must_use]
    pub fn attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exprs = values
            .into_iter()
            .map(|v| ValueExpr::parse(v.as_ref()))
            .collect();
        self.attributes.push((name.into(), exprs));
        self
    }

    /// Lifts a parsed record (typically from an LDIF template file) into a template.
    ///
    /// Binary attributes cannot hold placeholders and become literals of their lossy text.
    #[must_use]
    pub fn from_record(record: &DirectoryRecord) -> Self {
        let attributes = record
            .attributes
            .iter()
            .map(|(name, values)| {
                let exprs = match values {
                    AttributeValues::Text(texts) => {
                        texts.iter().map(|t| ValueExpr::parse(t)).collect()
                    }
                    AttributeValues::Binary(blobs) => blobs
                        .iter()
                        .map(|b| ValueExpr::literal(String::from_utf8_lossy(b)))
                        .collect(),
                };
                (name.clone(), exprs)
            })
            .collect();

        Self {
            dn: ValueExpr::parse(&record.dn),
            attributes,
        }
    }

    /// Every distinct token referenced by the template, DN first.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = Vec::new();
        let all = self.dn.placeholders().chain(
            self.attributes
                .iter()
                .flat_map(|(_, exprs)| exprs.iter().flat_map(ValueExpr::placeholders)),
        );
        for token in all {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Renders the template into a concrete entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedPlaceholder`] for the first token with no binding.
    pub fn render(&self, values: &Placeholders) -> Result<DirectoryRecord> {
        let mut record = DirectoryRecord::new(self.dn.render(values)?);
        for (name, exprs) in &self.attributes {
            let rendered = exprs
                .iter()
                .map(|expr| expr.render(values))
                .collect::<Result<Vec<_>>>()?;
            for value in rendered {
                record.push_text(name.clone(), value);
            }
        }
        Ok(record)
    }
}
