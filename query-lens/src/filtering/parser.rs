use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::OnceLock;

use log::{debug, trace};
use regex::Regex;

use crate::errors::{FilterError, FilterErrorCollection};
use crate::filtering::FilterTerm;
use crate::operators::Operator;

const FILTER_PREFIX: &str = "filter[";

/// A source of request parameters.
///
/// Each key may carry several values. Only the first value of a key
/// is ever used for filtering.
pub trait ParamSource {
    /// Every parameter with all of its values.
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &[String])> + '_>;
    /// The first value of the parameter `name`, if present.
    fn first(&self, name: &str) -> Option<&str>;
}

/// Query parameters in the order their keys were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
    // position of each key in `entries`
    index: HashMap<String, usize>,
}

impl QueryParams {
    pub fn new() -> Self {
        Default::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes()).collect()
    }

    /// Add a value for `key`, after any it already has.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1.push(value),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, vec![value]));
            }
        }
        self
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.append(k, v);
        }
        params
    }
}

impl ParamSource for QueryParams {
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &[String])> + '_> {
        Box::new(self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
    }

    fn first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }
}

impl ParamSource for HashMap<String, Vec<String>> {
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &[String])> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
    }

    fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }
}

impl ParamSource for BTreeMap<String, Vec<String>> {
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &[String])> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
    }

    fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }
}

/// The outcome of parsing: every term that could be read, and an
/// error for every key that couldn't.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub filters: Vec<FilterTerm>,
    pub errors: FilterErrorCollection,
}

/// Reads filter terms out of a [`ParamSource`].
pub struct Parser<'a, P: ?Sized> {
    params: &'a P,
}

fn filter_key() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| {
        Regex::new(r"^filter\[([^\[\]]*)\](?:\[([^\[\]]*)\])?$").expect("filter key pattern")
    })
}

/// The bracket groups of a filter key.
#[derive(Debug, PartialEq, Eq)]
enum FilterKey<'k> {
    Implicit { field: &'k str },
    Explicit { field: &'k str, operator: &'k str },
}

fn split_filter_key(key: &str) -> Option<FilterKey<'_>> {
    let caps = filter_key().captures(key)?;
    let field = caps.get(1)?.as_str();
    match caps.get(2) {
        Some(operator) => Some(FilterKey::Explicit {
            field,
            operator: operator.as_str(),
        }),
        None => Some(FilterKey::Implicit { field }),
    }
}

impl<'a, P: ParamSource + ?Sized> Parser<'a, P> {
    pub fn new(params: &'a P) -> Self {
        Self { params }
    }

    /// Read every `filter[...]` key.
    ///
    /// Keys that don't start with `filter[` belong to someone else and
    /// are skipped. Terms come out in the iteration order of the
    /// source.
    pub fn parse(&self) -> ParseResult {
        let mut result = ParseResult::default();

        for (key, values) in self.params.entries() {
            if !key.starts_with(FILTER_PREFIX) {
                continue;
            }
            let value = match values.first() {
                Some(value) => value.as_str(),
                None => continue,
            };
            trace!("Parsing filter key {} = {:?}", key, value);
            match Self::parse_one(key, value) {
                Ok(term) => result.filters.push(term),
                Err(e) => {
                    debug!("Rejected filter key {}: {}", key, e);
                    result.errors.push(e);
                }
            }
        }

        result
    }

    fn parse_one(key: &str, value: &str) -> Result<FilterTerm, FilterError> {
        let (field, operator) = match split_filter_key(key) {
            Some(FilterKey::Implicit { field }) => (field, None),
            Some(FilterKey::Explicit { field, operator }) => (field, Some(operator)),
            None => return Err(FilterError::invalid_filter_format(key, value)),
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(FilterError::empty_field(value));
        }

        let operator = match operator {
            Some(token) => {
                Operator::from_str(token).map_err(|_| FilterError::invalid_operator(field, token))?
            }
            None => Operator::Eq,
        };

        Ok(FilterTerm::new(field, operator, value))
    }
}
