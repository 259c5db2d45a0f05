//! Path parameters and query string parsing.
//!
//! - [`ParameterBag`]: values captured from a matched path. Every capture is
//!   appended to an ordered positional list; captures of named segments
//!   (`:id`) are additionally addressable by name. Wildcards (`*`) only get a
//!   positional slot.
//! - [`QueryParams`]: the `?key=value&...` part of a path, multi-valued.
//!
//! # Example
//!
//! ```
//! use page_router::{ParameterBag, QueryParams};
//!
//! // /route/:param/* matched against /route/param/asterisk
//! let mut params = ParameterBag::new();
//! params.push_named("param", "param");
//! params.push_positional("asterisk");
//! assert_eq!(params.len(), 2);
//! assert_eq!(params.get("param"), Some("param"));
//! assert_eq!(params.at(1), Some("asterisk"));
//!
//! let query = QueryParams::from_query_string("page=1&sort=name");
//! assert_eq!(query.get_as::<u32>("page"), Some(1));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::ops::Index;

/// Dual-indexed container of extracted path values.
///
/// Named lookups always refer to a positional entry, so `get(name)` and
/// `at(i)` can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBag {
    values: Vec<String>,
    names: HashMap<String, usize>,
}

impl ParameterBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unnamed value (a wildcard capture).
    pub fn push_positional(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    /// Append a value and make it addressable under `name`.
    ///
    /// A repeated name points at the newest value.
    pub fn push_named(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.names.insert(name.into(), self.values.len());
        self.values.push(value.into());
    }

    /// Get a value by parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(|&i| self.values[i].as_str())
    }

    /// Get a value by position.
    pub fn at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Get a named parameter and parse it as `T`.
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, name: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(name)?.parse().ok()
    }

    /// Return `true` if `name` is a named parameter.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Iterate over values in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Iterate over `(name, value)` pairs of named captures, in capture order.
    pub fn named(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut pairs: Vec<(&str, usize)> = self
            .names
            .iter()
            .map(|(name, &i)| (name.as_str(), i))
            .collect();
        pairs.sort_by_key(|&(_, i)| i);
        pairs
            .into_iter()
            .map(move |(name, i)| (name, self.values[i].as_str()))
    }

    /// Positional values as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.values
    }

    /// Number of positional values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<usize> for ParameterBag {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.values[index]
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters parsed from the query string of a path.
///
/// Supports multiple values for the same key. Decoding follows
/// `application/x-www-form-urlencoded` rules (`+` is a space).
///
/// # Example
///
/// ```
/// use page_router::QueryParams;
///
/// let query = QueryParams::from_query_string("tag=rust&tag=web&q=a+b");
/// assert_eq!(query.get_all("tag").unwrap().len(), 2);
/// assert_eq!(query.get("q"), Some("a b"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create empty query parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without its leading `?`.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), value.into_owned());
        }
        params
    }

    /// Parse the query part of a full path such as `/search?q=x`.
    pub fn from_path(path: &str) -> Self {
        path.split_once('?')
            .map(|(_, query)| Self::from_query_string(query))
            .unwrap_or_default()
    }

    /// Get the first value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key)?.first().map(String::as_str)
    }

    /// Get all values for a key.
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    /// Get the first value for a key, parsed as type `T`.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Append a value for the given key.
    pub fn insert(&mut self, key: String, value: String) {
        self.params.entry(key).or_default().push(value);
    }

    /// Return `true` if the given key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Serialize back into a query string, keys in sorted order.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Return `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Return the number of unique keys.
    pub fn len(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_positional_agree() {
        let mut params = ParameterBag::new();
        params.push_named("one", "1");
        params.push_named("two", "2");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("one"), params.at(0));
        assert_eq!(params.get("two"), params.at(1));
        assert_eq!(&params[1], "2");
    }

    #[test]
    fn test_wildcards_have_no_name() {
        let mut params = ParameterBag::new();
        params.push_positional("a/b");
        assert_eq!(params.len(), 1);
        assert_eq!(params.at(0), Some("a/b"));
        assert_eq!(params.named().count(), 0);
    }

    #[test]
    fn test_repeated_name_points_at_newest() {
        let mut params = ParameterBag::new();
        params.push_named("id", "old");
        params.push_named("id", "new");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("id"), Some("new"));
    }

    #[test]
    fn test_get_as() {
        let mut params = ParameterBag::new();
        params.push_named("id", "42");
        assert_eq!(params.get_as::<u32>("id"), Some(42));
        assert_eq!(params.get_as::<u32>("missing"), None);
    }

    #[test]
    fn test_named_iterates_in_capture_order() {
        let mut params = ParameterBag::new();
        params.push_named("b", "1");
        params.push_positional("x");
        params.push_named("a", "2");
        let pairs: Vec<_> = params.named().collect();
        assert_eq!(pairs, vec![("b", "1"), ("a", "2")]);
    }

    #[test]
    fn test_query_params_basic() {
        let query = QueryParams::from_query_string("?page=1&sort=name");
        assert_eq!(query.get("page"), Some("1"));
        assert_eq!(query.get("sort"), Some("name"));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_query_params_multiple_values() {
        let query = QueryParams::from_query_string("tag=rust&tag=web");
        assert_eq!(
            query.get_all("tag"),
            Some(&["rust".to_string(), "web".to_string()][..])
        );
        assert_eq!(query.get("tag"), Some("rust"));
    }

    #[test]
    fn test_query_params_from_path() {
        let query = QueryParams::from_path("/search?q=hello%20world");
        assert_eq!(query.get("q"), Some("hello world"));
        assert!(QueryParams::from_path("/search").is_empty());
    }

    #[test]
    fn test_to_query_string() {
        let mut query = QueryParams::new();
        query.insert("sort".to_string(), "name".to_string());
        query.insert("page".to_string(), "1".to_string());
        assert_eq!(query.to_query_string(), "page=1&sort=name");
    }
}
