use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FieldPath, FieldValue, FieldValueError, FromFieldValue};

static NULL: FieldValue = FieldValue::Null;

/// The contents of one form: an open record keyed by field name.
///
/// The engine never assumes a closed shape; it only touches the names
/// declared in the form's field configuration. Typed records convert
/// to and from this through `FormRecord`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData {
    values: BTreeMap<String, FieldValue>,
}

impl FormData {
    /// Create a new empty record.
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Insert a value under the given field name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Get the value stored under a field name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Get the value under a field name, `Null` when absent.
    pub fn value(&self, name: &str) -> &FieldValue {
        self.values.get(name).unwrap_or(&NULL)
    }

    /// Mutable access to a stored value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.values.get_mut(name)
    }

    /// Check if a value exists under the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    /// Get an iterator over all name-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    /// Get the number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no stored values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another record into this one; values from `other` win.
    pub fn extend(&mut self, other: FormData) {
        self.values.extend(other.values);
    }

    /// `self` overlaid with `other`, leaving both inputs untouched.
    ///
    /// Used to build submit payloads from static params plus form contents.
    pub fn merged(&self, other: &FormData) -> FormData {
        let mut merged = self.clone();
        merged.extend(other.clone());
        merged
    }

    /// Resolve a dotted path through nested records and lists.
    ///
    /// ```
    /// use form_engine_types::{FieldPath, FieldValue, FormData};
    ///
    /// let item = FormData::new().with("isin", "IT0000000001");
    /// let data = FormData::new().with("holdings", vec![FieldValue::from(item)]);
    ///
    /// let isin = data.lookup(&FieldPath::new("holdings.0.isin"));
    /// assert_eq!(isin.and_then(FieldValue::as_str), Some("IT0000000001"));
    /// assert!(data.lookup(&FieldPath::new("holdings.3.isin")).is_none());
    /// ```
    pub fn lookup(&self, path: &FieldPath) -> Option<&FieldValue> {
        let mut segments = path.segments();
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                FieldValue::Record(data) => data.get(segment)?,
                FieldValue::List(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Read a typed value, reporting the field name on failure.
    pub fn get_as<T: FromFieldValue>(&self, name: &str) -> Result<T, FieldValueError> {
        T::from_field_value(self.value(name)).map_err(|err| err.in_field(name))
    }

    /// Get a text value.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// Get a numeric value (text is parsed).
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// Get a boolean value.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    /// Check if a field holds a non-blank value.
    pub fn has_value(&self, name: &str) -> bool {
        !self.value(name).is_blank()
    }
}

impl FromIterator<(String, FieldValue)> for FormData {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FormData {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormData {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut data = FormData::new();
        data.insert("name", "Alice");
        data.insert("age", 30);

        assert_eq!(data.get_str("name"), Some("Alice"));
        assert_eq!(data.get_number("age"), Some(30.0));
        assert_eq!(data.value("missing"), &FieldValue::Null);
    }

    #[test]
    fn merged_prefers_right_hand_side() {
        let params = FormData::new().with("id", 7).with("name", "old");
        let data = FormData::new().with("name", "new");

        let payload = params.merged(&data);
        assert_eq!(payload.get_number("id"), Some(7.0));
        assert_eq!(payload.get_str("name"), Some("new"));
        assert_eq!(params.get_str("name"), Some("old"));
    }

    #[test]
    fn typed_access_reports_field() {
        let data = FormData::new().with("age", "abc");
        let err = data.get_as::<u32>("age").unwrap_err();
        assert_eq!(err.to_string(), "field 'age': expected Number, got Text");
    }
}
