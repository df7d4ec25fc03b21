//! Decoding of sparse sub-list edit forms.
//!
//! Ingredient and instruction rows are edited through one flat form whose
//! field names follow `<prefix>_<row id>_<column or action>`, plus a single
//! `<prefix>_add_row` button. Parsing a field name yields a [`FormEntry`];
//! [`SubListEdit::decode`] folds the entries into the batch that the
//! ordering engine executes.

use std::collections::BTreeMap;

use serde::Deserialize;

/// A submitted `application/x-www-form-urlencoded` body, kept as ordered
/// pairs so unknown and repeated field names survive decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    /// Value of `key`; a repeated key yields its last value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Checkbox semantics: any value except the explicit "off" spellings is on.
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "off" | "false" | "no"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Up,
    Down,
    Delete,
}

impl RowAction {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEntry<'a> {
    /// Presence of the field is the signal, its value is ignored.
    Action { row: i64, action: RowAction },
    Field {
        row: i64,
        column: &'a str,
        value: &'a str,
    },
    AppendRow,
}

/// Classify one submitted field. Returns `None` for fields that do not
/// belong to the `prefix` sub-list.
pub fn parse_entry<'a>(prefix: &str, key: &'a str, value: &'a str) -> Option<FormEntry<'a>> {
    let rest = key.strip_prefix(prefix)?.strip_prefix('_')?;

    if rest == "add_row" {
        // An empty value is an unpressed button
        return (!value.is_empty()).then_some(FormEntry::AppendRow);
    }

    let (row, column) = rest.split_once('_')?;
    if row.is_empty() || !row.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: i64 = row.parse().ok()?;
    if column.is_empty() || !column.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    Some(match RowAction::from_token(column) {
        Some(action) => FormEntry::Action { row, action },
        None => FormEntry::Field { row, column, value },
    })
}

/// Everything one form submission asks of a sub-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubListEdit {
    /// Move and delete requests in submission order.
    pub actions: Vec<(i64, RowAction)>,
    /// Staged column values per row id. Only submitted columns appear.
    pub updates: BTreeMap<i64, BTreeMap<String, String>>,
    pub append: bool,
}

impl SubListEdit {
    pub fn decode<'a, I>(prefix: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut edit = Self::default();
        for (key, value) in fields {
            if let Some(entry) = parse_entry(prefix, key, value) {
                edit.push(entry);
            }
        }
        edit
    }

    fn push(&mut self, entry: FormEntry<'_>) {
        match entry {
            FormEntry::Action { row, action } => self.actions.push((row, action)),
            FormEntry::Field { row, column, value } => {
                self.updates
                    .entry(row)
                    .or_default()
                    .insert(column.to_string(), value.to_string());
            }
            FormEntry::AppendRow => self.append = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.updates.is_empty() && !self.append
    }
}
