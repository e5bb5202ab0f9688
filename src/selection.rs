//! Selection set: the option ids chosen for one generation request.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;

use crate::error::{NattdError, Result};

/// One selected option, optionally pinned to an installation variant.
///
/// Written as `id` or `id=variant` on the command line and in config files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub id: String,
    pub variant: Option<String>,
}

impl Selection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            variant: None,
        }
    }

    pub fn with_variant(id: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            variant: Some(variant.into()),
        }
    }
}

impl FromStr for Selection {
    type Err = NattdError;

    fn from_str(s: &str) -> Result<Self> {
        let (id, variant) = match s.split_once('=') {
            Some((id, variant)) => (id.trim(), Some(variant.trim())),
            None => (s.trim(), None),
        };
        if id.is_empty() {
            return Err(NattdError::invalid_request(format!(
                "empty option id in selection '{}'",
                s
            )));
        }
        if variant.is_some_and(str::is_empty) {
            return Err(NattdError::invalid_request(format!(
                "empty variant in selection '{}'",
                s
            )));
        }
        Ok(Self {
            id: id.to_string(),
            variant: variant.map(str::to_string),
        })
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}={}", self.id, variant),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Set of selected option ids. Selecting an id twice behaves as once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: BTreeMap<String, Option<String>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from selections, merging repeats.
    pub fn from_selections<I>(selections: I) -> Result<Self>
    where
        I: IntoIterator<Item = Selection>,
    {
        let mut set = Self::new();
        for selection in selections {
            set.insert(selection)?;
        }
        Ok(set)
    }

    /// Parse `id` / `id=variant` strings into a set.
    pub fn parse<I, S>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selections = items
            .into_iter()
            .map(|s| s.as_ref().parse::<Selection>())
            .collect::<Result<Vec<_>>>()?;
        Self::from_selections(selections)
    }

    /// Add a selection. An explicit variant wins over an unspecified one;
    /// two different explicit variants conflict.
    pub fn insert(&mut self, selection: Selection) -> Result<()> {
        match self.entries.entry(selection.id) {
            Entry::Vacant(entry) => {
                entry.insert(selection.variant);
            }
            Entry::Occupied(mut entry) => match (entry.get().clone(), selection.variant) {
                (Some(first), Some(second)) if first != second => {
                    return Err(NattdError::ConflictingVariants {
                        id: entry.key().clone(),
                        first,
                        second,
                    });
                }
                (None, Some(second)) => {
                    entry.insert(Some(second));
                }
                _ => {}
            },
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Variant pinned for `id`, if any
    pub fn variant_of(&self, id: &str) -> Option<&str> {
        self.entries.get(id).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selections in id order
    pub fn iter(&self) -> impl Iterator<Item = Selection> + '_ {
        self.entries.iter().map(|(id, variant)| Selection {
            id: id.clone(),
            variant: variant.clone(),
        })
    }
}
