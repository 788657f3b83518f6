//! Logical ids for whitelist entries and the whitelist itself.
//!
//! An entry identifies either a standard quick-reply set (by name) or a
//! script-injected button (by script id). The persisted form is a plain
//! string matching `^(QRV2::.+|JSR::.+)$`, stored inside the embedder's
//! larger settings object; this module only defines the round-trip.

use indexmap::IndexSet;
use smartstring::alias::String as SmartString;
use std::fmt;
use std::str::FromStr;

/// Persisted prefix for standard-set entries.
pub const SET_PREFIX: &str = "QRV2::";
/// Persisted prefix for script-injected entries.
pub const SCRIPT_PREFIX: &str = "JSR::";

/// Logical identity of a consolidatable button group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// A standard quick-reply set, identified by name.
    Set(SmartString),
    /// A script-injected container, identified by script id.
    Script(SmartString),
}

impl EntryId {
    /// Entry for a standard set.
    pub fn set(name: &str) -> Self {
        EntryId::Set(SmartString::from(name))
    }

    /// Entry for a script-injected container.
    pub fn script(id: &str) -> Self {
        EntryId::Script(SmartString::from(id))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Set(name) => write!(f, "{SET_PREFIX}{name}"),
            EntryId::Script(id) => write!(f, "{SCRIPT_PREFIX}{id}"),
        }
    }
}

/// Error parsing a persisted whitelist entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed whitelist entry {0:?} (expected QRV2::<name> or JSR::<scriptId>)")]
pub struct ParseEntryError(pub String);

impl FromStr for EntryId {
    type Err = ParseEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix(SET_PREFIX) {
            if !name.is_empty() {
                return Ok(EntryId::set(name));
            }
        }
        if let Some(id) = s.strip_prefix(SCRIPT_PREFIX) {
            if !id.is_empty() {
                return Ok(EntryId::script(id));
            }
        }
        Err(ParseEntryError(s.to_owned()))
    }
}

/// Ordered set of whitelist entries.
///
/// Entries are unique; insertion order is preserved for display only and
/// carries no policy meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    entries: IndexSet<EntryId>,
}

impl Whitelist {
    /// Empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse persisted entries, silently dropping malformed ones (the
    /// settings object may carry junk from older versions).
    pub fn from_persisted<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut whitelist = Self::new();
        for raw in entries {
            match raw.as_ref().parse::<EntryId>() {
                Ok(entry) => {
                    whitelist.add(entry);
                }
                Err(err) => tracing::debug!("dropping persisted entry: {err}"),
            }
        }
        whitelist
    }

    /// Persisted string form, in insertion order.
    pub fn to_persisted(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Add an entry. Returns `true` if it was not already present.
    pub fn add(&mut self, entry: EntryId) -> bool {
        self.entries.insert(entry)
    }

    /// Remove an entry. Returns `true` if it was present.
    pub fn remove(&mut self, entry: &EntryId) -> bool {
        self.entries.shift_remove(entry)
    }

    /// Whether the entry is whitelisted.
    pub fn contains(&self, entry: &EntryId) -> bool {
        self.entries.contains(entry)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EntryId> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the whitelist is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Script ids of the `JSR::` entries, in insertion order.
    pub fn script_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            EntryId::Script(id) => Some(id.as_str()),
            EntryId::Set(_) => None,
        })
    }
}
