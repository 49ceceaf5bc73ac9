// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{borrow::Borrow, fmt, sync::Arc};

use serde::Serialize;

use crate::KeyError;

/// Maximum length of a query key in bytes.
pub const MAX_KEY_LEN: usize = 1024;

/// Identifies one logical query and its parameters in a cache store.
///
/// Keys are cheap to clone. Construction through [`QueryKey::new`] never fails; stores and the
/// coordinator call [`QueryKey::validate`] before using a key.
///
/// # Examples
///
/// ```
/// use readthru_store::QueryKey;
///
/// let key = QueryKey::new("robbery_count");
/// assert!(key.validate().is_ok());
///
/// let derived = QueryKey::derive("crimes.count", &[("Primary Type", "ROBBERY")])?;
/// assert!(derived.as_str().starts_with("crimes.count:"));
/// # Ok::<(), readthru_store::KeyError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Arc<str>);

impl QueryKey {
    /// Wraps a string as a query key without validating it.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// Derives a key from a query name and its parameters.
    ///
    /// The parameters are converted to a canonical JSON value, where object keys are sorted,
    /// and hashed with XXH3-128. Logically identical parameters therefore produce identical
    /// keys regardless of map iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the name is not a valid key or the parameters cannot be
    /// serialized.
    pub fn derive<P>(name: &str, params: &P) -> Result<Self, KeyError>
    where
        P: Serialize + ?Sized,
    {
        Self::new(name).validate()?;

        let canonical = serde_json::to_value(params).map_err(|e| KeyError::Params(e.to_string()))?;
        let bytes = serde_json::to_vec(&canonical).map_err(|e| KeyError::Params(e.to_string()))?;
        let digest = xxhash_rust::xxh3::xxh3_128(&bytes);

        let key = Self::new(format!("{name}:{digest:032x}"));
        key.validate()?;
        Ok(key)
    }

    /// Checks that the key is usable.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the key is empty, longer than [`MAX_KEY_LEN`] bytes, or contains
    /// whitespace or control characters.
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.0.is_empty() {
            return Err(KeyError::Empty);
        }

        if self.0.len() > MAX_KEY_LEN {
            return Err(KeyError::TooLong {
                len: self.0.len(),
                max: MAX_KEY_LEN,
            });
        }

        if let Some((position, found)) = self.0.char_indices().find(|(_, c)| c.is_whitespace() || c.is_control()) {
            return Err(KeyError::InvalidCharacter { found, position });
        }

        Ok(())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueryKey").field(&&*self.0).finish()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for QueryKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QueryKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for QueryKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;

    #[test]
    fn validate_accepts_plain_key() {
        assert_eq!(QueryKey::new("longquery_result").validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_empty_key() {
        assert_eq!(QueryKey::new("").validate(), Err(KeyError::Empty));
    }

    #[test]
    fn validate_rejects_long_key() {
        let key = QueryKey::new("k".repeat(MAX_KEY_LEN + 1));
        assert_eq!(
            key.validate(),
            Err(KeyError::TooLong {
                len: MAX_KEY_LEN + 1,
                max: MAX_KEY_LEN
            })
        );
        assert_eq!(QueryKey::new("k".repeat(MAX_KEY_LEN)).validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_whitespace_and_control() {
        assert_eq!(
            QueryKey::new("robbery count").validate(),
            Err(KeyError::InvalidCharacter { found: ' ', position: 7 })
        );
        assert_eq!(
            QueryKey::new("a\u{7}").validate(),
            Err(KeyError::InvalidCharacter {
                found: '\u{7}',
                position: 1
            })
        );
    }

    #[test]
    fn derive_ignores_map_ordering() {
        let mut hashed = HashMap::new();
        hashed.insert("Primary Type", "ROBBERY");
        hashed.insert("District", "007");
        hashed.insert("Arrest", "true");

        let mut sorted = BTreeMap::new();
        sorted.insert("Arrest", "true");
        sorted.insert("District", "007");
        sorted.insert("Primary Type", "ROBBERY");

        let a = QueryKey::derive("crimes.count", &hashed).unwrap();
        let b = QueryKey::derive("crimes.count", &sorted).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn derive_separates_names_and_params() {
        let robbery = QueryKey::derive("crimes.count", &[("Primary Type", "ROBBERY")]).unwrap();
        let theft = QueryKey::derive("crimes.count", &[("Primary Type", "THEFT")]).unwrap();
        let listed = QueryKey::derive("crimes.list", &[("Primary Type", "ROBBERY")]).unwrap();

        assert_ne!(robbery, theft);
        assert_ne!(robbery, listed);
        assert_eq!(robbery.as_str().len(), "crimes.count:".len() + 32);
    }

    #[test]
    fn derive_rejects_invalid_name() {
        assert_eq!(QueryKey::derive("", &()), Err(KeyError::Empty));
    }

    #[test]
    fn derive_reports_unserializable_params() {
        let mut params = HashMap::new();
        params.insert(vec![1_u8], "tuple keys are not valid JSON object keys");

        assert!(matches!(QueryKey::derive("q", &params), Err(KeyError::Params(_))));
    }

    #[test]
    fn display_and_debug() {
        let key = QueryKey::from("robbery_count");
        assert_eq!(key.to_string(), "robbery_count");
        assert_eq!(format!("{key:?}"), "QueryKey(\"robbery_count\")");
    }
}
