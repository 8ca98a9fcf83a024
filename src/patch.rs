//! Helpers for partial-update payloads.
//!
//! A patch field is `Option<Option<T>>`: `None` means the key was absent and
//! the column stays untouched, `Some(None)` means an explicit `null` that
//! clears the column, `Some(Some(v))` sets it.

use serde::{Deserialize, Deserializer};

/// Use with `#[serde(default, deserialize_with = "crate::patch::double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::double_option")]
        value: Option<Option<i64>>,
    }

    #[test]
    fn test_absent_null_and_present_are_distinct() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.value, None);

        let null: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(null.value, Some(None));

        let set: Probe = serde_json::from_str(r#"{"value": 15}"#).unwrap();
        assert_eq!(set.value, Some(Some(15)));
    }
}
