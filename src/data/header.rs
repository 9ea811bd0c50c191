use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// HeaderValue – a single metadata entry of an instrument export
// ---------------------------------------------------------------------------

/// A dynamically-typed header value.
/// Filters put these in `BTreeSet`s, so `HeaderValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Integer(i64),
    Float(f64),
    String(String),
    /// Calibration coefficients (`Pixel…` / `Shift…` keys).
    FloatArray(Vec<f64>),
}

// -- Manual Eq/Ord so we can put HeaderValue in BTreeSet --

impl Eq for HeaderValue {}

impl PartialOrd for HeaderValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeaderValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use HeaderValue::*;
        fn discriminant(v: &HeaderValue) -> u8 {
            match v {
                Integer(_) => 0,
                Float(_) => 1,
                String(_) => 2,
                FloatArray(_) => 3,
            }
        }
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (FloatArray(a), FloatArray(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Integer(i) => write!(f, "{i}"),
            // Keep the decimal point so a float never reads as an integer.
            HeaderValue::Float(v) => write!(f, "{v:?}"),
            HeaderValue::String(s) => write!(f, "{s}"),
            HeaderValue::FloatArray(values) => {
                let joined: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

impl HeaderValue {
    /// Coerce a raw scalar field: all-digit text becomes an integer,
    /// anything else is kept verbatim.
    pub fn from_scalar(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = raw.parse::<i64>() {
                return HeaderValue::Integer(i);
            }
        }
        HeaderValue::String(raw.to_string())
    }

    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::String(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::String(s)
    }
}

impl From<i64> for HeaderValue {
    fn from(i: i64) -> Self {
        HeaderValue::Integer(i)
    }
}

impl From<f64> for HeaderValue {
    fn from(v: f64) -> Self {
        HeaderValue::Float(v)
    }
}

impl From<Vec<f64>> for HeaderValue {
    fn from(values: Vec<f64>) -> Self {
        HeaderValue::FloatArray(values)
    }
}

// ---------------------------------------------------------------------------
// Header – insertion-ordered key → value map
// ---------------------------------------------------------------------------

/// Spectrum metadata. Keys keep the order in which they were first inserted,
/// so exported headers come out in the same order the instrument wrote them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    entries: Vec<(String, HeaderValue)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. Overwriting keeps the key's position.
    /// Returns the previous value, if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<HeaderValue>,
    ) -> Option<HeaderValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<HeaderValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<HeaderValue>> FromIterator<(K, V)> for Header {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut header = Header::new();
        for (k, v) in iter {
            header.insert(k, v);
        }
        header
    }
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_coercion_only_accepts_plain_digits() {
        assert_eq!(HeaderValue::from_scalar("228"), HeaderValue::Integer(228));
        assert_eq!(
            HeaderValue::from_scalar("-3"),
            HeaderValue::String("-3".into())
        );
        assert_eq!(
            HeaderValue::from_scalar("1.5"),
            HeaderValue::String("1.5".into())
        );
        assert_eq!(HeaderValue::from_scalar(""), HeaderValue::String(String::new()));
    }

    #[test]
    fn insertion_order_survives_overwrite() {
        let mut header = Header::new();
        header.insert("Method", "Column 1");
        header.insert("Scan", 3_i64);
        header.insert("Name", "apple");
        let previous = header.insert("Scan", 4_i64);

        assert_eq!(previous, Some(HeaderValue::Integer(3)));
        assert_eq!(header.keys().collect::<Vec<_>>(), ["Method", "Scan", "Name"]);
        assert_eq!(header.get("Scan"), Some(&HeaderValue::Integer(4)));
    }

    #[test]
    fn serializes_as_ordered_object() {
        let header: Header = [
            ("Name", HeaderValue::from("b")),
            ("Pixel", HeaderValue::from(vec![1.0, 2.5])),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(json, r#"{"Name":"b","Pixel":[1.0,2.5]}"#);
    }

    #[test]
    fn ordering_groups_variants_then_values() {
        let mut values = vec![
            HeaderValue::from("b"),
            HeaderValue::from(2_i64),
            HeaderValue::from("a"),
            HeaderValue::from(1_i64),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                HeaderValue::from(1_i64),
                HeaderValue::from(2_i64),
                HeaderValue::from("a"),
                HeaderValue::from("b"),
            ]
        );
    }
}
