use serde::Serialize;
use serde_json::{Map, Value};

/// One report payload as received from the dashboard backend.
pub type Record = Map<String, Value>;

/// Ordered candidate spellings for one logical field. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldVariants(Vec<String>);

impl FieldVariants {
    /// Returns `None` for an empty list; the first variant doubles as the
    /// key to create when nothing matches.
    pub fn new<I, S>(variants: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let v: Vec<String> = variants.into_iter().map(Into::into).collect();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    pub(crate) fn builtin(variants: &[&str]) -> Self {
        debug_assert!(!variants.is_empty());
        Self(variants.iter().map(|s| s.to_string()).collect())
    }

    pub fn canonical(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    Exact,
    CaseInsensitive,
    Partial,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub key: String,
    pub kind: MatchKind,
}

impl Resolution {
    pub fn found(&self) -> bool {
        self.kind != MatchKind::Synthesized
    }
}

pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// `""` and null count as "no value" for writes and nested reads.
pub fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn exact_match(record: &Record, variants: &FieldVariants) -> Option<String> {
    variants
        .iter()
        .find(|v| record.contains_key(*v))
        .map(|v| v.to_string())
}

fn case_insensitive_match(record: &Record, variants: &FieldVariants) -> Option<String> {
    for variant in variants.iter() {
        let want = normalize_key(variant);
        if let Some(k) = record.keys().find(|k| normalize_key(k) == want) {
            return Some(k.clone());
        }
    }
    None
}

fn partial_match(record: &Record, variants: &FieldVariants) -> Option<String> {
    for variant in variants.iter() {
        let want = normalize_key(variant);
        if want.is_empty() {
            continue;
        }
        let hit = record.keys().find(|k| {
            let have = normalize_key(k);
            !have.is_empty() && (have.contains(&want) || want.contains(&have))
        });
        if let Some(k) = hit {
            return Some(k.clone());
        }
    }
    None
}

/// Exact, then case-insensitive, then the canonical variant.
pub fn resolve(record: &Record, variants: &FieldVariants) -> Resolution {
    if let Some(key) = exact_match(record, variants) {
        return Resolution {
            key,
            kind: MatchKind::Exact,
        };
    }
    if let Some(key) = case_insensitive_match(record, variants) {
        return Resolution {
            key,
            kind: MatchKind::CaseInsensitive,
        };
    }
    Resolution {
        key: variants.canonical().to_string(),
        kind: MatchKind::Synthesized,
    }
}

/// Like [`resolve`], with a substring tier before falling back to the
/// canonical variant.
pub fn resolve_loose(record: &Record, variants: &FieldVariants) -> Resolution {
    let strict = resolve(record, variants);
    if strict.found() {
        return strict;
    }
    match partial_match(record, variants) {
        Some(key) => Resolution {
            key,
            kind: MatchKind::Partial,
        },
        None => strict,
    }
}

pub fn resolve_key(record: &Record, variants: &FieldVariants) -> String {
    resolve(record, variants).key
}

/// The stored spelling of `sub_key`: exact first, then trimmed and case-folded.
fn nested_key(nested: &Record, sub_key: &str) -> Option<String> {
    if nested.contains_key(sub_key) {
        return Some(sub_key.to_string());
    }
    let want = normalize_key(sub_key);
    nested.keys().find(|k| normalize_key(k) == want).cloned()
}

fn nested_lookup<'a>(nested: &'a Record, sub_key: &str) -> Option<&'a Value> {
    nested_key(nested, sub_key).and_then(|k| nested.get(&k))
}

pub fn get_value<'a>(
    record: &'a Record,
    variants: &FieldVariants,
    sub_key: Option<&str>,
) -> Option<&'a Value> {
    let key = resolve_key(record, variants);
    let outer = record.get(&key).filter(|v| !v.is_null())?;
    let Some(sub_key) = sub_key else {
        return Some(outer);
    };
    let nested = outer.as_object()?;
    nested_lookup(nested, sub_key).filter(|v| !is_empty_value(v))
}

/// Returns the object stored under `key`, creating it when absent. A
/// scalar sitting under the key is replaced by an empty object.
pub fn ensure_container<'a>(record: &'a mut Record, key: &str) -> &'a mut Record {
    let slot = record
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        tracing::debug!(key, "replacing non-object value with container");
    }
    object_slot(slot)
}

fn object_slot(slot: &mut Value) -> &mut Record {
    match slot {
        Value::Object(m) => m,
        other => {
            *other = Value::Object(Map::new());
            object_slot(other)
        }
    }
}

/// Writes `record[key][sub_key]`. The nested entry is found the same way
/// [`get_value`] finds it, so a differently cased spelling already stored is
/// overwritten or deleted in place. Empty values delete the entry and drop
/// the outer key once it has nothing left. Returns the key that was used.
pub fn set_value(
    record: &mut Record,
    variants: &FieldVariants,
    sub_key: &str,
    value: Value,
) -> String {
    let key = resolve_key(record, variants);

    if is_empty_value(&value) {
        let now_empty = match record.get_mut(&key).and_then(|v| v.as_object_mut()) {
            Some(nested) => {
                if let Some(stored) = nested_key(nested, sub_key) {
                    nested.shift_remove(&stored);
                }
                nested.is_empty()
            }
            None => false,
        };
        if now_empty {
            record.shift_remove(&key);
        }
        return key;
    }

    let nested = ensure_container(record, &key);
    let stored = nested_key(nested, sub_key).unwrap_or_else(|| sub_key.to_string());
    nested.insert(stored, value);
    key
}

/// Scalar counterpart of [`set_value`] for fields that are not keyed by topic.
pub fn set_top_level(record: &mut Record, variants: &FieldVariants, value: Value) -> String {
    let key = resolve_key(record, variants);
    if is_empty_value(&value) {
        record.shift_remove(&key);
    } else {
        record.insert(key.clone(), value);
    }
    key
}
