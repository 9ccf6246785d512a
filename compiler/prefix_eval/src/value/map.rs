//! Insertion-ordered maps keyed by scalars.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Value;

/// A map key. Only `INT`, `FLT` and `STR` values can key a map; floats are
/// keyed by their bit pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    Int(i64),
    Float(u64),
    Str(String),
}

impl MapKey {
    pub fn from_value(v: &Value) -> Option<MapKey> {
        match v {
            Value::Int(n) => Some(MapKey::Int(*n)),
            Value::Float(x) => Some(MapKey::Float(x.to_bits())),
            Value::Str(s) => Some(MapKey::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Int(n) => Value::Int(*n),
            MapKey::Float(bits) => Value::Float(f64::from_bits(*bits)),
            MapKey::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// Map payload: an association list in insertion order.
#[derive(Clone, Default)]
pub struct MapData {
    entries: Vec<(MapKey, Value)>,
}

impl MapData {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &MapKey) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Insert or overwrite; an overwritten key keeps its position.
    pub fn insert(&mut self, key: MapKey, value: Value) -> Option<Value> {
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &MapKey) -> Option<Value> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &MapKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    #[must_use]
    pub fn deep_copy(&self) -> MapData {
        MapData {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.deep_copy()))
                .collect(),
        }
    }
}

impl FromIterator<(MapKey, Value)> for MapData {
    fn from_iter<I: IntoIterator<Item = (MapKey, Value)>>(iter: I) -> Self {
        let mut map = MapData::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Shared, lock-protected map handle.
#[derive(Clone)]
pub struct MapRef(Arc<RwLock<MapData>>);

impl MapRef {
    pub fn new(m: MapData) -> Self {
        MapRef(Arc::new(RwLock::new(m)))
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, MapData> {
        self.0.read()
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, MapData> {
        self.0.write()
    }

    #[inline]
    pub fn ptr_eq(a: &MapRef, b: &MapRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}
