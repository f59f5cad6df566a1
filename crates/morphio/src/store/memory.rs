use std::collections::BTreeMap;

use super::{normalize_path, AttrValue, DatasetInfo, ElementClass, StoreError, TabularStore};

#[derive(Debug, Clone, PartialEq)]
enum Values {
    Float(Vec<f64>),
    Int(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
struct StoredDataset {
    shape: Vec<u64>,
    values: Values,
}

/// A [`TabularStore`] held entirely in memory.
///
/// Useful for feeding the decoder from other readers and for tests. Adding a
/// dataset or attribute creates every missing parent group.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    location: String,
    groups: BTreeMap<String, BTreeMap<String, AttrValue>>,
    datasets: BTreeMap<String, StoredDataset>,
}

impl MemoryStore {
    pub fn new(location: impl Into<String>) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert("/".to_string(), BTreeMap::new());
        Self {
            location: location.into(),
            groups,
            datasets: BTreeMap::new(),
        }
    }

    pub fn add_group(&mut self, path: &str) -> &mut Self {
        let path = normalize_path(path);
        self.ensure_parents(&path);
        self.groups.entry(path).or_default();
        self
    }

    pub fn set_attr(&mut self, group: &str, name: &str, value: AttrValue) -> &mut Self {
        let group = normalize_path(group);
        self.add_group(&group);
        if let Some(attrs) = self.groups.get_mut(&group) {
            attrs.insert(name.to_string(), value);
        }
        self
    }

    pub fn put_f64(&mut self, path: &str, shape: &[u64], values: Vec<f64>) -> &mut Self {
        self.put(path, shape, Values::Float(values))
    }

    pub fn put_i64(&mut self, path: &str, shape: &[u64], values: Vec<i64>) -> &mut Self {
        self.put(path, shape, Values::Int(values))
    }

    fn put(&mut self, path: &str, shape: &[u64], values: Values) -> &mut Self {
        let path = normalize_path(path);
        self.ensure_parents(&path);
        self.datasets.insert(
            path,
            StoredDataset {
                shape: shape.to_vec(),
                values,
            },
        );
        self
    }

    fn ensure_parents(&mut self, path: &str) {
        let mut parent = String::new();
        let mut parts = path.split('/').filter(|c| !c.is_empty()).peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                break;
            }
            parent.push('/');
            parent.push_str(part);
            self.groups.entry(parent.clone()).or_default();
        }
    }

    fn stored(&self, path: &str) -> Result<&StoredDataset, StoreError> {
        let key = normalize_path(path);
        let stored = self
            .datasets
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        let expected = stored.shape.iter().product::<u64>();
        let actual = match &stored.values {
            Values::Float(v) => v.len(),
            Values::Int(v) => v.len(),
        };
        if expected != actual as u64 {
            return Err(StoreError::Data {
                path: key,
                reason: format!("shape {:?} needs {expected} values, found {actual}", stored.shape),
            });
        }
        Ok(stored)
    }
}

impl TabularStore for MemoryStore {
    fn location(&self) -> &str {
        &self.location
    }

    fn has_group(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.groups.contains_key(&normalize_path(path)))
    }

    fn attribute(&self, group: &str, name: &str) -> Result<Option<AttrValue>, StoreError> {
        Ok(self
            .groups
            .get(&normalize_path(group))
            .and_then(|attrs| attrs.get(name))
            .cloned())
    }

    fn dataset(&self, path: &str) -> Result<Option<DatasetInfo>, StoreError> {
        Ok(self.datasets.get(&normalize_path(path)).map(|d| DatasetInfo {
            shape: d.shape.clone(),
            class: match d.values {
                Values::Float(_) => ElementClass::Float,
                Values::Int(_) => ElementClass::Integer,
            },
        }))
    }

    fn read_f64(&self, path: &str) -> Result<Vec<f64>, StoreError> {
        Ok(match &self.stored(path)?.values {
            Values::Float(v) => v.clone(),
            Values::Int(v) => v.iter().map(|x| *x as f64).collect(),
        })
    }

    fn read_i64(&self, path: &str) -> Result<Vec<i64>, StoreError> {
        match &self.stored(path)?.values {
            Values::Int(v) => Ok(v.clone()),
            Values::Float(v) => v
                .iter()
                .map(|x| {
                    if x.fract() == 0.0 && x.is_finite() {
                        Ok(*x as i64)
                    } else {
                        Err(StoreError::Data {
                            path: normalize_path(path),
                            reason: format!("{x} is not an integer"),
                        })
                    }
                })
                .collect(),
        }
    }
}
