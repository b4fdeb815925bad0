use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::store::{QueryFilter, RemoteStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Push,
    Get,
}

/// A document written through [`RemoteStore::push`].
#[derive(Debug, Clone, PartialEq)]
pub struct Push {
    pub path: String,
    pub key: String,
    pub document: Value,
}

#[derive(Debug, Default)]
struct Inner {
    root: Value,
    failing: HashSet<Operation>,
    pushes: Vec<Push>,
}

impl Inner {
    fn check(&self, operation: Operation) -> Result<(), StoreError> {
        if self.failing.contains(&operation) {
            return Err(StoreError::Unavailable(format!("{operation:?} rejected")));
        }
        Ok(())
    }
}

/// Datastore kept in process memory.
///
/// Used when no remote datastore is configured, and as the fake in tests.
/// Individual operations can be made to fail to emulate a lost connection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the document at `path`, creating intermediate objects.
    pub fn insert(&self, path: &str, document: Value) {
        *entry(&mut self.lock().root, path) = document;
    }

    pub fn document(&self, path: &str) -> Option<Value> {
        lookup(&self.lock().root, path)
            .filter(|value| !value.is_null())
            .cloned()
    }

    pub fn fail(&self, operation: Operation) {
        self.lock().failing.insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.lock().failing.remove(&operation);
    }

    /// Every successful push, oldest first.
    pub fn pushes(&self) -> Vec<Push> {
        self.lock().pushes.clone()
    }

    pub fn pushes_to(&self, path: &str) -> Vec<Push> {
        self.lock()
            .pushes
            .iter()
            .filter(|push| push.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn query(&self, path: &str, filter: &QueryFilter) -> Result<Option<Value>, StoreError> {
        let inner = self.lock();
        inner.check(Operation::Query)?;

        let Some(Value::Object(children)) = lookup(&inner.root, path) else {
            return Ok(None);
        };

        let mut selected: Vec<(&String, &Value)> = children
            .iter()
            .filter(|(_, child)| filter.matches(child))
            .collect();
        if let Some(field) = &filter.order_by {
            selected.sort_by(|(a_key, a), (b_key, b)| {
                compare(a.get(field), b.get(field)).then_with(|| a_key.cmp(b_key))
            });
        } else {
            selected.sort_by_key(|(key, _)| *key);
        }

        let limit = filter.limit_to_first.unwrap_or(usize::MAX);
        let result: Map<String, Value> = selected
            .into_iter()
            .take(limit)
            .map(|(key, child)| (key.clone(), child.clone()))
            .collect();

        if result.is_empty() {
            return Ok(None);
        }
        Ok(Some(Value::Object(result)))
    }

    async fn push(&self, path: &str, document: &Value) -> Result<String, StoreError> {
        let mut inner = self.lock();
        inner.check(Operation::Push)?;

        let key = Uuid::new_v4().simple().to_string();
        *entry(&mut inner.root, &format!("{path}/{key}")) = document.clone();
        inner.pushes.push(Push {
            path: path.to_string(),
            key: key.clone(),
            document: document.clone(),
        });
        debug!(path, %key, "stored document");

        Ok(key)
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.lock();
        inner.check(Operation::Get)?;

        Ok(lookup(&inner.root, path)
            .filter(|value| !value.is_null())
            .cloned())
    }
}

// Missing and null values first, then booleans, numbers, strings and objects.
fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_) | Value::Object(_)) => 4,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            a.total_cmp(&b)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |node, segment| node.get(segment))
}

fn entry<'a>(mut node: &'a mut Value, path: &str) -> &'a mut Value {
    for segment in segments(path) {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(children) => children.entry(segment).or_insert(Value::Null),
            _ => unreachable!("node was just replaced by an object"),
        };
    }
    node
}
