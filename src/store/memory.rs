// src/store/memory.rs
use super::{KvStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// In-memory store, primarily for tests and store-less development runs.
/// Honors TTLs on read so cache-expiry behavior matches the real store.
#[derive(Default)]
pub struct MemoryStore {
    strings: RwLock<HashMap<String, (String, Option<Instant>)>>,
    lists: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let strings = self.strings.read().await;
        match strings.get(key) {
            Some((_, Some(expires_at))) if *expires_at <= Instant::now() => Ok(None),
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut strings = self.strings.write().await;
        strings.insert(
            key.to_string(),
            (value.to_string(), Some(Instant::now() + ttl)),
        );
        Ok(())
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut lists = self.lists.write().await;
        lists
            .entry(key.to_string())
            .or_default()
            .insert(0, value.to_string());
        Ok(())
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StoreError> {
        let mut lists = self.lists.write().await;
        if let Some(list) = lists.get_mut(key) {
            let len = list.len() as isize;
            let resolve = |i: isize| if i < 0 { (len + i).max(0) } else { i.min(len) };
            let start = resolve(start) as usize;
            let stop = resolve(stop);
            if start as isize > stop {
                list.clear();
            } else {
                let stop = (stop as usize + 1).min(list.len());
                *list = list[start..stop].to_vec();
            }
        }
        Ok(())
    }

    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        let lists = self.lists.read().await;
        let Some(list) = lists.get(key) else {
            return Ok(Vec::new());
        };
        let len = list.len() as isize;
        let resolve = |i: isize| if i < 0 { (len + i).max(0) } else { i.min(len) };
        let start = resolve(start) as usize;
        let stop = resolve(stop);
        if start as isize > stop {
            return Ok(Vec::new());
        }
        let stop = (stop as usize + 1).min(list.len());
        Ok(list[start..stop].to_vec())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
