use crate::core::{City, CityStore};
use crate::utils::error::{CityError, Result};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Indexes {
    cities: HashMap<u64, City>,
    names: HashMap<String, BTreeSet<u64>>,
    prefixes: HashMap<String, BTreeSet<u64>>,
}

/// Every prefix of `name`, from the first character to the full string.
pub fn name_prefixes(name: &str) -> impl Iterator<Item = &str> {
    name.char_indices()
        .skip(1)
        .map(|(idx, _)| idx)
        .chain(std::iter::once(name.len()))
        .filter(|&end| end > 0)
        .map(move |end| &name[..end])
}

impl Indexes {
    fn insert(&mut self, city: City) {
        let key = city.name_key();

        if let Some(previous) = self.cities.get(&city.id) {
            let previous_key = previous.name_key();
            if previous_key != key {
                let id = previous.id;
                Self::unlink(&mut self.names, &previous_key, id);
                for prefix in name_prefixes(&previous_key) {
                    Self::unlink(&mut self.prefixes, prefix, id);
                }
            }
        }

        self.names.entry(key.clone()).or_default().insert(city.id);
        for prefix in name_prefixes(&key) {
            self.prefixes
                .entry(prefix.to_string())
                .or_default()
                .insert(city.id);
        }
        self.cities.insert(city.id, city);
    }

    fn unlink(index: &mut HashMap<String, BTreeSet<u64>>, key: &str, id: u64) {
        if let Some(ids) = index.get_mut(key) {
            ids.remove(&id);
            if ids.is_empty() {
                index.remove(key);
            }
        }
    }
}

/// In-memory city index: records by id, ids by exact lowercase name and
/// ids by every lowercase name prefix.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Indexes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Indexes>> {
        self.inner
            .read()
            .map_err(|_| CityError::store("city index lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Indexes>> {
        self.inner
            .write()
            .map_err(|_| CityError::store("city index lock poisoned"))
    }
}

#[async_trait]
impl CityStore for MemoryStore {
    async fn put_batch(&self, cities: Vec<City>) -> Result<()> {
        let mut indexes = self.write()?;
        for city in cities {
            indexes.insert(city);
        }
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<City>> {
        Ok(self.read()?.cities.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[u64]) -> Result<Vec<City>> {
        let indexes = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| indexes.cities.get(id).cloned())
            .collect())
    }

    async fn ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<u64>> {
        let indexes = self.read()?;
        Ok(indexes
            .prefixes
            .get(prefix)
            .map(|ids| ids.iter().copied().take(limit).collect())
            .unwrap_or_default())
    }

    async fn ids_by_name(&self, name: &str) -> Result<Vec<u64>> {
        let indexes = self.read()?;
        Ok(indexes
            .names
            .get(name)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<()> {
        self.read().map(|_| ())
    }

    async fn city_count(&self) -> Result<usize> {
        Ok(self.read()?.cities.len())
    }

    async fn name_count(&self) -> Result<usize> {
        Ok(self.read()?.names.len())
    }

    async fn key_count(&self) -> Result<usize> {
        let indexes = self.read()?;
        Ok(indexes.cities.len() + indexes.names.len() + indexes.prefixes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(cities: Vec<City>) -> MemoryStore {
        let store = MemoryStore::new();
        store.put_batch(cities).await.unwrap();
        store
    }

    #[test]
    fn test_name_prefixes_respect_char_boundaries() {
        let prefixes: Vec<&str> = name_prefixes("zürich").collect();
        assert_eq!(prefixes, vec!["z", "zü", "zür", "züri", "züric", "zürich"]);
        assert_eq!(name_prefixes("").count(), 0);
    }

    #[tokio::test]
    async fn test_prefix_lookup_is_ordered_and_limited() {
        let store = store_with(vec![
            City::new(30, "Shanghai"),
            City::new(10, "Shenzhen"),
            City::new(20, "Sheffield"),
        ])
        .await;

        assert_eq!(store.ids_by_prefix("sh", 10).await.unwrap(), vec![10, 20, 30]);
        assert_eq!(store.ids_by_prefix("she", 1).await.unwrap(), vec![10]);
        assert!(store.ids_by_prefix("x", 10).await.unwrap().is_empty());
        assert!(store.ids_by_prefix("Sh", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exact_name_index() {
        let store = store_with(vec![
            City::new(1, "Paris"),
            City::new(2, "Paris"),
            City::new(3, "Parisot"),
        ])
        .await;

        assert_eq!(store.ids_by_name("paris").await.unwrap(), vec![1, 2]);
        assert_eq!(store.ids_by_prefix("paris", 10).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(store.name_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_overwrite_drops_stale_index_entries() {
        let store = store_with(vec![City::new(1, "Bombay")]).await;
        store.put_batch(vec![City::new(1, "Mumbai")]).await.unwrap();

        assert!(store.ids_by_prefix("b", 10).await.unwrap().is_empty());
        assert!(store.ids_by_name("bombay").await.unwrap().is_empty());
        assert_eq!(store.ids_by_prefix("mum", 10).await.unwrap(), vec![1]);
        assert_eq!(store.get(1).await.unwrap().unwrap().name, "Mumbai");
        // 1 city + 1 name + 6 prefixes
        assert_eq!(store.key_count().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_get_many_skips_missing_and_keeps_order() {
        let store = store_with(vec![City::new(1, "Rome"), City::new(2, "Milan")]).await;

        let cities = store.get_many(&[2, 99, 1]).await.unwrap();
        let names: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Milan", "Rome"]);
    }

    #[tokio::test]
    async fn test_counts_and_ping() {
        let store = store_with(vec![City::new(1, "Ab"), City::new(2, "Ac")]).await;

        store.ping().await.unwrap();
        assert_eq!(store.city_count().await.unwrap(), 2);
        // prefixes: a, ab, ac; names: ab, ac
        assert_eq!(store.key_count().await.unwrap(), 2 + 2 + 3);
    }
}
