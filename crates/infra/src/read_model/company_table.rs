use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::RwLock;

use ledgersync_core::CompanyId;

use super::{StoreError, StoreResult};

/// In-memory company-isolated key/value table backing the in-memory stores.
///
/// Rows are keyed by `(company, key)`; no operation can see another company's rows.
#[derive(Debug)]
pub struct CompanyTable<K, V> {
    inner: RwLock<HashMap<(CompanyId, K), V>>,
}

impl<K, V> Default for CompanyTable<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> CompanyTable<K, V>
where
    K: Clone + Eq + Hash + core::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, company: CompanyId, key: &K) -> StoreResult<Option<V>> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&(company, key.clone())).cloned())
    }

    /// Insert a row whose key must not exist yet (unique constraint).
    pub fn insert_new(&self, company: CompanyId, key: K, value: V) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match map.entry((company, key)) {
            Entry::Occupied(e) => Err(StoreError::Conflict(format!("{:?}", e.key().1))),
            Entry::Vacant(e) => {
                e.insert(value);
                Ok(())
            }
        }
    }

    /// Overwrite an existing row; fails if there is none.
    pub fn replace(&self, company: CompanyId, key: K, value: V) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match map.get_mut(&(company, key.clone())) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("{key:?}"))),
        }
    }

    pub fn upsert(&self, company: CompanyId, key: K, value: V) -> StoreResult<Option<V>> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.insert((company, key), value))
    }

    /// Read-modify-write one row under a single write lock.
    pub fn upsert_with(
        &self,
        company: CompanyId,
        key: K,
        f: impl FnOnce(Option<V>) -> V,
    ) -> StoreResult<V> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let slot = (company, key);
        let next = f(map.remove(&slot));
        map.insert(slot, next.clone());
        Ok(next)
    }

    pub fn remove(&self, company: CompanyId, key: &K) -> StoreResult<Option<V>> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(&(company, key.clone())))
    }

    /// Remove every row of `company` matching `pred`; returns how many went.
    pub fn remove_where(
        &self,
        company: CompanyId,
        pred: impl Fn(&K, &V) -> bool,
    ) -> StoreResult<usize> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let before = map.len();
        map.retain(|(c, k), v| *c != company || !pred(k, v));
        Ok(before - map.len())
    }

    pub fn list(&self, company: CompanyId) -> StoreResult<Vec<V>> {
        self.list_where(company, |_, _| true)
    }

    pub fn list_where(
        &self,
        company: CompanyId,
        pred: impl Fn(&K, &V) -> bool,
    ) -> StoreResult<Vec<V>> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .iter()
            .filter_map(|((c, k), v)| (*c == company && pred(k, v)).then(|| v.clone()))
            .collect())
    }

    /// Clear all rows for a company (rebuild support).
    pub fn clear_company(&self, company: CompanyId) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.retain(|(c, _k), _v| *c != company);
        Ok(())
    }
}
