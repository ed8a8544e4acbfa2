use std::collections::BTreeMap;

use crate::renderer::ShaderIndex;

/// Descriptor -> shader index for one material kind.
///
/// Entries are never evicted; the cache lives exactly as long as its session.
#[derive(Debug)]
pub struct KindCache<D> {
    entries: BTreeMap<D, ShaderIndex>,
}

impl<D: Ord> Default for KindCache<D> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<D: Ord> KindCache<D> {
    pub fn get(&self, key: &D) -> Option<ShaderIndex> {
        self.entries.get(key).copied()
    }

    /// Store `index` under `key`. An existing entry is kept and returned instead.
    pub fn insert(&mut self, key: D, index: ShaderIndex) -> ShaderIndex {
        *self.entries.entry(key).or_insert(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
