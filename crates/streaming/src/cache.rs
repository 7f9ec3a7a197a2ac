use std::collections::BTreeMap;

use crate::residency::ResidencyState;

/// Addresses one sample-chunk file of one model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    pub model_id: String,
    pub resource_id: String,
}

impl CacheKey {
    pub fn new(model_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            resource_id: resource_id.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryBudget {
    pub max_bytes: usize,
}

impl MemoryBudget {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[derive(Debug, Clone)]
struct ChunkSlot {
    state: ResidencyState,
    bytes: usize,
    last_used_tick: u64,
    version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    ChunkTooLarge { bytes: usize, max: usize },
    NothingEvictable,
    MissingEntry,
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::ChunkTooLarge { bytes, max } => {
                write!(f, "chunk of {bytes} bytes exceeds the {max}-byte budget")
            }
            CacheError::NothingEvictable => write!(f, "over budget with nothing left to evict"),
            CacheError::MissingEntry => write!(f, "no cache entry for key"),
        }
    }
}

impl std::error::Error for CacheError {}

/// Holds the decoded sample chunks the detail panel reads from.
///
/// The panel shows one chunk at a time; that chunk is marked as focused and
/// is never evicted. Everything else is reclaimed least-recently-used when
/// the byte budget overflows, with ties broken by key order so eviction is
/// reproducible.
///
/// Chunk files are immutable per content version. `pin_model_version`
/// records the version of the feature table currently loaded for a model
/// and drops any resident chunk decoded against an older one.
#[derive(Debug)]
pub struct ChunkCache {
    budget: MemoryBudget,
    used_bytes: usize,
    tick: u64,
    focused: Option<CacheKey>,
    slots: BTreeMap<CacheKey, ChunkSlot>,
    versions: BTreeMap<String, String>,
}

impl ChunkCache {
    pub fn new(budget: MemoryBudget) -> Self {
        Self {
            budget,
            used_bytes: 0,
            tick: 0,
            focused: None,
            slots: BTreeMap::new(),
            versions: BTreeMap::new(),
        }
    }

    pub fn budget(&self) -> MemoryBudget {
        self.budget
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn state(&self, key: &CacheKey) -> Option<ResidencyState> {
        self.slots.get(key).map(|s| s.state)
    }

    pub fn focused(&self) -> Option<&CacheKey> {
        self.focused.as_ref()
    }

    pub fn pinned_model_version(&self, model_id: &str) -> Option<&str> {
        self.versions.get(model_id).map(|v| v.as_str())
    }

    /// Registers a fetch for `key`. A previously resident copy is released
    /// first so its bytes are not counted while the refresh is in flight.
    pub fn begin_fetch(&mut self, key: CacheKey) {
        self.tick += 1;
        let tick = self.tick;
        let version = self.versions.get(&key.model_id).cloned();
        match self.slots.get_mut(&key) {
            Some(slot) => {
                if slot.state == ResidencyState::Resident {
                    self.used_bytes = self.used_bytes.saturating_sub(slot.bytes);
                    slot.bytes = 0;
                }
                slot.state = ResidencyState::Downloading;
                slot.last_used_tick = tick;
                slot.version = version;
            }
            None => {
                self.slots.insert(
                    key,
                    ChunkSlot {
                        state: ResidencyState::Downloading,
                        bytes: 0,
                        last_used_tick: tick,
                        version,
                    },
                );
            }
        }
    }

    /// Marks the chunk backing the detail panel; `None` when nothing is
    /// selected. The focused chunk is exempt from eviction.
    pub fn focus(&mut self, key: Option<CacheKey>) {
        if let Some(k) = &key {
            self.tick += 1;
            let tick = self.tick;
            if let Some(slot) = self.slots.get_mut(k) {
                slot.last_used_tick = tick;
            }
        }
        self.focused = key;
    }

    pub fn touch(&mut self, key: &CacheKey) -> Result<(), CacheError> {
        self.tick += 1;
        let tick = self.tick;
        let slot = self.slots.get_mut(key).ok_or(CacheError::MissingEntry)?;
        slot.last_used_tick = tick;
        Ok(())
    }

    /// Records `key` as decoded and resident at `bytes`, evicting other
    /// chunks as needed to stay under budget. Returns the evicted keys.
    pub fn mark_resident(
        &mut self,
        key: &CacheKey,
        bytes: usize,
    ) -> Result<Vec<CacheKey>, CacheError> {
        if bytes > self.budget.max_bytes {
            return Err(CacheError::ChunkTooLarge {
                bytes,
                max: self.budget.max_bytes,
            });
        }

        self.tick += 1;
        let tick = self.tick;
        let version = self.versions.get(&key.model_id).cloned();

        let slot = self.slots.entry(key.clone()).or_insert(ChunkSlot {
            state: ResidencyState::Evicted,
            bytes: 0,
            last_used_tick: tick,
            version: None,
        });
        if slot.state == ResidencyState::Resident {
            self.used_bytes = self.used_bytes.saturating_sub(slot.bytes);
        }
        slot.state = ResidencyState::Resident;
        slot.bytes = bytes;
        slot.last_used_tick = tick;
        slot.version = version;
        self.used_bytes += bytes;

        self.shrink_to_budget(key)
    }

    /// Pins `model_id`'s chunk files to `version` (the content hash of its
    /// feature table). Resident chunks stamped with any other version hold
    /// samples for rows that no longer exist; they are dropped and their
    /// keys returned.
    pub fn pin_model_version(
        &mut self,
        model_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Vec<CacheKey> {
        let model_id = model_id.into();
        let version = version.into();
        self.versions.insert(model_id.clone(), version.clone());

        let mut dropped: Vec<CacheKey> = Vec::new();
        let mut freed = 0usize;
        for (k, slot) in self.slots.iter_mut() {
            if k.model_id != model_id || slot.version.as_deref() == Some(version.as_str()) {
                continue;
            }
            if slot.state == ResidencyState::Resident {
                freed += slot.bytes;
                slot.bytes = 0;
                slot.state = ResidencyState::Evicted;
                dropped.push(k.clone());
            }
            slot.version = Some(version.clone());
        }
        self.used_bytes = self.used_bytes.saturating_sub(freed);
        dropped
    }

    fn shrink_to_budget(&mut self, just_added: &CacheKey) -> Result<Vec<CacheKey>, CacheError> {
        let mut evicted: Vec<CacheKey> = Vec::new();
        while self.used_bytes > self.budget.max_bytes {
            let mut candidate: Option<CacheKey> = None;
            let mut candidate_tick = u64::MAX;
            for (k, slot) in &self.slots {
                if slot.state != ResidencyState::Resident {
                    continue;
                }
                if self.focused.as_ref() == Some(k) || k == just_added {
                    continue;
                }
                // Strict comparison: BTreeMap order settles recency ties.
                if slot.last_used_tick < candidate_tick {
                    candidate_tick = slot.last_used_tick;
                    candidate = Some(k.clone());
                }
            }
            // Last resort is the chunk just inserted, unless the panel
            // needs it.
            if candidate.is_none() && self.focused.as_ref() != Some(just_added) {
                candidate = Some(just_added.clone());
            }
            let Some(key) = candidate else {
                return Err(CacheError::NothingEvictable);
            };
            if let Some(slot) = self.slots.get_mut(&key) {
                self.used_bytes = self.used_bytes.saturating_sub(slot.bytes);
                slot.bytes = 0;
                slot.state = ResidencyState::Evicted;
            }
            evicted.push(key);
        }
        Ok(evicted)
    }
}
