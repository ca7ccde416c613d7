use log::{debug, trace, warn};
use rustc_hash::FxHashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::bit_array::MAX_BITS;
use crate::block_state::{BlockState, BlockStateDescriptor};
use crate::error::{DecodeError, Result};
use crate::registry::BlockLookup;

/// Bits used per packed entry for a palette of `palette_len` states: enough
/// to address every index, and never less than one even for a single entry.
pub fn bits_per_entry(palette_len: usize) -> Result<u32> {
    if palette_len == 0 {
        return Err(DecodeError::EmptyPalette);
    }
    let bits = if palette_len == 1 {
        1
    } else {
        usize::BITS - (palette_len - 1).leading_zeros()
    };
    if bits > MAX_BITS {
        return Err(DecodeError::PaletteTooLarge { palette_len, bits });
    }
    Ok(bits)
}

/// Resolved block states in on-disk order. Index `i` is the value stored in
/// the packed array for cells holding state `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    states: Vec<BlockState>,
}

impl Palette {
    pub fn new(states: Vec<BlockState>) -> Result<Self> {
        if states.is_empty() {
            return Err(DecodeError::EmptyPalette);
        }
        Ok(Palette { states })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BlockState> {
        self.states.get(index)
    }

    pub fn states(&self) -> &[BlockState] {
        &self.states
    }

    pub fn bits_per_entry(&self) -> Result<u32> {
        bits_per_entry(self.states.len())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockState> {
        self.states.iter()
    }
}

/// Descriptor to resolved state cache. Safe to share between threads that
/// decode different regions at the same time.
#[derive(Debug, Default)]
pub struct ResolveCache {
    states: RwLock<FxHashMap<BlockStateDescriptor, BlockState>>,
}

impl ResolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // Entries are inserted whole, so a map left behind by a panicking
    // holder is still consistent and the guard can be recovered.
    fn read(&self) -> RwLockReadGuard<'_, FxHashMap<BlockStateDescriptor, BlockState>> {
        self.states.read().unwrap_or_else(|poisoned| {
            warn!("Resolve cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, FxHashMap<BlockStateDescriptor, BlockState>> {
        self.states.write().unwrap_or_else(|poisoned| {
            warn!("Resolve cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn get(&self, descriptor: &BlockStateDescriptor) -> Option<BlockState> {
        self.read().get(descriptor).cloned()
    }

    fn insert(&self, descriptor: &BlockStateDescriptor, state: &BlockState) {
        self.write()
            .entry(descriptor.clone())
            .or_insert_with(|| state.clone());
    }
}

/// Turns palette descriptors into resolved block states.
pub struct PaletteResolver<'a, L: BlockLookup + ?Sized> {
    lookup: &'a L,
    cache: Option<&'a ResolveCache>,
}

impl<'a, L: BlockLookup + ?Sized> PaletteResolver<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: &'a ResolveCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn resolve(&self, descriptors: &[BlockStateDescriptor]) -> Result<Palette> {
        let states = descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| self.resolve_entry(index, descriptor))
            .collect::<Result<Vec<_>>>()?;
        Palette::new(states)
    }

    /// Resolves one descriptor. `palette_index` is only used for error context.
    pub fn resolve_entry(
        &self,
        palette_index: usize,
        descriptor: &BlockStateDescriptor,
    ) -> Result<BlockState> {
        if let Some(state) = self.cache.and_then(|c| c.get(descriptor)) {
            trace!("Resolve cache hit for {}", descriptor);
            return Ok(state);
        }

        let definition =
            self.lookup
                .block(descriptor.name())
                .ok_or_else(|| DecodeError::UnresolvedIdentifier {
                    palette_index,
                    name: descriptor.name().into(),
                })?;

        let mut state = definition.default_state().clone();
        for (key, raw) in descriptor.properties() {
            let Some(property) = definition.property(key) else {
                debug!(
                    "Ignoring unknown property '{}' on palette entry {} ({})",
                    key, palette_index, descriptor
                );
                continue;
            };
            let value = property
                .parse(raw)
                .ok_or_else(|| DecodeError::InvalidPropertyValue {
                    palette_index,
                    block: descriptor.name().into(),
                    property: key.clone(),
                    value: raw.clone(),
                })?;
            state.override_property(key, value);
        }

        if let Some(cache) = self.cache {
            cache.insert(descriptor, &state);
        }
        Ok(state)
    }
}
