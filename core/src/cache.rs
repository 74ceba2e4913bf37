//! Memoization of coordinate maps across correction requests.
//!
//! Interactive use applies one configuration frame after frame; the cache
//! makes every frame after the first cost only a resample. Concurrent
//! misses on the same key collapse into a single build, and returned maps
//! are shared, so eviction never invalidates a map mid-resample.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;

use crate::config::OutputFormat;
use crate::lens::LensModel;
use crate::map::{build_map, CoordinateMap};
use crate::resolve::ResolvedGeometry;

pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Cache key: geometry bit patterns plus source size and pad.
///
/// Identical keys produce bit-identical maps, so float fields are keyed
/// by their exact bit patterns rather than tolerant comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MapKey {
    center: [u64; 2],
    radius: u64,
    angle: u64,
    fov: u64,
    pfov: u64,
    lens_model: LensModel,
    output_format: OutputFormat,
    src_width: u32,
    src_height: u32,
    pad: u32,
}

impl MapKey {
    fn new(geom: &ResolvedGeometry, src_width: u32, src_height: u32, pad: u32) -> Self {
        Self {
            center: [geom.center.x.to_bits(), geom.center.y.to_bits()],
            radius: geom.radius.to_bits(),
            angle: geom.angle_rad.to_bits(),
            fov: geom.fov.to_bits(),
            pfov: geom.pfov.to_bits(),
            lens_model: geom.lens_model,
            output_format: geom.output_format,
            src_width,
            src_height,
            pad,
        }
    }
}

struct Slot {
    cell: Arc<OnceLock<Arc<CoordinateMap>>>,
    last_used: u64,
}

/// Bounded LRU cache of coordinate maps with single-flight builds.
pub struct MapCache {
    slots: Mutex<Slots>,
    capacity: usize,
    builds: AtomicU64,
}

struct Slots {
    entries: HashMap<MapKey, Slot>,
    tick: u64,
}

impl MapCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                tick: 0,
            }),
            capacity: capacity.max(1),
            builds: AtomicU64::new(0),
        }
    }

    /// Fetch the map for this key, building it at most once.
    ///
    /// The lock only guards the slot table; the build itself runs outside
    /// it, gated by the slot's `OnceLock` so that concurrent requesters
    /// for the same key wait for one build instead of duplicating it.
    pub fn get_or_build(
        &self,
        geom: &ResolvedGeometry,
        src_width: u32,
        src_height: u32,
        pad: u32,
    ) -> Arc<CoordinateMap> {
        let key = MapKey::new(geom, src_width, src_height, pad);

        let cell = {
            let mut slots = self.slots.lock().unwrap();
            slots.tick += 1;
            let now = slots.tick;
            if let Some(slot) = slots.entries.get_mut(&key) {
                slot.last_used = now;
                slot.cell.clone()
            } else {
                if slots.entries.len() >= self.capacity {
                    evict_lru(&mut slots.entries);
                }
                let cell = Arc::new(OnceLock::new());
                slots.entries.insert(
                    key,
                    Slot {
                        cell: cell.clone(),
                        last_used: now,
                    },
                );
                cell
            }
        };

        cell.get_or_init(|| {
            self.builds.fetch_add(1, Ordering::Relaxed);
            debug!(src_width, src_height, pad, "coordinate map miss, building");
            Arc::new(build_map(geom, src_width, src_height, pad))
        })
        .clone()
    }

    /// Number of map builds performed so far.
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all cached maps. Maps already handed out stay alive through
    /// their `Arc` until the callers are done with them.
    pub fn clear(&self) {
        self.slots.lock().unwrap().entries.clear();
    }
}

impl Default for MapCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove the least-recently-used completed entry. Entries whose build is
/// still in flight are never evicted; if every entry is in flight the
/// table is allowed to overflow its capacity temporarily.
fn evict_lru(entries: &mut HashMap<MapKey, Slot>) {
    let victim = entries
        .iter()
        .filter(|(_, slot)| slot.cell.get().is_some())
        .min_by_key(|(_, slot)| slot.last_used)
        .map(|(key, _)| *key);
    if let Some(key) = victim {
        entries.remove(&key);
    }
}
