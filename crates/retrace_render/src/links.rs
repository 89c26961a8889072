//! Light-Filter Link Graph
//!
//! Light filters name the lights they affect (`filteredLights`); lights
//! need the reverse mapping in their `filters` array. The graph keeps that
//! many-to-many relation up to date as lights and filters come and go:
//!
//! ```text
//!   light "key"  ──► LightLinks { state, groups: {g1, g2}, dirty }
//!   light "fill" ──► LightLinks { state, groups: {g1},     dirty }
//!
//!   group g1 = {"fill", "key"} ──► [filter A, filter B]
//!   group g2 = {"key"}         ──► [filter C]
//! ```
//!
//! Filters sharing the same light set share one group, so registering a
//! filter touches one group plus the lights of its set, and only marks those
//! lights dirty. [`LinkGraph::update`] runs once before each render and
//! pushes the union of each dirty light's groups to the light, in parallel.
//!
//! Registration and deregistration may run concurrently with each other
//! (tables are sharded, each shard behind its own lock). `update` must not
//! run concurrently with anything else.

use std::any::Any;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use log::warn;
use parking_lot::Mutex;
use rayon::prelude::*;
use retrace_core::{Result, RetraceError};
use rustc_hash::{FxHashMap, FxHasher};

use crate::light::LightCore;
use crate::light_filter::LightFilterCore;

const SHARD_COUNT: usize = 16;

fn shard_index<K: Hash + ?Sized>(key: &K) -> usize {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    (hasher.finish() % SHARD_COUNT as u64) as usize
}

/// Normalises a light-name list into a group key: sorted, without
/// duplicates.
#[must_use]
pub fn light_set(names: &[String]) -> Arc<[String]> {
    let mut names = names.to_vec();
    names.sort();
    names.dedup();
    names.into()
}

// ─── Entries ─────────────────────────────────────────────────────────────────

enum LinkState {
    /// Filters refer to the light but no light has registered under the name.
    Unregistered,
    Registered(Weak<LightCore>),
    /// Removed at the next update.
    Deregistered,
}

struct LightLinks {
    state: LinkState,
    groups: BTreeMap<u64, Arc<FilterGroup>>,
    dirty: bool,
}

impl LightLinks {
    fn new(state: LinkState) -> Self {
        Self {
            state,
            groups: BTreeMap::new(),
            dirty: true,
        }
    }
}

/// The filters that share one light set, in registration order.
struct FilterGroup {
    id: u64,
    filters: Mutex<BTreeMap<u64, Weak<LightFilterCore>>>,
}

type Retained = Arc<dyn Any + Send + Sync>;

/// Problems found by [`LinkGraph::update`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkReport {
    /// Lights that filters are linked to but that never registered.
    pub missing_lights: Vec<String>,
    /// Registered filters whose shader no longer exists.
    pub missing_filters: Vec<String>,
}

impl LinkReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_lights.is_empty() && self.missing_filters.is_empty()
    }

    /// The first problem as an error.
    pub fn into_result(self) -> Result<()> {
        if let Some(light) = self.missing_lights.into_iter().next() {
            return Err(RetraceError::MissingLight(light));
        }
        if let Some(filter) = self.missing_filters.into_iter().next() {
            return Err(RetraceError::MissingLightFilter(filter));
        }
        Ok(())
    }
}

// ─── LinkGraph ───────────────────────────────────────────────────────────────

pub struct LinkGraph {
    lights: Box<[Mutex<FxHashMap<String, LightLinks>>]>,
    groups: Box<[Mutex<FxHashMap<Arc<[String]>, Arc<FilterGroup>>>]>,
    next_group: AtomicU64,
    next_filter: AtomicU64,
    /// Registrants kept alive until the next update, for sessions whose
    /// hosts drop object handles straight after creating them. Registrants
    /// only hold the graph weakly, so dropping it releases them.
    retained: Option<Mutex<Vec<Retained>>>,
}

impl LinkGraph {
    #[must_use]
    pub fn new(retain_registrants: bool) -> Self {
        Self {
            lights: (0..SHARD_COUNT).map(|_| Mutex::default()).collect(),
            groups: (0..SHARD_COUNT).map(|_| Mutex::default()).collect(),
            next_group: AtomicU64::new(0),
            next_filter: AtomicU64::new(0),
            retained: retain_registrants.then(Mutex::default),
        }
    }

    /// Allocates an id ordering a filter within its group.
    pub(crate) fn next_filter_id(&self) -> u64 {
        self.next_filter.fetch_add(1, Ordering::Relaxed)
    }

    fn light_shard(&self, name: &str) -> &Mutex<FxHashMap<String, LightLinks>> {
        &self.lights[shard_index(name)]
    }

    fn group_shard(&self, lights: &[String]) -> &Mutex<FxHashMap<Arc<[String]>, Arc<FilterGroup>>> {
        &self.groups[shard_index(lights)]
    }

    pub(crate) fn register_light(&self, name: &str, light: &Arc<LightCore>) {
        {
            let mut shard = self.light_shard(name).lock();
            let links = shard
                .entry(name.to_string())
                .or_insert_with(|| LightLinks::new(LinkState::Unregistered));
            links.state = LinkState::Registered(Arc::downgrade(light));
            links.dirty = true;
        }
        if let Some(retained) = &self.retained {
            retained.lock().push(light.clone());
        }
    }

    /// Tombstones the light if `light` is the one registered under `name`.
    pub(crate) fn deregister_light(&self, name: &str, light: *const LightCore) {
        let mut shard = self.light_shard(name).lock();
        let Some(links) = shard.get_mut(name) else {
            warn!("Deregistering unknown light \"{name}\"");
            return;
        };
        if let LinkState::Registered(current) = &links.state
            && (current.as_ptr() == light || current.strong_count() == 0)
        {
            links.state = LinkState::Deregistered;
            links.dirty = true;
        }
    }

    pub(crate) fn register_light_filter(&self, lights: &Arc<[String]>, filter: &Arc<LightFilterCore>) {
        let group = {
            let mut shard = self.group_shard(lights).lock();
            let group = shard
                .entry(lights.clone())
                .or_insert_with(|| {
                    Arc::new(FilterGroup {
                        id: self.next_group.fetch_add(1, Ordering::Relaxed),
                        filters: Mutex::default(),
                    })
                })
                .clone();
            group
                .filters
                .lock()
                .insert(filter.id(), Arc::downgrade(filter));
            group
        };

        for name in lights.iter() {
            let mut shard = self.light_shard(name).lock();
            let links = shard.entry(name.clone()).or_insert_with(|| {
                warn!(
                    "Light filter \"{}\" linked to unknown light \"{name}\"",
                    filter.name()
                );
                LightLinks::new(LinkState::Unregistered)
            });
            links.groups.insert(group.id, group.clone());
            links.dirty = true;
        }

        if let Some(retained) = &self.retained {
            retained.lock().push(filter.clone());
        }
    }

    pub(crate) fn deregister_light_filter(&self, lights: &Arc<[String]>, filter_id: u64) {
        let (group_id, emptied) = {
            let mut shard = self.group_shard(lights).lock();
            let Some(group) = shard.get(lights).cloned() else {
                return;
            };
            let mut filters = group.filters.lock();
            if filters.remove(&filter_id).is_none() {
                return;
            }
            let emptied = filters.is_empty();
            drop(filters);
            if emptied {
                shard.remove(lights);
            }
            (group.id, emptied)
        };

        for name in lights.iter() {
            let mut shard = self.light_shard(name).lock();
            let Some(links) = shard.get_mut(name) else {
                continue;
            };
            if emptied {
                links.groups.remove(&group_id);
            }
            links.dirty = true;
        }
    }

    /// Pushes filter lists to every dirty light and drops deregistered
    /// lights. Must not run concurrently with any other graph operation.
    pub fn update(&self) -> LinkReport {
        let mut report = LinkReport::default();
        let mut work: Vec<(Arc<LightCore>, Vec<Arc<FilterGroup>>)> = Vec::new();

        for shard in &self.lights {
            for (name, links) in shard.lock().iter_mut() {
                match &links.state {
                    LinkState::Registered(light) if links.dirty => {
                        links.dirty = false;
                        if let Some(light) = light.upgrade() {
                            work.push((light, links.groups.values().cloned().collect()));
                        }
                    }
                    LinkState::Unregistered if !links.groups.is_empty() => {
                        report.missing_lights.push(name.clone());
                    }
                    _ => {}
                }
            }
        }

        report.missing_filters = work
            .par_iter()
            .flat_map_iter(|(light, groups)| {
                let filters: Vec<Arc<LightFilterCore>> = groups
                    .iter()
                    .flat_map(|g| {
                        g.filters
                            .lock()
                            .values()
                            .filter_map(Weak::upgrade)
                            .collect::<Vec<_>>()
                    })
                    .collect();
                light.update_filters(&filters)
            })
            .collect();

        if let Some(retained) = &self.retained {
            let released = std::mem::take(&mut *retained.lock());
            drop(released);
        }

        // Links survive the light, so that a light recreated under the same
        // name picks its filters back up.
        for shard in &self.lights {
            shard.lock().retain(|_, links| {
                if !matches!(links.state, LinkState::Deregistered) {
                    return true;
                }
                links.state = LinkState::Unregistered;
                links.dirty = true;
                !links.groups.is_empty()
            });
        }

        report.missing_lights.sort();
        report.missing_filters.sort();
        report.missing_filters.dedup();
        report
    }

    /// Number of lights with links or registrations.
    #[must_use]
    pub fn light_count(&self) -> usize {
        self.lights.iter().map(|s| s.lock().len()).sum()
    }

    /// Number of distinct filter groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.iter().map(|s| s.lock().len()).sum()
    }
}
