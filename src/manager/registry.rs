// ============================================================================
// VNF Registry
// ============================================================================
//
// Name -> handle directory plus a count. The manager keeps it behind a single
// mutex and only ever performs O(1) map work while holding it.
//
// ============================================================================

use crate::core::VnfSnapshot;
use crate::worker::VnfHandle;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

lazy_static! {
    static ref NUMERIC_SUFFIX: Regex = Regex::new("[0-9]+$").expect("static regex is valid");
}

#[derive(Debug, Default)]
pub(crate) struct VnfRegistry {
    vnfs: HashMap<String, VnfHandle>,
    num_vnfs: usize,
}

impl VnfRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.num_vnfs
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.vnfs.contains_key(name)
    }

    /// Inserts unless the name is taken; the rejected handle is given back.
    pub(crate) fn insert_if_absent(&mut self, handle: VnfHandle) -> Result<(), VnfHandle> {
        if self.vnfs.contains_key(handle.name()) {
            return Err(handle);
        }
        self.vnfs.insert(handle.name().to_string(), handle);
        self.num_vnfs += 1;
        Ok(())
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<VnfHandle> {
        self.vnfs.get(name).cloned()
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<VnfHandle> {
        let handle = self.vnfs.remove(name)?;
        self.num_vnfs -= 1;
        Some(handle)
    }

    /// Removes `name` only while it still refers to `instance_id`.
    pub(crate) fn remove_instance(&mut self, name: &str, instance_id: Uuid) -> bool {
        match self.vnfs.get(name) {
            Some(handle) if handle.instance_id() == instance_id => {
                self.remove(name);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn snapshot(&self, name: &str) -> Option<VnfSnapshot> {
        self.vnfs.get(name).map(VnfHandle::snapshot)
    }

    /// Snapshots of every VNF, ordered by [`compare_vnf_names`].
    pub(crate) fn snapshots(&self) -> Vec<VnfSnapshot> {
        let mut vnfs: Vec<VnfSnapshot> = self.vnfs.values().map(VnfHandle::snapshot).collect();
        vnfs.sort_by(|a, b| compare_vnf_names(&a.name, &b.name));
        vnfs
    }
}

fn numeric_suffix(name: &str) -> Option<u128> {
    NUMERIC_SUFFIX
        .find(name)
        .and_then(|m| m.as_str().parse::<u128>().ok())
}

/// Orders names by trailing number (`vnf_2` before `vnf_10`), then lexically.
///
/// Names without a trailing number come after all numbered names so the
/// ordering stays total.
pub fn compare_vnf_names(a: &str, b: &str) -> Ordering {
    match (numeric_suffix(a), numeric_suffix(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
