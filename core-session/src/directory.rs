//! Device directory.
//!
//! Owns the canonical device snapshot. A refresh hands a freshly queried
//! snapshot to [`DeviceDirectory::reconcile`], which replaces and publishes it
//! only when it differs from the cached one. The comparison is positional:
//! the same devices enumerated in a different order count as a change.

use std::collections::HashSet;

use core_runtime::events::{LatestValueBus, ReplayStream, DEFAULT_EVENT_BUFFER_SIZE};
use tracing::{debug, trace};

use crate::model::{AudioDevice, DeviceSnapshot, DevicesChangedEvent};

#[derive(Debug, Clone)]
pub struct DeviceDirectory {
    snapshots: LatestValueBus<DeviceSnapshot>,
}

impl DeviceDirectory {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: LatestValueBus::new(capacity),
        }
    }

    /// Replaces the cached snapshot if `snapshot` differs from it.
    ///
    /// Returns `true` if the snapshot was published. The first reconcile
    /// always publishes, even an empty snapshot. Compare and replace happen
    /// atomically, so concurrent refreshes cannot drop an update.
    pub fn reconcile(&self, snapshot: DeviceSnapshot) -> bool {
        let device_count = snapshot.len();
        let changed = self
            .snapshots
            .publish_if(snapshot, |current, candidate| {
                !current.positionally_equal(candidate)
            });

        if changed {
            debug!(device_count, "Device snapshot changed");
        } else {
            trace!(device_count, "Device snapshot unchanged");
        }

        changed
    }

    /// The cached snapshot, `None` before the first reconcile.
    pub fn current(&self) -> Option<DeviceSnapshot> {
        self.snapshots.latest()
    }

    /// Snapshot stream starting with the cached snapshot (if any).
    pub fn subscribe(&self) -> ReplayStream<DeviceSnapshot> {
        self.snapshots.subscribe()
    }
}

impl Default for DeviceDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

/// Identity-based difference between two device lists.
///
/// `added` keeps the order of `current`, `removed` the order of `previous`.
/// A device whose attributes changed but whose id persisted is in neither.
pub fn diff(previous: &[AudioDevice], current: &[AudioDevice]) -> DevicesChangedEvent {
    let previous_ids: HashSet<&str> = previous.iter().map(|device| device.id.as_str()).collect();
    let current_ids: HashSet<&str> = current.iter().map(|device| device.id.as_str()).collect();

    let added = unique(current.iter().filter(|device| !previous_ids.contains(device.id.as_str())));
    let removed = unique(previous.iter().filter(|device| !current_ids.contains(device.id.as_str())));

    DevicesChangedEvent { added, removed }
}

fn unique<'a>(devices: impl Iterator<Item = &'a AudioDevice>) -> Vec<AudioDevice> {
    let mut seen = HashSet::new();
    devices
        .filter(|device| seen.insert(device.id.as_str()))
        .cloned()
        .collect()
}
