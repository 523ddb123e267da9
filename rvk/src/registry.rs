//! Ownership registry: an arena of object records keyed by [`ObjectId`].
//!
//! Every container registers itself here when it is created and releases
//! its record when it is destroyed. A record stores the native handle, a
//! relation-only back-reference to its parent's id, and the id of the scope
//! container (entry, instance or device) whose dispatch table serves it.
//! The registry never owns or frees native objects; it exists so the
//! parent/child structure can be queried and checked explicitly.
//!
//! Objects that are retrieved rather than created (physical devices,
//! queues) are registered with [`ObjectRegistry::retrieve`]. Retrieving the
//! same handle again under the same parent yields the same id, and their
//! records go away together with their parent's. Pool allocations
//! ([`ObjectRegistry::allocate`]) are reaped with their pool the same way.

use std::{
    collections::HashMap,
    fmt,
    num::NonZeroU64,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use ash::vk::{self, Handle};

/// Stable identifier of a registered object. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(NonZeroU64);

impl ObjectId {
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Produced by a create/allocate call and released by an explicit
    /// destroy/free.
    Created,
    /// Handed out by a query (`vkEnumeratePhysicalDevices`,
    /// `vkGetDeviceQueue`). Lives exactly as long as its parent.
    Retrieved,
    /// Allocated from a pool. Freed either in a batch or implicitly when the
    /// pool is destroyed or reset.
    Allocated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRecord {
    pub object_type: vk::ObjectType,
    pub raw: u64,
    /// `None` only for the loader-level root.
    pub parent: Option<ObjectId>,
    /// The entry, instance or device whose table resolves calls on this
    /// object. Scope containers point at themselves.
    pub scope: ObjectId,
    pub origin: Origin,
}

pub struct ObjectRegistry {
    next_id: AtomicU64,
    records: Mutex<HashMap<ObjectId, ObjectRecord>>,
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("live", &self.live_count())
            .finish_non_exhaustive()
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            records: Mutex::new(HashMap::new()),
        }
    }

    fn allocate_id(&self) -> ObjectId {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        ObjectId(NonZeroU64::new(raw).expect("object id counter overflowed"))
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<ObjectId, ObjectRecord>> {
        self.records.lock().expect("object registry lock poisoned")
    }

    /// Register the loader-level root. It has no handle and no parent.
    pub fn register_root(&self) -> ObjectId {
        let id = self.allocate_id();
        self.lock().insert(
            id,
            ObjectRecord {
                object_type: vk::ObjectType::UNKNOWN,
                raw: 0,
                parent: None,
                scope: id,
                origin: Origin::Created,
            },
        );
        id
    }

    /// Register a container that defines its own dispatch scope.
    pub fn register_scope<H: Handle>(
        &self,
        handle: H,
        parent: ObjectId,
    ) -> ObjectId {
        let id = self.allocate_id();
        self.insert(id, H::TYPE, handle.as_raw(), parent, id, Origin::Created);
        id
    }

    /// Register a freshly created object served by `scope`'s table.
    pub fn register<H: Handle>(
        &self,
        handle: H,
        parent: ObjectId,
        scope: ObjectId,
    ) -> ObjectId {
        let id = self.allocate_id();
        self.insert(id, H::TYPE, handle.as_raw(), parent, scope, Origin::Created);
        id
    }

    /// Register an object allocated from the pool `parent`.
    pub fn allocate<H: Handle>(
        &self,
        handle: H,
        parent: ObjectId,
        scope: ObjectId,
    ) -> ObjectId {
        let id = self.allocate_id();
        self.insert(
            id,
            H::TYPE,
            handle.as_raw(),
            parent,
            scope,
            Origin::Allocated,
        );
        id
    }

    /// Register (or look up) an object handed out by a query on `parent`.
    pub fn retrieve<H: Handle>(
        &self,
        handle: H,
        parent: ObjectId,
        scope: ObjectId,
    ) -> ObjectId {
        let raw = handle.as_raw();
        let mut records = self.lock();
        if let Some((id, _)) = records.iter().find(|(_, record)| {
            record.origin == Origin::Retrieved
                && record.object_type == H::TYPE
                && record.raw == raw
                && record.parent == Some(parent)
        }) {
            return *id;
        }
        let id = self.allocate_id();
        records.insert(
            id,
            ObjectRecord {
                object_type: H::TYPE,
                raw,
                parent: Some(parent),
                scope,
                origin: Origin::Retrieved,
            },
        );
        id
    }

    fn insert(
        &self,
        id: ObjectId,
        object_type: vk::ObjectType,
        raw: u64,
        parent: ObjectId,
        scope: ObjectId,
        origin: Origin,
    ) {
        let mut records = self.lock();
        if !records.contains_key(&parent) {
            tracing::warn!(
                "Registering {object_type:?} {raw:#x} under {parent}, which \
                 is not live"
            );
        }
        tracing::trace!("Registered {object_type:?} {raw:#x} as {id} under {parent}");
        records.insert(
            id,
            ObjectRecord {
                object_type,
                raw,
                parent: Some(parent),
                scope,
                origin,
            },
        );
    }

    /// Drop the record for `id` together with any retrieved or allocated
    /// children.
    ///
    /// Created children that are still live are left in place and reported
    /// at `warn`: destroying a parent before its children is a usage error
    /// this layer does not refuse.
    pub fn release(&self, id: ObjectId) -> Option<ObjectRecord> {
        let mut records = self.lock();
        let record = records.remove(&id)?;

        let mut pending = vec![id];
        while let Some(parent) = pending.pop() {
            let children: Vec<_> = records
                .iter()
                .filter(|(_, child)| child.parent == Some(parent))
                .map(|(child_id, child)| (*child_id, child.origin))
                .collect();
            for (child_id, origin) in children {
                match origin {
                    Origin::Retrieved | Origin::Allocated => {
                        records.remove(&child_id);
                        pending.push(child_id);
                    }
                    Origin::Created => {
                        tracing::warn!(
                            "Released {:?} {id} while its child {child_id} \
                             is still live",
                            record.object_type
                        );
                    }
                }
            }
        }
        Some(record)
    }

    /// Release `id` after its native destroy could not be called.
    ///
    /// The handle leaks but the record goes, the same as a scope container
    /// with no destroy entry point. Hands `err` back for the caller to
    /// return.
    pub fn release_leaked(&self, id: ObjectId, err: crate::Error) -> crate::Error {
        match self.release(id) {
            Some(record) => tracing::error!(
                "Leaking {:?} {:#x}: {err}",
                record.object_type,
                record.raw
            ),
            None => tracing::error!("Leaking {id}: {err}"),
        }
        err
    }

    pub fn get(&self, id: ObjectId) -> Option<ObjectRecord> {
        self.lock().get(&id).copied()
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn parent_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.lock().get(&id).and_then(|record| record.parent)
    }

    pub fn scope_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.lock().get(&id).map(|record| record.scope)
    }

    /// Live pool allocations under `id`, in allocation order.
    pub fn allocations_of(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut allocations: Vec<_> = self
            .lock()
            .iter()
            .filter(|(_, record)| {
                record.parent == Some(id) && record.origin == Origin::Allocated
            })
            .map(|(child, _)| *child)
            .collect();
        allocations.sort();
        allocations
    }

    /// Release the pool allocations under `id` without touching `id` itself.
    pub fn release_allocations(&self, id: ObjectId) -> usize {
        let allocations = self.allocations_of(id);
        for allocation in &allocations {
            self.release(*allocation);
        }
        allocations.len()
    }

    /// Live direct children of `id`, in creation order.
    pub fn children_of(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut children: Vec<_> = self
            .lock()
            .iter()
            .filter(|(_, record)| record.parent == Some(id))
            .map(|(child, _)| *child)
            .collect();
        children.sort();
        children
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    pub fn is_descendant_of(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let records = self.lock();
        let mut current = records.get(&id).and_then(|record| record.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = records.get(&parent).and_then(|record| record.parent);
        }
        false
    }

    pub fn live_count(&self) -> usize {
        self.lock().len()
    }
}
