use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::{
    error::InvalidResourceError,
    id::{Id, Marker},
    identity::IdAllocator,
    resource_log,
    storage::{Storage, StorageItem, StorageReport},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryReport {
    pub num_allocated: usize,
    pub num_kept_from_user: usize,
    pub element_size: usize,
}

impl RegistryReport {
    pub fn is_empty(&self) -> bool {
        self.num_allocated + self.num_kept_from_user == 0
    }
}

/// Registry is the primary holder of each resource type.
///
/// Every resource is registered here when it is created and deregistered when
/// the user destroys or drops it. A registry answers one question: is this id
/// live? Destroyed resources are absent, even if something else still holds
/// their id.
#[derive(Debug)]
pub(crate) struct Registry<T: StorageItem> {
    identity: IdAllocator<T::Marker>,
    storage: RwLock<Storage<T>>,
}

impl<T: StorageItem> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            identity: IdAllocator::new(),
            storage: RwLock::new(Storage::new()),
        }
    }
}

#[must_use]
pub(crate) struct FutureId<'a, T: StorageItem> {
    id: Id<T::Marker>,
    data: &'a RwLock<Storage<T>>,
}

impl<T: StorageItem> FutureId<'_, T> {
    /// The id this resource will be registered under.
    pub fn id(&self) -> Id<T::Marker> {
        self.id
    }

    /// Assign a new resource to this ID.
    ///
    /// Registers it with the registry.
    pub fn assign(self, value: Arc<T>) -> Id<T::Marker> {
        let mut data = self.data.write();
        data.insert(self.id, value);
        resource_log!("{}::register {:?}", data.kind(), self.id);
        self.id
    }
}

impl<T: StorageItem> Registry<T> {
    pub(crate) fn prepare(&self) -> FutureId<'_, T> {
        FutureId {
            id: self.identity.alloc(),
            data: &self.storage,
        }
    }

    /// Register `value` under a fresh id.
    pub(crate) fn register(&self, value: T) -> Id<T::Marker> {
        self.prepare().assign(Arc::new(value))
    }

    pub(crate) fn read<'a>(&'a self) -> RwLockReadGuard<'a, Storage<T>> {
        self.storage.read()
    }

    /// Deregister `id`, returning its resource.
    ///
    /// Deregistering an id that is not live is a no-op.
    pub(crate) fn unregister(&self, id: Id<T::Marker>) -> Option<Arc<T>> {
        let value = self.storage.write().remove(id);
        if value.is_some() {
            //Note: careful about the order here!
            self.identity.release(id);
            resource_log!("{}::unregister {:?}", T::Marker::KIND, id);
        }
        value
    }

    pub(crate) fn get(&self, id: Id<T::Marker>) -> Result<Arc<T>, InvalidResourceError> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| InvalidResourceError::new(id))
    }

    pub(crate) fn contains(&self, id: Id<T::Marker>) -> bool {
        self.read().contains(id)
    }

    pub(crate) fn ids(&self) -> Vec<Id<T::Marker>> {
        self.read().iter().map(|(id, _)| id).collect()
    }

    pub(crate) fn generate_report(&self) -> RegistryReport {
        let storage = self.storage.read();
        let StorageReport {
            num_occupied,
            num_vacant: _,
            element_size,
        } = storage.generate_report();
        RegistryReport {
            num_allocated: self.identity.live(),
            num_kept_from_user: num_occupied,
            element_size,
        }
    }
}
