use std::sync::Arc;

use crate::id::{Id, Marker};
use crate::{Epoch, Index};

/// An entry in a `Storage::map` table.
#[derive(Debug)]
pub(crate) enum Element<T> {
    /// There are no live ids with this index.
    Vacant,

    /// There is one live id with this index, allocated at the given
    /// epoch.
    Occupied(Arc<T>, Epoch),
}

/// Counts of the slots in a [`Storage`] table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageReport {
    pub num_occupied: usize,
    pub num_vacant: usize,
    pub element_size: usize,
}

impl StorageReport {
    pub fn is_empty(&self) -> bool {
        self.num_occupied + self.num_vacant == 0
    }
}

/// A resource type that can be held in a [`Storage`] table.
pub(crate) trait StorageItem: 'static + Send + Sync {
    type Marker: Marker;
}

/// A table of `T` values indexed by the id type `I`.
///
/// The table is represented as a vector indexed by the ids' index
/// values, so you should use an id allocator like `IdAllocator`
/// that keeps the index values dense and close to zero.
///
/// Lookups compare epochs: an id whose slot has since been reused by a newer
/// resource is treated as absent, never as the newer resource.
#[derive(Debug)]
pub(crate) struct Storage<T>
where
    T: StorageItem,
{
    pub(crate) map: Vec<Element<T>>,
    kind: &'static str,
}

impl<T> Storage<T>
where
    T: StorageItem,
{
    pub(crate) fn new() -> Self {
        Self {
            map: Vec::new(),
            kind: T::Marker::KIND,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        self.kind
    }

    pub(crate) fn contains(&self, id: Id<T::Marker>) -> bool {
        self.get(id).is_some()
    }

    /// Get the resource behind `id`, or `None` if `id` is not live.
    pub(crate) fn get(&self, id: Id<T::Marker>) -> Option<&Arc<T>> {
        let (index, epoch) = id.unzip();
        match self.map.get(index as usize) {
            Some(&Element::Occupied(ref value, storage_epoch)) if storage_epoch == epoch => {
                Some(value)
            }
            _ => None,
        }
    }

    pub(crate) fn insert(&mut self, id: Id<T::Marker>, value: Arc<T>) {
        let (index, epoch) = id.unzip();
        let index = index as usize;
        if index >= self.map.len() {
            self.map.resize_with(index + 1, || Element::Vacant);
        }
        match std::mem::replace(&mut self.map[index], Element::Occupied(value, epoch)) {
            Element::Vacant => {}
            Element::Occupied(_, storage_epoch) => {
                // Ids are allocated by `IdAllocator`, which never hands out
                // a live index twice.
                panic!(
                    "{}[{}] is already occupied (epoch {} vs {})",
                    self.kind, index, storage_epoch, epoch
                )
            }
        }
    }

    /// Remove the resource behind `id`.
    ///
    /// Returns `None`, leaving the table untouched, if `id` is not live.
    pub(crate) fn remove(&mut self, id: Id<T::Marker>) -> Option<Arc<T>> {
        let (index, epoch) = id.unzip();
        let slot = self.map.get_mut(index as usize)?;
        match *slot {
            Element::Occupied(_, storage_epoch) if storage_epoch == epoch => {}
            _ => return None,
        }
        match std::mem::replace(slot, Element::Vacant) {
            Element::Occupied(value, _) => Some(value),
            Element::Vacant => None,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Id<T::Marker>, &Arc<T>)> {
        self.map
            .iter()
            .enumerate()
            .filter_map(move |(index, x)| match *x {
                Element::Occupied(ref value, storage_epoch) => {
                    Some((Id::zip(index as Index, storage_epoch), value))
                }
                _ => None,
            })
    }

    pub(crate) fn generate_report(&self) -> StorageReport {
        let mut report = StorageReport {
            element_size: size_of::<T>(),
            ..Default::default()
        };
        for element in self.map.iter() {
            match *element {
                Element::Occupied(..) => report.num_occupied += 1,
                Element::Vacant => report.num_vacant += 1,
            }
        }
        report
    }
}
