/*! Non-owning relations between resources.

A WebGPU object cannot carry extra owning fields (a `GPUTextureView` has no
`texture` attribute), yet the emulation needs to walk from derived objects back
to the objects they came from. These relations live in side tables scoped to
one [`Global`](crate::global::Global):

- texture view → texture it was created from,
- texture → surface whose cache currently holds it.

Lookups never extend the owner's lifetime. Destroying an owner leaves derived
entries in place; whoever destroys the *derived* object removes its entry.
!*/

use parking_lot::RwLock;

use crate::{
    id::{Id, Marker},
    FastHashMap,
};

#[derive(Debug)]
pub(crate) struct RelationTracker<D: Marker, O: Marker> {
    owners: RwLock<FastHashMap<Id<D>, Id<O>>>,
}

impl<D: Marker, O: Marker> RelationTracker<D, O> {
    pub(crate) fn new() -> Self {
        Self {
            owners: RwLock::new(FastHashMap::default()),
        }
    }

    /// Record that `derived` belongs to `owner`, replacing any previous owner.
    pub(crate) fn insert(&self, derived: Id<D>, owner: Id<O>) {
        self.owners.write().insert(derived, owner);
    }

    pub(crate) fn owner_of(&self, derived: Id<D>) -> Option<Id<O>> {
        self.owners.read().get(&derived).copied()
    }

    /// Forget `derived`'s owner. No-op if it has none.
    pub(crate) fn remove(&self, derived: Id<D>) -> Option<Id<O>> {
        self.owners.write().remove(&derived)
    }

    /// All derived objects currently recorded against `owner`.
    pub(crate) fn derived_from(&self, owner: Id<O>) -> Vec<Id<D>> {
        let mut derived = self
            .owners
            .read()
            .iter()
            .filter_map(|(&d, &o)| (o == owner).then_some(d))
            .collect::<Vec<_>>();
        derived.sort();
        derived
    }

    pub(crate) fn len(&self) -> usize {
        self.owners.read().len()
    }
}
