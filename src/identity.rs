/*! Id allocation.

Every object the emulation hands out gets a fresh id. Slots are recycled so
storage stays dense, but a recycled slot always comes back with a newer epoch:
an id, once released, never compares equal to anything allocated later. That
is what makes stale ids detectable after `destroy`.
!*/

use parking_lot::Mutex;

use crate::{
    id::{Id, Marker},
    Epoch, Index,
};
use std::marker::PhantomData;

#[derive(Debug, Default)]
struct Slots {
    /// Released slots, with the epoch they were last handed out under.
    vacant: Vec<(Index, Epoch)>,
    /// First slot index that has never been used.
    fresh: Index,
    live: usize,
}

impl Slots {
    fn take(&mut self) -> (Index, Epoch) {
        self.live += 1;
        if let Some((index, epoch)) = self.vacant.pop() {
            return (index, epoch + 1);
        }
        let index = self.fresh;
        self.fresh += 1;
        (index, 1)
    }

    fn give_back(&mut self, index: Index, epoch: Epoch) {
        self.vacant.push((index, epoch));
        self.live -= 1;
    }
}

/// Hands out ids of one resource kind.
#[derive(Debug)]
pub struct IdAllocator<T: Marker> {
    slots: Mutex<Slots>,
    _kind: PhantomData<T>,
}

impl<T: Marker> IdAllocator<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            _kind: PhantomData,
        }
    }

    pub fn alloc(&self) -> Id<T> {
        let (index, epoch) = self.slots.lock().take();
        Id::zip(index, epoch)
    }

    /// Return `id`'s slot for reuse. `id` itself is never handed out again.
    pub fn release(&self, id: Id<T>) {
        let (index, epoch) = id.unzip();
        self.slots.lock().give_back(index, epoch);
    }

    /// Number of ids allocated and not yet released.
    pub fn live(&self) -> usize {
        self.slots.lock().live
    }
}
