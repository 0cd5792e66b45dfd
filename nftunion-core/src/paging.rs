//! Single-source pager: trims an overshoot batch from one source to the requested size.

use crate::factory::ContinuationFactory;
use crate::slice::Slice;

/// Sorts one source's batch in factory order and cuts it to a page.
pub struct Paging<'a, E, F> {
    factory: &'a F,
    entities: Vec<E>,
}

impl<'a, E, F> Paging<'a, E, F>
where
    F: ContinuationFactory<E>,
{
    pub fn new(factory: &'a F, entities: Vec<E>) -> Self {
        Self { factory, entities }
    }

    /// Take the first `size` entities in factory order.
    ///
    /// A batch no larger than `size` is the true end of the source and gets a
    /// `None` continuation. Otherwise the continuation is the cursor of the
    /// last included entity. A zero size is treated as one so the stream
    /// always advances.
    pub fn slice(self, size: usize) -> Slice<E> {
        let size = size.max(1);
        let factory = self.factory;
        let mut entities = self.entities;
        entities.sort_by(|a, b| factory.compare(a, b));

        if entities.len() <= size {
            return Slice::new(None, entities);
        }

        entities.truncate(size);
        let continuation = entities.last().map(|last| factory.continuation_of(last));
        Slice::new(continuation, entities)
    }
}
