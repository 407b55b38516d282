/// Append-only arena. Slots are plain indices, so nodes can refer to each
/// other (parent / children) without pointers or reference counting.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    pool: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaSlot {
    idx: u32,
}

impl ArenaSlot {
    fn new(index: usize) -> Self {
        Self { idx: index as u32 }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.idx as usize
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { pool: Vec::new() }
    }

    pub fn alloc(&mut self, value: T) -> ArenaSlot {
        self.pool.push(value);
        ArenaSlot::new(self.pool.len() - 1)
    }

    pub fn get(&self, slot: ArenaSlot) -> Option<&T> {
        self.pool.get(slot.index())
    }

    pub fn get_mut(&mut self, slot: ArenaSlot) -> Option<&mut T> {
        self.pool.get_mut(slot.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// allocation order
    pub fn iter(&self) -> impl Iterator<Item = (ArenaSlot, &T)> + '_ {
        self.pool.iter().enumerate().map(|(i, v)| (ArenaSlot::new(i), v))
    }
}
