/// Fixed-capacity delay line.
///
/// Storage is rounded up to a power of two so the write cursor can wrap with
/// a mask. The cursor counts writes; nothing is ever reallocated after
/// construction.
#[derive(Clone, Debug)]
pub struct CircularBuffer<T> {
    buffer: Box<[T]>,
    mask: usize,
    index: usize,
    capacity: usize,
}

impl<T: Copy + Default> CircularBuffer<T> {
    /// Buffer able to look back `capacity` writes behind the latest one.
    pub fn new(capacity: usize) -> Self {
        let size = (capacity + 1).next_power_of_two();
        Self {
            buffer: vec![T::default(); size].into_boxed_slice(),
            mask: size - 1,
            index: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn write(&mut self, value: T) {
        self.buffer[self.index & self.mask] = value;
        self.index = self.index.wrapping_add(1);
    }

    /// Value written `lag` writes before the latest one; `read(0)` is the
    /// latest. History that was never written reads as `T::default()`.
    ///
    /// `lag` must not exceed the capacity.
    #[inline]
    pub fn read(&self, lag: usize) -> T {
        debug_assert!(lag <= self.capacity, "lag {} > capacity {}", lag, self.capacity);
        self.buffer[self.index.wrapping_sub(1).wrapping_sub(lag) & self.mask]
    }

    pub fn get(&self, lag: usize) -> Option<T> {
        (lag <= self.capacity).then(|| self.read(lag))
    }
}
