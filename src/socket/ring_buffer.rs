use core::cmp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    Exhausted,
}

type Result<O> = core::result::Result<O, Error>;

/// A fixed capacity ring buffer.
///
/// Elements are delivered in the order they were enqueued. The buffer never
/// grows, enqueueing into a full buffer fails.
#[derive(Debug)]
pub struct RingBuffer<T, const N: usize> {
    storage: [T; N],
    read_at: usize,
    length: usize,
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    pub fn new() -> RingBuffer<T, N> {
        RingBuffer {
            storage: [T::default(); N],
            read_at: 0,
            length: 0,
        }
    }

    /// Return the maximum number of elements in the ring buffer.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Return the current number of elements in the ring buffer.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Return the number of elements that can be added to the ring buffer.
    pub fn window(&self) -> usize {
        self.capacity() - self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.window() == 0
    }

    /// Shorthand for `(self.read + idx) % self.capacity()` with an
    /// additional check to ensure that the capacity is not zero.
    fn get_idx(&self, idx: usize) -> usize {
        let len = self.capacity();
        if len > 0 {
            (self.read_at + idx) % len
        } else {
            0
        }
    }

    /// Enqueue a single element, or return `Err(Error::Exhausted)` if the
    /// buffer is full.
    pub fn enqueue_one(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            return Err(Error::Exhausted);
        }

        let index = self.get_idx(self.length);
        self.storage[index] = value;
        self.length += 1;
        Ok(())
    }

    /// Call `f` with the largest contiguous slice of allocated buffer elements,
    /// and dequeue the amount of elements returned by `f`.
    ///
    /// # Panics
    /// This function panics if the amount of elements returned by `f` is larger
    /// than the size of the slice passed into it.
    pub fn dequeue_many_with<'b, R, F>(&'b mut self, f: F) -> (usize, R)
    where
        F: FnOnce(&'b mut [T]) -> (usize, R),
    {
        let capacity = self.capacity();
        let max_size = cmp::min(self.len(), capacity - self.read_at);
        let (size, result) = f(&mut self.storage[self.read_at..self.read_at + max_size]);
        assert!(size <= max_size);
        self.read_at = if capacity > 0 {
            (self.read_at + size) % capacity
        } else {
            0
        };
        self.length -= size;
        (size, result)
    }

    /// Dequeue as many elements from the buffer into the given slice as possible,
    /// and return the amount of elements that could fit.
    pub fn dequeue_slice(&mut self, data: &mut [T]) -> usize {
        let (size_1, data) = self.dequeue_many_with(|buf| {
            let size = cmp::min(buf.len(), data.len());
            data[..size].copy_from_slice(&buf[..size]);
            (size, &mut data[size..])
        });
        let (size_2, ()) = self.dequeue_many_with(|buf| {
            let size = cmp::min(buf.len(), data.len());
            data[..size].copy_from_slice(&buf[..size]);
            (size, ())
        });
        size_1 + size_2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill<const N: usize>(ring: &mut RingBuffer<u8, N>, data: &[u8]) -> usize {
        data.iter().take_while(|b| ring.enqueue_one(**b).is_ok()).count()
    }

    #[test]
    fn buffer_length_changes() {
        let mut ring: RingBuffer<u8, 2> = RingBuffer::new();
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.capacity(), 2);
        assert_eq!(ring.window(), 2);

        ring.length = 1;
        assert!(!ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.window(), 1);

        ring.length = 2;
        assert!(!ring.is_empty());
        assert!(ring.is_full());
        assert_eq!(ring.window(), 0);
    }

    #[test]
    fn enqueue_fails_when_full() {
        let mut ring: RingBuffer<u8, 4> = RingBuffer::new();
        assert_eq!(fill(&mut ring, b"abcdef"), 4);
        assert!(ring.is_full());
        assert_eq!(ring.enqueue_one(b'g'), Err(Error::Exhausted));

        let mut out = [0u8; 8];
        assert_eq!(ring.dequeue_slice(&mut out), 4);
        assert_eq!(&out[..4], b"abcd");
    }

    #[test]
    fn dequeue_wraps_around() {
        let mut ring: RingBuffer<u8, 6> = RingBuffer::new();
        assert_eq!(fill(&mut ring, b"abcd"), 4);

        let mut out = [0u8; 3];
        assert_eq!(ring.dequeue_slice(&mut out), 3);
        assert_eq!(&out, b"abc");

        assert_eq!(fill(&mut ring, b"efghi"), 5);
        assert!(ring.is_full());

        let mut out = [0u8; 6];
        assert_eq!(ring.dequeue_slice(&mut out), 6);
        assert_eq!(&out, b"defghi");
        assert!(ring.is_empty());
    }
}
