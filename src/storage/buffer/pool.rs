use parking_lot::Mutex;
use std::fmt::Debug;

/// A recycler of page-sized byte buffers, shareable between vectors.
pub trait BufferPool: Send + Sync + Debug {
    /// Takes a buffer out of the pool. Returns None if the pool is empty.
    fn get(&self) -> Option<Vec<u8>>;

    /// Returns a buffer to the pool. The pool may drop it.
    fn put(&self, buf: Vec<u8>);
}

#[derive(Debug)]
pub struct VecBufferPool {
    /// Recycled buffers, most recently returned at the back
    buffers: Mutex<Vec<Vec<u8>>>,
    /// Capacity of freshly allocated buffers
    buffer_size: usize,
    /// Maximum number of idle buffers kept
    max_buffers: usize,
}

impl VecBufferPool {
    pub fn new(buffer_size: usize, max_buffers: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::with_capacity(max_buffers)),
            buffer_size,
            max_buffers,
        }
    }

    /// Pre-fills the pool with `count` zeroed buffers.
    pub fn with_buffers(buffer_size: usize, max_buffers: usize, count: usize) -> Self {
        let pool = Self::new(buffer_size, max_buffers);
        for _ in 0..count.min(max_buffers) {
            pool.put(vec![0u8; buffer_size]);
        }
        pool
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of idle buffers.
    pub fn available(&self) -> usize {
        self.buffers.lock().len()
    }
}

impl BufferPool for VecBufferPool {
    fn get(&self) -> Option<Vec<u8>> {
        self.buffers.lock().pop()
    }

    fn put(&self, mut buf: Vec<u8>) {
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.max_buffers {
            buf.clear();
            buffers.push(buf);
        }
    }
}
