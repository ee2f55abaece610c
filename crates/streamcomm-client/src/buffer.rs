use crate::error::ClientError;

/// Grow-only receive arena owned by the frame reader.
///
/// Capacity tracks the largest payload declared so far and never shrinks for
/// the life of the connection. Growth goes through `try_reserve` so an
/// allocation failure surfaces as [`ClientError::BufferExhausted`] instead of
/// aborting the process: once the payload length has been read from the
/// header it is committed on the wire, and reading it into an undersized
/// buffer would corrupt the stream.
pub(crate) struct RecvBuffer {
    data: Vec<u8>,
}

impl RecvBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Return a writable region of exactly `n` bytes, growing if needed.
    pub(crate) fn ensure_capacity(&mut self, n: usize) -> Result<&mut [u8], ClientError> {
        if n > self.data.capacity() {
            self.data
                .try_reserve(n - self.data.len())
                .map_err(|_| ClientError::BufferExhausted { requested: n })?;
        }
        if self.data.len() < n {
            self.data.resize(n, 0);
        }
        Ok(&mut self.data[..n])
    }
}
