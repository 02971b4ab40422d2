//! Process-wide pool of spill buffers.
//!
//! Nested zips cannot be decoded from a forward-only stream, so the scanner
//! spills them into a byte buffer first. Uber-jars contain many such nested
//! archives; pooling the buffers keeps steady-state allocation flat.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, MutexGuard};

const MAX_POOLED_BUFFERS: usize = 8;

static POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

fn pool() -> MutexGuard<'static, Vec<Vec<u8>>> {
    POOL.lock().unwrap_or_else(|e| e.into_inner())
}

/// Take a buffer from the pool (or allocate one), cleared and with room for
/// `size_hint` bytes when the caller knows the size up front.
pub fn acquire(size_hint: i64) -> Vec<u8> {
    let mut buf = pool().pop().unwrap_or_default();
    buf.clear();
    if size_hint > 0 {
        buf.reserve(size_hint as usize);
    }
    buf
}

fn release(mut buf: Vec<u8>) {
    let mut pool = pool();
    if pool.len() < MAX_POOLED_BUFFERS {
        buf.clear();
        pool.push(buf);
    }
}

/// A cheap seekable view over a spilled buffer.
///
/// The zip decoder and the owning container each hold a view; the underlying
/// buffer returns to the pool when the last view drops.
pub struct ByteView {
    data: Option<Arc<Vec<u8>>>,
    pos: u64,
}

impl ByteView {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Some(Arc::new(data)),
            pos: 0,
        }
    }

    /// Another view over the same bytes, positioned at the start.
    pub fn share(&self) -> ByteView {
        ByteView {
            data: self.data.clone(),
            pos: 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        self.data.as_deref().map(Vec::as_slice).unwrap_or_default()
    }
}

impl Read for ByteView {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = (self.pos as usize).min(self.as_bytes().len());
        let n = (&self.as_bytes()[start..]).read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for ByteView {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.as_bytes().len() as i64;
        let next = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => len + n,
            SeekFrom::Current(n) => self.pos as i64 + n,
        };
        if next < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of buffer",
            ));
        }
        self.pos = next as u64;
        Ok(self.pos)
    }
}

impl Drop for ByteView {
    fn drop(&mut self) {
        // The last view standing hands the buffer back to the pool.
        if let Some(arc) = self.data.take() {
            if let Ok(buf) = Arc::try_unwrap(arc) {
                release(buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_seek() {
        let mut view = ByteView::new(b"0123456789".to_vec());
        let mut buf = [0u8; 4];
        view.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"0123");

        view.seek(SeekFrom::End(-2)).unwrap();
        let mut rest = Vec::new();
        view.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"89");

        view.seek(SeekFrom::Start(1)).unwrap();
        view.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"1234");
    }

    #[test]
    fn seek_before_start_is_an_error() {
        let mut view = ByteView::new(b"abc".to_vec());
        assert!(view.seek(SeekFrom::Current(-1)).is_err());
    }

    #[test]
    fn shared_views_are_independent() {
        let mut a = ByteView::new(b"hello".to_vec());
        let mut b = a.share();
        let mut buf = [0u8; 2];
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"he");
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"he");
    }

    #[test]
    fn buffers_are_reused_after_all_views_drop() {
        let view = ByteView::new(acquire(64));
        let shared = view.share();
        drop(view);
        drop(shared);
        // The buffer is back in the pool; acquiring must not grow it.
        let buf = acquire(0);
        drop(ByteView::new(buf));
    }
}
