use std::io::{self, Read};

use sha2::{Digest, Sha256};

/// How many leading bytes are captured for archive-kind detection. 262 bytes
/// is enough to reach the `ustar` magic at offset 257 in a tar header.
pub const HEADER_PEEK_LEN: usize = 262;

/// A byte source that tees everything it serves into a running SHA-256.
///
/// On construction the first [`HEADER_PEEK_LEN`] bytes are pulled through the
/// tee and kept aside; `header()` exposes them without disturbing the read
/// cursor, and `read()` serves them back before continuing with the rest of
/// the source. `hash()` drains whatever has not been read yet and returns the
/// hex digest of the whole source, memoized. After `hash()` the reader is at
/// end of stream.
pub struct ContentReader<'a> {
    filename: String,
    size: i64,
    header: Vec<u8>,
    header_pos: usize,
    tee: TeeReader<'a>,
    hash: Option<String>,
}

struct TeeReader<'a> {
    inner: Box<dyn Read + 'a>,
    hasher: Sha256,
}

impl Read for TeeReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

impl<'a> ContentReader<'a> {
    /// Wrap `source`, pulling the detection header through the hash tee.
    ///
    /// `size` is the uncompressed length when known, or -1 (decompressed
    /// streams report -1 because gzip does not carry a trustworthy length).
    pub fn new(
        filename: impl Into<String>,
        size: i64,
        source: Box<dyn Read + 'a>,
    ) -> io::Result<Self> {
        let mut tee = TeeReader {
            inner: source,
            hasher: Sha256::new(),
        };
        let mut header = vec![0u8; HEADER_PEEK_LEN];
        let mut filled = 0;
        while filled < header.len() {
            let n = tee.read(&mut header[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        header.truncate(filled);
        Ok(Self {
            filename: filename.into(),
            size,
            header,
            header_pos: 0,
            tee,
            hash: None,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Uncompressed size when known, -1 otherwise.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// The peeked leading bytes (shorter than [`HEADER_PEEK_LEN`] for short
    /// sources).
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Hex SHA-256 of the entire source.
    ///
    /// Bytes not yet served to the consumer are drained through the tee
    /// first, so the digest always covers the whole stream even when the
    /// consumer stopped early. The result is memoized; subsequent reads
    /// return end of stream.
    pub fn hash(&mut self) -> io::Result<String> {
        if self.hash.is_none() {
            io::copy(self, &mut io::sink())?;
            let digest = self.tee.hasher.finalize_reset();
            self.hash = Some(hex::encode(digest));
        }
        Ok(self.hash.clone().unwrap_or_default())
    }
}

impl Read for ContentReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.header_pos < self.header.len() {
            let n = (&self.header[self.header_pos..]).read(buf)?;
            self.header_pos += n;
            return Ok(n);
        }
        if self.hash.is_some() {
            // The stream was drained to finalize the hash.
            return Ok(0);
        }
        self.tee.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};
    use std::io::Read;

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// A reader that counts how many bytes it has served, to prove the
    /// source is consumed only once.
    struct Counting<'a> {
        data: &'a [u8],
        served: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl Read for Counting<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let pos = self.served.get().min(self.data.len());
            let n = (&self.data[pos..]).read(buf)?;
            self.served.set(self.served.get() + n);
            Ok(n)
        }
    }

    #[test]
    fn hash_covers_whole_source_without_reads() {
        let data = vec![7u8; 4096];
        let mut reader = ContentReader::new("blob", data.len() as i64, Box::new(&data[..])).unwrap();
        assert_eq!(reader.hash().unwrap(), sha256_hex(&data));
    }

    #[test]
    fn hash_after_partial_read_matches_full_digest() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let mut reader = ContentReader::new("blob", data.len() as i64, Box::new(&data[..])).unwrap();
        let mut first = vec![0u8; 1000];
        reader.read_exact(&mut first).unwrap();
        assert_eq!(&first, &data[..1000]);
        assert_eq!(reader.hash().unwrap(), sha256_hex(&data));
    }

    #[test]
    fn header_is_capped_and_replayed() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut reader = ContentReader::new("blob", data.len() as i64, Box::new(&data[..])).unwrap();
        assert_eq!(reader.header(), &data[..HEADER_PEEK_LEN]);
        // Reads start from the beginning, not after the peek.
        let mut all = Vec::new();
        reader.read_to_end(&mut all).unwrap();
        assert_eq!(all, data);
    }

    #[test]
    fn short_source_yields_short_header() {
        let data = b"PK\x03\x04tiny";
        let mut reader = ContentReader::new("tiny.zip", data.len() as i64, Box::new(&data[..])).unwrap();
        assert_eq!(reader.header(), data);
        assert_eq!(reader.hash().unwrap(), sha256_hex(data));
    }

    #[test]
    fn reads_after_hash_yield_eof() {
        let data = vec![1u8; 500];
        let mut reader = ContentReader::new("blob", -1, Box::new(&data[..])).unwrap();
        reader.hash().unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn hash_is_memoized_and_source_read_once() {
        let data = vec![9u8; 2000];
        let served = std::rc::Rc::new(std::cell::Cell::new(0));
        let counting = Counting { data: &data, served: served.clone() };
        let mut reader = ContentReader::new("blob", data.len() as i64, Box::new(counting)).unwrap();
        let first = reader.hash().unwrap();
        let second = reader.hash().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, sha256_hex(&data));
        // The source was drained exactly once, never re-read.
        assert_eq!(served.get(), data.len());
    }
}
