//! Memory-mapped view of the server's shared-memory segment
//!
//! The server creates the segment, writes headers and payloads into it and
//! reclaims slots once every reader has cleared its flag. The client only
//! maps it, reads records, and clears its own flags.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};
use tracing::debug;

use super::header::{RecordHeader, SlotRef, HEADER_SIZE};
use crate::error::{LoaderError, Result};

/// Directory backing POSIX shared-memory names
pub const SHM_DIR: &str = "/dev/shm";

/// A mapped shared-memory segment with bounds-checked access
pub struct SharedMemoryRegion {
    path: PathBuf,
    map: MmapMut,
}

impl std::fmt::Debug for SharedMemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemoryRegion")
            .field("path", &self.path)
            .field("len", &self.map.len())
            .finish()
    }
}

/// Resolve a server-provided `shm_path` to a file.
///
/// An existing file path is used as is; anything else is treated as a
/// POSIX shm name (`shm_open` style, leading `/` optional).
pub fn resolve_shm_path(shm_path: &str) -> PathBuf {
    let direct = Path::new(shm_path);
    if direct.is_file() {
        return direct.to_path_buf();
    }
    Path::new(SHM_DIR).join(shm_path.trim_start_matches('/'))
}

impl SharedMemoryRegion {
    /// Open and map the segment named by `shm_path`
    pub fn open(shm_path: &str) -> Result<Self> {
        let path = resolve_shm_path(shm_path);
        let shm_err = |reason: String| LoaderError::Shm {
            path: path.display().to_string(),
            reason,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| shm_err(e.to_string()))?;

        let len = file.metadata().map_err(|e| shm_err(e.to_string()))?.len();
        if len == 0 {
            return Err(shm_err("segment is empty".into()));
        }
        let len = usize::try_from(len).map_err(|_| shm_err(format!("segment of {len} bytes cannot be mapped")))?;

        // SAFETY: the segment is owned by the server, which never truncates it
        // while loaders are attached.
        let map = unsafe {
            MmapOptions::new()
                .len(len)
                .map_mut(&file)
                .map_err(|e| shm_err(e.to_string()))?
        };

        debug!("Mapped {} bytes of shared memory from {}", len, path.display());
        Ok(Self { path, map })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the mapping in bytes
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn range(&self, offset: u64, len: u64) -> Result<std::ops::Range<usize>> {
        let out_of_bounds = || LoaderError::OutOfBounds {
            offset,
            len,
            region_len: self.map.len(),
        };
        let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > self.map.len() as u64 {
            return Err(out_of_bounds());
        }
        Ok(offset as usize..end as usize)
    }

    /// Borrow `len` bytes at absolute `offset`
    pub fn read(&self, offset: u64, len: u64) -> Result<&[u8]> {
        let range = self.range(offset, len)?;
        Ok(&self.map[range])
    }

    /// Write one byte at absolute `offset`
    pub fn write_byte(&mut self, offset: u64, value: u8) -> Result<()> {
        let range = self.range(offset, 1)?;
        self.map[range.start] = value;
        Ok(())
    }

    /// Decode the header located at absolute byte `address`
    pub fn read_header(&self, address: u64) -> Result<RecordHeader> {
        RecordHeader::decode(self.read(address, HEADER_SIZE)?)
    }

    /// Borrow the payload of `slot`
    ///
    /// The slice stays valid until `mark_consumed` is issued for the slot;
    /// after that the server may overwrite it.
    pub fn read_payload(&self, slot: SlotRef) -> Result<&[u8]> {
        let header = self.read_header(slot.header_offset()?)?;
        let range = header.payload_range()?;
        self.read(range.start, range.end - range.start)
    }

    /// Clear this reader's flag on `slot` so the server can reuse it
    pub fn mark_consumed(&mut self, slot: SlotRef) -> Result<()> {
        let offset = slot.read_flag_offset()?;
        self.write_byte(offset, 0)
    }

    /// Read this reader's flag on `slot`; non-zero means not yet consumed
    pub fn read_flag(&self, slot: SlotRef) -> Result<u8> {
        let offset = slot.read_flag_offset()?;
        Ok(self.read(offset, 1)?[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn region_with(bytes: &[u8]) -> (tempfile::NamedTempFile, SharedMemoryRegion) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        let region = SharedMemoryRegion::open(file.path().to_str().unwrap()).unwrap();
        (file, region)
    }

    fn segment(slots: &[(u32, u64)], size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; size];
        for (i, (len, off)) in slots.iter().enumerate() {
            let start = i * HEADER_SIZE as usize;
            RecordHeader::new(*len, *off)
                .encode(&mut buf[start..start + HEADER_SIZE as usize])
                .unwrap();
            buf[start + 12..start + 20].fill(0xff);
        }
        buf
    }

    #[test]
    fn test_resolve_shm_name() {
        assert_eq!(resolve_shm_path("/DLCJob"), PathBuf::from("/dev/shm/DLCJob"));
        assert_eq!(resolve_shm_path("DLCJob"), PathBuf::from("/dev/shm/DLCJob"));
    }

    #[test]
    fn test_read_payload() {
        let mut buf = segment(&[(5, 100), (3, 105)], 128);
        buf[100..105].copy_from_slice(b"hello");
        buf[105..108].copy_from_slice(b"abc");
        let (_file, region) = region_with(&buf);

        assert_eq!(region.len(), 128);
        assert_eq!(region.read_payload(SlotRef::new(0, 0)).unwrap(), b"hello");
        assert_eq!(region.read_payload(SlotRef::new(1, 3)).unwrap(), b"abc");
    }

    #[test]
    fn test_payload_past_region_is_out_of_bounds() {
        let buf = segment(&[(64, 100)], 128);
        let (_file, region) = region_with(&buf);

        let err = region.read_payload(SlotRef::new(0, 0)).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::OutOfBounds {
                offset: 100,
                len: 64,
                region_len: 128
            }
        ));
    }

    #[test]
    fn test_header_past_region_is_out_of_bounds() {
        let (_file, region) = region_with(&[0u8; 30]);
        assert!(matches!(
            region.read_payload(SlotRef::new(1, 0)),
            Err(LoaderError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_mark_consumed_clears_only_own_flag() {
        let buf = segment(&[(1, 40)], 64);
        let (_file, mut region) = region_with(&buf);
        let slot = SlotRef::new(0, 2);

        assert_eq!(region.read_flag(slot).unwrap(), 0xff);
        region.mark_consumed(slot).unwrap();
        assert_eq!(region.read_flag(slot).unwrap(), 0);
        assert_eq!(region.read_flag(SlotRef::new(0, 1)).unwrap(), 0xff);
        assert_eq!(region.read_flag(SlotRef::new(0, 3)).unwrap(), 0xff);
    }

    #[test]
    fn test_missing_segment() {
        let err = SharedMemoryRegion::open("/nonexistent/joader-segment").unwrap_err();
        assert!(matches!(err, LoaderError::Shm { .. }));
    }
}
