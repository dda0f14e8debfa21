//! On-disk snapshot of the ordered key-value store.
//!
//! Layout: 4 magic bytes, u32 format version, u64 entry count (all
//! little-endian), then one lz4 block (size-prepended) holding the entries as
//! `u32 key_len, key, u32 value_len, value` in key order.

use crate::error::{StorageError, StorageResult};
use memmap2::MmapOptions;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Magic bytes to identify snapshot files
const MAGIC_BYTES: &[u8; 4] = b"PHPX";

/// Version of the snapshot format
const VERSION: u32 = 1;

/// Header size in bytes
const HEADER_SIZE: usize = 16;

pub type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// Writes `entries` next to `path` and renames the file into place, so a
/// crash mid-write leaves the previous snapshot intact.
pub fn write(path: &Path, entries: &Entries) -> StorageResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let raw_len: usize = entries.iter().map(|(k, v)| 8 + k.len() + v.len()).sum();
    let mut raw = Vec::with_capacity(raw_len);
    for (key, value) in entries {
        raw.extend_from_slice(&(key.len() as u32).to_le_bytes());
        raw.extend_from_slice(key);
        raw.extend_from_slice(&(value.len() as u32).to_le_bytes());
        raw.extend_from_slice(value);
    }
    let compressed = lz4_flex::compress_prepend_size(&raw);

    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(MAGIC_BYTES)?;
    file.write_all(&VERSION.to_le_bytes())?;
    file.write_all(&(entries.len() as u64).to_le_bytes())?;
    file.write_all(&compressed)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| StorageError::Io(e.error))?;

    Ok(())
}

/// Loads a snapshot written by [`write`].
pub fn read(path: &Path) -> StorageResult<Entries> {
    let file = File::open(path)?;
    let len = file.metadata()?.len() as usize;
    if len < HEADER_SIZE {
        return Err(corrupted(path, "file too small"));
    }
    let mmap = unsafe { MmapOptions::new().map(&file)? };

    if &mmap[0..4] != MAGIC_BYTES {
        return Err(corrupted(path, "invalid magic bytes"));
    }

    let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);
    if version != VERSION {
        return Err(StorageError::UnsupportedSnapshotVersion {
            path: path.to_path_buf(),
            version,
        });
    }

    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&mmap[8..16]);
    let count = u64::from_le_bytes(count_bytes) as usize;

    let raw = lz4_flex::decompress_size_prepended(&mmap[HEADER_SIZE..])
        .map_err(|e| corrupted(path, &format!("decompression failed: {e}")))?;

    let mut entries = Entries::new();
    let mut pos = 0;
    for _ in 0..count {
        let key = read_chunk(&raw, &mut pos).ok_or_else(|| corrupted(path, "truncated key"))?;
        let value =
            read_chunk(&raw, &mut pos).ok_or_else(|| corrupted(path, "truncated value"))?;
        entries.insert(key.to_vec(), value.to_vec());
    }
    if pos != raw.len() {
        return Err(corrupted(path, "unexpected trailing data"));
    }

    Ok(entries)
}

fn read_chunk<'a>(raw: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let len_bytes = raw.get(*pos..*pos + 4)?;
    let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    let start = *pos + 4;
    let chunk = raw.get(start..start + len)?;
    *pos = start + len;
    Some(chunk)
}

fn corrupted(path: &Path, reason: &str) -> StorageError {
    StorageError::SnapshotCorrupted {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index").join("store.snap");

        let mut entries = Entries::new();
        entries.insert(b"class@1\0a".to_vec(), vec![1, 2, 3]);
        entries.insert(b"class@1\0b".to_vec(), Vec::new());
        entries.insert(vec![0, 0xFF, 0], vec![9; 1000]);

        write(&path, &entries).unwrap();
        let loaded = read(&path).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn test_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.snap");

        std::fs::write(&path, b"nope").unwrap();
        assert!(matches!(
            read(&path),
            Err(StorageError::SnapshotCorrupted { .. })
        ));

        std::fs::write(&path, b"XXXX\x01\0\0\0\0\0\0\0\0\0\0\0").unwrap();
        assert!(matches!(
            read(&path),
            Err(StorageError::SnapshotCorrupted { .. })
        ));

        std::fs::write(&path, b"PHPX\x07\0\0\0\0\0\0\0\0\0\0\0").unwrap();
        assert!(matches!(
            read(&path),
            Err(StorageError::UnsupportedSnapshotVersion { version: 7, .. })
        ));
    }

    #[test]
    fn test_empty_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.snap");
        write(&path, &Entries::new()).unwrap();
        assert!(read(&path).unwrap().is_empty());
    }
}
