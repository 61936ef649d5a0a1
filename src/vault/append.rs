//! Append writer: byte-exact appends into files whose physical size may
//! exceed their logical content.
//!
//! A log file that began life as a zero-filled placeholder carries a zero
//! tail after its content. The true end of content is the position after
//! the last non-zero byte, found by scanning backward from physical EOF.
//! Writes land there and the zero tail past the new content is left alone,
//! so the disk footprint established at reservation time never shrinks and
//! no external length record is needed.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::core::errors::{Result, VaultError};

/// Backward-scan unit. Crash reports are text; the last non-zero byte is
/// almost always inside the final chunk.
const SCAN_CHUNK: usize = 64 * 1024;

/// Append `text` (UTF-8 bytes) at the end of the file's logical content.
///
/// The write is synced before returning; the file's physical size is never
/// truncated. An entirely zero file has its content start at 0.
pub fn append_text(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| VaultError::io(path, e))?;

    let len = file.metadata().map_err(|e| VaultError::io(path, e))?.len();
    let pos = if len == 0 {
        0
    } else {
        content_end(&mut file, len, path)?
    };

    file.seek(SeekFrom::Start(pos))
        .map_err(|e| VaultError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| VaultError::io(path, e))?;
    file.sync_all().map_err(|e| VaultError::io(path, e))?;
    Ok(())
}

/// Position immediately after the last non-zero byte, scanning backward in
/// chunks from the physical end of file. 0 when the file is entirely zero.
fn content_end(file: &mut File, len: u64, path: &Path) -> Result<u64> {
    let mut buf = vec![0u8; SCAN_CHUNK];
    let mut end = len;

    while end > 0 {
        let start = end.saturating_sub(SCAN_CHUNK as u64);
        #[allow(clippy::cast_possible_truncation)]
        let chunk_len = (end - start) as usize;

        file.seek(SeekFrom::Start(start))
            .map_err(|e| VaultError::io(path, e))?;
        file.read_exact(&mut buf[..chunk_len])
            .map_err(|e| VaultError::io(path, e))?;

        if let Some(idx) = buf[..chunk_len].iter().rposition(|&b| b != 0) {
            return Ok(start + idx as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn append_into_zero_filled_file_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tombstone_a.panic.crashlog");
        fs::write(&path, vec![0u8; 4096]).unwrap();

        append_text(&path, "panic at src/main.rs:42").unwrap();

        let content = fs::read(&path).unwrap();
        assert_eq!(content.len(), 4096, "physical size must not change");
        assert!(content.starts_with(b"panic at src/main.rs:42"));
        assert!(content[23..].iter().all(|&b| b == 0));
    }

    #[test]
    fn consecutive_appends_chain_without_a_length_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tombstone_b.panic.crashlog");
        fs::write(&path, vec![0u8; 1024]).unwrap();

        append_text(&path, "A").unwrap();
        append_text(&path, "B").unwrap();

        let content = fs::read(&path).unwrap();
        assert_eq!(content.len(), 1024);
        assert_eq!(&content[..2], b"AB");
        assert!(content[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn append_to_empty_file_writes_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tombstone_c.native.crashlog");
        fs::write(&path, b"").unwrap();

        append_text(&path, "report").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"report");
    }

    #[test]
    fn append_past_existing_content_without_zero_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tombstone_d.native.crashlog");
        fs::write(&path, b"first half").unwrap();

        append_text(&path, " second half").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"first half second half");
    }

    #[test]
    fn scan_crosses_chunk_boundaries() {
        // Content ends early in a large zero tail, several chunks before
        // physical EOF.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tombstone_e.panic.crashlog");
        let mut data = vec![0u8; 3 * SCAN_CHUNK + 17];
        data[..5].copy_from_slice(b"stack");
        fs::write(&path, &data).unwrap();

        append_text(&path, " trace").unwrap();

        let content = fs::read(&path).unwrap();
        assert_eq!(content.len(), data.len());
        assert!(content.starts_with(b"stack trace"));
    }

    #[test]
    fn text_longer_than_zero_tail_extends_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tombstone_f.panic.crashlog");
        fs::write(&path, vec![0u8; 4]).unwrap();

        append_text(&path, "longer than four").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"longer than four");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = append_text(&dir.path().join("absent.panic.crashlog"), "x").unwrap_err();
        assert_eq!(err.code(), "CLV-3001");
    }

    #[test]
    fn utf8_text_is_written_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tombstone_g.panic.crashlog");
        fs::write(&path, vec![0u8; 64]).unwrap();

        append_text(&path, "пані́ка → 💥").unwrap();
        let content = fs::read(&path).unwrap();
        assert!(content.starts_with("пані́ка → 💥".as_bytes()));
        assert_eq!(content.len(), 64);
    }
}
