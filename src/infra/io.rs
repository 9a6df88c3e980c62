//! Text I/O for the flatten/distribute pipeline.
//!
//! Reads are lossy (invalid UTF-8 becomes U+FFFD) and memory-mapped above
//! 1 MiB. Writes fully overwrite the destination and create parent
//! directories on demand.

use memchr::memchr_iter;
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// Read `path` as UTF-8, replacing invalid sequences.
pub fn read_text_lossy<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)?;

    if metadata.len() > MMAP_THRESHOLD {
        let file = File::open(path)?;

        // Safety: read-only mapping, copied out before the map is dropped
        let mmap = unsafe { Mmap::map(&file) }?;

        Ok(String::from_utf8_lossy(&mmap).into_owned())
    } else {
        let bytes = fs::read(path)?;

        // Avoid a second copy for the common valid case
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

/// Replace the contents of `path`, creating missing parent directories.
pub fn write_overwrite<P: AsRef<Path>>(path: P, contents: &str) -> io::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, contents)
}

/// Fast, CRLF-safe total line counting.
/// Counts '\n' bytes and adds one if the file is non-empty and doesn't end with '\n'.
pub fn count_lines<P: AsRef<Path>>(path: P) -> io::Result<usize> {
    let path = path.as_ref();
    let len = fs::metadata(path)?.len();
    if len == 0 {
        return Ok(0);
    }

    if len > MMAP_THRESHOLD {
        let file = File::open(path)?;
        // Safety: read-only map of an existing regular file
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(total_lines(&mmap))
    } else {
        Ok(total_lines(&fs::read(path)?))
    }
}

fn total_lines(bytes: &[u8]) -> usize {
    let nl = memchr_iter(b'\n', bytes).count();
    // Last line may lack a terminator
    if bytes.ends_with(b"\n") { nl } else { nl + 1 }
}

/// Expand `~` and `$VAR` in a user-supplied path. Unknown variables leave
/// the path untouched.
pub fn expand_path(raw: &Path) -> PathBuf {
    let text = raw.to_string_lossy();

    match shellexpand::full(&text) {
        Ok(Cow::Borrowed(_)) => raw.to_path_buf(),
        Ok(Cow::Owned(expanded)) => PathBuf::from(expanded),
        Err(e) => {
            warn!("could not expand {}: {e}", raw.display());
            raw.to_path_buf()
        }
    }
}
