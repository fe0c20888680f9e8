//! Crash-safe file placement.
//!
//! New artifacts are written under a hidden temporary name and renamed into place,
//! so a crash never leaves a half-written recording under a real id. Moves between
//! areas are a single `rename` on one volume; across volumes the copy is verified
//! byte for byte before the source is removed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Suffix of in-flight temporary files. Names also start with a dot.
pub const TEMP_SUFFIX: &str = ".partial";

const COMPARE_CHUNK: usize = 64 * 1024;

/// Whether a file name belongs to an in-flight temporary file.
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

/// Hidden temporary sibling of `target`.
fn temp_path_for(target: &Path) -> io::Result<PathBuf> {
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no file name"))?;
    Ok(target.with_file_name(format!(".{name}{TEMP_SUFFIX}")))
}

/// Writes `bytes` to `target`, which must not exist yet.
///
/// On any failure the temporary file is removed and `target` is left absent.
pub fn write_new_file(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp = temp_path_for(target)?;
    let result = write_synced(&temp, bytes).and_then(|()| rename_no_clobber(&temp, target));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

/// Moves `source` to `target`, which must not exist yet.
///
/// Either the file ends up at `target` and `source` is gone, or `source` is left
/// exactly as it was.
pub fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    if target.exists() {
        return Err(already_exists(target));
    }

    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                "Cross-device move of {}, falling back to copy and verify",
                source.display()
            );
            copy_verify_move(source, target)
        }
        Err(e) => Err(e),
    }
}

/// Renames within one directory without replacing an existing file.
pub fn rename_no_clobber(source: &Path, target: &Path) -> io::Result<()> {
    if target.exists() {
        return Err(already_exists(target));
    }
    fs::rename(source, target)
}

/// Copies `source` next to `target`, verifies the copy, renames it into place and
/// only then removes `source`.
pub fn copy_verify_move(source: &Path, target: &Path) -> io::Result<()> {
    let temp = temp_path_for(target)?;

    let placed = fs::copy(source, &temp)
        .and_then(|_| File::open(&temp)?.sync_all())
        .and_then(|()| {
            if files_identical(source, &temp)? {
                Ok(())
            } else {
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "copied file does not match the original",
                ))
            }
        })
        .and_then(|()| rename_no_clobber(&temp, target));

    if let Err(e) = placed {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    if let Err(e) = fs::remove_file(source) {
        // Never leave the recording in both places.
        tracing::warn!(
            "Could not remove {} after copying, rolling back: {}",
            source.display(),
            e
        );
        let _ = fs::remove_file(target);
        return Err(e);
    }
    Ok(())
}

/// Compares two files byte for byte.
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    let len = fs::metadata(a)?.len();
    if len != fs::metadata(b)?.len() {
        return Ok(false);
    }

    let mut left = File::open(a)?;
    let mut right = File::open(b)?;
    let mut left_buf = vec![0u8; COMPARE_CHUNK];
    let mut right_buf = vec![0u8; COMPARE_CHUNK];
    let mut remaining = len;

    while remaining > 0 {
        let step = remaining.min(COMPARE_CHUNK as u64) as usize;
        left.read_exact(&mut left_buf[..step])?;
        right.read_exact(&mut right_buf[..step])?;
        if left_buf[..step] != right_buf[..step] {
            return Ok(false);
        }
        remaining -= step as u64;
    }
    Ok(true)
}

/// Removes temporary files left behind by an interrupted write or move.
///
/// Returns how many were removed.
pub fn sweep_temp_files(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_temp_name(name) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::info!("Removed stale temporary file {}", entry.path().display());
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove {}: {}", entry.path().display(), e),
        }
    }
    removed
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_new_file_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.wav");
        write_new_file(&target, b"first").unwrap();

        let err = write_new_file(&target, b"second").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&target).unwrap(), b"first");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_copy_verify_move_relocates_bytes() {
        let from = tempfile::tempdir().unwrap();
        let to = tempfile::tempdir().unwrap();
        let source = from.path().join("take.wav");
        let target = to.path().join("take.wav");
        fs::write(&source, vec![7u8; COMPARE_CHUNK * 2 + 13]).unwrap();

        copy_verify_move(&source, &target).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap().len(), COMPARE_CHUNK * 2 + 13);
        assert_eq!(fs::read_dir(to.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_copy_leaves_source_untouched() {
        let from = tempfile::tempdir().unwrap();
        let source = from.path().join("take.wav");
        fs::write(&source, b"audio").unwrap();
        let target = from.path().join("missing-dir").join("take.wav");

        assert!(copy_verify_move(&source, &target).is_err());
        assert_eq!(fs::read(&source).unwrap(), b"audio");
    }

    #[test]
    fn test_move_file_refuses_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.wav");
        let target = dir.path().join("b.wav");
        fs::write(&source, b"a").unwrap();
        fs::write(&target, b"b").unwrap();

        assert!(move_file(&source, &target).is_err());
        assert_eq!(fs::read(&source).unwrap(), b"a");
        assert_eq!(fs::read(&target).unwrap(), b"b");
    }

    #[test]
    fn test_files_identical_detects_difference() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"same length!").unwrap();
        fs::write(&b, b"same length?").unwrap();
        assert!(!files_identical(&a, &b).unwrap());
        fs::write(&b, b"same length!").unwrap();
        assert!(files_identical(&a, &b).unwrap());
    }

    #[test]
    fn test_sweep_removes_only_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".take.wav.partial"), b"x").unwrap();
        fs::write(dir.path().join("take.wav"), b"x").unwrap();

        assert_eq!(sweep_temp_files(dir.path()), 1);
        assert!(dir.path().join("take.wav").exists());
    }
}
