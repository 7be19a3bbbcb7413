use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default permission mode for created FIFOs.
pub const DEFAULT_FIFO_MODE: u32 = 0o660;

/// Create a named pipe at `path` unless one is already there.
///
/// Returns `true` if a FIFO was created, `false` if an existing FIFO is
/// reused. An existing path that is not a FIFO is never replaced.
pub fn create_fifo(path: impl AsRef<Path>, mode: u32) -> Result<bool> {
    let path = path.as_ref();

    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_fifo() => {
            debug!(?path, "reusing existing fifo");
            return Ok(false);
        }
        Ok(_) => {
            return Err(TransportError::CreateFifo {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a fifo",
                ),
            });
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(TransportError::CreateFifo {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    let c_path =
        CString::new(path.as_os_str().as_bytes()).map_err(|_| TransportError::CreateFifo {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path contains an interior NUL byte",
            ),
        })?;

    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), mode as libc::mode_t) };
    if rc != 0 {
        return Err(TransportError::CreateFifo {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }

    info!(?path, "created fifo");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simulator");

        assert!(create_fifo(&path, DEFAULT_FIFO_MODE).unwrap());
        let metadata = std::fs::symlink_metadata(&path).unwrap();
        assert!(metadata.file_type().is_fifo());

        assert!(!create_fifo(&path, DEFAULT_FIFO_MODE).unwrap());
    }

    #[test]
    fn refuses_existing_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-fifo");
        std::fs::write(&path, b"regular-file").unwrap();

        let result = create_fifo(&path, DEFAULT_FIFO_MODE);
        assert!(matches!(result, Err(TransportError::CreateFifo { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), b"regular-file");
    }

    #[test]
    fn missing_parent_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("fifo");

        let result = create_fifo(&path, DEFAULT_FIFO_MODE);
        assert!(matches!(result, Err(TransportError::CreateFifo { .. })));
    }
}
