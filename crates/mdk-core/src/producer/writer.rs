//! Destinations for produced artifacts

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::PackError;
use crate::result::Result;

/// Where artifacts end up
pub trait OutputWriter: Send + Sync {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Copy the file at `source` to `path`; returns its size in bytes
    fn copy(&self, source: &Path, path: &Path) -> Result<usize>;
}

/// Writes artifacts to disk, creating parent directories as needed
///
/// Each file is first written next to its target and then renamed over it,
/// so an interrupted run never leaves a truncated script behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemWriter;

impl OutputWriter for FileSystemWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| PackError::io_error(parent, e))?;
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| PackError::internal_error(format!("not a file path: {}", path.display())))?;
        let temporary = path.with_file_name(format!(".{file_name}.tmp"));

        fs::write(&temporary, bytes).map_err(|e| PackError::io_error(&temporary, e))?;
        if let Err(e) = fs::rename(&temporary, path) {
            let _ = fs::remove_file(&temporary);
            return Err(PackError::io_error(path, e));
        }
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn copy(&self, source: &Path, path: &Path) -> Result<usize> {
        let bytes = fs::read(source).map_err(|e| PackError::io_error(source, e))?;
        self.write(path, &bytes)?;
        Ok(bytes.len())
    }
}

/// Records what would be written without touching the file system
#[derive(Debug, Default)]
pub struct DryRunWriter {
    recorded: Mutex<Vec<(PathBuf, usize)>>,
}

impl DryRunWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths and sizes of every write so far
    pub fn recorded(&self) -> Vec<(PathBuf, usize)> {
        self.recorded
            .lock()
            .map(|recorded| recorded.clone())
            .unwrap_or_default()
    }
}

impl DryRunWriter {
    fn record(&self, path: &Path, bytes: usize) -> Result<()> {
        info!("[dry run] would write {} ({} bytes)", path.display(), bytes);
        self.recorded
            .lock()
            .map_err(|_| PackError::internal_error("dry run log poisoned"))?
            .push((path.to_path_buf(), bytes));
        Ok(())
    }
}

impl OutputWriter for DryRunWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.record(path, bytes.len())
    }

    /// Only looks at the source's metadata
    fn copy(&self, source: &Path, path: &Path) -> Result<usize> {
        let metadata = fs::metadata(source).map_err(|e| PackError::io_error(source, e))?;
        let bytes = usize::try_from(metadata.len())
            .map_err(|_| PackError::internal_error(format!("{} is too large", source.display())))?;
        self.record(path, bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_system_writer_creates_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("Demo").join("Script.cs");

        FileSystemWriter.write(&target, b"class Program { }").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "class Program { }");

        FileSystemWriter.write(&target, b"// replaced").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "// replaced");

        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_dry_run_writer_records_only() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Script.cs");
        let writer = DryRunWriter::new();

        writer.write(&target, b"12345").unwrap();
        assert_eq!(writer.recorded(), vec![(target.clone(), 5)]);
        assert!(!target.exists());
    }

    #[test]
    fn test_copies() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("thumb.png");
        fs::write(&source, [1u8, 2, 3]).unwrap();
        let target = dir.path().join("out").join("thumb.png");

        let writer = DryRunWriter::new();
        assert_eq!(writer.copy(&source, &target).unwrap(), 3);
        assert_eq!(writer.recorded(), vec![(target.clone(), 3)]);
        assert!(!target.exists());

        assert_eq!(FileSystemWriter.copy(&source, &target).unwrap(), 3);
        assert_eq!(fs::read(&target).unwrap(), vec![1, 2, 3]);
    }
}
