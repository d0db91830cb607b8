use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{MnemoError, Result};
use crate::repository::Repository;
use crate::vfs::{FileSystem, PhysicalFileSystem};

use super::Memory;

/// Handle to a background scan ("think").
///
/// The scan runs on one dedicated thread and parses every document of the
/// repository. `get` blocks until it finishes and yields the populated
/// collection. There is no cancellation: dropping the task detaches the
/// thread and the work still completes, its result is simply discarded.
pub struct ScanTask {
    handle: JoinHandle<Result<Memory>>,
}

impl ScanTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the scan completes.
    pub fn get(self) -> Result<Memory> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(MnemoError::ScanFailed(
                "scan thread panicked".to_string(),
            )),
        }
    }
}

impl Memory {
    /// Scan and parse the repository on a background thread.
    pub fn think(repository: Repository) -> ScanTask {
        Self::think_with(repository, Arc::new(PhysicalFileSystem))
    }

    pub fn think_with(repository: Repository, fs: Arc<dyn FileSystem>) -> ScanTask {
        ScanTask {
            handle: thread::spawn(move || Memory::learn_with(repository, fs)),
        }
    }
}
