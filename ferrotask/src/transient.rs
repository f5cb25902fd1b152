//! Short-lived files holding inventories built at run time.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::inventory::Inventory;

/// Write `content` to a new temporary file that outlives its handle.
///
/// Text and raw bytes are written unchanged. The caller owns the returned
/// path and is responsible for removing it.
pub fn write_tmp_file(content: impl AsRef<[u8]>) -> io::Result<PathBuf> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_ref())?;
    file.flush()?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

/// A hosts file on disk that is deleted when dropped.
#[derive(Debug)]
pub struct TransientInventory {
    path: PathBuf,
    removed: bool,
}

impl TransientInventory {
    /// Serialize `inventory` into a fresh temporary hosts file.
    pub fn write(inventory: &Inventory) -> Result<Self> {
        let path = write_tmp_file(inventory.to_json()?)?;
        debug!("Wrote transient inventory {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the inventory back from disk.
    pub fn load(&self) -> Result<Inventory> {
        Inventory::from_path(&self.path)
    }

    /// Delete the file now, reporting failures.
    pub fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        std::fs::remove_file(&self.path)
    }
}

impl Drop for TransientInventory {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove transient inventory {}: {}", self.path.display(), e);
        }
    }
}
