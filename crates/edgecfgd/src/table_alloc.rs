//! VRF routing table allocator
//!
//! Hands out kernel routing table ids from a dedicated pool, keyed by VRF
//! name. The name to id map is written to disk after every allocation so a
//! restarted daemon gives each VRF the same table again.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use edge_cfgmgr_common::{CfgMgrError, CfgMgrResult};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// First table id of the pool.
pub const VRF_TABLE_START: u32 = 1001;

/// End of the pool (exclusive).
pub const VRF_TABLE_END: u32 = 2000;

/// Persistent VRF name to routing table id allocator
#[derive(Debug)]
pub struct TableAllocator {
    /// VRF name -> routing table ID mapping
    vrf_table_map: BTreeMap<String, u32>,

    /// Available routing table IDs
    free_tables: BTreeSet<u32>,

    /// Where the mapping is persisted; `None` keeps it in memory only
    path: Option<PathBuf>,
}

impl TableAllocator {
    /// Create an allocator that is never persisted
    pub fn in_memory() -> Self {
        Self::from_map(BTreeMap::new(), None)
    }

    /// Load the mapping from `path`, starting empty if the file is absent
    pub fn load(path: impl Into<PathBuf>) -> CfgMgrResult<Self> {
        let path = path.into();
        let map = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<BTreeMap<String, u32>>(&content).map_err(|e| {
                CfgMgrError::invalid_config(
                    path.display().to_string(),
                    format!("corrupt table map: {}", e),
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(CfgMgrError::io(path, e)),
        };

        info!(
            "Loaded {} VRF table assignments from {}",
            map.len(),
            path.display()
        );
        Ok(Self::from_map(map, Some(path)))
    }

    fn from_map(vrf_table_map: BTreeMap<String, u32>, path: Option<PathBuf>) -> Self {
        let used: BTreeSet<u32> = vrf_table_map.values().copied().collect();
        let free_tables = (VRF_TABLE_START..VRF_TABLE_END)
            .filter(|id| !used.contains(id))
            .collect();

        Self {
            vrf_table_map,
            free_tables,
            path,
        }
    }

    /// Table id already assigned to `vrf_name`, if any
    pub fn get(&self, vrf_name: &str) -> Option<u32> {
        self.vrf_table_map.get(vrf_name).copied()
    }

    /// Return the table id for `vrf_name`, allocating and persisting a new
    /// one on first use
    pub fn get_or_allocate(&mut self, vrf_name: &str) -> CfgMgrResult<u32> {
        if let Some(table_id) = self.get(vrf_name) {
            return Ok(table_id);
        }

        let table_id = self
            .free_tables
            .pop_first()
            .ok_or_else(|| CfgMgrError::internal("No free routing tables available"))?;
        self.vrf_table_map.insert(vrf_name.to_string(), table_id);
        debug!("Allocated routing table ID {} to VRF {}", table_id, vrf_name);

        if let Err(e) = self.persist() {
            // Keep memory and disk in agreement: an unpersisted id could be
            // handed to another VRF after a restart.
            self.vrf_table_map.remove(vrf_name);
            self.free_tables.insert(table_id);
            return Err(e);
        }

        Ok(table_id)
    }

    /// Number of ids still available
    pub fn free_count(&self) -> usize {
        self.free_tables.len()
    }

    fn persist(&self) -> CfgMgrResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_string_pretty(&self.vrf_table_map)
            .map_err(|e| CfgMgrError::internal(format!("serialize table map: {}", e)))?;
        write_atomic(path, content.as_bytes()).map_err(|e| CfgMgrError::io(path, e))
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_allocation_is_stable_per_name() {
        let mut alloc = TableAllocator::in_memory();
        let hedge = alloc.get_or_allocate("hedge").unwrap();
        let hog = alloc.get_or_allocate("hog").unwrap();

        assert_eq!(hedge, VRF_TABLE_START);
        assert_eq!(hog, VRF_TABLE_START + 1);
        assert_eq!(alloc.get_or_allocate("hedge").unwrap(), hedge);
    }

    #[test]
    fn test_table_exhaustion() {
        let mut alloc = TableAllocator::in_memory();
        for i in VRF_TABLE_START..VRF_TABLE_END {
            alloc.get_or_allocate(&format!("vrf{}", i)).unwrap();
        }

        assert_eq!(alloc.free_count(), 0);
        assert!(matches!(
            alloc.get_or_allocate("one-too-many"),
            Err(CfgMgrError::Internal { .. })
        ));
    }

    #[test]
    fn test_mapping_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("vrf-tables.json");

        let mut alloc = TableAllocator::load(&path).unwrap();
        alloc.get_or_allocate("hedge").unwrap();
        alloc.get_or_allocate("hog").unwrap();
        drop(alloc);

        let mut reloaded = TableAllocator::load(&path).unwrap();
        assert_eq!(reloaded.get("hog"), Some(VRF_TABLE_START + 1));
        // New names skip ids already taken on disk
        assert_eq!(
            reloaded.get_or_allocate("pig").unwrap(),
            VRF_TABLE_START + 2
        );
    }

    #[test]
    fn test_corrupt_map_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vrf-tables.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            TableAllocator::load(&path),
            Err(CfgMgrError::InvalidConfig { .. })
        ));
    }
}
