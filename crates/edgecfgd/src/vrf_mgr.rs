//! VRF reconciler - brings kernel VRF devices in line with the intent

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;

use edge_cfgmgr_common::{CfgMgrError, CfgMgrResult, CommandExecutor};
use edge_types::{GlobalIntent, IpPrefix, Vrf};
use tracing::{debug, info, instrument};

use crate::commands::*;
use crate::error::{EdgeError, Result};
use crate::table_alloc::TableAllocator;

/// Where VRF routing table ids come from
#[derive(Debug)]
pub enum TableSource {
    /// The VRF's VNI is used as its table id
    Vni,
    /// Ids are handed out by a persisted allocator
    Allocated(TableAllocator),
}

impl TableSource {
    fn table_for(&mut self, vrf: &Vrf) -> CfgMgrResult<u32> {
        match self {
            TableSource::Vni => Ok(vrf.vni),
            TableSource::Allocated(alloc) => alloc.get_or_allocate(&vrf.name),
        }
    }
}

/// What a successful pass changed on the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// VRF devices created during the pass
    pub created: Vec<String>,
    /// Number of addresses assigned
    pub addresses_added: usize,
    /// Number of stale addresses removed
    pub addresses_removed: usize,
}

/// VRF Reconciler
///
/// Walks the intent's VRFs in declaration order. For each one it makes sure
/// the VRF device exists and is up, then diffs the device's IPv4 addresses
/// against the router-id of the router scoped to that VRF.
///
/// The first failing command stops the pass; VRFs already handled are left
/// as they are and the next pass starts over from the first VRF.
pub struct VrfReconciler {
    executor: Arc<dyn CommandExecutor>,
    tables: TableSource,
    prefix_len: u8,
}

impl VrfReconciler {
    /// Create a new reconciler
    pub fn new(executor: Arc<dyn CommandExecutor>, tables: TableSource, prefix_len: u8) -> Self {
        Self {
            executor,
            tables,
            prefix_len,
        }
    }

    /// Reconcile every VRF in `intent`
    #[instrument(skip_all, fields(vrfs = intent.vrfs.len()))]
    pub async fn reconcile(&mut self, intent: &GlobalIntent) -> Result<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();

        for vrf in &intent.vrfs {
            let router_id = intent.router_for_vrf(&vrf.name).map(|r| r.router_id);
            self.reconcile_vrf(vrf, router_id.map(IpAddr::V4), &mut summary)
                .await
                .map_err(|source| EdgeError::Reconcile {
                    vrf: vrf.name.clone(),
                    source,
                })?;
        }

        info!(
            "Reconciled {} VRFs ({} created, {} addresses added, {} removed)",
            intent.vrfs.len(),
            summary.created.len(),
            summary.addresses_added,
            summary.addresses_removed
        );
        Ok(summary)
    }

    #[instrument(skip(self, vrf, summary), fields(vrf = %vrf.name))]
    async fn reconcile_vrf(
        &mut self,
        vrf: &Vrf,
        router_id: Option<IpAddr>,
        summary: &mut ReconcileSummary,
    ) -> CfgMgrResult<()> {
        if self.link_exists(&vrf.name).await? {
            debug!("VRF {} already exists, bringing it up", vrf.name);
        } else {
            let table_id = self.tables.table_for(vrf)?;
            self.executor
                .exec_or_throw(&build_add_vrf_cmd(&vrf.name, table_id))
                .await?;
            info!("Created VRF {} with table ID {}", vrf.name, table_id);
            summary.created.push(vrf.name.clone());
        }

        self.executor
            .exec_or_throw(&build_set_vrf_up_cmd(&vrf.name))
            .await?;

        let target = match router_id {
            Some(addr) => Some(IpPrefix::new(addr, self.prefix_len).map_err(|e| {
                CfgMgrError::invalid_config("address_prefix_len", e.to_string())
            })?),
            None => None,
        };
        self.sync_addresses(&vrf.name, target, summary).await
    }

    /// A link exists when the query succeeds and actually names it
    async fn link_exists(&self, vrf_name: &str) -> CfgMgrResult<bool> {
        let result = self.executor.exec(&build_show_link_cmd(vrf_name)).await?;
        Ok(result.success() && result.stdout.contains(vrf_name))
    }

    /// Add the target address if missing, then drop everything else
    async fn sync_addresses(
        &self,
        vrf_name: &str,
        target: Option<IpPrefix>,
        summary: &mut ReconcileSummary,
    ) -> CfgMgrResult<()> {
        let output = self
            .executor
            .exec_or_throw(&build_show_addr_cmd(vrf_name))
            .await?;
        let current: BTreeSet<IpPrefix> = parse_ipv4_addrs(&output).into_iter().collect();

        // Deletes precede the add; removing a primary also drops its
        // same-subnet secondaries.
        for stale in current.iter().filter(|a| Some(*a) != target.as_ref()) {
            self.executor
                .exec_or_throw(&build_del_addr_cmd(vrf_name, stale))
                .await?;
            info!("Removed stale address {} from VRF {}", stale, vrf_name);
            summary.addresses_removed += 1;
        }

        if let Some(addr) = &target {
            if !current.contains(addr) {
                self.executor
                    .exec_or_throw(&build_add_addr_cmd(vrf_name, addr))
                    .await?;
                info!("Assigned {} to VRF {}", addr, vrf_name);
                summary.addresses_added += 1;
            }
        }

        Ok(())
    }
}
