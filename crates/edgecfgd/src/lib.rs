//! Fabric-edge configuration daemon
//!
//! Keeps a BGP/EVPN edge node in line with its intent: VRF devices in the
//! kernel, an FRR configuration rendered from the intent, and a reload of the
//! running daemon, repeated on a fixed interval.

pub mod commands;
pub mod config;
pub mod daemon;
pub mod error;
pub mod reload;
pub mod render;
pub mod table_alloc;
pub mod vrf_mgr;
pub mod writer;

pub use config::{load_intent, DaemonConfig, TableIdMode};
pub use daemon::{EdgeDaemon, PassReport};
pub use error::{EdgeError, Result};
pub use reload::ReloadInvoker;
pub use render::{render, VrfStanzaStyle};
pub use table_alloc::TableAllocator;
pub use vrf_mgr::{ReconcileSummary, TableSource, VrfReconciler};
pub use writer::ConfigWriter;
