//! rarefy_rs
//!
//! Interactive alpha-rarefaction charts: one curve per sample (or metadata
//! category value) of a diversity metric against sequencing depth, with a
//! legend whose line and dot toggles persist across metric and category
//! switches. Pairs with the `rarefy` CLI.
//!
//! ### Features
//! - Load a report from JSON (split orientation) or a single CSV/TSV table
//! - Stable per-series colors and visibility for the life of a session
//! - Keyed reconciliation: unchanged lines and markers keep their identity
//! - Legend with per-series line/dot swatches and a "Select All" entry
//! - SVG/PNG output via Plotters
//!
//! ### Example
//! ```no_run
//! use rarefy_rs::{ChartConfig, LegendTarget, Session};
//!
//! let report = rarefy_rs::storage::load_report("alpha-rarefaction.json")?;
//! let mut session = Session::new(report, ChartConfig::default())?;
//! session.click(&LegendTarget::Dots("S1".into()))?;
//! rarefy_rs::viz::write_chart(&session, "shannon.svg")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod legend;
pub mod models;
pub mod reconcile;
pub mod scale;
pub mod series;
pub mod session;
pub mod state;
pub mod storage;
pub mod viz;

pub use config::ChartConfig;
pub use error::{ChartError, ChartResult};
pub use legend::LegendTarget;
pub use models::{Dataset, Report};
pub use session::Session;
