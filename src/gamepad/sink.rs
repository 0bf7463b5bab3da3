//! HID transmit sinks: where encoded reports go after `SendState`.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::layout::Report;

/// Receives every published report. Invoked synchronously from `SendState`,
/// so implementations must not block for long.
pub trait HidSink: Send + 'static {
    fn send_report(&mut self, report: &Report) -> io::Result<()>;
}

/// Sink selection as it appears in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Reports are only logged
    #[default]
    Log,
    /// Reports are written to a USB gadget HID function such as `/dev/hidg0`
    Hidg { path: PathBuf },
}

impl SinkConfig {
    pub fn build(&self) -> io::Result<Box<dyn HidSink>> {
        match self {
            SinkConfig::Log => Ok(Box::new(TracingSink)),
            SinkConfig::Hidg { path } => Ok(Box::new(HidgSink::open(path)?)),
        }
    }
}

/// Logs each report at debug level and drops it
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl HidSink for TracingSink {
    fn send_report(&mut self, report: &Report) -> io::Result<()> {
        debug!("HID report {}", report);
        Ok(())
    }
}

/// Writes `[report_id, payload..]` to a HID gadget character device
#[derive(Debug)]
pub struct HidgSink {
    path: PathBuf,
    file: File,
}

impl HidgSink {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().write(true).open(&path)?;
        info!("Writing HID reports to {}", path.display());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HidSink for HidgSink {
    fn send_report(&mut self, report: &Report) -> io::Result<()> {
        // One write per report, the gadget driver treats each write as one transfer
        self.file.write_all(&report.to_wire())
    }
}

/// Keeps every report in memory; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        match self.reports.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl HidSink for RecordingSink {
    fn send_report(&mut self, report: &Report) -> io::Result<()> {
        match self.reports.lock() {
            Ok(mut guard) => guard.push(report.clone()),
            Err(poisoned) => poisoned.into_inner().push(report.clone()),
        }
        Ok(())
    }
}
