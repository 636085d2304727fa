//! Result types returned by the interface manager.

use crate::model::{Interface, InterfaceId, Ipblock};
use netinv_types::IpVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a non-fatal problem met during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A discovered scalar value could not be parsed.
    Field,
    /// Hardware address invalid or not storable.
    PhysAddr,
    /// A discovered VLAN entry was unusable.
    Vlan,
    /// The STP instance a VLAN maps to has not been synced yet.
    StpInstance,
    /// Subnet could not be inferred or stored.
    Subnet,
    /// Host address could not be stored.
    HostIp,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningKind::Field => "field",
            WarningKind::PhysAddr => "physaddr",
            WarningKind::Vlan => "vlan",
            WarningKind::StpInstance => "stp_instance",
            WarningKind::Subnet => "subnet",
            WarningKind::HostIp => "host_ip",
        };
        f.write_str(s)
    }
}

/// A sub-item that was skipped while the surrounding operation went on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWarning {
    pub kind: WarningKind,
    /// The item concerned (address, vid, field name, ...).
    pub subject: String,
    pub message: String,
}

impl SyncWarning {
    pub fn new(kind: WarningKind, subject: impl Into<String>, message: impl ToString) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.subject, self.message)
    }
}

/// Outcome of resolving one discovered address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpResolution {
    /// The host record, `None` for loopbacks or when it could not be stored.
    pub ipblock: Option<Ipblock>,
    /// The subnet the address was placed in, if one was inferred.
    pub subnet: Option<Ipblock>,
    pub ipv4_changed: bool,
    pub ipv6_changed: bool,
    pub warnings: Vec<SyncWarning>,
}

impl IpResolution {
    pub(crate) fn mark_changed(&mut self, version: IpVersion) {
        match version {
            IpVersion::V4 => self.ipv4_changed = true,
            IpVersion::V6 => self.ipv6_changed = true,
        }
    }
}

/// Outcome of reconciling one interface against discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub interface: Interface,
    /// An IPv4 block was created; the v4 address tree needs rebuilding.
    pub ipv4_changed: bool,
    /// An IPv6 block was created; the v6 address tree needs rebuilding.
    pub ipv6_changed: bool,
    pub warnings: Vec<SyncWarning>,
}

impl ReconcileOutcome {
    pub(crate) fn absorb(&mut self, resolution: IpResolution) {
        self.ipv4_changed |= resolution.ipv4_changed;
        self.ipv6_changed |= resolution.ipv6_changed;
        self.warnings.extend(resolution.warnings);
    }
}

/// An interface whose reconciliation failed outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub interface: InterfaceId,
    pub error: String,
}

/// Aggregate result of reconciling a device's interfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<ReconcileOutcome>,
    pub failures: Vec<BatchFailure>,
    pub ipv4_changed: bool,
    pub ipv6_changed: bool,
}

impl BatchReport {
    pub fn warning_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.warnings.len()).sum()
    }

    /// True when every interface reconciled without warnings.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.warning_count() == 0
    }

    pub(crate) fn record(&mut self, outcome: ReconcileOutcome) {
        self.ipv4_changed |= outcome.ipv4_changed;
        self.ipv6_changed |= outcome.ipv6_changed;
        self.outcomes.push(outcome);
    }
}
