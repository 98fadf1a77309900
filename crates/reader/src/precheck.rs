//! Connectivity precondition check: verifies the backend's client capability
//! is present before any network call.

use std::collections::BTreeSet;

use sqf_common::{DialectId, Result, SqfError};

/// The client capability one backend requires, with an actionable hint.
#[derive(Debug, Clone, Copy)]
pub struct ClientRequirement {
    pub capability: &'static str,
    pub install_hint: &'static str,
}

/// The capability each backend needs before a connection can be attempted.
pub fn client_requirement(backend: DialectId) -> ClientRequirement {
    match backend {
        DialectId::Generic => ClientRequirement {
            capability: "generic-sql-client",
            install_hint: "Install the generic SQL client library for your database.",
        },
        DialectId::MySql => ClientRequirement {
            capability: "mysql-client",
            install_hint: "Install the MySQL client library (for example `apt install \
                           libmysqlclient-dev`).",
        },
        DialectId::Oracle => ClientRequirement {
            capability: "oracle-instant-client",
            install_hint: "Install Oracle Instant Client and make sure it is on the library \
                           search path.",
        },
        DialectId::Snowflake => ClientRequirement {
            capability: "snowflake-connector",
            install_hint: "Install the Snowflake connector package for your platform.",
        },
    }
}

/// Reports which client capabilities are present in this process.
pub trait CapabilityProbe: Send + Sync {
    fn is_available(&self, capability: &str) -> bool;
}

/// Probe backed by a fixed capability set.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    available: BTreeSet<String>,
}

impl StaticProbe {
    pub fn with(capabilities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            available: capabilities.into_iter().map(Into::into).collect(),
        }
    }
}

impl CapabilityProbe for StaticProbe {
    fn is_available(&self, capability: &str) -> bool {
        self.available.contains(capability)
    }
}

/// Fails fast with [`SqfError::MissingDependency`] when the backend's client
/// capability is absent. Runs once per read, synchronously, ahead of every
/// other step; never retries and never degrades to a different backend.
pub fn verify_client(backend: DialectId, probe: &dyn CapabilityProbe) -> Result<()> {
    let requirement = client_requirement(backend);
    if probe.is_available(requirement.capability) {
        Ok(())
    } else {
        Err(SqfError::MissingDependency {
            backend: backend.to_string(),
            capability: requirement.capability.to_string(),
            hint: requirement.install_hint.to_string(),
        })
    }
}
