// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::DispatchError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a compute device, e.g. `0` or `cuda:1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Result<Self, DispatchError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DispatchError::Configuration(
                "device identifier must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Ordered list of distinct devices. Position 0 receives the first partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceList {
    devices: Vec<DeviceId>,
}

impl DeviceList {
    /// Builds a device list, rejecting duplicated identifiers.
    pub fn new(devices: Vec<DeviceId>) -> Result<Self, DispatchError> {
        let mut seen = HashSet::with_capacity(devices.len());
        for device in &devices {
            if !seen.insert(device) {
                return Err(DispatchError::Configuration(format!(
                    "device '{}' appears more than once in the device list",
                    device
                )));
            }
        }
        Ok(Self { devices })
    }

    /// Parses each identifier and builds the list.
    pub fn parse<I, S>(ids: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let devices = ids
            .into_iter()
            .map(|id| id.as_ref().parse())
            .collect::<Result<Vec<DeviceId>, _>>()?;
        Self::new(devices)
    }

    /// Explicit "run on the host, no accelerator" request.
    pub fn host_only() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeviceId> {
        self.devices.iter()
    }
}

/// Where a replica runs: a listed device or the virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placement {
    Host,
    Device(DeviceId),
}

impl Placement {
    pub fn is_host(&self) -> bool {
        matches!(self, Placement::Host)
    }

    pub fn device(&self) -> Option<&DeviceId> {
        match self {
            Placement::Host => None,
            Placement::Device(id) => Some(id),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Host => f.write_str("host"),
            Placement::Device(id) => write!(f, "{}", id),
        }
    }
}
