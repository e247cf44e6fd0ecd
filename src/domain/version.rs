use std::fmt;

/// Semantic contract version. On-chain the `version` method reports the
/// packed integer form `major*1_000_000 + minor*1_000 + patch`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContractVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ContractVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    pub fn from_packed(value: u64) -> Self {
        Self {
            major: (value / 1_000_000) as u32,
            minor: (value / 1_000 % 1_000) as u32,
            patch: (value % 1_000) as u32,
        }
    }

    pub fn to_packed(self) -> u64 {
        u64::from(self.major) * 1_000_000 + u64::from(self.minor) * 1_000 + u64::from(self.patch)
    }
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
