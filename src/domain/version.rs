//! Dotted content versions

use std::fmt;
use std::str::FromStr;

/// A three-component version such as `6.5.0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Lowest version, used when `fromversion` is absent
    pub const MIN: Version = Version::new(0, 0, 0);
    /// Highest version, used when `toversion` is absent
    pub const MAX: Version = Version::new(99, 99, 99);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Strict pack version: exactly three components, each below 100
    pub fn parse_pack_version(s: &str) -> Option<Version> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let n: u32 = part.parse().ok()?;
            if n >= 100 {
                return None;
            }
            *slot = n;
        }
        Some(Version::new(nums[0], nums[1], nums[2]))
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::MIN
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Lenient parse: accepts `6`, `6.5` and `6.5.0`, missing components are zero
impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split('.').collect();
        if trimmed.is_empty() || parts.len() > 3 {
            return Err(format!("invalid version '{s}'"));
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid version '{s}'"))?;
        }
        Ok(Version::new(nums[0], nums[1], nums[2]))
    }
}
