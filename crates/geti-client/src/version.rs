// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use std::{fmt, str::FromStr};

use crate::Error;

/// Version of the platform a session is connected to.
///
/// Versions are ordered by `(major, minor, patch, build)`; a version without
/// build number orders before the same version with one. The platform reports
/// versions such as `1.2.0-release-20220620123456`, where the trailing digits
/// are the build.
///
/// ```rust
/// use geti_client::{PlatformVersion, SC11_VERSION, SC12_VERSION};
///
/// let version: PlatformVersion = "1.2.0-release-20220620".parse().unwrap();
/// assert!(version >= SC12_VERSION);
/// assert!(version > SC11_VERSION);
/// assert_eq!(version.build(), Some(20220620));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformVersion {
    major: u32,
    minor: u32,
    patch: u32,
    build: Option<u64>,
}

/// First release with the 1.1 REST API.
pub const SC11_VERSION: PlatformVersion = PlatformVersion::new(1, 1, 0);
/// First release with the 1.2 REST API.
pub const SC12_VERSION: PlatformVersion = PlatformVersion::new(1, 2, 0);

impl PlatformVersion {
    /// Version used when the server does not report one.
    pub const UNKNOWN: PlatformVersion = PlatformVersion::new(0, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        PlatformVersion {
            major,
            minor,
            patch,
            build: None,
        }
    }

    pub const fn with_build(self, build: u64) -> Self {
        PlatformVersion {
            build: Some(build),
            ..self
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    pub fn build(&self) -> Option<u64> {
        self.build
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl Default for PlatformVersion {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl FromStr for PlatformVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);
        let (release, suffix) = match s.split_once('-') {
            Some((release, suffix)) => (release, Some(suffix)),
            None => (s, None),
        };

        let mut parts = release.split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidValue(format!("'{}' is not a version", s)))?
            .parse()?;
        let minor = parts.next().map(str::parse).transpose()?.unwrap_or(0);
        let patch = parts.next().map(str::parse).transpose()?.unwrap_or(0);
        if parts.next().is_some() {
            return Err(Error::InvalidValue(format!("'{}' is not a version", s)));
        }

        let build = suffix
            .and_then(|suffix| suffix.rsplit('-').next())
            .filter(|tail| !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()))
            .map(str::parse)
            .transpose()?;

        Ok(PlatformVersion {
            major,
            minor,
            patch,
            build,
        })
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(build) = self.build {
            write!(f, "-{}", build)?;
        }
        Ok(())
    }
}
