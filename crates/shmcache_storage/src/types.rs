//! Segment identifiers and permission bits.

use std::fmt;

/// Identifier of a segment in a store.
///
/// Ids are plain non-negative integers with no meaning of their own.
/// Id `0` is never addressable (it is the "private key" value of the
/// System V IPC family that segment stores mimic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub u64);

impl SegmentId {
    /// Creates a new segment id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next id, saturating at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg:{}", self.0)
    }
}

/// Unix-style access mode bits attached to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permissions(u32);

impl Permissions {
    /// World readable and writable (`0o666`).
    pub const DEFAULT: Self = Self(0o666);

    /// Owner read/write only (`0o600`).
    pub const PRIVATE: Self = Self(0o600);

    /// Read-only for everyone (`0o444`).
    pub const READ_ONLY: Self = Self(0o444);

    /// Creates permissions from mode bits.
    ///
    /// Returns `None` if any bit outside `0o777` is set.
    #[must_use]
    pub const fn from_mode(mode: u32) -> Option<Self> {
        if mode & !0o777 == 0 {
            Some(Self(mode))
        } else {
            None
        }
    }

    /// Returns the raw mode bits.
    #[must_use]
    pub const fn mode(self) -> u32 {
        self.0
    }

    /// Returns true if the owner may read the segment.
    #[must_use]
    pub const fn owner_can_read(self) -> bool {
        self.0 & 0o400 != 0
    }

    /// Returns true if the owner may overwrite or remove the segment.
    #[must_use]
    pub const fn owner_can_write(self) -> bool {
        self.0 & 0o200 != 0
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#o}", self.0)
    }
}
