//! Loader configuration.
//!
//! [`EntryConfig`] is handed to [`Entry::load_with`](crate::entry::Entry::load_with)
//! and copied into every scope container created below it.

use std::{
    ffi::OsStr,
    num::NonZeroU32,
    path::{Path, PathBuf},
};

#[cfg(windows)]
pub const DEFAULT_LIBRARY_NAME: &str = "vulkan-1.dll";
#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
pub const DEFAULT_LIBRARY_NAME: &str = "libvulkan.so.1";
#[cfg(target_os = "android")]
pub const DEFAULT_LIBRARY_NAME: &str = "libvulkan.so";
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const DEFAULT_LIBRARY_NAME: &str = "libvulkan.dylib";

/// Bound on the count/fill retry loop of the two-call protocol.
///
/// Each attempt is one count call followed by one fill call. The driver
/// only asks for another attempt with `VK_INCOMPLETE`, which means the set
/// grew in between; a handful of attempts is plenty in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumerationPolicy {
    pub max_attempts: NonZeroU32,
}

impl EnumerationPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: NonZeroU32 = NonZeroU32::new(8).unwrap();

    pub fn new(max_attempts: NonZeroU32) -> Self {
        Self { max_attempts }
    }
}

impl Default for EnumerationPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntryConfig {
    /// Loader library to open. `None` uses [`DEFAULT_LIBRARY_NAME`] and the
    /// platform's library search path.
    pub library_path: Option<PathBuf>,
    pub enumeration: EnumerationPolicy,
}

impl EntryConfig {
    pub fn library(&self) -> &OsStr {
        self.library_path
            .as_deref()
            .map(Path::as_os_str)
            .unwrap_or_else(|| OsStr::new(DEFAULT_LIBRARY_NAME))
    }
}
