//! The error taxonomy shared by every wrapped call.
//!
//! [`Error`] covers what can go wrong inside a single operation: an entry
//! point the driver never exposed, a native failure code, an enumeration
//! that kept growing, or a batch free handed foreign objects. Loader
//! failures live in [`LoadError`](crate::entry::LoadError) since they
//! happen before any table exists.
//!
//! Use-after-destroy is deliberately absent: the native layer gives no
//! detectable behaviour for it, so it stays a documented precondition.

use std::{ffi::CStr, fmt, sync::Arc};

use ash::vk;
use thiserror::Error;

use crate::registry::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{} is not exposed by the loaded driver", .0.to_string_lossy())]
    Unsupported(&'static CStr),
    #[error("Vulkan error: {0}")]
    Vulkan(vk::Result),
    #[error("Enumeration did not settle after {attempts} count/fill attempts")]
    EnumerationDidNotConverge { attempts: u32 },
    #[error("Object {object} was not allocated from {owner}")]
    NotOwnedBy { object: ObjectId, owner: ObjectId },
}

impl Error {
    /// The native result code, when the failure came from the driver.
    pub fn vk_result(&self) -> Option<vk::Result> {
        match self {
            Error::Vulkan(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<vk::Result> for Error {
    fn from(value: vk::Result) -> Self {
        Error::Vulkan(value)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returned by `destroy` on a scope container that still has other owners.
///
/// Holds the `Arc` that was passed in so the caller can retry once the
/// remaining children are gone.
pub struct StillInUse<T>(pub Arc<T>);

impl<T> StillInUse<T> {
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T> fmt::Debug for StillInUse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StillInUse")
            .field(&std::any::type_name::<T>())
            .field(&Arc::strong_count(&self.0))
            .finish()
    }
}

impl<T> fmt::Display for StillInUse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} still has {} other live reference(s)",
            std::any::type_name::<T>(),
            Arc::strong_count(&self.0) - 1
        )
    }
}

impl<T> std::error::Error for StillInUse<T> {}

/// Returned by a batch free that did not go through.
///
/// Nothing in the batch was freed. `objects` holds every value that was
/// passed in, in order, so the caller can sort out the offending ones and
/// free the rest.
pub struct NotFreed<T> {
    pub error: Error,
    pub objects: Vec<T>,
}

impl<T> NotFreed<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.objects
    }
}

impl<T> fmt::Debug for NotFreed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotFreed")
            .field("error", &self.error)
            .field("objects", &self.objects.len())
            .finish()
    }
}

impl<T> fmt::Display for NotFreed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; {} object(s) handed back unfreed",
            self.error,
            self.objects.len()
        )
    }
}

impl<T> std::error::Error for NotFreed<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
