//! Mapping of native status codes.
//!
//! Vulkan reports every non-error outcome with a non-negative code and
//! every failure with a negative one. [`check`] keeps that split: failures
//! become [`Error::Vulkan`] with the code preserved, while successes are
//! returned as a [`Success`] so callers can branch on variants such as
//! `VK_NOT_READY` or `VK_SUBOPTIMAL_KHR`. Nothing here retries.

use ash::vk;

use crate::error::{Error, Result};

/// A non-error status returned by a native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Success(vk::Result);

impl Success {
    pub const COMPLETE: Success = Success(vk::Result::SUCCESS);

    pub fn code(self) -> vk::Result {
        self.0
    }

    /// Plain `VK_SUCCESS`.
    pub fn is_complete(self) -> bool {
        self.0 == vk::Result::SUCCESS
    }

    pub fn is_incomplete(self) -> bool {
        self.0 == vk::Result::INCOMPLETE
    }

    pub fn is_not_ready(self) -> bool {
        self.0 == vk::Result::NOT_READY
    }

    pub fn is_timeout(self) -> bool {
        self.0 == vk::Result::TIMEOUT
    }

    pub fn is_suboptimal(self) -> bool {
        self.0 == vk::Result::SUBOPTIMAL_KHR
    }

    pub fn is_event_set(self) -> bool {
        self.0 == vk::Result::EVENT_SET
    }
}

/// Split a native status into a success variant or a failure.
pub fn check(code: vk::Result) -> Result<Success> {
    if code.as_raw() >= 0 {
        Ok(Success(code))
    } else {
        Err(Error::Vulkan(code))
    }
}

/// [`check`] for calls whose success variants carry no information.
pub fn check_plain(code: vk::Result) -> Result<()> {
    check(code).map(|_| ())
}
