//! Validation-layer output routed into `tracing`.

use std::{ffi::CStr, sync::Arc};

use ash::vk;

use crate::{error::Result, instance::Instance, registry::ObjectId};

/// Target every forwarded validation message is logged under.
pub const DEBUG_MESSENGER_TARGET: &str = "rvk-debug-messenger";

/// Minimum severity level for Vulkan validation layer messages.
///
/// Messages at or above the chosen level are forwarded to the [`tracing`]
/// subscriber; lower-severity messages are suppressed. Variants are ordered
/// least-to-most severe: `Verbose < Info < Warning < Error`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum VulkanLogLevel {
    Verbose,
    Info,
    Warning,
    Error,
}

impl VulkanLogLevel {
    /// The severities a messenger at this level subscribes to.
    pub fn severity_mask(self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        type Severity = vk::DebugUtilsMessageSeverityFlagsEXT;
        match self {
            VulkanLogLevel::Verbose => {
                Severity::VERBOSE
                    | Severity::INFO
                    | Severity::WARNING
                    | Severity::ERROR
            }
            VulkanLogLevel::Info => {
                Severity::INFO | Severity::WARNING | Severity::ERROR
            }
            VulkanLogLevel::Warning => Severity::WARNING | Severity::ERROR,
            VulkanLogLevel::Error => Severity::ERROR,
        }
    }
}

unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let p_message = if p_callback_data.is_null() {
        std::ptr::null()
    } else {
        // SAFETY: non-null callback data is valid for the duration of the call
        unsafe { (*p_callback_data).p_message }
    };
    let message = if p_message.is_null() {
        "<no message>".into()
    } else {
        // SAFETY: non-null messages are NUL-terminated strings
        unsafe { CStr::from_ptr(p_message) }.to_string_lossy()
    };

    let type_str = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "GENERAL",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "VALIDATION",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "PERFORMANCE",
        _ => "UNKNOWN",
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
            tracing::trace!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", type_str, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            tracing::info!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", type_str, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            tracing::warn!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", type_str, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            tracing::error!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", type_str, message);
        }
        _ => {
            tracing::debug!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", type_str, message);
        }
    }

    vk::FALSE
}

/// A `VkDebugUtilsMessengerEXT` forwarding to [`vulkan_debug_callback`].
pub struct DebugMessenger {
    instance: Arc<Instance>,
    handle: vk::DebugUtilsMessengerEXT,
    id: ObjectId,
    level: VulkanLogLevel,
}

impl std::fmt::Debug for DebugMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugMessenger")
            .field("handle", &self.handle)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl DebugMessenger {
    pub(crate) fn new(
        instance: Arc<Instance>,
        handle: vk::DebugUtilsMessengerEXT,
        id: ObjectId,
        level: VulkanLogLevel,
    ) -> Self {
        Self {
            instance,
            handle,
            id,
            level,
        }
    }

    /// Create info for a messenger at `level`.
    ///
    /// Also usable chained into `VkInstanceCreateInfo` to capture messages
    /// emitted during instance creation and destruction.
    pub fn create_info(
        level: VulkanLogLevel,
    ) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
        vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(level.severity_mask())
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback))
    }

    pub fn raw_messenger(&self) -> vk::DebugUtilsMessengerEXT {
        self.handle
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn level(&self) -> VulkanLogLevel {
        self.level
    }

    /// # Safety
    /// Must not be destroyed while another thread may be emitting messages
    /// through it.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy = self
            .instance
            .table()
            .destroy_debug_utils_messenger_ext()
            .map_err(|err| self.instance.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying debug messenger {:?}", self.handle);
        // SAFETY: created from this instance; consumed so never used again.
        unsafe {
            destroy(self.instance.raw_instance(), self.handle, std::ptr::null())
        };
        self.instance.registry().release(self.id);
        Ok(())
    }
}
