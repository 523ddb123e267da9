//! The instance scope: physical device discovery and instance-level
//! children (surfaces and debug messengers).
//!
//! [`VkVersion`] is a thin newtype over the packed Vulkan version word.

use std::{ffi::CStr, fmt::Debug, sync::Arc};

use ash::vk;

use crate::{
    dispatch::InstanceTable,
    entry::Entry,
    enumerate::enumerate,
    error::{Result, StillInUse},
    log::{DebugMessenger, VulkanLogLevel},
    physical_device::PhysicalDevice,
    registry::{ObjectId, ObjectRegistry},
    result,
    surface::Surface,
};

/// A packed Vulkan API version number.
///
/// Wraps the 32-bit encoding used by `VkApplicationInfo` and
/// `vkEnumerateInstanceVersion`. Construct from components with
/// [`new`](Self::new), or wrap an already-encoded word with
/// [`from_raw`](Self::from_raw).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VkVersion(u32);

impl VkVersion {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn new(variant: u32, major: u32, minor: u32, patch: u32) -> Self {
        Self(vk::make_api_version(variant, major, minor, patch))
    }

    pub fn variant(&self) -> u32 {
        vk::api_version_variant(self.0)
    }

    pub fn major(&self) -> u32 {
        vk::api_version_major(self.0)
    }
    pub fn minor(&self) -> u32 {
        vk::api_version_minor(self.0)
    }
    pub fn patch(&self) -> u32 {
        vk::api_version_patch(self.0)
    }

    pub fn to_raw(&self) -> u32 {
        self.0
    }
}

impl Debug for VkVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

impl std::fmt::Display for VkVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// A live `VkInstance` and its dispatch table.
///
/// Everything derived from an instance holds an `Arc<Instance>`, so the
/// instance cannot be destroyed while a physical device, surface or debug
/// messenger value is still around.
pub struct Instance {
    entry: Arc<Entry>,
    handle: vk::Instance,
    table: Arc<InstanceTable>,
    id: ObjectId,
    api_version: VkVersion,
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl Instance {
    pub(crate) fn new(
        entry: Arc<Entry>,
        handle: vk::Instance,
        table: Arc<InstanceTable>,
        id: ObjectId,
        api_version: VkVersion,
    ) -> Self {
        Self {
            entry,
            handle,
            table,
            id,
            api_version,
        }
    }

    pub fn raw_instance(&self) -> vk::Instance {
        self.handle
    }

    pub fn table(&self) -> &InstanceTable {
        &self.table
    }

    pub fn entry(&self) -> &Arc<Entry> {
        &self.entry
    }

    pub fn registry(&self) -> &ObjectRegistry {
        self.entry.registry()
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The API version requested at creation.
    pub fn api_version(&self) -> VkVersion {
        self.api_version
    }

    /// Look up a command on this instance.
    pub fn get_instance_proc_addr(&self, name: &CStr) -> vk::PFN_vkVoidFunction {
        // SAFETY: the entry's resolver created this instance and `name` is
        // NUL-terminated.
        unsafe {
            (self.entry.raw_get_instance_proc_addr())(self.handle, name.as_ptr())
        }
    }

    pub fn enumerate_physical_devices(
        self: &Arc<Self>,
    ) -> Result<Vec<PhysicalDevice>> {
        let enumerate_physical_devices =
            self.table.enumerate_physical_devices()?;
        let handles = enumerate(self.entry.config().enumeration, |count, data| {
            // SAFETY: live instance; the enumerator hands out a valid count
            // and buffer.
            unsafe { enumerate_physical_devices(self.handle, count, data) }
        })?;

        Ok(handles
            .into_iter()
            .map(|handle| {
                let id = self.registry().retrieve(handle, self.id, self.id);
                PhysicalDevice::new(Arc::clone(self), handle, id)
            })
            .collect())
    }

    pub fn enumerate_physical_device_groups(
        &self,
    ) -> Result<Vec<vk::PhysicalDeviceGroupProperties<'static>>> {
        let enumerate_groups = self.table.enumerate_physical_device_groups()?;
        enumerate(self.entry.config().enumeration, |count, data| {
            // SAFETY: live instance; the enumerator hands out a valid count
            // and a buffer of default (sType-initialised) elements.
            unsafe { enumerate_groups(self.handle, count, data) }
        })
    }

    /// Create a surface with no window behind it.
    ///
    /// # Safety
    /// `VK_EXT_headless_surface` must be enabled on this instance.
    pub unsafe fn create_headless_surface(self: &Arc<Self>) -> Result<Surface> {
        let create_headless_surface =
            self.table.create_headless_surface_ext()?;
        let create_info = vk::HeadlessSurfaceCreateInfoEXT::default();
        let mut handle = vk::SurfaceKHR::null();
        // SAFETY: live instance, valid create info, output is a live local.
        result::check(unsafe {
            create_headless_surface(
                self.handle,
                &create_info,
                std::ptr::null(),
                &mut handle,
            )
        })?;

        let id = self.registry().register(handle, self.id, self.id);
        tracing::debug!("Created surface {:?} as {id}", handle);
        Ok(Surface::new(Arc::clone(self), handle, id))
    }

    /// Route validation messages at or above `level` into `tracing`.
    ///
    /// # Safety
    /// `VK_EXT_debug_utils` must be enabled on this instance.
    pub unsafe fn create_debug_messenger(
        self: &Arc<Self>,
        level: VulkanLogLevel,
    ) -> Result<DebugMessenger> {
        let create_messenger = self.table.create_debug_utils_messenger_ext()?;
        let create_info = DebugMessenger::create_info(level);
        let mut handle = vk::DebugUtilsMessengerEXT::null();
        // SAFETY: live instance, valid create info, output is a live local.
        result::check(unsafe {
            create_messenger(
                self.handle,
                &create_info,
                std::ptr::null(),
                &mut handle,
            )
        })?;

        let id = self.registry().register(handle, self.id, self.id);
        tracing::debug!("Created debug messenger {:?} as {id}", handle);
        Ok(DebugMessenger::new(Arc::clone(self), handle, id, level))
    }

    /// Destroy the instance.
    ///
    /// Refused while any other `Arc<Instance>` exists, which includes every
    /// physical device, surface and debug messenger made from it.
    ///
    /// # Safety
    /// No work submitted through devices of this instance may still be
    /// executing.
    pub unsafe fn destroy(self: Arc<Self>) -> Result<(), StillInUse<Self>> {
        let instance = Arc::try_unwrap(self).map_err(StillInUse)?;
        tracing::debug!("Destroying instance {:?}", instance.handle);
        match instance.table.destroy_instance() {
            // SAFETY: sole owner, no children left, caller guarantees idle.
            Ok(destroy_instance) => unsafe {
                destroy_instance(instance.handle, std::ptr::null())
            },
            Err(err) => tracing::error!("Leaking instance: {err}"),
        }
        instance.registry().release(instance.id);
        Ok(())
    }
}
