//! Physical devices: capability queries and logical device creation.

use std::{ffi::CStr, sync::Arc};

use ash::vk;

use crate::{
    device::Device,
    dispatch::DeviceTable,
    enumerate::{enumerate, enumerate_unchecked},
    error::Result,
    instance::Instance,
    registry::ObjectId,
    result,
    surface::Surface,
};

/// A `VkPhysicalDevice` handed out by
/// [`Instance::enumerate_physical_devices`].
///
/// Physical devices are never destroyed; their record goes away with the
/// instance. Cloning is cheap and yields the same registry entry.
#[derive(Clone)]
pub struct PhysicalDevice {
    instance: Arc<Instance>,
    handle: vk::PhysicalDevice,
    id: ObjectId,
}

impl std::fmt::Debug for PhysicalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDevice")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl PhysicalDevice {
    pub(crate) fn new(
        instance: Arc<Instance>,
        handle: vk::PhysicalDevice,
        id: ObjectId,
    ) -> Self {
        Self {
            instance,
            handle,
            id,
        }
    }

    pub fn raw_physical_device(&self) -> vk::PhysicalDevice {
        self.handle
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn properties(&self) -> Result<vk::PhysicalDeviceProperties> {
        let get_properties =
            self.instance.table().get_physical_device_properties()?;
        let mut properties = vk::PhysicalDeviceProperties::default();
        // SAFETY: live physical device; output is a live local.
        unsafe { get_properties(self.handle, &mut properties) };
        Ok(properties)
    }

    pub fn features(&self) -> Result<vk::PhysicalDeviceFeatures> {
        let get_features = self.instance.table().get_physical_device_features()?;
        let mut features = vk::PhysicalDeviceFeatures::default();
        // SAFETY: live physical device; output is a live local.
        unsafe { get_features(self.handle, &mut features) };
        Ok(features)
    }

    pub fn memory_properties(
        &self,
    ) -> Result<vk::PhysicalDeviceMemoryProperties> {
        let get_memory_properties =
            self.instance.table().get_physical_device_memory_properties()?;
        let mut properties = vk::PhysicalDeviceMemoryProperties::default();
        // SAFETY: live physical device; output is a live local.
        unsafe { get_memory_properties(self.handle, &mut properties) };
        Ok(properties)
    }

    pub fn format_properties(
        &self,
        format: vk::Format,
    ) -> Result<vk::FormatProperties> {
        let get_format_properties =
            self.instance.table().get_physical_device_format_properties()?;
        let mut properties = vk::FormatProperties::default();
        // SAFETY: live physical device; output is a live local.
        unsafe { get_format_properties(self.handle, format, &mut properties) };
        Ok(properties)
    }

    /// Queue families, indexed by family index.
    pub fn queue_family_properties(
        &self,
    ) -> Result<Vec<vk::QueueFamilyProperties>> {
        let get_queue_families = self
            .instance
            .table()
            .get_physical_device_queue_family_properties()?;
        Ok(enumerate_unchecked(|count, data| {
            // SAFETY: live physical device; the enumerator hands out a valid
            // count and buffer.
            unsafe { get_queue_families(self.handle, count, data) }
        }))
    }

    pub fn enumerate_device_extension_properties(
        &self,
        layer: Option<&CStr>,
    ) -> Result<Vec<vk::ExtensionProperties>> {
        let enumerate_extensions = self
            .instance
            .table()
            .enumerate_device_extension_properties()?;
        let layer = layer.map_or(std::ptr::null(), CStr::as_ptr);
        enumerate(self.instance.entry().config().enumeration, |count, data| {
            // SAFETY: `layer` is null or borrowed for the whole call; the
            // enumerator hands out a valid count and buffer.
            unsafe { enumerate_extensions(self.handle, layer, count, data) }
        })
    }

    /// Device layers are deprecated; loaders report instance layers here.
    pub fn enumerate_device_layer_properties(
        &self,
    ) -> Result<Vec<vk::LayerProperties>> {
        let enumerate_layers =
            self.instance.table().enumerate_device_layer_properties()?;
        enumerate(self.instance.entry().config().enumeration, |count, data| {
            // SAFETY: live physical device; valid count and buffer.
            unsafe { enumerate_layers(self.handle, count, data) }
        })
    }

    pub fn surface_support(
        &self,
        queue_family_index: u32,
        surface: &Surface,
    ) -> Result<bool> {
        let get_support = self
            .instance
            .table()
            .get_physical_device_surface_support_khr()?;
        let mut supported = vk::FALSE;
        // SAFETY: live physical device and surface of the same instance;
        // output is a live local.
        result::check(unsafe {
            get_support(
                self.handle,
                queue_family_index,
                surface.raw_surface(),
                &mut supported,
            )
        })?;
        Ok(supported == vk::TRUE)
    }

    pub fn surface_capabilities(
        &self,
        surface: &Surface,
    ) -> Result<vk::SurfaceCapabilitiesKHR> {
        let get_capabilities = self
            .instance
            .table()
            .get_physical_device_surface_capabilities_khr()?;
        let mut capabilities = vk::SurfaceCapabilitiesKHR::default();
        // SAFETY: live physical device and surface; output is a live local.
        result::check(unsafe {
            get_capabilities(self.handle, surface.raw_surface(), &mut capabilities)
        })?;
        Ok(capabilities)
    }

    pub fn surface_formats(
        &self,
        surface: &Surface,
    ) -> Result<Vec<vk::SurfaceFormatKHR>> {
        let get_formats = self
            .instance
            .table()
            .get_physical_device_surface_formats_khr()?;
        enumerate(self.instance.entry().config().enumeration, |count, data| {
            // SAFETY: live physical device and surface; valid count and
            // buffer.
            unsafe { get_formats(self.handle, surface.raw_surface(), count, data) }
        })
    }

    pub fn surface_present_modes(
        &self,
        surface: &Surface,
    ) -> Result<Vec<vk::PresentModeKHR>> {
        let get_present_modes = self
            .instance
            .table()
            .get_physical_device_surface_present_modes_khr()?;
        enumerate(self.instance.entry().config().enumeration, |count, data| {
            // SAFETY: live physical device and surface; valid count and
            // buffer.
            unsafe {
                get_present_modes(self.handle, surface.raw_surface(), count, data)
            }
        })
    }

    /// Create a logical device and resolve its dispatch table.
    ///
    /// The device table is filled through the instance's
    /// `vkGetDeviceProcAddr`, so every device command goes straight to this
    /// device's driver.
    ///
    /// # Safety
    /// `create_info` must be a valid `VkDeviceCreateInfo`, including every
    /// structure and array it points at.
    pub unsafe fn create_device(
        &self,
        create_info: &vk::DeviceCreateInfo<'_>,
    ) -> Result<Arc<Device>> {
        let table = self.instance.table();
        let create_device = table.create_device()?;
        // Checked before creating anything so a missing resolver cannot leak
        // a device.
        let get_device_proc_addr = table.get_device_proc_addr()?;

        let mut handle = vk::Device::null();
        // SAFETY: caller guarantees create_info; output is a live local.
        result::check(unsafe {
            create_device(self.handle, create_info, std::ptr::null(), &mut handle)
        })?;

        // SAFETY: `handle` was just created from this instance, whose table
        // supplied the resolver.
        let device_table =
            unsafe { DeviceTable::load_for(get_device_proc_addr, handle) };
        for name in device_table.missing() {
            tracing::debug!("Device command {name:?} is not exposed");
        }

        let id = self.instance.registry().register_scope(handle, self.id);
        tracing::debug!("Created device {:?} as {id}", handle);
        Ok(Arc::new(Device::new(
            self.clone(),
            handle,
            Arc::new(device_table),
            id,
        )))
    }
}
