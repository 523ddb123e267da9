//! Per-scope dispatch tables.
//!
//! Vulkan entry points are looked up by name at three levels:
//!
//! - [`EntryTable`]: global commands, resolved with
//!   `vkGetInstanceProcAddr(VK_NULL_HANDLE, name)`.
//! - [`InstanceTable`]: resolved with `vkGetInstanceProcAddr(instance, name)`,
//!   falling back to the global lookup for commands exposed at both levels.
//! - [`DeviceTable`]: resolved only through the instance-level
//!   `vkGetDeviceProcAddr(device, name)`. Device pointers fetched globally
//!   may belong to a different device's dispatch chain, so the device table
//!   is never handed the global resolver.
//!
//! Each table resolves every slot exactly once, in `load`, and is immutable
//! afterwards. A name the driver does not expose becomes an absent slot;
//! construction itself never fails. Accessors return
//! [`Error::Unsupported`](crate::Error::Unsupported) for absent slots and
//! [`supports`](EntryTable::supports) lets callers check capabilities up
//! front.

use std::ffi::CStr;

use ash::vk;

macro_rules! dispatch_table {
    (
        $(#[$meta:meta])*
        $vis:vis struct $table:ident {
            $( $field:ident : $name:expr => $pfn:ty, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $table {
            $( $field: Option<$pfn>, )*
        }

        impl $table {
            /// Every entry point name this table resolves.
            pub const ENTRY_POINTS: &'static [&'static CStr] = &[$($name),*];

            /// Resolve every slot through `resolve`.
            ///
            /// `resolve` must return either `None` or a pointer to the
            /// native command of that name.
            pub fn load(
                mut resolve: impl FnMut(&CStr) -> vk::PFN_vkVoidFunction,
            ) -> Self {
                Self {
                    $(
                        $field: resolve($name).map(|f| {
                            // SAFETY: the resolver returned this pointer for
                            // `$name`, whose native signature is `$pfn`.
                            unsafe {
                                std::mem::transmute::<
                                    unsafe extern "system" fn(),
                                    $pfn,
                                >(f)
                            }
                        }),
                    )*
                }
            }

            $(
                #[inline]
                pub fn $field(&self) -> crate::Result<$pfn> {
                    self.$field.ok_or(crate::Error::Unsupported($name))
                }
            )*

            /// `(name, resolved)` for every slot, in declaration order.
            pub fn slots(
                &self,
            ) -> impl Iterator<Item = (&'static CStr, bool)> + '_ {
                [$( ($name, self.$field.is_some()) ),*].into_iter()
            }

            pub fn supports(&self, name: &CStr) -> bool {
                self.slots()
                    .any(|(slot, resolved)| resolved && slot == name)
            }

            pub fn missing(&self) -> impl Iterator<Item = &'static CStr> + '_ {
                self.slots()
                    .filter(|(_, resolved)| !resolved)
                    .map(|(name, _)| name)
            }

            pub fn loaded_count(&self) -> usize {
                self.slots().filter(|(_, resolved)| *resolved).count()
            }
        }

        impl std::fmt::Debug for $table {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($table))
                    .field("loaded", &self.loaded_count())
                    .field("total", &Self::ENTRY_POINTS.len())
                    .finish()
            }
        }
    };
}

dispatch_table! {
    /// Global commands, available before any instance exists.
    pub struct EntryTable {
        create_instance: c"vkCreateInstance" => vk::PFN_vkCreateInstance,
        enumerate_instance_version:
            c"vkEnumerateInstanceVersion" => vk::PFN_vkEnumerateInstanceVersion,
        enumerate_instance_layer_properties:
            c"vkEnumerateInstanceLayerProperties"
                => vk::PFN_vkEnumerateInstanceLayerProperties,
        enumerate_instance_extension_properties:
            c"vkEnumerateInstanceExtensionProperties"
                => vk::PFN_vkEnumerateInstanceExtensionProperties,
    }
}

dispatch_table! {
    /// Commands dispatched on an instance or physical device.
    pub struct InstanceTable {
        destroy_instance: c"vkDestroyInstance" => vk::PFN_vkDestroyInstance,
        enumerate_physical_devices:
            c"vkEnumeratePhysicalDevices" => vk::PFN_vkEnumeratePhysicalDevices,
        enumerate_physical_device_groups:
            c"vkEnumeratePhysicalDeviceGroups"
                => vk::PFN_vkEnumeratePhysicalDeviceGroups,
        get_physical_device_properties:
            c"vkGetPhysicalDeviceProperties"
                => vk::PFN_vkGetPhysicalDeviceProperties,
        get_physical_device_features:
            c"vkGetPhysicalDeviceFeatures" => vk::PFN_vkGetPhysicalDeviceFeatures,
        get_physical_device_memory_properties:
            c"vkGetPhysicalDeviceMemoryProperties"
                => vk::PFN_vkGetPhysicalDeviceMemoryProperties,
        get_physical_device_format_properties:
            c"vkGetPhysicalDeviceFormatProperties"
                => vk::PFN_vkGetPhysicalDeviceFormatProperties,
        get_physical_device_queue_family_properties:
            c"vkGetPhysicalDeviceQueueFamilyProperties"
                => vk::PFN_vkGetPhysicalDeviceQueueFamilyProperties,
        enumerate_device_extension_properties:
            c"vkEnumerateDeviceExtensionProperties"
                => vk::PFN_vkEnumerateDeviceExtensionProperties,
        enumerate_device_layer_properties:
            c"vkEnumerateDeviceLayerProperties"
                => vk::PFN_vkEnumerateDeviceLayerProperties,
        create_device: c"vkCreateDevice" => vk::PFN_vkCreateDevice,
        get_device_proc_addr:
            c"vkGetDeviceProcAddr" => vk::PFN_vkGetDeviceProcAddr,
        destroy_surface_khr:
            c"vkDestroySurfaceKHR" => vk::PFN_vkDestroySurfaceKHR,
        get_physical_device_surface_support_khr:
            c"vkGetPhysicalDeviceSurfaceSupportKHR"
                => vk::PFN_vkGetPhysicalDeviceSurfaceSupportKHR,
        get_physical_device_surface_capabilities_khr:
            c"vkGetPhysicalDeviceSurfaceCapabilitiesKHR"
                => vk::PFN_vkGetPhysicalDeviceSurfaceCapabilitiesKHR,
        get_physical_device_surface_formats_khr:
            c"vkGetPhysicalDeviceSurfaceFormatsKHR"
                => vk::PFN_vkGetPhysicalDeviceSurfaceFormatsKHR,
        get_physical_device_surface_present_modes_khr:
            c"vkGetPhysicalDeviceSurfacePresentModesKHR"
                => vk::PFN_vkGetPhysicalDeviceSurfacePresentModesKHR,
        create_headless_surface_ext:
            c"vkCreateHeadlessSurfaceEXT" => vk::PFN_vkCreateHeadlessSurfaceEXT,
        create_debug_utils_messenger_ext:
            c"vkCreateDebugUtilsMessengerEXT"
                => vk::PFN_vkCreateDebugUtilsMessengerEXT,
        destroy_debug_utils_messenger_ext:
            c"vkDestroyDebugUtilsMessengerEXT"
                => vk::PFN_vkDestroyDebugUtilsMessengerEXT,
    }
}

dispatch_table! {
    /// Commands dispatched on a device or one of its children.
    pub struct DeviceTable {
        destroy_device: c"vkDestroyDevice" => vk::PFN_vkDestroyDevice,
        get_device_queue: c"vkGetDeviceQueue" => vk::PFN_vkGetDeviceQueue,
        device_wait_idle: c"vkDeviceWaitIdle" => vk::PFN_vkDeviceWaitIdle,
        queue_submit: c"vkQueueSubmit" => vk::PFN_vkQueueSubmit,
        queue_wait_idle: c"vkQueueWaitIdle" => vk::PFN_vkQueueWaitIdle,
        create_fence: c"vkCreateFence" => vk::PFN_vkCreateFence,
        destroy_fence: c"vkDestroyFence" => vk::PFN_vkDestroyFence,
        reset_fences: c"vkResetFences" => vk::PFN_vkResetFences,
        get_fence_status: c"vkGetFenceStatus" => vk::PFN_vkGetFenceStatus,
        wait_for_fences: c"vkWaitForFences" => vk::PFN_vkWaitForFences,
        create_semaphore: c"vkCreateSemaphore" => vk::PFN_vkCreateSemaphore,
        destroy_semaphore: c"vkDestroySemaphore" => vk::PFN_vkDestroySemaphore,
        get_semaphore_counter_value:
            c"vkGetSemaphoreCounterValue" => vk::PFN_vkGetSemaphoreCounterValue,
        create_event: c"vkCreateEvent" => vk::PFN_vkCreateEvent,
        destroy_event: c"vkDestroyEvent" => vk::PFN_vkDestroyEvent,
        get_event_status: c"vkGetEventStatus" => vk::PFN_vkGetEventStatus,
        set_event: c"vkSetEvent" => vk::PFN_vkSetEvent,
        reset_event: c"vkResetEvent" => vk::PFN_vkResetEvent,
        create_buffer: c"vkCreateBuffer" => vk::PFN_vkCreateBuffer,
        destroy_buffer: c"vkDestroyBuffer" => vk::PFN_vkDestroyBuffer,
        get_buffer_memory_requirements:
            c"vkGetBufferMemoryRequirements"
                => vk::PFN_vkGetBufferMemoryRequirements,
        bind_buffer_memory: c"vkBindBufferMemory" => vk::PFN_vkBindBufferMemory,
        allocate_memory: c"vkAllocateMemory" => vk::PFN_vkAllocateMemory,
        free_memory: c"vkFreeMemory" => vk::PFN_vkFreeMemory,
        map_memory: c"vkMapMemory" => vk::PFN_vkMapMemory,
        unmap_memory: c"vkUnmapMemory" => vk::PFN_vkUnmapMemory,
        get_device_memory_commitment:
            c"vkGetDeviceMemoryCommitment" => vk::PFN_vkGetDeviceMemoryCommitment,
        create_command_pool:
            c"vkCreateCommandPool" => vk::PFN_vkCreateCommandPool,
        destroy_command_pool:
            c"vkDestroyCommandPool" => vk::PFN_vkDestroyCommandPool,
        reset_command_pool: c"vkResetCommandPool" => vk::PFN_vkResetCommandPool,
        allocate_command_buffers:
            c"vkAllocateCommandBuffers" => vk::PFN_vkAllocateCommandBuffers,
        free_command_buffers:
            c"vkFreeCommandBuffers" => vk::PFN_vkFreeCommandBuffers,
        begin_command_buffer:
            c"vkBeginCommandBuffer" => vk::PFN_vkBeginCommandBuffer,
        end_command_buffer: c"vkEndCommandBuffer" => vk::PFN_vkEndCommandBuffer,
        reset_command_buffer:
            c"vkResetCommandBuffer" => vk::PFN_vkResetCommandBuffer,
        cmd_fill_buffer: c"vkCmdFillBuffer" => vk::PFN_vkCmdFillBuffer,
        cmd_copy_buffer: c"vkCmdCopyBuffer" => vk::PFN_vkCmdCopyBuffer,
        create_descriptor_set_layout:
            c"vkCreateDescriptorSetLayout"
                => vk::PFN_vkCreateDescriptorSetLayout,
        destroy_descriptor_set_layout:
            c"vkDestroyDescriptorSetLayout"
                => vk::PFN_vkDestroyDescriptorSetLayout,
        create_descriptor_pool:
            c"vkCreateDescriptorPool" => vk::PFN_vkCreateDescriptorPool,
        destroy_descriptor_pool:
            c"vkDestroyDescriptorPool" => vk::PFN_vkDestroyDescriptorPool,
        reset_descriptor_pool:
            c"vkResetDescriptorPool" => vk::PFN_vkResetDescriptorPool,
        allocate_descriptor_sets:
            c"vkAllocateDescriptorSets" => vk::PFN_vkAllocateDescriptorSets,
        free_descriptor_sets:
            c"vkFreeDescriptorSets" => vk::PFN_vkFreeDescriptorSets,
        create_swapchain_khr:
            c"vkCreateSwapchainKHR" => vk::PFN_vkCreateSwapchainKHR,
        destroy_swapchain_khr:
            c"vkDestroySwapchainKHR" => vk::PFN_vkDestroySwapchainKHR,
        get_swapchain_images_khr:
            c"vkGetSwapchainImagesKHR" => vk::PFN_vkGetSwapchainImagesKHR,
        acquire_next_image_khr:
            c"vkAcquireNextImageKHR" => vk::PFN_vkAcquireNextImageKHR,
        queue_present_khr: c"vkQueuePresentKHR" => vk::PFN_vkQueuePresentKHR,
    }
}

impl EntryTable {
    /// Resolve the global commands.
    ///
    /// # Safety
    /// `get_instance_proc_addr` must be a valid `vkGetInstanceProcAddr`.
    pub unsafe fn load_global(
        get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    ) -> Self {
        Self::load(|name| {
            // SAFETY: caller guarantees the resolver; name is NUL-terminated.
            unsafe { get_instance_proc_addr(vk::Instance::null(), name.as_ptr()) }
        })
    }
}

impl InstanceTable {
    /// Resolve the commands of `instance`, falling back to the global lookup
    /// for names the instance-level lookup does not return.
    ///
    /// # Safety
    /// `get_instance_proc_addr` must be a valid `vkGetInstanceProcAddr` and
    /// `instance` a live instance created through it.
    pub unsafe fn load_for(
        get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
        instance: vk::Instance,
    ) -> Self {
        Self::load(|name| {
            // SAFETY: caller guarantees the resolver and instance; name is
            // NUL-terminated.
            unsafe { get_instance_proc_addr(instance, name.as_ptr()) }.or_else(
                || {
                    // SAFETY: as above, global lookups take a null instance.
                    unsafe {
                        get_instance_proc_addr(
                            vk::Instance::null(),
                            name.as_ptr(),
                        )
                    }
                },
            )
        })
    }
}

impl DeviceTable {
    /// Resolve the commands of `device`.
    ///
    /// # Safety
    /// `get_device_proc_addr` must be the `vkGetDeviceProcAddr` resolved from
    /// the instance that owns `device`, and `device` must be live.
    pub unsafe fn load_for(
        get_device_proc_addr: vk::PFN_vkGetDeviceProcAddr,
        device: vk::Device,
    ) -> Self {
        Self::load(|name| {
            // SAFETY: caller guarantees the resolver and device; name is
            // NUL-terminated.
            unsafe { get_device_proc_addr(device, name.as_ptr()) }
        })
    }
}
