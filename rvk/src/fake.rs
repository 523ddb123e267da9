//! In-process stand-in for a Vulkan driver, used by the unit tests.
//!
//! Every exported command reads and records into a thread-local [`Driver`],
//! so each test (running on its own thread) sees a fresh, independent
//! driver. Handles are plain counters; nothing is actually allocated.

use std::{
    cell::RefCell,
    collections::HashMap,
    ffi::{CStr, CString, c_char, c_void},
    sync::Arc,
};

use ash::vk::{self, Handle};

use crate::{
    config::EntryConfig, device::Device, entry::Entry, instance::Instance,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolver {
    Instance,
    Device,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub resolver: Resolver,
    pub handle: u64,
    pub name: CString,
}

pub struct Driver {
    /// Names no resolver will return.
    pub missing: Vec<&'static CStr>,
    /// Names `vkGetInstanceProcAddr(instance, ..)` refuses.
    pub hidden_at_instance_scope: Vec<&'static CStr>,
    /// Non-global names `vkGetInstanceProcAddr(NULL, ..)` still returns.
    pub exposed_globally: Vec<&'static CStr>,
    pub resolutions: Vec<Resolution>,
    pub calls: Vec<&'static str>,
    /// Forced failure codes, keyed by command name.
    pub failures: HashMap<&'static str, vk::Result>,

    pub instance_version: u32,
    pub layers: Vec<&'static CStr>,
    pub instance_extensions: Vec<&'static CStr>,
    pub device_extensions: Vec<&'static CStr>,
    pub physical_devices: Vec<u64>,
    /// Add this many physical devices between the count and fill calls.
    pub grow_physical_devices: u32,
    /// Add a physical device on every fill call.
    pub physical_devices_grow_forever: bool,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    pub surface_formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub swapchain_images: u32,

    pub fence_status: vk::Result,
    pub wait_result: vk::Result,
    pub event_status: vk::Result,
    pub acquire_result: vk::Result,
    pub present_result: vk::Result,
    pub semaphore_value: u64,

    pub destroyed: Vec<(vk::ObjectType, u64)>,
    pub freed_batches: Vec<(vk::ObjectType, Vec<u64>)>,
    /// `(submit count, fence)` per `vkQueueSubmit`.
    pub submits: Vec<(u32, u64)>,
    pub reset_fence_counts: Vec<u32>,
    pub recorded: Vec<&'static str>,
    next_handle: u64,
}

impl Default for Driver {
    fn default() -> Self {
        Self {
            missing: Vec::new(),
            hidden_at_instance_scope: Vec::new(),
            exposed_globally: Vec::new(),
            resolutions: Vec::new(),
            calls: Vec::new(),
            failures: HashMap::new(),
            instance_version: vk::API_VERSION_1_3,
            layers: vec![c"VK_LAYER_KHRONOS_validation"],
            instance_extensions: vec![
                c"VK_KHR_surface",
                c"VK_EXT_headless_surface",
                c"VK_EXT_debug_utils",
            ],
            device_extensions: vec![c"VK_KHR_swapchain"],
            physical_devices: vec![0x100, 0x101],
            grow_physical_devices: 0,
            physical_devices_grow_forever: false,
            queue_families: vec![
                vk::QueueFamilyProperties {
                    queue_flags: vk::QueueFlags::GRAPHICS
                        | vk::QueueFlags::COMPUTE
                        | vk::QueueFlags::TRANSFER,
                    queue_count: 2,
                    ..Default::default()
                },
                vk::QueueFamilyProperties {
                    queue_flags: vk::QueueFlags::TRANSFER,
                    queue_count: 1,
                    ..Default::default()
                },
            ],
            surface_formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::R8G8B8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![
                vk::PresentModeKHR::FIFO,
                vk::PresentModeKHR::MAILBOX,
            ],
            swapchain_images: 3,
            fence_status: vk::Result::NOT_READY,
            wait_result: vk::Result::SUCCESS,
            event_status: vk::Result::EVENT_RESET,
            acquire_result: vk::Result::SUCCESS,
            present_result: vk::Result::SUCCESS,
            semaphore_value: 0,
            destroyed: Vec::new(),
            freed_batches: Vec::new(),
            submits: Vec::new(),
            reset_fence_counts: Vec::new(),
            recorded: Vec::new(),
            next_handle: 0x1000,
        }
    }
}

impl Driver {
    fn new_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Log a call and return its forced failure, if any.
    fn call(&mut self, name: &'static str) -> Option<vk::Result> {
        self.calls.push(name);
        self.failures.get(name).copied()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.calls.iter().filter(|call| **call == name).count()
    }
}

thread_local! {
    static DRIVER: RefCell<Driver> = RefCell::new(Driver::default());
}

pub fn reset() {
    DRIVER.with_borrow_mut(|driver| *driver = Driver::default());
}

pub fn with<R>(f: impl FnOnce(&mut Driver) -> R) -> R {
    DRIVER.with_borrow_mut(f)
}

pub fn entry() -> Arc<Entry> {
    entry_with(EntryConfig::default())
}

pub fn entry_with(config: EntryConfig) -> Arc<Entry> {
    // SAFETY: the fake resolver only returns commands with the signature
    // of the name asked for.
    unsafe { Entry::from_resolver(get_instance_proc_addr, config) }
}

pub fn instance() -> Arc<Instance> {
    instance_from(&entry())
}

pub fn instance_from(entry: &Arc<Entry>) -> Arc<Instance> {
    let app_info =
        vk::ApplicationInfo::default().api_version(vk::API_VERSION_1_2);
    let create_info =
        vk::InstanceCreateInfo::default().application_info(&app_info);
    // SAFETY: create_info and app_info outlive the call.
    unsafe { entry.create_instance(&create_info) }
        .expect("fake instance creation succeeds")
}

pub fn device() -> Arc<Device> {
    device_from(&instance())
}

pub fn device_from(instance: &Arc<Instance>) -> Arc<Device> {
    let physical_device = instance
        .enumerate_physical_devices()
        .expect("fake enumeration succeeds")
        .remove(0);
    let priorities = [1.0];
    let queue_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities)];
    let create_info =
        vk::DeviceCreateInfo::default().queue_create_infos(&queue_infos);
    // SAFETY: create_info and the arrays it points at outlive the call.
    unsafe { physical_device.create_device(&create_info) }
        .expect("fake device creation succeeds")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Two-call fill of `items` into the caller's buffer.
///
/// # Safety
/// `count` must be valid; `data` must be null or hold `*count` elements.
unsafe fn fill<T: Copy>(items: &[T], count: *mut u32, data: *mut T) -> vk::Result {
    let len = items.len() as u32;
    // SAFETY: caller guarantees `count`.
    let count = unsafe { &mut *count };
    if data.is_null() {
        *count = len;
        return vk::Result::SUCCESS;
    }
    let written = (*count).min(len);
    for (i, item) in items.iter().take(written as usize).enumerate() {
        // SAFETY: `i < *count` elements fit in `data`.
        unsafe { data.add(i).write(*item) };
    }
    *count = written;
    if written < len {
        vk::Result::INCOMPLETE
    } else {
        vk::Result::SUCCESS
    }
}

fn listed(names: &[&'static CStr], name: &CStr) -> bool {
    names.iter().any(|listed| *listed == name)
}

fn write_name(dst: &mut [c_char], name: &CStr) {
    for (slot, byte) in dst.iter_mut().zip(name.to_bytes_with_nul()) {
        *slot = *byte as c_char;
    }
}

fn layer(name: &CStr) -> vk::LayerProperties {
    let mut layer = vk::LayerProperties {
        spec_version: vk::API_VERSION_1_3,
        implementation_version: 1,
        ..Default::default()
    };
    write_name(&mut layer.layer_name, name);
    layer
}

fn extension(name: &CStr) -> vk::ExtensionProperties {
    let mut extension = vk::ExtensionProperties {
        spec_version: 1,
        ..Default::default()
    };
    write_name(&mut extension.extension_name, name);
    extension
}

/// Store a freshly made handle through `out`, unless `name` is set to fail.
///
/// # Safety
/// `out` must be valid for writes.
unsafe fn create<H: Handle>(name: &'static str, out: *mut H) -> vk::Result {
    let created = with(|driver| match driver.call(name) {
        Some(failure) => Err(failure),
        None => Ok(driver.new_handle()),
    });
    match created {
        Ok(raw) => {
            // SAFETY: caller guarantees `out`.
            unsafe { out.write(H::from_raw(raw)) };
            vk::Result::SUCCESS
        }
        Err(failure) => failure,
    }
}

fn destroy<H: Handle>(name: &'static str, handle: H) {
    with(|driver| {
        driver.call(name);
        driver.destroyed.push((H::TYPE, handle.as_raw()));
    });
}

fn status(name: &'static str, ok: vk::Result) -> vk::Result {
    with(|driver| driver.call(name).unwrap_or(ok))
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Level {
    Global,
    Instance,
    Device,
}

macro_rules! commands {
    ($($level:ident $name:literal => $f:ident as $pfn:ty,)*) => {
        fn command(name: &CStr) -> Option<(Level, unsafe extern "system" fn())> {
            $(
                if name == $name {
                    let f: $pfn = $f;
                    // SAFETY: fn pointers share a representation; callers
                    // transmute back to `$pfn` before calling.
                    let f = unsafe {
                        std::mem::transmute::<$pfn, unsafe extern "system" fn()>(f)
                    };
                    return Some((Level::$level, f));
                }
            )*
            None
        }
    };
}

commands! {
    Global c"vkCreateInstance" => create_instance as vk::PFN_vkCreateInstance,
    Global c"vkEnumerateInstanceVersion"
        => enumerate_instance_version as vk::PFN_vkEnumerateInstanceVersion,
    Global c"vkEnumerateInstanceLayerProperties"
        => enumerate_instance_layer_properties
            as vk::PFN_vkEnumerateInstanceLayerProperties,
    Global c"vkEnumerateInstanceExtensionProperties"
        => enumerate_instance_extension_properties
            as vk::PFN_vkEnumerateInstanceExtensionProperties,
    Global c"vkGetInstanceProcAddr"
        => get_instance_proc_addr as vk::PFN_vkGetInstanceProcAddr,

    Instance c"vkDestroyInstance" => destroy_instance as vk::PFN_vkDestroyInstance,
    Instance c"vkEnumeratePhysicalDevices"
        => enumerate_physical_devices as vk::PFN_vkEnumeratePhysicalDevices,
    Instance c"vkEnumeratePhysicalDeviceGroups"
        => enumerate_physical_device_groups
            as vk::PFN_vkEnumeratePhysicalDeviceGroups,
    Instance c"vkGetPhysicalDeviceProperties"
        => get_physical_device_properties
            as vk::PFN_vkGetPhysicalDeviceProperties,
    Instance c"vkGetPhysicalDeviceFeatures"
        => get_physical_device_features as vk::PFN_vkGetPhysicalDeviceFeatures,
    Instance c"vkGetPhysicalDeviceMemoryProperties"
        => get_physical_device_memory_properties
            as vk::PFN_vkGetPhysicalDeviceMemoryProperties,
    Instance c"vkGetPhysicalDeviceFormatProperties"
        => get_physical_device_format_properties
            as vk::PFN_vkGetPhysicalDeviceFormatProperties,
    Instance c"vkGetPhysicalDeviceQueueFamilyProperties"
        => get_physical_device_queue_family_properties
            as vk::PFN_vkGetPhysicalDeviceQueueFamilyProperties,
    Instance c"vkEnumerateDeviceExtensionProperties"
        => enumerate_device_extension_properties
            as vk::PFN_vkEnumerateDeviceExtensionProperties,
    Instance c"vkEnumerateDeviceLayerProperties"
        => enumerate_device_layer_properties
            as vk::PFN_vkEnumerateDeviceLayerProperties,
    Instance c"vkCreateDevice" => create_device as vk::PFN_vkCreateDevice,
    Instance c"vkGetDeviceProcAddr"
        => get_device_proc_addr as vk::PFN_vkGetDeviceProcAddr,
    Instance c"vkDestroySurfaceKHR"
        => destroy_surface as vk::PFN_vkDestroySurfaceKHR,
    Instance c"vkGetPhysicalDeviceSurfaceSupportKHR"
        => get_surface_support as vk::PFN_vkGetPhysicalDeviceSurfaceSupportKHR,
    Instance c"vkGetPhysicalDeviceSurfaceCapabilitiesKHR"
        => get_surface_capabilities
            as vk::PFN_vkGetPhysicalDeviceSurfaceCapabilitiesKHR,
    Instance c"vkGetPhysicalDeviceSurfaceFormatsKHR"
        => get_surface_formats as vk::PFN_vkGetPhysicalDeviceSurfaceFormatsKHR,
    Instance c"vkGetPhysicalDeviceSurfacePresentModesKHR"
        => get_surface_present_modes
            as vk::PFN_vkGetPhysicalDeviceSurfacePresentModesKHR,
    Instance c"vkCreateHeadlessSurfaceEXT"
        => create_headless_surface as vk::PFN_vkCreateHeadlessSurfaceEXT,
    Instance c"vkCreateDebugUtilsMessengerEXT"
        => create_debug_messenger as vk::PFN_vkCreateDebugUtilsMessengerEXT,
    Instance c"vkDestroyDebugUtilsMessengerEXT"
        => destroy_debug_messenger as vk::PFN_vkDestroyDebugUtilsMessengerEXT,

    Device c"vkDestroyDevice" => destroy_device as vk::PFN_vkDestroyDevice,
    Device c"vkGetDeviceQueue" => get_device_queue as vk::PFN_vkGetDeviceQueue,
    Device c"vkDeviceWaitIdle" => device_wait_idle as vk::PFN_vkDeviceWaitIdle,
    Device c"vkQueueSubmit" => queue_submit as vk::PFN_vkQueueSubmit,
    Device c"vkQueueWaitIdle" => queue_wait_idle as vk::PFN_vkQueueWaitIdle,
    Device c"vkCreateFence" => create_fence as vk::PFN_vkCreateFence,
    Device c"vkDestroyFence" => destroy_fence as vk::PFN_vkDestroyFence,
    Device c"vkResetFences" => reset_fences as vk::PFN_vkResetFences,
    Device c"vkGetFenceStatus" => get_fence_status as vk::PFN_vkGetFenceStatus,
    Device c"vkWaitForFences" => wait_for_fences as vk::PFN_vkWaitForFences,
    Device c"vkCreateSemaphore" => create_semaphore as vk::PFN_vkCreateSemaphore,
    Device c"vkDestroySemaphore"
        => destroy_semaphore as vk::PFN_vkDestroySemaphore,
    Device c"vkGetSemaphoreCounterValue"
        => get_semaphore_counter_value as vk::PFN_vkGetSemaphoreCounterValue,
    Device c"vkCreateEvent" => create_event as vk::PFN_vkCreateEvent,
    Device c"vkDestroyEvent" => destroy_event as vk::PFN_vkDestroyEvent,
    Device c"vkGetEventStatus" => get_event_status as vk::PFN_vkGetEventStatus,
    Device c"vkSetEvent" => set_event as vk::PFN_vkSetEvent,
    Device c"vkResetEvent" => reset_event as vk::PFN_vkResetEvent,
    Device c"vkCreateBuffer" => create_buffer as vk::PFN_vkCreateBuffer,
    Device c"vkDestroyBuffer" => destroy_buffer as vk::PFN_vkDestroyBuffer,
    Device c"vkGetBufferMemoryRequirements"
        => get_buffer_memory_requirements
            as vk::PFN_vkGetBufferMemoryRequirements,
    Device c"vkBindBufferMemory"
        => bind_buffer_memory as vk::PFN_vkBindBufferMemory,
    Device c"vkAllocateMemory" => allocate_memory as vk::PFN_vkAllocateMemory,
    Device c"vkFreeMemory" => free_memory as vk::PFN_vkFreeMemory,
    Device c"vkMapMemory" => map_memory as vk::PFN_vkMapMemory,
    Device c"vkUnmapMemory" => unmap_memory as vk::PFN_vkUnmapMemory,
    Device c"vkGetDeviceMemoryCommitment"
        => get_device_memory_commitment as vk::PFN_vkGetDeviceMemoryCommitment,
    Device c"vkCreateCommandPool"
        => create_command_pool as vk::PFN_vkCreateCommandPool,
    Device c"vkDestroyCommandPool"
        => destroy_command_pool as vk::PFN_vkDestroyCommandPool,
    Device c"vkResetCommandPool"
        => reset_command_pool as vk::PFN_vkResetCommandPool,
    Device c"vkAllocateCommandBuffers"
        => allocate_command_buffers as vk::PFN_vkAllocateCommandBuffers,
    Device c"vkFreeCommandBuffers"
        => free_command_buffers as vk::PFN_vkFreeCommandBuffers,
    Device c"vkBeginCommandBuffer"
        => begin_command_buffer as vk::PFN_vkBeginCommandBuffer,
    Device c"vkEndCommandBuffer"
        => end_command_buffer as vk::PFN_vkEndCommandBuffer,
    Device c"vkResetCommandBuffer"
        => reset_command_buffer as vk::PFN_vkResetCommandBuffer,
    Device c"vkCmdFillBuffer" => cmd_fill_buffer as vk::PFN_vkCmdFillBuffer,
    Device c"vkCmdCopyBuffer" => cmd_copy_buffer as vk::PFN_vkCmdCopyBuffer,
    Device c"vkCreateDescriptorSetLayout"
        => create_descriptor_set_layout as vk::PFN_vkCreateDescriptorSetLayout,
    Device c"vkDestroyDescriptorSetLayout"
        => destroy_descriptor_set_layout
            as vk::PFN_vkDestroyDescriptorSetLayout,
    Device c"vkCreateDescriptorPool"
        => create_descriptor_pool as vk::PFN_vkCreateDescriptorPool,
    Device c"vkDestroyDescriptorPool"
        => destroy_descriptor_pool as vk::PFN_vkDestroyDescriptorPool,
    Device c"vkResetDescriptorPool"
        => reset_descriptor_pool as vk::PFN_vkResetDescriptorPool,
    Device c"vkAllocateDescriptorSets"
        => allocate_descriptor_sets as vk::PFN_vkAllocateDescriptorSets,
    Device c"vkFreeDescriptorSets"
        => free_descriptor_sets as vk::PFN_vkFreeDescriptorSets,
    Device c"vkCreateSwapchainKHR"
        => create_swapchain as vk::PFN_vkCreateSwapchainKHR,
    Device c"vkDestroySwapchainKHR"
        => destroy_swapchain as vk::PFN_vkDestroySwapchainKHR,
    Device c"vkGetSwapchainImagesKHR"
        => get_swapchain_images as vk::PFN_vkGetSwapchainImagesKHR,
    Device c"vkAcquireNextImageKHR"
        => acquire_next_image as vk::PFN_vkAcquireNextImageKHR,
    Device c"vkQueuePresentKHR" => queue_present as vk::PFN_vkQueuePresentKHR,
}

pub unsafe extern "system" fn get_instance_proc_addr(
    instance: vk::Instance,
    name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    // SAFETY: callers pass NUL-terminated names.
    let name = unsafe { CStr::from_ptr(name) };
    let (level, f) = command(name)?;
    with(|driver| {
        driver.resolutions.push(Resolution {
            resolver: Resolver::Instance,
            handle: instance.as_raw(),
            name: name.to_owned(),
        });
        if listed(&driver.missing, name) {
            return None;
        }
        let visible = if instance.is_null() {
            level == Level::Global || listed(&driver.exposed_globally, name)
        } else {
            !listed(&driver.hidden_at_instance_scope, name)
        };
        visible.then_some(f)
    })
}

unsafe extern "system" fn get_device_proc_addr(
    device: vk::Device,
    name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    // SAFETY: callers pass NUL-terminated names.
    let name = unsafe { CStr::from_ptr(name) };
    let (level, f) = command(name)?;
    with(|driver| {
        driver.resolutions.push(Resolution {
            resolver: Resolver::Device,
            handle: device.as_raw(),
            name: name.to_owned(),
        });
        (level == Level::Device && !listed(&driver.missing, name)).then_some(f)
    })
}

// ---------------------------------------------------------------------------
// Global and instance commands
// ---------------------------------------------------------------------------

unsafe extern "system" fn create_instance(
    _create_info: *const vk::InstanceCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    instance: *mut vk::Instance,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateInstance", instance) }
}

unsafe extern "system" fn enumerate_instance_version(
    version: *mut u32,
) -> vk::Result {
    let (failure, value) = with(|driver| {
        (driver.call("vkEnumerateInstanceVersion"), driver.instance_version)
    });
    if let Some(failure) = failure {
        return failure;
    }
    // SAFETY: the output pointer comes from the caller.
    unsafe { version.write(value) };
    vk::Result::SUCCESS
}

unsafe extern "system" fn enumerate_instance_layer_properties(
    count: *mut u32,
    properties: *mut vk::LayerProperties,
) -> vk::Result {
    let layers: Vec<_> = with(|driver| {
        driver.call("vkEnumerateInstanceLayerProperties");
        driver.layers.iter().map(|name| layer(name)).collect()
    });
    // SAFETY: pointers come from the caller.
    unsafe { fill(&layers, count, properties) }
}

unsafe extern "system" fn enumerate_instance_extension_properties(
    layer_name: *const c_char,
    count: *mut u32,
    properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    if !layer_name.is_null() {
        // Layers provide no extensions of their own.
        // SAFETY: pointers come from the caller.
        return unsafe { fill::<vk::ExtensionProperties>(&[], count, properties) };
    }
    let extensions: Vec<_> = with(|driver| {
        driver.call("vkEnumerateInstanceExtensionProperties");
        driver
            .instance_extensions
            .iter()
            .map(|name| extension(name))
            .collect()
    });
    // SAFETY: pointers come from the caller.
    unsafe { fill(&extensions, count, properties) }
}

unsafe extern "system" fn destroy_instance(
    instance: vk::Instance,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyInstance", instance);
}

unsafe extern "system" fn enumerate_physical_devices(
    _instance: vk::Instance,
    count: *mut u32,
    physical_devices: *mut vk::PhysicalDevice,
) -> vk::Result {
    let devices: Vec<_> = with(|driver| {
        driver.call("vkEnumeratePhysicalDevices");
        if !physical_devices.is_null() {
            if driver.physical_devices_grow_forever {
                let raw = 0x100 + driver.physical_devices.len() as u64;
                driver.physical_devices.push(raw);
            } else {
                for _ in 0..std::mem::take(&mut driver.grow_physical_devices) {
                    let raw = 0x100 + driver.physical_devices.len() as u64;
                    driver.physical_devices.push(raw);
                }
            }
        }
        driver
            .physical_devices
            .iter()
            .map(|raw| vk::PhysicalDevice::from_raw(*raw))
            .collect()
    });
    // SAFETY: pointers come from the caller.
    unsafe { fill(&devices, count, physical_devices) }
}

unsafe extern "system" fn enumerate_physical_device_groups(
    _instance: vk::Instance,
    count: *mut u32,
    groups: *mut vk::PhysicalDeviceGroupProperties<'_>,
) -> vk::Result {
    let groups_available: Vec<_> = with(|driver| {
        driver.call("vkEnumeratePhysicalDeviceGroups");
        driver
            .physical_devices
            .iter()
            .map(|raw| {
                let mut group = vk::PhysicalDeviceGroupProperties {
                    physical_device_count: 1,
                    ..Default::default()
                };
                group.physical_devices[0] = vk::PhysicalDevice::from_raw(*raw);
                group
            })
            .collect()
    });
    // SAFETY: pointers come from the caller.
    unsafe { fill(&groups_available, count, groups.cast()) }
}

unsafe extern "system" fn get_physical_device_properties(
    physical_device: vk::PhysicalDevice,
    properties: *mut vk::PhysicalDeviceProperties,
) {
    with(|driver| driver.call("vkGetPhysicalDeviceProperties"));
    let raw = physical_device.as_raw();
    let mut value = vk::PhysicalDeviceProperties {
        api_version: vk::API_VERSION_1_3,
        vendor_id: 0x1234,
        device_id: raw as u32,
        device_type: if raw == 0x100 {
            vk::PhysicalDeviceType::DISCRETE_GPU
        } else {
            vk::PhysicalDeviceType::INTEGRATED_GPU
        },
        ..Default::default()
    };
    let name = CString::new(format!("Fake GPU {raw:#x}"))
        .expect("formatted name has no NUL");
    write_name(&mut value.device_name, &name);
    // SAFETY: the output pointer comes from the caller.
    unsafe { properties.write(value) };
}

unsafe extern "system" fn get_physical_device_features(
    _physical_device: vk::PhysicalDevice,
    features: *mut vk::PhysicalDeviceFeatures,
) {
    with(|driver| driver.call("vkGetPhysicalDeviceFeatures"));
    let value = vk::PhysicalDeviceFeatures {
        sampler_anisotropy: vk::TRUE,
        ..Default::default()
    };
    // SAFETY: the output pointer comes from the caller.
    unsafe { features.write(value) };
}

unsafe extern "system" fn get_physical_device_memory_properties(
    _physical_device: vk::PhysicalDevice,
    properties: *mut vk::PhysicalDeviceMemoryProperties,
) {
    with(|driver| driver.call("vkGetPhysicalDeviceMemoryProperties"));
    let mut value = vk::PhysicalDeviceMemoryProperties {
        memory_type_count: 1,
        memory_heap_count: 1,
        ..Default::default()
    };
    value.memory_types[0].property_flags =
        vk::MemoryPropertyFlags::HOST_VISIBLE;
    value.memory_heaps[0].size = 256 << 20;
    // SAFETY: the output pointer comes from the caller.
    unsafe { properties.write(value) };
}

unsafe extern "system" fn get_physical_device_format_properties(
    _physical_device: vk::PhysicalDevice,
    format: vk::Format,
    properties: *mut vk::FormatProperties,
) {
    with(|driver| driver.call("vkGetPhysicalDeviceFormatProperties"));
    let value = if format == vk::Format::UNDEFINED {
        vk::FormatProperties::default()
    } else {
        vk::FormatProperties {
            buffer_features: vk::FormatFeatureFlags::VERTEX_BUFFER,
            ..Default::default()
        }
    };
    // SAFETY: the output pointer comes from the caller.
    unsafe { properties.write(value) };
}

unsafe extern "system" fn get_physical_device_queue_family_properties(
    _physical_device: vk::PhysicalDevice,
    count: *mut u32,
    properties: *mut vk::QueueFamilyProperties,
) {
    let families = with(|driver| {
        driver.call("vkGetPhysicalDeviceQueueFamilyProperties");
        driver.queue_families.clone()
    });
    // SAFETY: pointers come from the caller.
    let _ = unsafe { fill(&families, count, properties) };
}

unsafe extern "system" fn enumerate_device_extension_properties(
    _physical_device: vk::PhysicalDevice,
    _layer_name: *const c_char,
    count: *mut u32,
    properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    let extensions: Vec<_> = with(|driver| {
        driver.call("vkEnumerateDeviceExtensionProperties");
        driver
            .device_extensions
            .iter()
            .map(|name| extension(name))
            .collect()
    });
    // SAFETY: pointers come from the caller.
    unsafe { fill(&extensions, count, properties) }
}

unsafe extern "system" fn enumerate_device_layer_properties(
    _physical_device: vk::PhysicalDevice,
    count: *mut u32,
    properties: *mut vk::LayerProperties,
) -> vk::Result {
    with(|driver| driver.call("vkEnumerateDeviceLayerProperties"));
    // SAFETY: pointers come from the caller.
    unsafe { fill::<vk::LayerProperties>(&[], count, properties) }
}

unsafe extern "system" fn create_device(
    _physical_device: vk::PhysicalDevice,
    _create_info: *const vk::DeviceCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    device: *mut vk::Device,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateDevice", device) }
}

unsafe extern "system" fn destroy_surface(
    _instance: vk::Instance,
    surface: vk::SurfaceKHR,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroySurfaceKHR", surface);
}

unsafe extern "system" fn get_surface_support(
    _physical_device: vk::PhysicalDevice,
    queue_family_index: u32,
    _surface: vk::SurfaceKHR,
    supported: *mut vk::Bool32,
) -> vk::Result {
    if let Some(failure) =
        with(|driver| driver.call("vkGetPhysicalDeviceSurfaceSupportKHR"))
    {
        return failure;
    }
    let value = if queue_family_index == 0 {
        vk::TRUE
    } else {
        vk::FALSE
    };
    // SAFETY: the output pointer comes from the caller.
    unsafe { supported.write(value) };
    vk::Result::SUCCESS
}

unsafe extern "system" fn get_surface_capabilities(
    _physical_device: vk::PhysicalDevice,
    _surface: vk::SurfaceKHR,
    capabilities: *mut vk::SurfaceCapabilitiesKHR,
) -> vk::Result {
    if let Some(failure) = with(|driver| {
        driver.call("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")
    }) {
        return failure;
    }
    let value = vk::SurfaceCapabilitiesKHR {
        min_image_count: 2,
        max_image_count: 4,
        current_extent: vk::Extent2D {
            width: 640,
            height: 480,
        },
        ..Default::default()
    };
    // SAFETY: the output pointer comes from the caller.
    unsafe { capabilities.write(value) };
    vk::Result::SUCCESS
}

unsafe extern "system" fn get_surface_formats(
    _physical_device: vk::PhysicalDevice,
    _surface: vk::SurfaceKHR,
    count: *mut u32,
    formats: *mut vk::SurfaceFormatKHR,
) -> vk::Result {
    let (failure, available) = with(|driver| {
        (
            driver.call("vkGetPhysicalDeviceSurfaceFormatsKHR"),
            driver.surface_formats.clone(),
        )
    });
    if let Some(failure) = failure {
        return failure;
    }
    // SAFETY: pointers come from the caller.
    unsafe { fill(&available, count, formats) }
}

unsafe extern "system" fn get_surface_present_modes(
    _physical_device: vk::PhysicalDevice,
    _surface: vk::SurfaceKHR,
    count: *mut u32,
    modes: *mut vk::PresentModeKHR,
) -> vk::Result {
    let available = with(|driver| {
        driver.call("vkGetPhysicalDeviceSurfacePresentModesKHR");
        driver.present_modes.clone()
    });
    // SAFETY: pointers come from the caller.
    unsafe { fill(&available, count, modes) }
}

unsafe extern "system" fn create_headless_surface(
    _instance: vk::Instance,
    _create_info: *const vk::HeadlessSurfaceCreateInfoEXT<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    surface: *mut vk::SurfaceKHR,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateHeadlessSurfaceEXT", surface) }
}

unsafe extern "system" fn create_debug_messenger(
    _instance: vk::Instance,
    create_info: *const vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    messenger: *mut vk::DebugUtilsMessengerEXT,
) -> vk::Result {
    // SAFETY: the create info comes from the caller.
    let severity = unsafe { (*create_info).message_severity };
    with(|driver| {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE) {
            driver.recorded.push("severity:verbose");
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            driver.recorded.push("severity:info");
        } else if severity
            .contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING)
        {
            driver.recorded.push("severity:warning");
        } else {
            driver.recorded.push("severity:error");
        }
    });
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateDebugUtilsMessengerEXT", messenger) }
}

unsafe extern "system" fn destroy_debug_messenger(
    _instance: vk::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyDebugUtilsMessengerEXT", messenger);
}

// ---------------------------------------------------------------------------
// Device commands
// ---------------------------------------------------------------------------

unsafe extern "system" fn destroy_device(
    device: vk::Device,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyDevice", device);
}

unsafe extern "system" fn get_device_queue(
    _device: vk::Device,
    queue_family_index: u32,
    queue_index: u32,
    queue: *mut vk::Queue,
) {
    with(|driver| driver.call("vkGetDeviceQueue"));
    let raw = 0x200 + u64::from(queue_family_index) * 0x10 + u64::from(queue_index);
    // SAFETY: the output pointer comes from the caller.
    unsafe { queue.write(vk::Queue::from_raw(raw)) };
}

unsafe extern "system" fn device_wait_idle(_device: vk::Device) -> vk::Result {
    status("vkDeviceWaitIdle", vk::Result::SUCCESS)
}

unsafe extern "system" fn queue_submit(
    _queue: vk::Queue,
    submit_count: u32,
    _submits: *const vk::SubmitInfo<'_>,
    fence: vk::Fence,
) -> vk::Result {
    with(|driver| {
        driver.submits.push((submit_count, fence.as_raw()));
        driver.call("vkQueueSubmit").unwrap_or(vk::Result::SUCCESS)
    })
}

unsafe extern "system" fn queue_wait_idle(_queue: vk::Queue) -> vk::Result {
    status("vkQueueWaitIdle", vk::Result::SUCCESS)
}

unsafe extern "system" fn create_fence(
    _device: vk::Device,
    _create_info: *const vk::FenceCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    fence: *mut vk::Fence,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateFence", fence) }
}

unsafe extern "system" fn destroy_fence(
    _device: vk::Device,
    fence: vk::Fence,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyFence", fence);
}

unsafe extern "system" fn reset_fences(
    _device: vk::Device,
    fence_count: u32,
    _fences: *const vk::Fence,
) -> vk::Result {
    with(|driver| {
        driver.reset_fence_counts.push(fence_count);
        driver.call("vkResetFences").unwrap_or(vk::Result::SUCCESS)
    })
}

unsafe extern "system" fn get_fence_status(
    _device: vk::Device,
    _fence: vk::Fence,
) -> vk::Result {
    with(|driver| {
        driver
            .call("vkGetFenceStatus")
            .unwrap_or(driver.fence_status)
    })
}

unsafe extern "system" fn wait_for_fences(
    _device: vk::Device,
    _fence_count: u32,
    _fences: *const vk::Fence,
    _wait_all: vk::Bool32,
    _timeout: u64,
) -> vk::Result {
    with(|driver| {
        driver
            .call("vkWaitForFences")
            .unwrap_or(driver.wait_result)
    })
}

unsafe extern "system" fn create_semaphore(
    _device: vk::Device,
    _create_info: *const vk::SemaphoreCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    semaphore: *mut vk::Semaphore,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateSemaphore", semaphore) }
}

unsafe extern "system" fn destroy_semaphore(
    _device: vk::Device,
    semaphore: vk::Semaphore,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroySemaphore", semaphore);
}

unsafe extern "system" fn get_semaphore_counter_value(
    _device: vk::Device,
    _semaphore: vk::Semaphore,
    value: *mut u64,
) -> vk::Result {
    let (failure, current) = with(|driver| {
        (
            driver.call("vkGetSemaphoreCounterValue"),
            driver.semaphore_value,
        )
    });
    if let Some(failure) = failure {
        return failure;
    }
    // SAFETY: the output pointer comes from the caller.
    unsafe { value.write(current) };
    vk::Result::SUCCESS
}

unsafe extern "system" fn create_event(
    _device: vk::Device,
    _create_info: *const vk::EventCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    event: *mut vk::Event,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateEvent", event) }
}

unsafe extern "system" fn destroy_event(
    _device: vk::Device,
    event: vk::Event,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyEvent", event);
}

unsafe extern "system" fn get_event_status(
    _device: vk::Device,
    _event: vk::Event,
) -> vk::Result {
    with(|driver| {
        driver
            .call("vkGetEventStatus")
            .unwrap_or(driver.event_status)
    })
}

unsafe extern "system" fn set_event(
    _device: vk::Device,
    _event: vk::Event,
) -> vk::Result {
    with(|driver| {
        driver.event_status = vk::Result::EVENT_SET;
        driver.call("vkSetEvent").unwrap_or(vk::Result::SUCCESS)
    })
}

unsafe extern "system" fn reset_event(
    _device: vk::Device,
    _event: vk::Event,
) -> vk::Result {
    with(|driver| {
        driver.event_status = vk::Result::EVENT_RESET;
        driver.call("vkResetEvent").unwrap_or(vk::Result::SUCCESS)
    })
}

unsafe extern "system" fn create_buffer(
    _device: vk::Device,
    _create_info: *const vk::BufferCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    buffer: *mut vk::Buffer,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateBuffer", buffer) }
}

unsafe extern "system" fn destroy_buffer(
    _device: vk::Device,
    buffer: vk::Buffer,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyBuffer", buffer);
}

unsafe extern "system" fn get_buffer_memory_requirements(
    _device: vk::Device,
    _buffer: vk::Buffer,
    requirements: *mut vk::MemoryRequirements,
) {
    with(|driver| driver.call("vkGetBufferMemoryRequirements"));
    let value = vk::MemoryRequirements {
        size: 256,
        alignment: 64,
        memory_type_bits: 0b1,
    };
    // SAFETY: the output pointer comes from the caller.
    unsafe { requirements.write(value) };
}

unsafe extern "system" fn bind_buffer_memory(
    _device: vk::Device,
    _buffer: vk::Buffer,
    _memory: vk::DeviceMemory,
    _offset: vk::DeviceSize,
) -> vk::Result {
    status("vkBindBufferMemory", vk::Result::SUCCESS)
}

unsafe extern "system" fn allocate_memory(
    _device: vk::Device,
    _allocate_info: *const vk::MemoryAllocateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    memory: *mut vk::DeviceMemory,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkAllocateMemory", memory) }
}

unsafe extern "system" fn free_memory(
    _device: vk::Device,
    memory: vk::DeviceMemory,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkFreeMemory", memory);
}

unsafe extern "system" fn map_memory(
    _device: vk::Device,
    _memory: vk::DeviceMemory,
    offset: vk::DeviceSize,
    _size: vk::DeviceSize,
    _flags: vk::MemoryMapFlags,
    data: *mut *mut c_void,
) -> vk::Result {
    if let Some(failure) = with(|driver| driver.call("vkMapMemory")) {
        return failure;
    }
    // SAFETY: the output pointer comes from the caller.
    unsafe { data.write((0x8000 + offset as usize) as *mut c_void) };
    vk::Result::SUCCESS
}

unsafe extern "system" fn unmap_memory(
    _device: vk::Device,
    _memory: vk::DeviceMemory,
) {
    with(|driver| driver.call("vkUnmapMemory"));
}

unsafe extern "system" fn get_device_memory_commitment(
    _device: vk::Device,
    _memory: vk::DeviceMemory,
    committed: *mut vk::DeviceSize,
) {
    with(|driver| driver.call("vkGetDeviceMemoryCommitment"));
    // SAFETY: the output pointer comes from the caller.
    unsafe { committed.write(4096) };
}

unsafe extern "system" fn create_command_pool(
    _device: vk::Device,
    _create_info: *const vk::CommandPoolCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    pool: *mut vk::CommandPool,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateCommandPool", pool) }
}

unsafe extern "system" fn destroy_command_pool(
    _device: vk::Device,
    pool: vk::CommandPool,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyCommandPool", pool);
}

unsafe extern "system" fn reset_command_pool(
    _device: vk::Device,
    _pool: vk::CommandPool,
    _flags: vk::CommandPoolResetFlags,
) -> vk::Result {
    status("vkResetCommandPool", vk::Result::SUCCESS)
}

unsafe extern "system" fn allocate_command_buffers(
    _device: vk::Device,
    allocate_info: *const vk::CommandBufferAllocateInfo<'_>,
    buffers: *mut vk::CommandBuffer,
) -> vk::Result {
    // SAFETY: the allocate info comes from the caller.
    let count = unsafe { (*allocate_info).command_buffer_count };
    let handles = with(|driver| match driver.call("vkAllocateCommandBuffers") {
        Some(failure) => Err(failure),
        None => Ok((0..count).map(|_| driver.new_handle()).collect::<Vec<_>>()),
    });
    match handles {
        Ok(handles) => {
            for (i, raw) in handles.into_iter().enumerate() {
                // SAFETY: the caller's array holds `count` elements.
                unsafe { buffers.add(i).write(vk::CommandBuffer::from_raw(raw)) };
            }
            vk::Result::SUCCESS
        }
        Err(failure) => failure,
    }
}

unsafe extern "system" fn free_command_buffers(
    _device: vk::Device,
    _pool: vk::CommandPool,
    count: u32,
    buffers: *const vk::CommandBuffer,
) {
    // SAFETY: the caller's array holds `count` elements.
    let freed = unsafe { std::slice::from_raw_parts(buffers, count as usize) };
    with(|driver| {
        driver.call("vkFreeCommandBuffers");
        driver.freed_batches.push((
            vk::ObjectType::COMMAND_BUFFER,
            freed.iter().map(|buffer| buffer.as_raw()).collect(),
        ));
    });
}

unsafe extern "system" fn begin_command_buffer(
    _command_buffer: vk::CommandBuffer,
    _begin_info: *const vk::CommandBufferBeginInfo<'_>,
) -> vk::Result {
    status("vkBeginCommandBuffer", vk::Result::SUCCESS)
}

unsafe extern "system" fn end_command_buffer(
    _command_buffer: vk::CommandBuffer,
) -> vk::Result {
    status("vkEndCommandBuffer", vk::Result::SUCCESS)
}

unsafe extern "system" fn reset_command_buffer(
    _command_buffer: vk::CommandBuffer,
    _flags: vk::CommandBufferResetFlags,
) -> vk::Result {
    status("vkResetCommandBuffer", vk::Result::SUCCESS)
}

unsafe extern "system" fn cmd_fill_buffer(
    _command_buffer: vk::CommandBuffer,
    _dst_buffer: vk::Buffer,
    _dst_offset: vk::DeviceSize,
    _size: vk::DeviceSize,
    _data: u32,
) {
    with(|driver| driver.call("vkCmdFillBuffer"));
}

unsafe extern "system" fn cmd_copy_buffer(
    _command_buffer: vk::CommandBuffer,
    _src_buffer: vk::Buffer,
    _dst_buffer: vk::Buffer,
    _region_count: u32,
    _regions: *const vk::BufferCopy,
) {
    with(|driver| driver.call("vkCmdCopyBuffer"));
}

unsafe extern "system" fn create_descriptor_set_layout(
    _device: vk::Device,
    _create_info: *const vk::DescriptorSetLayoutCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    layout: *mut vk::DescriptorSetLayout,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateDescriptorSetLayout", layout) }
}

unsafe extern "system" fn destroy_descriptor_set_layout(
    _device: vk::Device,
    layout: vk::DescriptorSetLayout,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyDescriptorSetLayout", layout);
}

unsafe extern "system" fn create_descriptor_pool(
    _device: vk::Device,
    _create_info: *const vk::DescriptorPoolCreateInfo<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    pool: *mut vk::DescriptorPool,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateDescriptorPool", pool) }
}

unsafe extern "system" fn destroy_descriptor_pool(
    _device: vk::Device,
    pool: vk::DescriptorPool,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroyDescriptorPool", pool);
}

unsafe extern "system" fn reset_descriptor_pool(
    _device: vk::Device,
    _pool: vk::DescriptorPool,
    _flags: vk::DescriptorPoolResetFlags,
) -> vk::Result {
    status("vkResetDescriptorPool", vk::Result::SUCCESS)
}

unsafe extern "system" fn allocate_descriptor_sets(
    _device: vk::Device,
    allocate_info: *const vk::DescriptorSetAllocateInfo<'_>,
    sets: *mut vk::DescriptorSet,
) -> vk::Result {
    // SAFETY: the allocate info comes from the caller.
    let count = unsafe { (*allocate_info).descriptor_set_count };
    let handles = with(|driver| match driver.call("vkAllocateDescriptorSets") {
        Some(failure) => Err(failure),
        None => Ok((0..count).map(|_| driver.new_handle()).collect::<Vec<_>>()),
    });
    match handles {
        Ok(handles) => {
            for (i, raw) in handles.into_iter().enumerate() {
                // SAFETY: the caller's array holds `count` elements.
                unsafe { sets.add(i).write(vk::DescriptorSet::from_raw(raw)) };
            }
            vk::Result::SUCCESS
        }
        Err(failure) => failure,
    }
}

unsafe extern "system" fn free_descriptor_sets(
    _device: vk::Device,
    _pool: vk::DescriptorPool,
    count: u32,
    sets: *const vk::DescriptorSet,
) -> vk::Result {
    // SAFETY: the caller's array holds `count` elements.
    let freed = unsafe { std::slice::from_raw_parts(sets, count as usize) };
    with(|driver| {
        driver.freed_batches.push((
            vk::ObjectType::DESCRIPTOR_SET,
            freed.iter().map(|set| set.as_raw()).collect(),
        ));
        driver
            .call("vkFreeDescriptorSets")
            .unwrap_or(vk::Result::SUCCESS)
    })
}

unsafe extern "system" fn create_swapchain(
    _device: vk::Device,
    _create_info: *const vk::SwapchainCreateInfoKHR<'_>,
    _allocator: *const vk::AllocationCallbacks<'_>,
    swapchain: *mut vk::SwapchainKHR,
) -> vk::Result {
    // SAFETY: the output pointer comes from the caller.
    unsafe { create("vkCreateSwapchainKHR", swapchain) }
}

unsafe extern "system" fn destroy_swapchain(
    _device: vk::Device,
    swapchain: vk::SwapchainKHR,
    _allocator: *const vk::AllocationCallbacks<'_>,
) {
    destroy("vkDestroySwapchainKHR", swapchain);
}

unsafe extern "system" fn get_swapchain_images(
    _device: vk::Device,
    swapchain: vk::SwapchainKHR,
    count: *mut u32,
    images: *mut vk::Image,
) -> vk::Result {
    let available: Vec<_> = with(|driver| {
        driver.call("vkGetSwapchainImagesKHR");
        (0..u64::from(driver.swapchain_images))
            .map(|i| vk::Image::from_raw(swapchain.as_raw() * 0x10 + i))
            .collect()
    });
    // SAFETY: pointers come from the caller.
    unsafe { fill(&available, count, images) }
}

unsafe extern "system" fn acquire_next_image(
    _device: vk::Device,
    _swapchain: vk::SwapchainKHR,
    _timeout: u64,
    _semaphore: vk::Semaphore,
    _fence: vk::Fence,
    image_index: *mut u32,
) -> vk::Result {
    let result = with(|driver| {
        driver
            .call("vkAcquireNextImageKHR")
            .unwrap_or(driver.acquire_result)
    });
    if result.as_raw() >= 0 {
        // SAFETY: the output pointer comes from the caller.
        unsafe { image_index.write(1) };
    }
    result
}

unsafe extern "system" fn queue_present(
    _queue: vk::Queue,
    _present_info: *const vk::PresentInfoKHR<'_>,
) -> vk::Result {
    with(|driver| {
        driver
            .call("vkQueuePresentKHR")
            .unwrap_or(driver.present_result)
    })
}
