//! Logical device wrapper ([`Device`]) and its queues ([`Queue`]).
//!
//! `Device` is the third and last dispatch scope. Its table is resolved
//! through the owning instance's `vkGetDeviceProcAddr`, and every object
//! created from it (sync primitives, buffers, memory, pools, swapchains)
//! holds an `Arc<Device>` and calls through that table.
//!
//! Creation methods live next to the type they create: see
//! [`sync`](crate::sync), [`buffer`](crate::buffer),
//! [`command`](crate::command), [`descriptor`](crate::descriptor) and
//! [`swapchain`](crate::swapchain).

use std::{ffi::CStr, sync::Arc};

use ash::vk;

use crate::{
    dispatch::DeviceTable,
    error::{Result, StillInUse},
    instance::Instance,
    physical_device::PhysicalDevice,
    registry::{ObjectId, ObjectRegistry},
    result::{self, Success},
    sync::Fence,
};

/// A logical Vulkan device and its dispatch table.
pub struct Device {
    physical_device: PhysicalDevice,
    handle: vk::Device,
    table: Arc<DeviceTable>,
    id: ObjectId,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Device {
    pub(crate) fn new(
        physical_device: PhysicalDevice,
        handle: vk::Device,
        table: Arc<DeviceTable>,
        id: ObjectId,
    ) -> Self {
        Self {
            physical_device,
            handle,
            table,
            id,
        }
    }

    pub fn raw_device(&self) -> vk::Device {
        self.handle
    }

    pub fn table(&self) -> &DeviceTable {
        &self.table
    }

    pub fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }

    pub fn instance(&self) -> &Arc<Instance> {
        self.physical_device.instance()
    }

    pub fn registry(&self) -> &ObjectRegistry {
        self.instance().registry()
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Record a freshly created child of this device.
    pub(crate) fn register<H: vk::Handle + std::fmt::Debug + Copy>(
        &self,
        handle: H,
        parent: ObjectId,
    ) -> ObjectId {
        let id = self.registry().register(handle, parent, self.id);
        tracing::debug!("Created {:?} {:?} as {id}", H::TYPE, handle);
        id
    }

    /// Look up a command on this device.
    pub fn get_device_proc_addr(&self, name: &CStr) -> Result<vk::PFN_vkVoidFunction> {
        let get_device_proc_addr = self.instance().table().get_device_proc_addr()?;
        // SAFETY: live device of this instance; `name` is NUL-terminated.
        Ok(unsafe { get_device_proc_addr(self.handle, name.as_ptr()) })
    }

    /// Fetch queue `queue_index` of family `queue_family_index`.
    ///
    /// The pair must have been requested in the `VkDeviceCreateInfo`.
    /// Fetching the same queue twice yields the same registry entry.
    pub fn get_queue(
        self: &Arc<Self>,
        queue_family_index: u32,
        queue_index: u32,
    ) -> Result<Queue> {
        let get_device_queue = self.table.get_device_queue()?;
        let mut handle = vk::Queue::null();
        // SAFETY: live device; output is a live local.
        unsafe {
            get_device_queue(self.handle, queue_family_index, queue_index, &mut handle)
        };
        let id = self.registry().retrieve(handle, self.id, self.id);
        Ok(Queue {
            device: Arc::clone(self),
            handle,
            id,
            family_index: queue_family_index,
            index: queue_index,
        })
    }

    /// Block until every queue of this device is idle.
    pub fn wait_idle(&self) -> Result<()> {
        let device_wait_idle = self.table.device_wait_idle()?;
        // SAFETY: live device.
        result::check_plain(unsafe { device_wait_idle(self.handle) })
    }

    /// Wait for one or all of `fences`.
    ///
    /// `timeout` is in nanoseconds and forwarded verbatim. Expiry is the
    /// success variant `VK_TIMEOUT`, not an error.
    pub fn wait_for_fences(
        &self,
        fences: &[&Fence],
        wait_all: bool,
        timeout: u64,
    ) -> Result<Success> {
        let wait_for_fences = self.table.wait_for_fences()?;
        let raw: Vec<_> = fences.iter().map(|fence| fence.raw_fence()).collect();
        // SAFETY: live device; every fence was created from a device and
        // `raw` outlives the call.
        result::check(unsafe {
            wait_for_fences(
                self.handle,
                raw.len() as u32,
                raw.as_ptr(),
                if wait_all { vk::TRUE } else { vk::FALSE },
                timeout,
            )
        })
    }

    /// # Safety
    /// None of `fences` may be pending on a queue.
    pub unsafe fn reset_fences(&self, fences: &[&Fence]) -> Result<()> {
        let reset_fences = self.table.reset_fences()?;
        let raw: Vec<_> = fences.iter().map(|fence| fence.raw_fence()).collect();
        // SAFETY: caller guarantees no fence is pending; `raw` outlives the
        // call.
        result::check_plain(unsafe {
            reset_fences(self.handle, raw.len() as u32, raw.as_ptr())
        })
    }

    /// Destroy the device.
    ///
    /// Refused while any other `Arc<Device>` exists, which includes every
    /// queue and object created from it.
    ///
    /// # Safety
    /// No work may still be executing on the device's queues.
    pub unsafe fn destroy(self: Arc<Self>) -> Result<(), StillInUse<Self>> {
        let device = Arc::try_unwrap(self).map_err(StillInUse)?;
        tracing::debug!("Destroying device {:?}", device.handle);
        match device.table.destroy_device() {
            // SAFETY: sole owner, no children left, caller guarantees idle.
            Ok(destroy_device) => unsafe {
                destroy_device(device.handle, std::ptr::null())
            },
            Err(err) => tracing::error!("Leaking device: {err}"),
        }
        device.registry().release(device.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// A device queue. Queues are retrieved, not created, and live as long as
/// their device.
#[derive(Clone)]
pub struct Queue {
    device: Arc<Device>,
    handle: vk::Queue,
    id: ObjectId,
    family_index: u32,
    index: u32,
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("handle", &self.handle)
            .field("family_index", &self.family_index)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Queue {
    pub fn raw_queue(&self) -> vk::Queue {
        self.handle
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn family_index(&self) -> u32 {
        self.family_index
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Submit work, optionally signalling `fence` on completion.
    ///
    /// # Safety
    /// Every structure in `submits` must be valid and reference objects of
    /// this device. The queue must be externally synchronised.
    pub unsafe fn submit(
        &self,
        submits: &[vk::SubmitInfo<'_>],
        fence: Option<&Fence>,
    ) -> Result<()> {
        let queue_submit = self.device.table().queue_submit()?;
        let fence = fence.map_or(vk::Fence::null(), Fence::raw_fence);
        // SAFETY: caller guarantees the submit infos and synchronisation.
        result::check_plain(unsafe {
            queue_submit(self.handle, submits.len() as u32, submits.as_ptr(), fence)
        })
    }

    pub fn wait_idle(&self) -> Result<()> {
        let queue_wait_idle = self.device.table().queue_wait_idle()?;
        // SAFETY: live queue of a live device.
        result::check_plain(unsafe { queue_wait_idle(self.handle) })
    }

    /// Queue presentation of swapchain images.
    ///
    /// `VK_SUBOPTIMAL_KHR` comes back as a success variant;
    /// `VK_ERROR_OUT_OF_DATE_KHR` is an error.
    ///
    /// # Safety
    /// `present_info` must be valid and reference swapchains and semaphores
    /// of this device. The queue must be externally synchronised.
    pub unsafe fn present(
        &self,
        present_info: &vk::PresentInfoKHR<'_>,
    ) -> Result<Success> {
        let queue_present = self.device.table().queue_present_khr()?;
        // SAFETY: caller guarantees present_info and synchronisation.
        result::check(unsafe { queue_present(self.handle, present_info) })
    }
}
