//! `VkSwapchainKHR`, a device child presenting to an instance-level
//! [`Surface`].

use std::sync::Arc;

use ash::vk;

use crate::{
    device::Device,
    enumerate::enumerate,
    error::Result,
    registry::ObjectId,
    result::{self, Success},
    surface::Surface,
    sync::{Fence, Semaphore},
};

impl Device {
    /// Create a swapchain for `surface`.
    ///
    /// `create_info.surface` is overwritten with `surface`; everything else
    /// is forwarded as given.
    ///
    /// # Safety
    /// `create_info` must be valid for this surface (see
    /// [`PhysicalDevice::surface_capabilities`](crate::physical_device::PhysicalDevice::surface_capabilities)),
    /// including any old swapchain and queue family array it names. The
    /// surface must outlive the swapchain.
    pub unsafe fn create_swapchain(
        self: &Arc<Self>,
        surface: &Surface,
        create_info: vk::SwapchainCreateInfoKHR<'_>,
    ) -> Result<Swapchain> {
        let create_swapchain = self.table().create_swapchain_khr()?;
        let create_info = create_info.surface(surface.raw_surface());
        let mut handle = vk::SwapchainKHR::null();
        // SAFETY: caller guarantees create_info; output is a live local.
        result::check(unsafe {
            create_swapchain(self.raw_device(), &create_info, std::ptr::null(), &mut handle)
        })?;
        Ok(Swapchain {
            parent: Arc::clone(self),
            handle,
            id: self.register(handle, self.id()),
            surface: surface.id(),
            extent: create_info.image_extent,
            format: create_info.image_format,
        })
    }
}

pub struct Swapchain {
    parent: Arc<Device>,
    handle: vk::SwapchainKHR,
    id: ObjectId,
    surface: ObjectId,
    extent: vk::Extent2D,
    format: vk::Format,
}

impl std::fmt::Debug for Swapchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Swapchain")
            .field("handle", &self.handle)
            .field("extent", &self.extent)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Swapchain {
    pub fn raw_swapchain(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Registry id of the surface this swapchain presents to.
    pub fn surface(&self) -> ObjectId {
        self.surface
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// The presentable images, owned by the swapchain.
    pub fn images(&self) -> Result<Vec<vk::Image>> {
        let get_images = self.parent.table().get_swapchain_images_khr()?;
        let policy = self.parent.instance().entry().config().enumeration;
        enumerate(policy, |count, data| {
            // SAFETY: live swapchain; `enumerate` hands out a valid count
            // and a buffer of `*count` elements (or null).
            unsafe { get_images(self.parent.raw_device(), self.handle, count, data) }
        })
    }

    /// Acquire the next presentable image, signalling `semaphore` and/or
    /// `fence` once it is ready.
    ///
    /// `VK_TIMEOUT`, `VK_NOT_READY` and `VK_SUBOPTIMAL_KHR` come back as
    /// success variants; the image index is only meaningful for
    /// `VK_SUCCESS` and `VK_SUBOPTIMAL_KHR`.
    ///
    /// # Safety
    /// The swapchain must be externally synchronised, and `semaphore` must
    /// have no pending signal.
    pub unsafe fn acquire_next_image(
        &self,
        timeout_ns: u64,
        semaphore: Option<&Semaphore>,
        fence: Option<&Fence>,
    ) -> Result<(u32, Success)> {
        let acquire_next_image = self.parent.table().acquire_next_image_khr()?;
        let semaphore = semaphore.map_or(vk::Semaphore::null(), Semaphore::raw_semaphore);
        let fence = fence.map_or(vk::Fence::null(), Fence::raw_fence);
        let mut index = 0;
        // SAFETY: caller guarantees synchronisation; output is a live local.
        let status = result::check(unsafe {
            acquire_next_image(
                self.parent.raw_device(),
                self.handle,
                timeout_ns,
                semaphore,
                fence,
                &mut index,
            )
        })?;
        Ok((index, status))
    }

    /// # Safety
    /// No acquired image may still be in use by pending work.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_swapchain = self
            .parent
            .table()
            .destroy_swapchain_khr()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying swapchain {:?}", self.handle);
        // SAFETY: created from parent; caller guarantees its images are
        // idle. Consumed so never used again.
        unsafe {
            destroy_swapchain(self.parent.raw_device(), self.handle, std::ptr::null())
        };
        self.parent.registry().release(self.id);
        Ok(())
    }
}
