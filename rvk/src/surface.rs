//! `VkSurfaceKHR`, a child of the instance.
//!
//! Surfaces are created through [`Instance::create_headless_surface`] and
//! queried through [`PhysicalDevice`](crate::physical_device::PhysicalDevice).

use std::sync::Arc;

use ash::vk;

use crate::{error::Result, instance::Instance, registry::ObjectId};

pub struct Surface {
    instance: Arc<Instance>,
    handle: vk::SurfaceKHR,
    id: ObjectId,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Surface {
    pub(crate) fn new(
        instance: Arc<Instance>,
        handle: vk::SurfaceKHR,
        id: ObjectId,
    ) -> Self {
        Self {
            instance,
            handle,
            id,
        }
    }

    pub fn raw_surface(&self) -> vk::SurfaceKHR {
        self.handle
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// # Safety
    /// Every swapchain created for this surface must already be destroyed.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_surface = self
            .instance
            .table()
            .destroy_surface_khr()
            .map_err(|err| self.instance.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying surface {:?}", self.handle);
        // SAFETY: created from this instance; caller guarantees no
        // swapchains remain. Consumed so never used again.
        unsafe {
            destroy_surface(self.instance.raw_instance(), self.handle, std::ptr::null())
        };
        self.instance.registry().release(self.id);
        Ok(())
    }
}
