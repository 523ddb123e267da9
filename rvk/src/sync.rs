//! Synchronisation primitives: [`Fence`], [`Semaphore`] and [`Event`].
//!
//! Status queries return the native success variants as plain booleans:
//! `VK_NOT_READY` for an unsignaled fence, `VK_EVENT_RESET` for an unset
//! event. Only negative codes are errors.

use std::sync::Arc;

use ash::vk;

use crate::{
    device::Device,
    error::Result,
    registry::ObjectId,
    result::{self, Success},
};

impl Device {
    /// Create a fence.
    ///
    /// `signaled` controls the initial state. Pass `true` so the first
    /// `wait` + `reset` cycle in a render loop returns immediately.
    pub fn create_fence(self: &Arc<Self>, signaled: bool) -> Result<Fence> {
        let create_fence = self.table().create_fence()?;
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::default().flags(flags);
        let mut handle = vk::Fence::null();
        // SAFETY: create_info is fully initialised with no borrowed pointers;
        // output is a live local.
        result::check(unsafe {
            create_fence(self.raw_device(), &create_info, std::ptr::null(), &mut handle)
        })?;
        Ok(Fence {
            parent: Arc::clone(self),
            handle,
            id: self.register(handle, self.id()),
        })
    }

    /// Create a binary semaphore.
    pub fn create_semaphore(self: &Arc<Self>) -> Result<Semaphore> {
        // SAFETY: a default create info has no chained structures.
        unsafe { self.create_semaphore_with(&vk::SemaphoreCreateInfo::default()) }
    }

    /// Create a timeline semaphore starting at `initial_value`.
    ///
    /// Needs Vulkan 1.2 or `VK_KHR_timeline_semaphore` with the
    /// `timelineSemaphore` feature enabled.
    pub fn create_timeline_semaphore(
        self: &Arc<Self>,
        initial_value: u64,
    ) -> Result<Semaphore> {
        let mut type_info = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(initial_value);
        let create_info =
            vk::SemaphoreCreateInfo::default().push_next(&mut type_info);
        // SAFETY: the chained type info outlives the call.
        unsafe { self.create_semaphore_with(&create_info) }
    }

    /// # Safety
    /// `create_info` and its `pNext` chain must be valid.
    unsafe fn create_semaphore_with(
        self: &Arc<Self>,
        create_info: &vk::SemaphoreCreateInfo<'_>,
    ) -> Result<Semaphore> {
        let create_semaphore = self.table().create_semaphore()?;
        let mut handle = vk::Semaphore::null();
        // SAFETY: caller guarantees create_info; output is a live local.
        result::check(unsafe {
            create_semaphore(self.raw_device(), create_info, std::ptr::null(), &mut handle)
        })?;
        Ok(Semaphore {
            parent: Arc::clone(self),
            handle,
            id: self.register(handle, self.id()),
        })
    }

    pub fn create_event(self: &Arc<Self>) -> Result<Event> {
        let create_event = self.table().create_event()?;
        let create_info = vk::EventCreateInfo::default();
        let mut handle = vk::Event::null();
        // SAFETY: create_info has no borrowed pointers; output is a live
        // local.
        result::check(unsafe {
            create_event(self.raw_device(), &create_info, std::ptr::null(), &mut handle)
        })?;
        Ok(Event {
            parent: Arc::clone(self),
            handle,
            id: self.register(handle, self.id()),
        })
    }
}

// ---------------------------------------------------------------------------
// Fence
// ---------------------------------------------------------------------------

/// A binary fence used for CPU–GPU synchronisation.
///
/// Use [`wait`](Self::wait) to block the CPU until the GPU signals the fence,
/// then [`reset`](Self::reset) to return it to the unsignaled state before
/// the next submission.
pub struct Fence {
    parent: Arc<Device>,
    handle: vk::Fence,
    id: ObjectId,
}

impl std::fmt::Debug for Fence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fence")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Fence {
    pub fn raw_fence(&self) -> vk::Fence {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Non-blocking status query.
    pub fn is_signaled(&self) -> Result<bool> {
        let get_fence_status = self.parent.table().get_fence_status()?;
        // SAFETY: handle was created from parent.
        let status = result::check(unsafe {
            get_fence_status(self.parent.raw_device(), self.handle)
        })?;
        Ok(status.is_complete())
    }

    /// Block until the fence is signaled or `timeout_ns` nanoseconds elapse.
    ///
    /// Pass `u64::MAX` to wait indefinitely. Expiry returns the
    /// `VK_TIMEOUT` success variant.
    pub fn wait(&self, timeout_ns: u64) -> Result<Success> {
        self.parent.wait_for_fences(&[self], true, timeout_ns)
    }

    /// Reset the fence to the unsignaled state.
    ///
    /// # Safety
    /// The fence must not be currently pending on any queue submission.
    pub unsafe fn reset(&self) -> Result<()> {
        // SAFETY: forwarded to the caller.
        unsafe { self.parent.reset_fences(&[self]) }
    }

    /// # Safety
    /// No queue submission may still reference this fence.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_fence = self
            .parent
            .table()
            .destroy_fence()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying fence {:?}", self.handle);
        // SAFETY: handle was created from parent; caller guarantees it is
        // unused. Consumed so never used again.
        unsafe {
            destroy_fence(self.parent.raw_device(), self.handle, std::ptr::null())
        };
        self.parent.registry().release(self.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Semaphore
// ---------------------------------------------------------------------------

/// A semaphore used for GPU–GPU synchronisation.
///
/// Binary semaphores are driven entirely by queue operations. Timeline
/// semaphores additionally expose their counter through
/// [`counter_value`](Self::counter_value).
pub struct Semaphore {
    parent: Arc<Device>,
    handle: vk::Semaphore,
    id: ObjectId,
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Semaphore {
    pub fn raw_semaphore(&self) -> vk::Semaphore {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Current counter of a timeline semaphore.
    pub fn counter_value(&self) -> Result<u64> {
        let get_counter_value = self.parent.table().get_semaphore_counter_value()?;
        let mut value = 0;
        // SAFETY: handle was created from parent; output is a live local.
        result::check(unsafe {
            get_counter_value(self.parent.raw_device(), self.handle, &mut value)
        })?;
        Ok(value)
    }

    /// # Safety
    /// No queue operation may still wait on or signal this semaphore.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_semaphore = self
            .parent
            .table()
            .destroy_semaphore()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying semaphore {:?}", self.handle);
        // SAFETY: handle was created from parent; caller guarantees it is
        // unused. Consumed so never used again.
        unsafe {
            destroy_semaphore(self.parent.raw_device(), self.handle, std::ptr::null())
        };
        self.parent.registry().release(self.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

pub struct Event {
    parent: Arc<Device>,
    handle: vk::Event,
    id: ObjectId,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Event {
    pub fn raw_event(&self) -> vk::Event {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn is_set(&self) -> Result<bool> {
        let get_event_status = self.parent.table().get_event_status()?;
        // SAFETY: handle was created from parent.
        let status = result::check(unsafe {
            get_event_status(self.parent.raw_device(), self.handle)
        })?;
        Ok(status.is_event_set())
    }

    pub fn set(&self) -> Result<()> {
        let set_event = self.parent.table().set_event()?;
        // SAFETY: handle was created from parent.
        result::check_plain(unsafe { set_event(self.parent.raw_device(), self.handle) })
    }

    pub fn reset(&self) -> Result<()> {
        let reset_event = self.parent.table().reset_event()?;
        // SAFETY: handle was created from parent.
        result::check_plain(unsafe {
            reset_event(self.parent.raw_device(), self.handle)
        })
    }

    /// # Safety
    /// No recorded command buffer that is pending may reference this event.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_event = self
            .parent
            .table()
            .destroy_event()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying event {:?}", self.handle);
        // SAFETY: handle was created from parent; caller guarantees it is
        // unused. Consumed so never used again.
        unsafe {
            destroy_event(self.parent.raw_device(), self.handle, std::ptr::null())
        };
        self.parent.registry().release(self.id);
        Ok(())
    }
}
