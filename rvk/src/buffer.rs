//! Buffers and device memory.
//!
//! [`Buffer`] and [`DeviceMemory`] are independent children of the device.
//! Binding memory to a buffer does not make one own the other: destroy the
//! buffer before freeing the memory bound to it.

use std::{ffi::c_void, sync::Arc};

use ash::vk;

use crate::{device::Device, error::Result, registry::ObjectId, result};

impl Device {
    /// # Safety
    /// `create_info` must be valid, including any queue family index array
    /// and `pNext` chain it points at.
    pub unsafe fn create_buffer(
        self: &Arc<Self>,
        create_info: &vk::BufferCreateInfo<'_>,
    ) -> Result<Buffer> {
        let create_buffer = self.table().create_buffer()?;
        let mut handle = vk::Buffer::null();
        // SAFETY: caller guarantees create_info; output is a live local.
        result::check(unsafe {
            create_buffer(self.raw_device(), create_info, std::ptr::null(), &mut handle)
        })?;
        Ok(Buffer {
            parent: Arc::clone(self),
            handle,
            size: create_info.size,
            id: self.register(handle, self.id()),
        })
    }

    /// # Safety
    /// `allocate_info` must be valid and name a memory type of this device.
    pub unsafe fn allocate_memory(
        self: &Arc<Self>,
        allocate_info: &vk::MemoryAllocateInfo<'_>,
    ) -> Result<DeviceMemory> {
        let allocate_memory = self.table().allocate_memory()?;
        let mut handle = vk::DeviceMemory::null();
        // SAFETY: caller guarantees allocate_info; output is a live local.
        result::check(unsafe {
            allocate_memory(
                self.raw_device(),
                allocate_info,
                std::ptr::null(),
                &mut handle,
            )
        })?;
        Ok(DeviceMemory {
            parent: Arc::clone(self),
            handle,
            size: allocate_info.allocation_size,
            id: self.register(handle, self.id()),
        })
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

pub struct Buffer {
    parent: Arc<Device>,
    handle: vk::Buffer,
    size: vk::DeviceSize,
    id: ObjectId,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.handle)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Buffer {
    pub fn raw_buffer(&self) -> vk::Buffer {
        self.handle
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn memory_requirements(&self) -> Result<vk::MemoryRequirements> {
        let get_requirements = self.parent.table().get_buffer_memory_requirements()?;
        let mut requirements = vk::MemoryRequirements::default();
        // SAFETY: handle was created from parent; output is a live local.
        unsafe {
            get_requirements(self.parent.raw_device(), self.handle, &mut requirements)
        };
        Ok(requirements)
    }

    /// # Safety
    /// The buffer must not already be bound, `memory` must come from the same
    /// device and `offset` must satisfy [`memory_requirements`](Self::memory_requirements).
    pub unsafe fn bind_memory(
        &self,
        memory: &DeviceMemory,
        offset: vk::DeviceSize,
    ) -> Result<()> {
        let bind_buffer_memory = self.parent.table().bind_buffer_memory()?;
        // SAFETY: caller guarantees the binding rules.
        result::check_plain(unsafe {
            bind_buffer_memory(
                self.parent.raw_device(),
                self.handle,
                memory.raw_memory(),
                offset,
            )
        })
    }

    /// # Safety
    /// No pending command buffer may reference this buffer.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_buffer = self
            .parent
            .table()
            .destroy_buffer()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying buffer {:?}", self.handle);
        // SAFETY: handle was created from parent; caller guarantees it is
        // unused. Consumed so never used again.
        unsafe {
            destroy_buffer(self.parent.raw_device(), self.handle, std::ptr::null())
        };
        self.parent.registry().release(self.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DeviceMemory
// ---------------------------------------------------------------------------

pub struct DeviceMemory {
    parent: Arc<Device>,
    handle: vk::DeviceMemory,
    size: vk::DeviceSize,
    id: ObjectId,
}

impl std::fmt::Debug for DeviceMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceMemory")
            .field("handle", &self.handle)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl DeviceMemory {
    pub fn raw_memory(&self) -> vk::DeviceMemory {
        self.handle
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Map `size` bytes at `offset` into host address space.
    ///
    /// Pass `vk::WHOLE_SIZE` to map to the end of the allocation.
    ///
    /// # Safety
    /// The memory must be host-visible and not already mapped. The returned
    /// pointer is valid until [`unmap`](Self::unmap).
    pub unsafe fn map(
        &self,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<*mut c_void> {
        let map_memory = self.parent.table().map_memory()?;
        let mut data = std::ptr::null_mut();
        // SAFETY: caller guarantees the mapping rules; output is a live
        // local.
        result::check(unsafe {
            map_memory(
                self.parent.raw_device(),
                self.handle,
                offset,
                size,
                vk::MemoryMapFlags::empty(),
                &mut data,
            )
        })?;
        Ok(data)
    }

    /// # Safety
    /// The memory must be mapped and no pointer from [`map`](Self::map) may
    /// be used afterwards.
    pub unsafe fn unmap(&self) -> Result<()> {
        let unmap_memory = self.parent.table().unmap_memory()?;
        // SAFETY: caller guarantees the memory is mapped.
        unsafe { unmap_memory(self.parent.raw_device(), self.handle) };
        Ok(())
    }

    /// Bytes currently committed for a lazily allocated memory object.
    pub fn commitment(&self) -> Result<vk::DeviceSize> {
        let get_commitment = self.parent.table().get_device_memory_commitment()?;
        let mut committed = 0;
        // SAFETY: handle was created from parent; output is a live local.
        unsafe {
            get_commitment(self.parent.raw_device(), self.handle, &mut committed)
        };
        Ok(committed)
    }

    /// # Safety
    /// Every buffer bound to this memory must be destroyed first and no
    /// pending work may reference it.
    pub unsafe fn free(self) -> Result<()> {
        let free_memory = self
            .parent
            .table()
            .free_memory()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Freeing device memory {:?}", self.handle);
        // SAFETY: handle was allocated from parent; caller guarantees it is
        // unused. Consumed so never used again.
        unsafe { free_memory(self.parent.raw_device(), self.handle, std::ptr::null()) };
        self.parent.registry().release(self.id);
        Ok(())
    }
}
