//! Command pools and the command buffers allocated from them.
//!
//! Command buffers are allocated in batches and freed in batches. A
//! [`CommandBuffer`] remembers the pool it came from and the size of the
//! batch it was allocated in; [`CommandPool::free_command_buffers`] refuses
//! buffers from any other pool before making its single native call.
//! Destroying or resetting the pool reclaims every buffer it still has
//! out; those values must not be used afterwards.

use std::sync::Arc;

use ash::vk;

use crate::{
    buffer::Buffer,
    device::Device,
    error::{Error, NotFreed, Result},
    registry::ObjectId,
    result,
};

impl Device {
    pub fn create_command_pool(
        self: &Arc<Self>,
        queue_family_index: u32,
        flags: vk::CommandPoolCreateFlags,
    ) -> Result<CommandPool> {
        let create_command_pool = self.table().create_command_pool()?;
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(flags);
        let mut handle = vk::CommandPool::null();
        // SAFETY: create_info has no borrowed pointers; output is a live
        // local.
        result::check(unsafe {
            create_command_pool(
                self.raw_device(),
                &create_info,
                std::ptr::null(),
                &mut handle,
            )
        })?;
        Ok(CommandPool {
            parent: Arc::clone(self),
            handle,
            id: self.register(handle, self.id()),
            queue_family_index,
        })
    }
}

// ---------------------------------------------------------------------------
// CommandPool
// ---------------------------------------------------------------------------

pub struct CommandPool {
    parent: Arc<Device>,
    handle: vk::CommandPool,
    id: ObjectId,
    queue_family_index: u32,
}

impl std::fmt::Debug for CommandPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPool")
            .field("handle", &self.handle)
            .field("queue_family_index", &self.queue_family_index)
            .finish_non_exhaustive()
    }
}

impl CommandPool {
    pub fn raw_command_pool(&self) -> vk::CommandPool {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Allocate `count` command buffers in one native call.
    ///
    /// The pool must be externally synchronised, which `&mut self` enforces.
    pub fn allocate_command_buffers(
        &mut self,
        level: vk::CommandBufferLevel,
        count: u32,
    ) -> Result<Vec<CommandBuffer>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let allocate_command_buffers =
            self.parent.table().allocate_command_buffers()?;
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.handle)
            .level(level)
            .command_buffer_count(count);
        let mut handles = vec![vk::CommandBuffer::null(); count as usize];
        // SAFETY: allocate_info names this pool; `handles` holds `count`
        // elements.
        result::check(unsafe {
            allocate_command_buffers(
                self.parent.raw_device(),
                &allocate_info,
                handles.as_mut_ptr(),
            )
        })?;

        let registry = self.parent.registry();
        tracing::debug!(
            "Allocated {count} command buffer(s) from pool {:?}",
            self.handle
        );
        Ok(handles
            .into_iter()
            .map(|handle| CommandBuffer {
                parent: Arc::clone(&self.parent),
                handle,
                id: registry.allocate(handle, self.id, self.parent.id()),
                pool: self.id,
                batch_len: count,
                level,
            })
            .collect())
    }

    /// Return every command buffer of the pool to the initial state.
    ///
    /// # Safety
    /// No command buffer of this pool may be pending.
    pub unsafe fn reset(&mut self, flags: vk::CommandPoolResetFlags) -> Result<()> {
        let reset_command_pool = self.parent.table().reset_command_pool()?;
        // SAFETY: caller guarantees nothing is pending.
        result::check_plain(unsafe {
            reset_command_pool(self.parent.raw_device(), self.handle, flags)
        })
    }

    /// Free `command_buffers` with a single native call.
    ///
    /// Every buffer must have been allocated from this pool; otherwise
    /// [`Error::NotOwnedBy`] is returned and nothing is freed. On any error
    /// the buffers come back in [`NotFreed`], still allocated and still
    /// registered.
    ///
    /// # Safety
    /// None of the buffers may be pending.
    pub unsafe fn free_command_buffers(
        &mut self,
        command_buffers: Vec<CommandBuffer>,
    ) -> Result<(), NotFreed<CommandBuffer>> {
        if let Some(foreign) = command_buffers.iter().find(|cb| cb.pool != self.id) {
            let error = Error::NotOwnedBy {
                object: foreign.id,
                owner: self.id,
            };
            return Err(NotFreed {
                error,
                objects: command_buffers,
            });
        }
        if command_buffers.is_empty() {
            return Ok(());
        }
        let free_command_buffers = match self.parent.table().free_command_buffers() {
            Ok(f) => f,
            Err(error) => {
                return Err(NotFreed {
                    error,
                    objects: command_buffers,
                });
            }
        };
        let raw: Vec<_> = command_buffers.iter().map(|cb| cb.handle).collect();
        tracing::debug!(
            "Freeing {} command buffer(s) from pool {:?}",
            raw.len(),
            self.handle
        );
        // SAFETY: every buffer came from this pool; caller guarantees none
        // is pending. The values are consumed so never used again.
        unsafe {
            free_command_buffers(
                self.parent.raw_device(),
                self.handle,
                raw.len() as u32,
                raw.as_ptr(),
            )
        };
        let registry = self.parent.registry();
        for command_buffer in &command_buffers {
            registry.release(command_buffer.id);
        }
        Ok(())
    }

    /// Destroy the pool, implicitly freeing every buffer still allocated
    /// from it.
    ///
    /// # Safety
    /// No command buffer of this pool may be pending, and none may be used
    /// after this call.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_command_pool = self
            .parent
            .table()
            .destroy_command_pool()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying command pool {:?}", self.handle);
        // SAFETY: caller guarantees nothing is pending. Consumed so never
        // used again.
        unsafe {
            destroy_command_pool(self.parent.raw_device(), self.handle, std::ptr::null())
        };
        self.parent.registry().release(self.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

pub struct CommandBuffer {
    parent: Arc<Device>,
    handle: vk::CommandBuffer,
    id: ObjectId,
    pool: ObjectId,
    batch_len: u32,
    level: vk::CommandBufferLevel,
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("handle", &self.handle)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl CommandBuffer {
    pub fn raw_command_buffer(&self) -> vk::CommandBuffer {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Registry id of the pool this buffer was allocated from.
    pub fn pool(&self) -> ObjectId {
        self.pool
    }

    /// Number of buffers allocated together with this one.
    pub fn batch_len(&self) -> u32 {
        self.batch_len
    }

    pub fn level(&self) -> vk::CommandBufferLevel {
        self.level
    }

    /// # Safety
    /// The buffer must not be recording or pending, and `begin_info` must be
    /// valid (including inheritance info for secondary buffers).
    pub unsafe fn begin(
        &mut self,
        begin_info: &vk::CommandBufferBeginInfo<'_>,
    ) -> Result<()> {
        let begin_command_buffer = self.parent.table().begin_command_buffer()?;
        // SAFETY: caller guarantees state and begin_info.
        result::check_plain(unsafe { begin_command_buffer(self.handle, begin_info) })
    }

    /// # Safety
    /// The buffer must be recording.
    pub unsafe fn end(&mut self) -> Result<()> {
        let end_command_buffer = self.parent.table().end_command_buffer()?;
        // SAFETY: caller guarantees the buffer is recording.
        result::check_plain(unsafe { end_command_buffer(self.handle) })
    }

    /// # Safety
    /// The pool must have been created with `RESET_COMMAND_BUFFER` and the
    /// buffer must not be pending.
    pub unsafe fn reset(&mut self, flags: vk::CommandBufferResetFlags) -> Result<()> {
        let reset_command_buffer = self.parent.table().reset_command_buffer()?;
        // SAFETY: caller guarantees the pool flag and state.
        result::check_plain(unsafe { reset_command_buffer(self.handle, flags) })
    }

    /// Record a fill of `size` bytes of `buffer` at `offset` with `data`.
    ///
    /// # Safety
    /// The buffer must be recording, and `buffer` must have `TRANSFER_DST`
    /// usage with `offset`/`size` aligned to 4 bytes.
    pub unsafe fn fill_buffer(
        &mut self,
        buffer: &Buffer,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
        data: u32,
    ) -> Result<()> {
        let cmd_fill_buffer = self.parent.table().cmd_fill_buffer()?;
        // SAFETY: caller guarantees recording state and usage.
        unsafe { cmd_fill_buffer(self.handle, buffer.raw_buffer(), offset, size, data) };
        Ok(())
    }

    /// # Safety
    /// The buffer must be recording and every region must lie inside both
    /// buffers, with `src` usable as `TRANSFER_SRC` and `dst` as
    /// `TRANSFER_DST`.
    pub unsafe fn copy_buffer(
        &mut self,
        src: &Buffer,
        dst: &Buffer,
        regions: &[vk::BufferCopy],
    ) -> Result<()> {
        let cmd_copy_buffer = self.parent.table().cmd_copy_buffer()?;
        // SAFETY: caller guarantees recording state and regions.
        unsafe {
            cmd_copy_buffer(
                self.handle,
                src.raw_buffer(),
                dst.raw_buffer(),
                regions.len() as u32,
                regions.as_ptr(),
            )
        };
        Ok(())
    }
}
