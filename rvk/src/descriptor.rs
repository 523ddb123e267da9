//! Descriptor set layouts, descriptor pools and the sets allocated from them.
//!
//! [`DescriptorSetLayout`] describes the binding slots within a descriptor
//! set. [`DescriptorPool`] allocates [`DescriptorSet`]s in batches; every
//! set remembers its pool so a batch free can refuse sets from elsewhere.
//! Resetting or destroying the pool reclaims all of its sets.

use std::sync::Arc;

use ash::vk;

use crate::{
    device::Device,
    error::{Error, NotFreed, Result},
    registry::ObjectId,
    result,
};

// ---------------------------------------------------------------------------
// DescriptorBindingDesc
// ---------------------------------------------------------------------------

/// Describes a single binding within a descriptor set layout.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorBindingDesc {
    /// Binding slot index used by the shader.
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    /// Array length of the binding.
    pub count: u32,
    pub stage_flags: vk::ShaderStageFlags,
}

impl From<DescriptorBindingDesc> for vk::DescriptorSetLayoutBinding<'static> {
    fn from(b: DescriptorBindingDesc) -> Self {
        vk::DescriptorSetLayoutBinding::default()
            .binding(b.binding)
            .descriptor_type(b.descriptor_type)
            .descriptor_count(b.count)
            .stage_flags(b.stage_flags)
    }
}

impl Device {
    pub fn create_descriptor_set_layout(
        self: &Arc<Self>,
        bindings: &[DescriptorBindingDesc],
    ) -> Result<DescriptorSetLayout> {
        let create_layout = self.table().create_descriptor_set_layout()?;
        let vk_bindings: Vec<vk::DescriptorSetLayoutBinding<'_>> =
            bindings.iter().copied().map(Into::into).collect();
        let create_info =
            vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);
        let mut handle = vk::DescriptorSetLayout::null();
        // SAFETY: create_info references `vk_bindings`, which outlives the
        // call; output is a live local.
        result::check(unsafe {
            create_layout(self.raw_device(), &create_info, std::ptr::null(), &mut handle)
        })?;
        Ok(DescriptorSetLayout {
            parent: Arc::clone(self),
            handle,
            id: self.register(handle, self.id()),
        })
    }

    /// Create a descriptor pool whose sets can be freed individually.
    ///
    /// `max_sets` bounds the number of live sets; `pool_sizes` bounds the
    /// descriptors of each type.
    pub fn create_descriptor_pool(
        self: &Arc<Self>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> Result<DescriptorPool> {
        let create_pool = self.table().create_descriptor_pool()?;
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes)
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET);
        let mut handle = vk::DescriptorPool::null();
        // SAFETY: create_info references `pool_sizes` for the duration of
        // the call; output is a live local.
        result::check(unsafe {
            create_pool(self.raw_device(), &create_info, std::ptr::null(), &mut handle)
        })?;
        Ok(DescriptorPool {
            parent: Arc::clone(self),
            handle,
            id: self.register(handle, self.id()),
        })
    }
}

// ---------------------------------------------------------------------------
// DescriptorSetLayout
// ---------------------------------------------------------------------------

pub struct DescriptorSetLayout {
    parent: Arc<Device>,
    handle: vk::DescriptorSetLayout,
    id: ObjectId,
}

impl std::fmt::Debug for DescriptorSetLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorSetLayout")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl DescriptorSetLayout {
    pub fn raw_descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// # Safety
    /// No pending work may use a set allocated with this layout.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_layout = self
            .parent
            .table()
            .destroy_descriptor_set_layout()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying descriptor set layout {:?}", self.handle);
        // SAFETY: created from parent; caller guarantees it is unused.
        // Consumed so never used again.
        unsafe { destroy_layout(self.parent.raw_device(), self.handle, std::ptr::null()) };
        self.parent.registry().release(self.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DescriptorPool
// ---------------------------------------------------------------------------

pub struct DescriptorPool {
    parent: Arc<Device>,
    handle: vk::DescriptorPool,
    id: ObjectId,
}

impl std::fmt::Debug for DescriptorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorPool")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl DescriptorPool {
    pub fn raw_descriptor_pool(&self) -> vk::DescriptorPool {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Allocate one descriptor set per layout, in a single native call.
    pub fn allocate_descriptor_sets(
        &mut self,
        layouts: &[&DescriptorSetLayout],
    ) -> Result<Vec<DescriptorSet>> {
        if layouts.is_empty() {
            return Ok(Vec::new());
        }
        let allocate_sets = self.parent.table().allocate_descriptor_sets()?;
        let raw_layouts: Vec<_> = layouts
            .iter()
            .map(|layout| layout.raw_descriptor_set_layout())
            .collect();
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.handle)
            .set_layouts(&raw_layouts);
        let mut handles = vec![vk::DescriptorSet::null(); raw_layouts.len()];
        // SAFETY: allocate_info references this pool and `raw_layouts`;
        // `handles` holds one element per layout.
        result::check(unsafe {
            allocate_sets(self.parent.raw_device(), &allocate_info, handles.as_mut_ptr())
        })?;

        let batch_len = handles.len() as u32;
        let registry = self.parent.registry();
        Ok(handles
            .into_iter()
            .map(|handle| DescriptorSet {
                parent: Arc::clone(&self.parent),
                handle,
                id: registry.allocate(handle, self.id, self.parent.id()),
                pool: self.id,
                batch_len,
            })
            .collect())
    }

    /// Return every set to the pool.
    ///
    /// # Safety
    /// No pending work may use a set of this pool, and none of the sets may
    /// be used afterwards.
    pub unsafe fn reset(&mut self) -> Result<()> {
        let reset_pool = self.parent.table().reset_descriptor_pool()?;
        // SAFETY: caller guarantees the sets are unused.
        result::check_plain(unsafe {
            reset_pool(
                self.parent.raw_device(),
                self.handle,
                vk::DescriptorPoolResetFlags::empty(),
            )
        })?;
        let reclaimed = self.parent.registry().release_allocations(self.id);
        tracing::debug!(
            "Reset descriptor pool {:?}, reclaiming {reclaimed} set(s)",
            self.handle
        );
        Ok(())
    }

    /// Free `sets` with a single native call.
    ///
    /// Every set must have been allocated from this pool; otherwise
    /// [`Error::NotOwnedBy`] is returned and nothing is freed. On any error,
    /// including a failed native call, the sets come back in [`NotFreed`]
    /// still registered.
    ///
    /// # Safety
    /// No pending work may use any of the sets.
    pub unsafe fn free_descriptor_sets(
        &mut self,
        sets: Vec<DescriptorSet>,
    ) -> Result<(), NotFreed<DescriptorSet>> {
        if let Some(foreign) = sets.iter().find(|set| set.pool != self.id) {
            let error = Error::NotOwnedBy {
                object: foreign.id,
                owner: self.id,
            };
            return Err(NotFreed {
                error,
                objects: sets,
            });
        }
        if sets.is_empty() {
            return Ok(());
        }
        let free_sets = match self.parent.table().free_descriptor_sets() {
            Ok(f) => f,
            Err(error) => return Err(NotFreed { error, objects: sets }),
        };
        let raw: Vec<_> = sets.iter().map(|set| set.handle).collect();
        // SAFETY: every set came from this pool, which was created with
        // FREE_DESCRIPTOR_SET; caller guarantees they are unused.
        let status = result::check_plain(unsafe {
            free_sets(
                self.parent.raw_device(),
                self.handle,
                raw.len() as u32,
                raw.as_ptr(),
            )
        });
        if let Err(error) = status {
            return Err(NotFreed { error, objects: sets });
        }
        let registry = self.parent.registry();
        for set in &sets {
            registry.release(set.id);
        }
        Ok(())
    }

    /// Destroy the pool, implicitly freeing every set still allocated from
    /// it.
    ///
    /// # Safety
    /// No pending work may use a set of this pool.
    pub unsafe fn destroy(self) -> Result<()> {
        let destroy_pool = self
            .parent
            .table()
            .destroy_descriptor_pool()
            .map_err(|err| self.parent.registry().release_leaked(self.id, err))?;
        tracing::debug!("Destroying descriptor pool {:?}", self.handle);
        // SAFETY: created from parent; caller guarantees its sets are
        // unused. Consumed so never used again.
        unsafe { destroy_pool(self.parent.raw_device(), self.handle, std::ptr::null()) };
        self.parent.registry().release(self.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DescriptorSet
// ---------------------------------------------------------------------------

/// A descriptor set allocated from a [`DescriptorPool`].
///
/// Sets must not be used after their pool has been reset or destroyed.
pub struct DescriptorSet {
    parent: Arc<Device>,
    handle: vk::DescriptorSet,
    id: ObjectId,
    pool: ObjectId,
    batch_len: u32,
}

impl std::fmt::Debug for DescriptorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorSet")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl DescriptorSet {
    pub fn raw_descriptor_set(&self) -> vk::DescriptorSet {
        self.handle
    }

    pub fn parent(&self) -> &Arc<Device> {
        &self.parent
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn pool(&self) -> ObjectId {
        self.pool
    }

    pub fn batch_len(&self) -> u32 {
        self.batch_len
    }
}
