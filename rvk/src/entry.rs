//! The loader-level root container.
//!
//! An [`Entry`] owns the loaded Vulkan library (when it opened one), the
//! `vkGetInstanceProcAddr` taken from it, the global dispatch table and the
//! object registry shared by everything created below it.

use std::{
    ffi::{CStr, c_char},
    sync::Arc,
};

use ash::vk;
use thiserror::Error;

use crate::{
    config::EntryConfig,
    dispatch::{EntryTable, InstanceTable},
    enumerate::enumerate,
    error::{Result, StillInUse},
    instance::{Instance, VkVersion},
    registry::{ObjectId, ObjectRegistry},
    result,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not open the Vulkan library: {0}")]
    Library(libloading::Error),
    #[error("The Vulkan library does not export vkGetInstanceProcAddr: {0}")]
    MissingEntryPoint(libloading::Error),
}

pub struct Entry {
    // Kept alive for as long as any resolved pointer can be called.
    _library: Option<libloading::Library>,
    get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    table: Arc<EntryTable>,
    registry: Arc<ObjectRegistry>,
    id: ObjectId,
    config: EntryConfig,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("library", &self.config.library())
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Entry {
    /// Open the platform's default Vulkan library.
    ///
    /// # Safety
    /// Loading a shared library runs its initialisers, which can execute
    /// arbitrary code.
    pub unsafe fn load() -> Result<Arc<Self>, LoadError> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::load_with(EntryConfig::default()) }
    }

    /// Open the library named by `config` and resolve the global commands.
    ///
    /// # Safety
    /// Same as [`load`](Self::load). The library must be a Vulkan loader or
    /// ICD with a conforming `vkGetInstanceProcAddr`.
    pub unsafe fn load_with(config: EntryConfig) -> Result<Arc<Self>, LoadError> {
        tracing::debug!("Loading Vulkan from {:?}", config.library());
        // SAFETY: forwarded to the caller.
        let library = unsafe { libloading::Library::new(config.library()) }
            .map_err(LoadError::Library)?;

        // SAFETY: vkGetInstanceProcAddr has this signature in every
        // conforming loader. The fn pointer is copied out of the symbol and
        // the library is stored next to it below.
        let get_instance_proc_addr = unsafe {
            *library
                .get::<vk::PFN_vkGetInstanceProcAddr>(b"vkGetInstanceProcAddr\0")
                .map_err(LoadError::MissingEntryPoint)?
        };

        // SAFETY: the resolver was just taken from a loaded Vulkan library.
        let entry = unsafe { Self::new(Some(library), get_instance_proc_addr, config) };
        Ok(Arc::new(entry))
    }

    /// Build an entry around a resolver the caller already has, e.g. one
    /// exported by a statically linked loader.
    ///
    /// # Safety
    /// `get_instance_proc_addr` must behave like `vkGetInstanceProcAddr` and
    /// stay callable for as long as the entry and its descendants exist.
    pub unsafe fn from_resolver(
        get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
        config: EntryConfig,
    ) -> Arc<Self> {
        // SAFETY: forwarded to the caller.
        Arc::new(unsafe { Self::new(None, get_instance_proc_addr, config) })
    }

    unsafe fn new(
        library: Option<libloading::Library>,
        get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
        config: EntryConfig,
    ) -> Self {
        // SAFETY: callers guarantee the resolver.
        let table = unsafe { EntryTable::load_global(get_instance_proc_addr) };
        for name in table.missing() {
            tracing::debug!("Global command {name:?} is not exposed");
        }
        let registry = Arc::new(ObjectRegistry::new());
        let id = registry.register_root();
        Self {
            _library: library,
            get_instance_proc_addr,
            table: Arc::new(table),
            registry,
            id,
            config,
        }
    }

    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EntryConfig {
        &self.config
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn raw_get_instance_proc_addr(&self) -> vk::PFN_vkGetInstanceProcAddr {
        self.get_instance_proc_addr
    }

    /// Look up a global command by name.
    pub fn get_instance_proc_addr(&self, name: &CStr) -> vk::PFN_vkVoidFunction {
        // SAFETY: the resolver is valid for the lifetime of the entry and
        // `name` is NUL-terminated.
        unsafe { (self.get_instance_proc_addr)(vk::Instance::null(), name.as_ptr()) }
    }

    /// Highest instance-level API version the loader supports.
    ///
    /// Vulkan 1.0 loaders do not export `vkEnumerateInstanceVersion`; that is
    /// reported as 1.0 rather than as an error.
    pub fn instance_version(&self) -> Result<VkVersion> {
        let Ok(enumerate_instance_version) = self.table.enumerate_instance_version()
        else {
            return Ok(VkVersion::from_raw(vk::API_VERSION_1_0));
        };
        let mut version = 0;
        // SAFETY: the output pointer is a live local.
        result::check(unsafe { enumerate_instance_version(&mut version) })?;
        Ok(VkVersion::from_raw(version))
    }

    pub fn enumerate_instance_layer_properties(
        &self,
    ) -> Result<Vec<vk::LayerProperties>> {
        let enumerate_layers = self.table.enumerate_instance_layer_properties()?;
        enumerate(self.config.enumeration, |count, data| {
            // SAFETY: the enumerator hands out a valid count and a null or
            // correctly sized buffer.
            unsafe { enumerate_layers(count, data) }
        })
    }

    /// Instance extensions, either those of the implementation (`None`) or
    /// those provided by `layer`.
    pub fn enumerate_instance_extension_properties(
        &self,
        layer: Option<&CStr>,
    ) -> Result<Vec<vk::ExtensionProperties>> {
        let enumerate_extensions =
            self.table.enumerate_instance_extension_properties()?;
        let layer: *const c_char =
            layer.map_or(std::ptr::null(), CStr::as_ptr);
        enumerate(self.config.enumeration, |count, data| {
            // SAFETY: `layer` is null or borrowed for the whole call; the
            // enumerator hands out a valid count and buffer.
            unsafe { enumerate_extensions(layer, count, data) }
        })
    }

    /// Create an instance and resolve its dispatch table.
    ///
    /// # Safety
    /// `create_info` must be a valid `VkInstanceCreateInfo`, including every
    /// structure and string it points at.
    pub unsafe fn create_instance(
        self: &Arc<Self>,
        create_info: &vk::InstanceCreateInfo<'_>,
    ) -> Result<Arc<Instance>> {
        let create_instance = self.table.create_instance()?;
        let mut handle = vk::Instance::null();
        // SAFETY: caller guarantees create_info; the output is a live local.
        result::check(unsafe {
            create_instance(create_info, std::ptr::null(), &mut handle)
        })?;

        // SAFETY: `handle` was just created through this resolver.
        let table =
            unsafe { InstanceTable::load_for(self.get_instance_proc_addr, handle) };
        for name in table.missing() {
            tracing::debug!("Instance command {name:?} is not exposed");
        }

        let api_version = if create_info.p_application_info.is_null() {
            vk::API_VERSION_1_0
        } else {
            // SAFETY: caller guarantees the application info is valid.
            match unsafe { (*create_info.p_application_info).api_version } {
                0 => vk::API_VERSION_1_0,
                version => version,
            }
        };

        let id = self.registry.register_scope(handle, self.id);
        tracing::debug!("Created instance {:?} as {id}", handle);
        Ok(Arc::new(Instance::new(
            Arc::clone(self),
            handle,
            Arc::new(table),
            id,
            VkVersion::from_raw(api_version),
        )))
    }

    /// Release the entry and unload the library.
    ///
    /// Refused while any instance created from it is still alive.
    pub fn destroy(self: Arc<Self>) -> Result<(), StillInUse<Self>> {
        let entry = Arc::try_unwrap(self).map_err(StillInUse)?;
        tracing::debug!("Dropping entry {}", entry.id);
        entry.registry.release(entry.id);
        Ok(())
    }
}
