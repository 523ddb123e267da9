#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::undocumented_unsafe_blocks)]

use std::{
    ffi::{CStr, c_char},
    fs::{self, File},
    num::NonZeroU32,
    path::PathBuf,
    sync::Arc,
};

use clap::Parser;
use rvk::{
    ash::vk,
    config::{EntryConfig, EnumerationPolicy},
    device::Device,
    entry::Entry,
    instance::{Instance, VkVersion},
    log::VulkanLogLevel,
    physical_device::PhysicalDevice,
};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, clap::ValueEnum)]
enum TracingLogLevel {
    Off,
    Trace,
    Info,
    Debug,
    Warn,
    #[default]
    Error,
}

impl From<TracingLogLevel> for tracing::Level {
    fn from(value: TracingLogLevel) -> Self {
        match value {
            //We clamp this to the lowest possible level but this shouldn't happen
            TracingLogLevel::Off => tracing::Level::TRACE,
            TracingLogLevel::Trace => tracing::Level::TRACE,
            TracingLogLevel::Info => tracing::Level::INFO,
            TracingLogLevel::Debug => tracing::Level::DEBUG,
            TracingLogLevel::Warn => tracing::Level::WARN,
            TracingLogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliVulkanLogLevel {
    Verbose,
    Info,
    Warning,
    Error,
}

impl From<CliVulkanLogLevel> for VulkanLogLevel {
    fn from(value: CliVulkanLogLevel) -> Self {
        match value {
            CliVulkanLogLevel::Verbose => VulkanLogLevel::Verbose,
            CliVulkanLogLevel::Info => VulkanLogLevel::Info,
            CliVulkanLogLevel::Warning => VulkanLogLevel::Warning,
            CliVulkanLogLevel::Error => VulkanLogLevel::Error,
        }
    }
}

/// Load Vulkan and print what the loader and drivers expose.
#[derive(clap::Parser, Debug)]
struct CliArgs {
    #[arg(short, long, default_value = "error")]
    tracing_log_level: TracingLogLevel,
    /// Enable validation and forward its messages at or above this level.
    #[arg(short, long)]
    graphics_debug_level: Option<CliVulkanLogLevel>,
    /// Loader library to open instead of the platform default.
    #[arg(long)]
    library: Option<PathBuf>,
    /// Count/fill attempts before an enumeration gives up.
    #[arg(long, default_value_t = EnumerationPolicy::DEFAULT_MAX_ATTEMPTS)]
    enumeration_attempts: NonZeroU32,
    /// Also create a device on the first physical device and run a fence
    /// through its first queue.
    #[arg(long)]
    create_device: bool,
}

fn main() -> eyre::Result<()> {
    let app_dirs = directories::ProjectDirs::from("", "rvk", "rvk-probe");

    let log_dir = match app_dirs
        .as_ref()
        .and_then(|x| x.runtime_dir().or_else(|| Some(x.data_dir())))
        .map(|p| p.to_owned())
    {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let cli_args = CliArgs::parse();

    if cli_args.tracing_log_level != TracingLogLevel::Off {
        fs::create_dir_all(&log_dir)?;

        let mut log_file_path = log_dir.clone();
        log_file_path.push("log-file");
        log_file_path.set_extension("txt");
        let log_file = File::create(&log_file_path)?;
        let file_log = tracing_subscriber::fmt::layer()
            .with_writer(log_file)
            .with_ansi(false);

        println!("log_file_path: {}", log_file_path.display());
        println!("cli_args: {:#?}", cli_args);

        let stdout_log = tracing_subscriber::fmt::layer().pretty();

        tracing_subscriber::registry()
            .with(
                stdout_log
                    .with_filter(tracing_subscriber::filter::LevelFilter::from_level(
                        cli_args.tracing_log_level.into(),
                    ))
                    .and_then(file_log),
            )
            .init();
    }

    let config = EntryConfig {
        library_path: cli_args.library.clone(),
        enumeration: EnumerationPolicy::new(cli_args.enumeration_attempts),
    };
    // SAFETY: Loads vulkan via libloading which is kinda unsafe but we're fine
    let entry = unsafe { Entry::load_with(config) }?;
    report_entry(&entry)?;

    let (instance, debug_utils) =
        create_instance(&entry, cli_args.graphics_debug_level.is_some())?;
    let messenger = match cli_args.graphics_debug_level {
        Some(level) if debug_utils => {
            // SAFETY: the extension was enabled in create_instance
            Some(unsafe { instance.create_debug_messenger(level.into()) }?)
        }
        _ => None,
    };

    let physical_devices = instance.enumerate_physical_devices()?;
    println!("physical devices: {}", physical_devices.len());
    for physical_device in &physical_devices {
        report_physical_device(physical_device)?;
    }

    if cli_args.create_device {
        match physical_devices.first() {
            Some(physical_device) => exercise_device(physical_device)?,
            None => println!("no physical device to create a device on"),
        }
    }

    drop(physical_devices);
    if let Some(messenger) = messenger {
        // SAFETY: nothing is executing anymore
        unsafe { messenger.destroy() }?;
    }
    // SAFETY: every device was destroyed above
    unsafe { instance.destroy() }?;
    entry.destroy()?;
    Ok(())
}

fn report_entry(entry: &Entry) -> eyre::Result<()> {
    println!("instance version: {}", entry.instance_version()?);
    println!(
        "global table: {} of {} entry points",
        entry.table().loaded_count(),
        rvk::dispatch::EntryTable::ENTRY_POINTS.len()
    );
    for layer in entry.enumerate_instance_layer_properties()? {
        println!(
            "layer: {} ({})",
            layer.layer_name_as_c_str()?.to_string_lossy(),
            VkVersion::from_raw(layer.spec_version)
        );
    }
    for extension in entry.enumerate_instance_extension_properties(None)? {
        println!(
            "instance extension: {} v{}",
            extension.extension_name_as_c_str()?.to_string_lossy(),
            extension.spec_version
        );
    }
    Ok(())
}

fn create_instance(
    entry: &Arc<Entry>,
    debug: bool,
) -> eyre::Result<(Arc<Instance>, bool)> {
    let available_extensions = entry.enumerate_instance_extension_properties(None)?;
    let has_extension = |name: &CStr| {
        available_extensions
            .iter()
            .any(|ext| ext.extension_name_as_c_str() == Ok(name))
    };

    let mut extensions: Vec<*const c_char> = Vec::new();
    for name in [extension_names::SURFACE, extension_names::HEADLESS_SURFACE] {
        if has_extension(name) {
            extensions.push(name.as_ptr());
        }
    }

    let mut layers: Vec<*const c_char> = Vec::new();
    let debug_utils = debug && has_extension(extension_names::DEBUG_UTILS);
    if debug {
        if debug_utils {
            extensions.push(extension_names::DEBUG_UTILS.as_ptr());
        } else {
            tracing::warn!("Debug utils requested but not available");
        }
        let has_validation = entry
            .enumerate_instance_layer_properties()?
            .iter()
            .any(|layer| layer.layer_name_as_c_str() == Ok(VALIDATION_LAYER));
        if has_validation {
            layers.push(VALIDATION_LAYER.as_ptr());
        } else {
            tracing::warn!("Validation requested but the layer is not installed");
        }
    }

    let app_info = vk::ApplicationInfo::default()
        .application_name(c"rvk-probe")
        .api_version(vk::API_VERSION_1_2);
    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extensions)
        .enabled_layer_names(&layers);
    // SAFETY: every name was reported by the loader and outlives the call
    let instance = unsafe { entry.create_instance(&create_info) }?;
    println!(
        "instance table: {} of {} entry points",
        instance.table().loaded_count(),
        rvk::dispatch::InstanceTable::ENTRY_POINTS.len()
    );
    Ok((instance, debug_utils))
}

fn report_physical_device(physical_device: &PhysicalDevice) -> eyre::Result<()> {
    let properties = physical_device.properties()?;
    println!(
        "{} {:?} (api {})",
        properties.device_name_as_c_str()?.to_string_lossy(),
        properties.device_type,
        VkVersion::from_raw(properties.api_version)
    );
    for (index, family) in physical_device.queue_family_properties()?.iter().enumerate() {
        println!(
            "  queue family {index}: {} x {:?}",
            family.queue_count, family.queue_flags
        );
    }
    let memory = physical_device.memory_properties()?;
    for heap in &memory.memory_heaps[..memory.memory_heap_count as usize] {
        println!("  memory heap: {} MiB {:?}", heap.size >> 20, heap.flags);
    }
    for extension in physical_device.enumerate_device_extension_properties(None)? {
        println!(
            "  device extension: {} v{}",
            extension.extension_name_as_c_str()?.to_string_lossy(),
            extension.spec_version
        );
    }
    Ok(())
}

fn exercise_device(physical_device: &PhysicalDevice) -> eyre::Result<()> {
    let priorities = [1.0];
    let queue_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities)];
    let create_info = vk::DeviceCreateInfo::default().queue_create_infos(&queue_infos);
    // SAFETY: family 0 always exists and create_info outlives the call
    let device: Arc<Device> = unsafe { physical_device.create_device(&create_info) }?;
    println!(
        "device table: {} of {} entry points",
        device.table().loaded_count(),
        rvk::dispatch::DeviceTable::ENTRY_POINTS.len()
    );

    let queue = device.get_queue(0, 0)?;
    let fence = device.create_fence(false)?;
    // SAFETY: an empty submission references nothing
    unsafe { queue.submit(&[], Some(&fence)) }?;
    let status = fence.wait(1_000_000_000)?;
    println!("fence wait: {:?}", status.code());

    // SAFETY: the fence was waited on above
    unsafe { fence.destroy() }?;
    drop(queue);
    device.wait_idle()?;
    // SAFETY: the device is idle and its children are gone
    unsafe { device.destroy() }?;
    Ok(())
}

/// Extension names the probe asks for.
mod extension_names {
    use std::ffi::CStr;

    pub const SURFACE: &CStr = c"VK_KHR_surface";
    pub const HEADLESS_SURFACE: &CStr = c"VK_EXT_headless_surface";
    pub const DEBUG_UTILS: &CStr = c"VK_EXT_debug_utils";
}
