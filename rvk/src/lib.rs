//! Typed object layer over Vulkan, built on the [`ash`] type definitions.
//!
//! `rvk` does not link against Vulkan. Every entry point is resolved at
//! runtime through `vkGetInstanceProcAddr`/`vkGetDeviceProcAddr` into a
//! per-scope dispatch table that is built once and shared by reference with
//! every descendant object.
//!
//! # Object hierarchy
//!
//! ```text
//! Entry                       (global table)
//! └── Instance                (instance table)
//!     ├── Surface
//!     ├── DebugMessenger
//!     └── PhysicalDevice
//!         └── Device          (device table)
//!             ├── Queue
//!             ├── Fence / Semaphore / Event
//!             ├── Buffer / DeviceMemory
//!             ├── CommandPool → [CommandBuffer]
//!             ├── DescriptorPool → [DescriptorSet]
//!             └── Swapchain
//! ```
//!
//! Children hold an `Arc` of the scope container ([`Entry`](entry::Entry),
//! [`Instance`](instance::Instance) or [`Device`](device::Device)) whose
//! table serves them, so a scope outlives everything created from it. Every
//! object is also recorded in an [`ObjectRegistry`](registry::ObjectRegistry)
//! that tracks the parent relation explicitly.
//!
//! Nothing is released on drop. Each container has an explicit, consuming
//! `destroy` (or `free`) which issues the native call.
//!
//! # Naming conventions
//!
//! | prefix  | meaning                                   |
//! |---------|-------------------------------------------|
//! | `raw_*` | accepts or returns a raw `ash::vk` handle |

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::undocumented_unsafe_blocks)]

pub mod buffer;
pub mod command;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod dispatch;
pub mod entry;
pub mod enumerate;
pub mod error;
pub mod instance;
pub mod log;
pub mod physical_device;
pub mod registry;
pub mod result;
pub mod surface;
pub mod swapchain;
pub mod sync;

#[cfg(test)]
mod fake;

pub use ash;
pub use error::{Error, Result};
