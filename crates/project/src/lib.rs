#![allow(clippy::option_if_let_else)]

//! # Javelin project model
//!
//! Session-scoped view of a multi-module repository: resolved module
//! descriptors, the [`Module`] type (source set, derived indexes, one
//! resolving compiler), the [`ModuleRegistry`] (uri routing and memoized
//! internal dependency closures), and platform-library membership.
//!
//! Build-descriptor *resolution* is an external collaborator: this crate
//! only loads its output (`javelin.toml` files) and never talks to a build
//! system.

mod descriptor;
mod discovery;
mod module;
mod platform;
mod registry;

pub use descriptor::{
    ArchiveClass, ArchiveDescriptor, CompilerOptions, DescriptorError, ModuleDescriptor,
    DESCRIPTOR_FILE_NAME,
};
pub use discovery::discover_modules;
pub use module::{CompilerFactory, Module};
pub use registry::ModuleRegistry;
pub use platform::{PlatformLibraries, PlatformLibrary};
