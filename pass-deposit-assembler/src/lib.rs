// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Package assembly.
//!
//! Resolves a submission's custodial files to byte sources, digests them,
//! and streams them as a tar, tar.gz or zip archive laid out by a
//! packaging strategy.

pub mod archive;
mod assembler;
mod error;
mod package;
pub mod resolver;
mod sanitize;
mod stream;
pub mod strategy;

pub use archive::{ArchiveFormat, ArchiveOptions, ArchiveWriter, CompressionFormat};
pub use assembler::{Assembler, AssemblerOptions};
pub use error::{AssemblyError, IoErrorContext, ResolutionError, Result};
pub use package::{PackageMetadata, PackageStream, Resource};
pub use resolver::{ResourceHandle, ResourceSupplier, Resolver, resolve};
pub use sanitize::{SanitizeError, check_custodial_name, sanitize_filename};
pub use stream::PackageByteStream;
pub use strategy::PackagingStrategy;
