// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Layers the archive and compression encoders over an output sink.
//!
//! Tar output is written straight through to the sink. Zip needs to patch
//! local headers after each entry, so it is built in an anonymous temporary
//! file and copied to the sink when finished; in both cases the archive is
//! never held in memory.

use std::fs::File;
use std::io::{self, Read, Seek, Write};

use derive_more::Display;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::trace;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::{AssemblyError, IoErrorContext, Result};

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[default]
    #[display("none")]
    None,
    #[display("tar")]
    Tar,
    #[display("zip")]
    Zip,
}

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionFormat {
    #[default]
    #[display("none")]
    None,
    #[display("gzip")]
    Gzip,
}

/// Which encoders to stack over the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub archive: ArchiveFormat,
    pub compression: CompressionFormat,
}

impl ArchiveOptions {
    /// File name extension of the produced archive, without a leading dot.
    pub fn extension(&self) -> Option<&'static str> {
        match (self.archive, self.compression) {
            (ArchiveFormat::Tar, CompressionFormat::Gzip) => Some("tar.gz"),
            (ArchiveFormat::Tar, CompressionFormat::None) => Some("tar"),
            (ArchiveFormat::Zip, _) => Some("zip"),
            (ArchiveFormat::None, _) => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match (self.archive, self.compression) {
            (ArchiveFormat::Tar, CompressionFormat::Gzip) => "application/gzip",
            (ArchiveFormat::Tar, CompressionFormat::None) => "application/x-tar",
            (ArchiveFormat::Zip, _) => "application/zip",
            (ArchiveFormat::None, _) => "application/octet-stream",
        }
    }
}

/// An archive being written to `W`.
pub enum ArchiveWriter<W: Write> {
    Tar(tar::Builder<W>),
    TarGz(tar::Builder<GzEncoder<W>>),
    Zip {
        zip: zip::ZipWriter<File>,
        sink: W,
    },
}

impl<W: Write> std::fmt::Debug for ArchiveWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ArchiveWriter::Tar(_) => "tar",
            ArchiveWriter::TarGz(_) => "tar.gz",
            ArchiveWriter::Zip { .. } => "zip",
        };
        f.debug_tuple("ArchiveWriter").field(&kind).finish()
    }
}

/// Counts the bytes an entry actually produced.
struct Counted<'a> {
    inner: &'a mut dyn Read,
    count: u64,
}

impl Read for Counted<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

fn size_mismatch(name: &str, expected: u64, actual: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("entry {name} changed while packaging: expected {expected} bytes, read {actual}"),
    )
}

impl<W: Write> ArchiveWriter<W> {
    /// Wraps `sink` in the encoders selected by `options`.
    pub fn wrap(options: &ArchiveOptions, sink: W) -> Result<Self> {
        match (options.archive, options.compression) {
            (ArchiveFormat::None, _) => Err(AssemblyError::NoArchiveFormat),
            (ArchiveFormat::Tar, CompressionFormat::None) => {
                Ok(ArchiveWriter::Tar(tar::Builder::new(sink)))
            }
            (ArchiveFormat::Tar, CompressionFormat::Gzip) => Ok(ArchiveWriter::TarGz(
                tar::Builder::new(GzEncoder::new(sink, Compression::default())),
            )),
            (ArchiveFormat::Zip, CompressionFormat::None) => {
                let spool = tempfile::tempfile().io_context("creating zip spool file")?;
                Ok(ArchiveWriter::Zip {
                    zip: zip::ZipWriter::new(spool),
                    sink,
                })
            }
            (archive, compression) => Err(AssemblyError::UnsupportedCompression {
                archive,
                compression,
            }),
        }
    }

    /// Appends one regular file entry of exactly `size` bytes.
    pub fn put_entry(&mut self, name: &str, size: u64, data: &mut dyn Read) -> io::Result<()> {
        trace!(entry = name, size, "writing archive entry");
        let mut counted = Counted {
            inner: data,
            count: 0,
        };
        match self {
            ArchiveWriter::Tar(builder) => append_tar(builder, name, size, &mut counted)?,
            ArchiveWriter::TarGz(builder) => append_tar(builder, name, size, &mut counted)?,
            ArchiveWriter::Zip { zip, .. } => {
                let options = SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .large_file(size > u64::from(u32::MAX));
                zip.start_file(name, options)?;
                io::copy(&mut counted, zip)?;
            }
        }
        if counted.count != size {
            return Err(size_mismatch(name, size, counted.count));
        }
        Ok(())
    }

    /// Writes archive trailers and returns the sink.
    pub fn finish(self) -> io::Result<W> {
        match self {
            ArchiveWriter::Tar(builder) => builder.into_inner(),
            ArchiveWriter::TarGz(builder) => builder.into_inner()?.finish(),
            ArchiveWriter::Zip { zip, mut sink } => {
                let mut spool = zip.finish()?;
                spool.rewind()?;
                io::copy(&mut spool, &mut sink)?;
                sink.flush()?;
                Ok(sink)
            }
        }
    }
}

fn append_tar<T: Write>(
    builder: &mut tar::Builder<T>,
    name: &str,
    size: u64,
    data: &mut Counted<'_>,
) -> io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(0);
    // A short read would leave the entry unpadded; stop at the declared size
    // and let the caller report the mismatch.
    let mut limited = data.take(size);
    builder.append_data(&mut header, name, &mut limited)?;
    Ok(())
}
