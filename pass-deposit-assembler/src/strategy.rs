// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Package layouts.
//!
//! A strategy decides where custodial resources land inside the archive and
//! which generated files accompany them. Generated files never appear in
//! [`PackageStream::resources`](crate::PackageStream::resources).

use std::fmt::Write as _;
use std::io;

use derive_more::Display;
use pass_deposit_utils_hash::Algorithm;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::archive::ArchiveWriter;
use crate::package::{PackageJob, Resource};

const BAGIT_VERSION: &str = "1.0";
const BAG_INFO_OPTION_PREFIX: &str = "bag-info.";
const PAYLOAD_DIR: &str = "data";

/// Characters a BagIt manifest cannot carry literally in a file path.
const MANIFEST_PATH: &AsciiSet = &CONTROLS.add(b'%');

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackagingStrategy {
    /// Custodial files only, at the archive root.
    #[default]
    #[display("simple")]
    Simple,
    /// A BagIt 1.0 bag with custodial files as its payload.
    #[display("bagit")]
    BagIt,
}

impl PackagingStrategy {
    /// Path of a custodial resource inside the archive.
    pub fn custodial_path(&self, resource: &Resource) -> String {
        match self {
            PackagingStrategy::Simple => resource.name.clone(),
            PackagingStrategy::BagIt => format!("{PAYLOAD_DIR}/{}", resource.name),
        }
    }

    pub(crate) fn write_entries<W: io::Write>(
        &self,
        archive: &mut ArchiveWriter<W>,
        job: &PackageJob,
        handle: &Handle,
    ) -> io::Result<()> {
        match self {
            PackagingStrategy::Simple => {
                for resource in job.resources.iter() {
                    PackageJob::put_resource(archive, &self.custodial_path(resource), resource, handle)?;
                }
                Ok(())
            }
            PackagingStrategy::BagIt => write_bag(self, archive, job, handle),
        }
    }
}

fn put_tag_file<W: io::Write>(
    archive: &mut ArchiveWriter<W>,
    tags: &mut Vec<(String, Vec<u8>)>,
    name: String,
    content: Vec<u8>,
) -> io::Result<()> {
    archive.put_entry(&name, content.len() as u64, &mut content.as_slice())?;
    tags.push((name, content));
    Ok(())
}

fn write_bag<W: io::Write>(
    strategy: &PackagingStrategy,
    archive: &mut ArchiveWriter<W>,
    job: &PackageJob,
    handle: &Handle,
) -> io::Result<()> {
    let algorithms = bag_algorithms(&job.metadata.algorithms);
    let mut tags = Vec::new();

    put_tag_file(archive, &mut tags, "bagit.txt".into(), bagit_declaration().into_bytes())?;
    put_tag_file(archive, &mut tags, "bag-info.txt".into(), bag_info(job).into_bytes())?;

    for resource in job.resources.iter() {
        PackageJob::put_resource(archive, &strategy.custodial_path(resource), resource, handle)?;
    }

    for algorithm in &algorithms {
        let manifest = payload_manifest(strategy, *algorithm, &job.resources)?;
        put_tag_file(archive, &mut tags, format!("manifest-{algorithm}.txt"), manifest.into_bytes())?;
    }

    let metadata = serde_json::to_vec_pretty(&serde_json::json!({
        "submission": job.submission.id,
        "title": job.submission.title(),
        "metadata": job.submission.metadata,
        "submissionMeta": job.metadata.submission_meta,
    }))
    .map_err(io::Error::other)?;
    put_tag_file(archive, &mut tags, "metadata.json".into(), metadata)?;

    for algorithm in &algorithms {
        let mut manifest = String::new();
        for (name, content) in &tags {
            let _ = writeln!(manifest, "{}  {name}", algorithm.digest(content).to_hex());
        }
        let name = format!("tagmanifest-{algorithm}.txt");
        archive.put_entry(&name, manifest.len() as u64, &mut manifest.as_bytes())?;
    }
    Ok(())
}

/// A bag always carries at least one payload manifest.
fn bag_algorithms(configured: &[Algorithm]) -> Vec<Algorithm> {
    if configured.is_empty() {
        vec![Algorithm::default()]
    } else {
        configured.to_vec()
    }
}

fn bagit_declaration() -> String {
    format!("BagIt-Version: {BAGIT_VERSION}\nTag-File-Character-Encoding: UTF-8\n")
}

fn bag_info(job: &PackageJob) -> String {
    let octets: u64 = job.resources.iter().map(|r| r.size).sum();
    let mut info = String::new();
    let _ = writeln!(info, "External-Identifier: {}", job.submission.id);
    if let Some(title) = job.submission.title() {
        let _ = writeln!(info, "External-Description: {}", title.replace(['\r', '\n'], " "));
    }
    for (key, value) in &job.metadata.options {
        if let Some(label) = key.strip_prefix(BAG_INFO_OPTION_PREFIX) {
            let _ = writeln!(info, "{label}: {value}");
        }
    }
    let _ = writeln!(info, "Payload-Oxum: {octets}.{}", job.resources.len());
    info
}

fn payload_manifest(
    strategy: &PackagingStrategy,
    algorithm: Algorithm,
    resources: &[Resource],
) -> io::Result<String> {
    let mut manifest = String::new();
    for resource in resources {
        let hash = resource.checksum(algorithm).ok_or_else(|| {
            io::Error::other(format!("no {algorithm} checksum computed for {}", resource.name))
        })?;
        let path = strategy.custodial_path(resource);
        let _ = writeln!(
            manifest,
            "{}  {}",
            hash.to_hex(),
            utf8_percent_encode(&path, MANIFEST_PATH)
        );
    }
    Ok(manifest)
}
