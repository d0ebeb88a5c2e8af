// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use pass_deposit_assembler::{ArchiveFormat, Assembler, AssemblerOptions, PackageStream, Resolver};
use pass_deposit_model::{
    DepositFile, DepositMetadata, EntityId, JournalMetadata, Person, PersonType, Submission,
};
use pass_deposit_store::MemoryStore;
use tempfile::TempDir;

pub const PDF: &[u8] = b"%PDF-1.7 manuscript body";
pub const SUPPLEMENT: &[u8] = b"a,b\n1,2\n";

pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<MemoryStore>,
    pub submission: Submission,
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manuscript.pdf");
    std::fs::write(&path, PDF).unwrap();

    let store = Arc::new(MemoryStore::new());
    store.put_binary("binary-9", SUPPLEMENT);

    let submission = Submission {
        id: EntityId::new("submission-1"),
        name: "My Article".into(),
        metadata: DepositMetadata {
            journal: Some(JournalMetadata {
                journal_title: "Journal of Tests".into(),
                publisher_name: Some("Test Press".into()),
                publication_date: Some("2025-03-01".into()),
                ..JournalMetadata::default()
            }),
            persons: vec![Person {
                first_name: "Ada".into(),
                middle_name: None,
                last_name: "Lovelace".into(),
                email: None,
                kind: PersonType::Author,
            }],
            ..DepositMetadata::default()
        },
        submission_meta: serde_json::json!({ "title": "My Article" }),
        files: vec![
            DepositFile {
                name: "manuscript.pdf".into(),
                location: Some(url::Url::from_file_path(&path).unwrap().to_string()),
                ..DepositFile::default()
            },
            DepositFile {
                name: "data.csv".into(),
                store_file_id: Some("binary-9".into()),
                ..DepositFile::default()
            },
        ],
        ..Submission::default()
    };

    Fixture {
        dir,
        store,
        submission,
    }
}

pub async fn package(fixture: &Fixture) -> PackageStream {
    let resolver = Resolver::new(fixture.store.clone(), reqwest::Client::new(), vec![]);
    let options = AssemblerOptions {
        archive: ArchiveFormat::Zip,
        ..AssemblerOptions::default()
    };
    Assembler::new(Arc::new(resolver))
        .assemble(&fixture.submission, &options)
        .await
        .unwrap()
}

/// Serves the router built for the bound address.
pub async fn serve(app: impl FnOnce(SocketAddr) -> Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app(addr);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_owned(), data)
        })
        .collect()
}
