//! Tests for the merge service.

use std::sync::Arc;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    ArchiveEntry, FixtureArchiveReader, FixtureArchiveSource, InMemoryBlobStore, MergeStatus,
    MockArchiveReader, MockBlobStore,
};

type FixtureService = MergeService<FixtureArchiveSource, FixtureArchiveReader, InMemoryBlobStore>;

fn service(entries: Vec<ArchiveEntry>, store: Arc<InMemoryBlobStore>) -> FixtureService {
    MergeService::new(
        Arc::new(FixtureArchiveSource::new(b"PK-remote".to_vec())),
        Arc::new(FixtureArchiveReader::new(entries)),
        store,
        MergeConfig::default(),
    )
}

fn direct(bytes: &[u8]) -> ArchiveUpload {
    ArchiveUpload::Direct {
        file_name: Some("data.zip".to_owned()),
        bytes: bytes.to_vec(),
    }
}

#[tokio::test]
async fn merge_then_fetch_returns_labelled_rows() {
    let store = Arc::new(InMemoryBlobStore::new());
    let service = service(
        vec![
            ArchiveEntry::file("jan.csv", b"id,val\n1,10\n".to_vec()),
            ArchiveEntry::file("feb.csv", b"id,val\n2,20\n".to_vec()),
        ],
        Arc::clone(&store),
    );

    let outcome = service.merge(direct(b"PK")).await.expect("merge");
    assert_eq!(outcome.status, MergeStatus::Merged);

    let artifact = service.fetch_artifact().await.expect("artifact");
    assert_eq!(artifact.file_name, "merged.csv");
    assert_eq!(
        artifact.contents,
        "\u{feff}id,val,日期\n1,10,jan\n2,20,feb\n".as_bytes()
    );
    assert_eq!(
        store.keys(),
        [
            "extracted/feb.csv",
            "extracted/jan.csv",
            "merged.csv",
            "uploaded.zip",
        ]
    );
}

#[tokio::test]
async fn remote_archives_are_persisted_as_uploaded_zip() {
    let store = Arc::new(InMemoryBlobStore::new());
    let service = service(Vec::new(), Arc::clone(&store));

    let outcome = service
        .merge(ArchiveUpload::RemoteUrl("https://example.com/a.zip".into()))
        .await
        .expect("merge");
    assert_eq!(outcome.status, MergeStatus::NoValidTables);

    let stored = store
        .get(&BlobKey::new(UPLOADED_ARCHIVE_KEY).expect("key"))
        .await
        .expect("get");
    assert_eq!(stored.as_deref(), Some(b"PK-remote".as_slice()));
}

#[tokio::test]
async fn fetch_before_any_merge_is_not_found() {
    let service = service(Vec::new(), Arc::new(InMemoryBlobStore::new()));
    let error = service.fetch_artifact().await.expect_err("no artifact");
    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.message(), "file not found");
}

#[tokio::test]
async fn missing_payload_is_an_invalid_request() {
    let service = service(Vec::new(), Arc::new(InMemoryBlobStore::new()));
    let error = service
        .merge(ArchiveUpload::Missing)
        .await
        .expect_err("missing");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn unreadable_archive_is_an_invalid_request() {
    let mut reader = MockArchiveReader::new();
    reader
        .expect_read_entries()
        .return_once(|_| Err(crate::domain::ports::ArchiveReaderError::malformed("eocd")));
    let service = MergeService::new(
        Arc::new(FixtureArchiveSource::default()),
        Arc::new(reader),
        Arc::new(InMemoryBlobStore::new()),
        MergeConfig::default(),
    );

    let error = service.merge(direct(b"junk")).await.expect_err("bad zip");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert!(error.message().contains("eocd"));
}

#[tokio::test]
async fn storage_failures_are_internal() {
    let mut store = MockBlobStore::new();
    store
        .expect_put()
        .return_once(|_, _| Err(BlobStoreError::unavailable("disk gone")));
    let service = MergeService::new(
        Arc::new(FixtureArchiveSource::default()),
        Arc::new(FixtureArchiveReader::default()),
        Arc::new(store),
        MergeConfig::default(),
    );

    let error = service.merge(direct(b"PK")).await.expect_err("store fails");
    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[tokio::test]
async fn custom_label_column_is_used() {
    let store = Arc::new(InMemoryBlobStore::new());
    let service = MergeService::new(
        Arc::new(FixtureArchiveSource::default()),
        Arc::new(FixtureArchiveReader::new(vec![ArchiveEntry::file(
            "q1/jan.csv",
            b"id\n1\n".to_vec(),
        )])),
        Arc::clone(&store),
        MergeConfig {
            label_column: "source".to_owned(),
            ..MergeConfig::default()
        },
    );

    service.merge(direct(b"PK")).await.expect("merge");
    let artifact = service.fetch_artifact().await.expect("artifact");
    assert_eq!(artifact.contents, "\u{feff}id,source\n1,jan\n".as_bytes());
}
