//! Tests for merging extracted entries into the artifact.

use super::*;
use crate::domain::ports::{InMemoryBlobStore, MockBlobStore};
use encoding_rs::GBK;
use rstest::{fixture, rstest};

#[fixture]
fn store() -> Arc<InMemoryBlobStore> {
    Arc::new(InMemoryBlobStore::new())
}

async fn stage(store: &InMemoryBlobStore, files: &[(&str, &[u8])]) -> Vec<StoredEntry> {
    let mut entries = Vec::new();
    for (path, contents) in files {
        let key = BlobKey::new(format!("extracted/{path}")).expect("key");
        store.put(&key, contents.to_vec()).await.expect("stage");
        entries.push(StoredEntry {
            path: (*path).to_owned(),
            key,
        });
    }
    entries
}

async fn artifact_text(store: &InMemoryBlobStore) -> String {
    let key = BlobKey::new(MERGED_ARTIFACT_KEY).expect("key");
    let bytes = store.get(&key).await.expect("get").expect("artifact exists");
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").expect("BOM");
    String::from_utf8(body.to_vec()).expect("UTF-8 artifact")
}

#[rstest]
#[tokio::test]
async fn merges_monthly_files_with_labels(store: Arc<InMemoryBlobStore>) {
    let entries = stage(
        &store,
        &[
            ("jan.csv", b"id,val\n1,10\n".as_slice()),
            ("feb.csv", b"id,val\n2,20\n".as_slice()),
        ],
    )
    .await;

    let outcome = TableMerger::new(Arc::clone(&store), DEFAULT_LABEL_COLUMN)
        .merge(&entries)
        .await
        .expect("merge");

    assert_eq!(outcome.status, MergeStatus::Merged);
    assert_eq!(outcome.artifact_key, MERGED_ARTIFACT_KEY);
    assert_eq!(outcome.report.merged_count(), 2);
    assert_eq!(artifact_text(&store).await, "id,val,日期\n1,10,jan\n2,20,feb\n");
}

#[rstest]
#[tokio::test]
async fn unions_overlapping_schemas(store: Arc<InMemoryBlobStore>) {
    let entries = stage(
        &store,
        &[
            ("x.csv", b"A,B\n1,2\n".as_slice()),
            ("y.csv", b"B,C\n3,4\n".as_slice()),
        ],
    )
    .await;

    TableMerger::new(Arc::clone(&store), "label")
        .merge(&entries)
        .await
        .expect("merge");

    assert_eq!(artifact_text(&store).await, "A,B,label,C\n1,2,x,\n,3,y,4\n");
}

#[rstest]
#[tokio::test]
async fn skips_bad_files_without_aborting(store: Arc<InMemoryBlobStore>) {
    let entries = stage(
        &store,
        &[
            ("empty.csv", b"".as_slice()),
            ("ragged.csv", b"a,b\n1,2,3\n".as_slice()),
            ("notes.txt", b"not a table".as_slice()),
            ("ok.csv", b"a\n1\n".as_slice()),
        ],
    )
    .await;

    let outcome = TableMerger::new(Arc::clone(&store), DEFAULT_LABEL_COLUMN)
        .merge(&entries)
        .await
        .expect("merge");

    let paths: Vec<&str> = outcome
        .report
        .files
        .iter()
        .map(|file| file.path.as_str())
        .collect();
    assert_eq!(paths, ["empty.csv", "ragged.csv", "ok.csv"]);
    assert!(matches!(
        outcome.report.files[0].status,
        FileStatus::Skipped { .. }
    ));
    assert!(matches!(
        outcome.report.files[1].status,
        FileStatus::Skipped { .. }
    ));
    assert_eq!(artifact_text(&store).await, "a,日期\n1,ok\n");
}

#[rstest]
#[tokio::test]
async fn no_valid_tables_leaves_previous_artifact(store: Arc<InMemoryBlobStore>) {
    let artifact = BlobKey::new(MERGED_ARTIFACT_KEY).expect("key");
    store
        .put(&artifact, b"previous".to_vec())
        .await
        .expect("seed");
    let entries = stage(
        &store,
        &[
            ("readme.txt", b"hi".as_slice()),
            ("UPPER.CSV", b"a\n1\n".as_slice()),
        ],
    )
    .await;

    let outcome = TableMerger::new(Arc::clone(&store), DEFAULT_LABEL_COLUMN)
        .merge(&entries)
        .await
        .expect("merge");

    assert_eq!(outcome.status, MergeStatus::NoValidTables);
    assert!(outcome.report.files.is_empty());
    let kept = store.get(&artifact).await.expect("get");
    assert_eq!(kept.as_deref(), Some(b"previous".as_slice()));
}

#[rstest]
#[tokio::test]
async fn decodes_gbk_content(store: Arc<InMemoryBlobStore>) {
    let mut text = String::from("城市,销售额,备注\n");
    for _ in 0..20 {
        text.push_str("北京,100,春节前的销售情况良好，我们需要继续努力\n");
        text.push_str("上海,200,客户反馈积极，需要继续跟进这个项目\n");
    }
    let (gbk, _, _) = GBK.encode(&text);
    let entries = stage(&store, &[("销售.csv", gbk.as_ref())]).await;

    let outcome = TableMerger::new(Arc::clone(&store), DEFAULT_LABEL_COLUMN)
        .merge(&entries)
        .await
        .expect("merge");

    assert_eq!(outcome.status, MergeStatus::Merged);
    let artifact = artifact_text(&store).await;
    assert!(artifact.starts_with("城市,销售额,备注,日期\n北京,100,"));
    assert!(artifact.contains("继续努力,销售\n"));
}

#[tokio::test]
async fn artifact_write_failures_propagate() {
    let mut store = MockBlobStore::new();
    store
        .expect_get()
        .return_once(|_| Ok(Some(b"a\n1\n".to_vec())));
    store
        .expect_put()
        .return_once(|key, _| Err(BlobStoreError::io(key.as_str(), "read-only")));
    let entry = StoredEntry {
        path: "a.csv".to_owned(),
        key: BlobKey::new("extracted/a.csv").expect("key"),
    };

    let error = TableMerger::new(Arc::new(store), DEFAULT_LABEL_COLUMN)
        .merge(&[entry])
        .await
        .expect_err("write fails");

    assert!(matches!(error, MergeError::Storage(_)));
}

#[test]
fn parse_entry_reports_encoding() {
    let parsed = parse_entry(b"a\n1\n").expect("parses");
    assert_eq!(parsed.encoding, "UTF-8");
    assert_eq!(parsed.table.row_count(), 1);
}
