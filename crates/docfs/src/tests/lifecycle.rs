use std::sync::Arc;
use std::time::Duration;

use docstore::{Document, DocumentStore, MemoryStore};
use serde_json::json;
use tokio::time::timeout;

use super::{FlakyStore, format_options, new_fs};
use crate::{
    Error, Filesystem, FsEvent, FsOptions, FsRegistry, LockTable, LogLevel, MkdirOptions,
    ProbeState, ROOT_INODE, SUPERBLOCK_KEY,
};

fn drain(receiver: &mut tokio::sync::broadcast::Receiver<FsEvent>) -> Vec<FsEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn empty_store_reports_unformatted_and_stays_pending() {
    let registry = FsRegistry::new();
    let (fs, mut events) = registry
        .open_with_observer(FsOptions::default())
        .await
        .unwrap();

    let seen = drain(&mut events);
    assert!(matches!(
        seen.as_slice(),
        [
            FsEvent::InitFailed(ProbeState::Unformatted),
            FsEvent::Log { .. }
        ]
    ));

    // Pending, not failed: ready() blocks until someone formats.
    assert!(
        timeout(Duration::from_millis(50), fs.ready())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn format_brings_a_pending_instance_online() {
    let registry = FsRegistry::new();
    let (fs, mut events) = registry
        .open_with_observer(FsOptions::default())
        .await
        .unwrap();
    drain(&mut events);

    fs.format().await.unwrap();
    fs.ready().await.unwrap();

    let seen = drain(&mut events);
    assert!(matches!(seen.first(), Some(FsEvent::Format)));
    assert!(seen.iter().any(|e| matches!(e, FsEvent::Ready)));

    // The fresh root links to itself under both structural names.
    let mut root = fs.root().await.unwrap();
    assert_eq!(root.inode(), ROOT_INODE);
    let mut names = root.ls_names().await.unwrap();
    names.sort();
    assert_eq!(names, vec![".".to_string(), "..".to_string()]);
    assert_eq!(root.get("..").await.unwrap().inode(), ROOT_INODE);
}

#[tokio::test]
async fn format_policy_comes_up_ready_without_help() {
    let registry = FsRegistry::new();
    let (fs, mut events) = registry
        .open_with_observer(format_options())
        .await
        .unwrap();
    fs.ready().await.unwrap();

    let seen = drain(&mut events);
    assert!(seen.iter().any(|e| matches!(e, FsEvent::Format)));
    assert!(seen.iter().any(|e| matches!(e, FsEvent::Ready)));
}

#[tokio::test]
async fn populated_store_reopens_ready_without_formatting() {
    let registry = FsRegistry::new();
    let fs = registry.open(format_options()).await.unwrap();
    fs.ready().await.unwrap();
    fs.root()
        .await
        .unwrap()
        .mkdir("keep", MkdirOptions::default())
        .await
        .unwrap();
    drop(fs);

    // Default policy this time: the store already holds a filesystem.
    let (fs, mut events) = registry
        .open_with_observer(FsOptions::default())
        .await
        .unwrap();
    fs.ready().await.unwrap();
    assert!(
        drain(&mut events)
            .iter()
            .all(|e| !matches!(e, FsEvent::Format))
    );
    assert!(fs.get("/keep").await.is_ok());
}

#[tokio::test]
async fn stray_documents_classify_as_corrupt() {
    let store = Arc::new(MemoryStore::new());
    store
        .put(Document::new("junk", json!({ "not": "a filesystem" })))
        .await
        .unwrap();

    let fs = Filesystem::open(store, LockTable::new(), FsOptions::default())
        .await
        .unwrap();
    assert_eq!(fs.ready().await, Err(Error::Corrupt));
}

#[tokio::test]
async fn missing_superblock_classifies_as_corrupt() {
    // A root with no superblock: non-empty store, unusable filesystem.
    let store = Arc::new(MemoryStore::new());
    store
        .put(Document::new(
            "i_1",
            json!({ "type": "dir", "mod_time": "2026-01-01T00:00:00Z",
                    "content": { ".": "i_1", "..": "i_1" } }),
        ))
        .await
        .unwrap();
    assert!(store.get(SUPERBLOCK_KEY).await.is_err());

    let fs = Filesystem::open(store, LockTable::new(), FsOptions::default())
        .await
        .unwrap();
    assert_eq!(fs.ready().await, Err(Error::Corrupt));
}

#[tokio::test]
async fn probe_fetch_failure_classifies_as_corrupt() {
    // A fetch failure that is not "absent" gets the corrupt treatment,
    // the same as unreadable documents would.
    let store = FlakyStore::new();
    store.set_fail_gets(true);

    let (fs, mut events) =
        Filesystem::open_with_observer(store, LockTable::new(), FsOptions::default())
            .await
            .unwrap();

    assert_eq!(fs.ready().await, Err(Error::Corrupt));
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, FsEvent::InitFailed(ProbeState::Corrupt)))
    );
}

#[tokio::test]
async fn count_probe_failure_surfaces_as_init_error() {
    // The store looks absent but the document count cannot be read;
    // that escapes classification entirely.
    let store = FlakyStore::new();
    store.set_fail_info(true);

    let (fs, mut events) =
        Filesystem::open_with_observer(store, LockTable::new(), FsOptions::default())
            .await
            .unwrap();

    assert!(matches!(fs.ready().await, Err(Error::Store(_))));
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, FsEvent::InitError(_)))
    );
}

#[tokio::test]
async fn readiness_outcome_persists_with_no_receiver_held() {
    // Nothing subscribes to the readiness channel while the open-time
    // probe runs; a ready() call made afterwards must still see the
    // outcome rather than wait for a state change that already happened.
    let registry = FsRegistry::new();
    let fs = registry.open(format_options()).await.unwrap();
    timeout(Duration::from_secs(1), fs.ready())
        .await
        .expect("ready() must resolve from the stored state")
        .unwrap();

    // The failed outcome is stored the same way.
    let store = Arc::new(MemoryStore::new());
    store
        .put(Document::new("junk", json!({ "stray": true })))
        .await
        .unwrap();
    let fs = Filesystem::open(store, LockTable::new(), FsOptions::default())
        .await
        .unwrap();
    assert_eq!(
        timeout(Duration::from_secs(1), fs.ready())
            .await
            .expect("ready() must resolve from the stored state"),
        Err(Error::Corrupt)
    );
}

#[tokio::test]
async fn debug_option_mirrors_log_lines_onto_the_event_stream() {
    let registry = FsRegistry::new();
    let (fs, mut events) = registry
        .open_with_observer(FsOptions {
            debug: true,
            ..format_options()
        })
        .await
        .unwrap();
    fs.ready().await.unwrap();

    let logs: Vec<(LogLevel, String)> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            FsEvent::Log { level, message } => Some((level, message)),
            _ => None,
        })
        .collect();
    assert!(
        logs.contains(&(LogLevel::Info, "filesystem format initiated".to_string()))
    );
    assert!(logs.contains(&(LogLevel::Info, "filesystem online".to_string())));
}

#[tokio::test]
async fn destroy_then_format_starts_over() {
    let fs = new_fs().await;
    fs.root()
        .await
        .unwrap()
        .mkdir("doomed", MkdirOptions::default())
        .await
        .unwrap();

    fs.destroy().await.unwrap();
    assert!(
        timeout(Duration::from_millis(50), fs.ready())
            .await
            .is_err()
    );

    fs.format().await.unwrap();
    fs.ready().await.unwrap();
    assert_eq!(
        fs.get("/doomed").await.unwrap_err(),
        Error::not_found("doomed")
    );
}

#[tokio::test]
async fn same_store_name_shares_documents() {
    let registry = FsRegistry::new();
    let fs1 = registry.open(format_options()).await.unwrap();
    fs1.ready().await.unwrap();
    fs1.root()
        .await
        .unwrap()
        .mkdir("shared", MkdirOptions::default())
        .await
        .unwrap();

    let fs2 = registry.open(FsOptions::default()).await.unwrap();
    fs2.ready().await.unwrap();
    assert!(fs2.get("/shared").await.is_ok());

    // A different name is a different filesystem.
    let fs3 = registry
        .open(FsOptions {
            db_name: Some("other".to_string()),
            ..format_options()
        })
        .await
        .unwrap();
    fs3.ready().await.unwrap();
    assert!(fs3.get("/shared").await.is_err());
}
