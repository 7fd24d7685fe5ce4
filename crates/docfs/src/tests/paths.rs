use super::{format_options, new_fs};
use crate::{Error, FsRegistry, MkdirOptions, MkfileOptions, ROOT_INODE};

#[tokio::test]
async fn absolute_paths_resolve_from_the_root() {
    let fs = new_fs().await;
    let mut root = fs.root().await.unwrap();
    let mut a = root.mkdir("a", MkdirOptions::default()).await.unwrap();
    let mut b = a.mkdir("b", MkdirOptions::default()).await.unwrap();
    let file = b
        .mkfile("c.txt", "x", MkfileOptions::default())
        .await
        .unwrap();

    assert_eq!(fs.get("/a/b/c.txt").await.unwrap().inode(), file.inode());
    // Repeated and trailing slashes collapse.
    assert_eq!(fs.get("//a///b/").await.unwrap().inode(), b.inode());
    assert_eq!(fs.get("/").await.unwrap().inode(), ROOT_INODE);
}

#[tokio::test]
async fn relative_lookup_and_structural_entries() {
    let fs = new_fs().await;
    let mut root = fs.root().await.unwrap();
    let mut a = root.mkdir("a", MkdirOptions::default()).await.unwrap();
    let b = a.mkdir("b", MkdirOptions::default()).await.unwrap();

    assert_eq!(a.get("b").await.unwrap().inode(), b.inode());
    assert_eq!(a.get(".").await.unwrap().inode(), a.inode());
    assert_eq!(a.get("..").await.unwrap().inode(), ROOT_INODE);
    assert_eq!(a.get("b/..").await.unwrap().inode(), a.inode());
}

#[tokio::test]
async fn lookup_failures_are_precise() {
    let fs = new_fs().await;
    let mut root = fs.root().await.unwrap();
    root.mkdir("a", MkdirOptions::default()).await.unwrap();

    assert_eq!(
        fs.get("relative").await.unwrap_err(),
        Error::path_format("relative")
    );
    assert_eq!(
        fs.get("/a/missing").await.unwrap_err(),
        Error::not_found("missing")
    );
}

#[tokio::test]
async fn path_reconstruction_walks_parents() {
    let fs = new_fs().await;
    let mut root = fs.root().await.unwrap();
    let mut a = root.mkdir("a", MkdirOptions::default()).await.unwrap();
    let b = a.mkdir("b", MkdirOptions::default()).await.unwrap();

    assert_eq!(root.path().await.unwrap(), "/");
    assert_eq!(a.path().await.unwrap(), "/a");
    assert_eq!(b.path().await.unwrap(), "/a/b");
}

#[tokio::test]
async fn stale_snapshots_persist_until_refreshed() {
    let registry = FsRegistry::new();
    let fs = registry
        .open(crate::FsOptions {
            auto_refresh: false,
            ..format_options()
        })
        .await
        .unwrap();
    fs.ready().await.unwrap();

    // Two handles on the same directory; only one performs the mkdir.
    let mut watcher = fs.root().await.unwrap();
    let mut actor = fs.root().await.unwrap();
    actor.mkdir("fresh", MkdirOptions::default()).await.unwrap();

    assert!(
        !watcher
            .ls_names()
            .await
            .unwrap()
            .contains(&"fresh".to_string())
    );
    watcher.refresh().await.unwrap();
    assert!(
        watcher
            .ls_names()
            .await
            .unwrap()
            .contains(&"fresh".to_string())
    );
}

#[tokio::test]
async fn auto_refresh_rereads_before_every_listing() {
    let registry = FsRegistry::new();
    let fs = registry
        .open(crate::FsOptions {
            auto_refresh: true,
            ..format_options()
        })
        .await
        .unwrap();
    fs.ready().await.unwrap();

    let mut watcher = fs.root().await.unwrap();
    let mut actor = fs.root().await.unwrap();
    actor.mkdir("fresh", MkdirOptions::default()).await.unwrap();

    assert!(
        watcher
            .ls_names()
            .await
            .unwrap()
            .contains(&"fresh".to_string())
    );
}

#[tokio::test]
async fn entity_refresh_follows_a_replaced_document() {
    let fs = new_fs().await;
    let mut root = fs.root().await.unwrap();
    let mut file = root
        .mkfile("live.txt", "one", MkfileOptions::default())
        .await
        .unwrap();

    // A second handle writes; the first still holds the old snapshot.
    let mut other = fs
        .get("/live.txt")
        .await
        .unwrap()
        .into_file()
        .unwrap();
    other
        .write("two, longer", crate::WriteOptions::default())
        .await
        .unwrap();

    assert_eq!(file.size(), 3);
    file.refresh().await.unwrap();
    assert_eq!(file.size(), 11);
    assert_eq!(
        file.data().await.unwrap(),
        crate::FileContent::Text("two, longer".to_string())
    );
}
