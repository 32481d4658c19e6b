mod common;

use anyhow::Result;
use common::TestTree;
use filetime::FileTime;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tripwire::config::PathList;
use tripwire::diff::RunKind;
use tripwire::run::RunOutcome;
use tripwire::scanner::AdvisoryKind;
use tripwire::storage::CatalogStore;

fn set(paths: &[PathBuf]) -> BTreeSet<PathBuf> {
    paths.iter().cloned().collect()
}

#[test]
fn test_end_to_end_first_run_then_changes() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    tree.write("b.txt", "world")?;
    tree.write("sub/c.txt", "x")?;

    let first = tree.run();
    assert_eq!(first.kind, RunKind::FirstRun);
    assert_eq!(first.outcome, RunOutcome::Completed { persisted: true });
    assert_eq!(
        first.diff.new,
        set(&[tree.key("a.txt"), tree.key("b.txt"), tree.key("sub/c.txt")])
    );
    assert!(first.diff.modified.is_empty());
    assert!(first.diff.deleted.is_empty());

    let saved = CatalogStore::new(tree.catalog_path(), 3).load()?;
    assert_eq!(saved.map(|c| c.len()), Some(3));

    tree.write("b.txt", "world2")?;
    tree.remove("a.txt")?;

    let second = tree.run();
    assert_eq!(second.kind, RunKind::ChangesDetected);
    assert!(second.diff.new.is_empty());
    assert_eq!(second.diff.deleted, set(&[tree.key("a.txt")]));
    assert_eq!(second.diff.modified, set(&[tree.key("b.txt")]));
    assert_eq!(second.counts.deleted, 1);
    assert_eq!(second.counts.modified, 1);
    Ok(())
}

#[test]
fn test_no_op_run_leaves_catalog_untouched() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("index.html", "<html></html>")?;
    tree.write("css/site.css", "body {}")?;

    assert_eq!(tree.run().kind, RunKind::FirstRun);

    // Backdate the catalog so a rewrite would be visible.
    let past = FileTime::from_unix_time(1_000_000_000, 0);
    filetime::set_file_mtime(tree.catalog_path(), past)?;
    let bytes_before = fs::read(tree.catalog_path())?;

    let second = tree.run();
    assert_eq!(second.kind, RunKind::NoChanges);
    assert!(!second.changed());
    assert_eq!(second.outcome, RunOutcome::Completed { persisted: false });

    let meta = fs::metadata(tree.catalog_path())?;
    assert_eq!(FileTime::from_last_modification_time(&meta), past);
    assert_eq!(fs::read(tree.catalog_path())?, bytes_before);
    Ok(())
}

#[test]
fn test_excluded_extension_never_cataloged() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("app.log", "line")?;
    tree.write("app.php", "<?php")?;

    let mut config = tree.config();
    config.scan.exclude_extensions = vec!["log".to_string()];
    let report = tree.run_with(config);

    assert_eq!(report.diff.new, set(&[tree.key("app.php")]));
    assert!(report.advisories.iter().any(|a| {
        a.kind == AdvisoryKind::Excluded && a.path.as_deref() == Some(tree.key("app.log").as_path())
    }));
    assert_eq!(report.stats.excluded, 1);
    Ok(())
}

#[test]
fn test_excluded_directory_is_not_descended() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("site/page.html", "page")?;
    tree.write(".git/HEAD", "ref: refs/heads/main")?;
    tree.write(".git/objects/ab/cdef", "blob")?;

    let report = tree.run();

    assert_eq!(report.diff.new, set(&[tree.key("site/page.html")]));
    assert_eq!(report.stats.excluded, 1);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_never_followed() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("real.txt", "real")?;

    let outside = tree.path().join("outside");
    fs::create_dir_all(&outside)?;
    fs::write(outside.join("secret.txt"), "secret")?;
    std::os::unix::fs::symlink(&outside, tree.root.join("link"))?;

    let report = tree.run();

    assert_eq!(report.diff.new, set(&[tree.key("real.txt")]));
    assert!(report.diff.new.iter().all(|p| !p.starts_with(tree.key("link"))));
    assert!(report.advisories.iter().any(|a| {
        a.kind == AdvisoryKind::Symlink && a.path.as_deref() == Some(tree.key("link").as_path())
    }));
    Ok(())
}

#[test]
fn test_corrupt_catalog_recovers_as_first_run() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    fs::write(tree.catalog_path(), b"TRIPCAT\x01garbage")?;

    let report = tree.run();
    assert_eq!(report.kind, RunKind::FirstRun);
    assert_eq!(report.outcome, RunOutcome::Completed { persisted: true });
    assert!(report.advisories.iter().any(|a| a.kind == AdvisoryKind::Catalog));

    // The rewritten catalog is usable again.
    assert_eq!(tree.run().kind, RunKind::NoChanges);
    Ok(())
}

#[test]
fn test_missing_root_is_advisory_and_others_still_walk() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    let missing = tree.path().join("does-not-exist");

    let mut config = tree.config();
    config.scan.paths = PathList::List(vec![
        missing.to_string_lossy().into_owned(),
        tree.root.to_string_lossy().into_owned(),
    ]);
    let report = tree.run_with(config);

    assert_eq!(report.diff.new, set(&[tree.key("a.txt")]));
    assert!(
        report
            .advisories
            .iter()
            .any(|a| a.kind == AdvisoryKind::RootMissing && a.message.contains("does not exist"))
    );
    Ok(())
}

#[test]
fn test_trailing_separator_roots_share_keys() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    tree.run();

    let mut config = tree.config();
    config.scan.paths = PathList::List(vec![format!("{}/", tree.root.display())]);
    let report = tree.run_with(config);

    assert_eq!(report.kind, RunKind::NoChanges);
    Ok(())
}

#[test]
fn test_deleted_root_reports_everything_deleted() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    tree.write("b.txt", "world")?;
    tree.run();

    fs::remove_dir_all(&tree.root)?;
    let report = tree.run();

    assert_eq!(report.kind, RunKind::ChangesDetected);
    assert_eq!(report.diff.deleted, set(&[tree.key("a.txt"), tree.key("b.txt")]));
    assert!(report.diff.new.is_empty());
    Ok(())
}

#[test]
fn test_parallel_and_serial_roots_agree() -> Result<()> {
    let tree = TestTree::new()?;
    for site in ["alpha", "beta", "gamma"] {
        tree.write(&format!("{site}/index.html"), site)?;
        tree.write(&format!("{site}/assets/app.js"), "js")?;
    }
    let roots: Vec<String> = ["alpha", "beta", "gamma"]
        .iter()
        .map(|s| tree.key(s).to_string_lossy().into_owned())
        .collect();

    let mut parallel = tree.config();
    parallel.scan.paths = PathList::List(roots.clone());
    parallel.scan.parallel_roots = true;
    parallel.storage.catalog_path = tree.state.join("parallel.bin");

    let mut serial = parallel.clone();
    serial.scan.parallel_roots = false;
    serial.storage.catalog_path = tree.state.join("serial.bin");

    let a = tree.run_with(parallel);
    let b = tree.run_with(serial);
    assert_eq!(a.diff, b.diff);
    assert_eq!(a.counts.new, 6);

    let a = CatalogStore::new(tree.state.join("parallel.bin"), 3).load()?;
    let b = CatalogStore::new(tree.state.join("serial.bin"), 3).load()?;
    assert_eq!(a, b);
    Ok(())
}
