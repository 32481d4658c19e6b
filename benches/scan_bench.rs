use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::fs;
use std::hint::black_box;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use tripwire::diff::diff;
use tripwire::run::CancelToken;
use tripwire::scanner::{ExclusionRules, walk};
use tripwire::storage::Catalog;
use tripwire::utils::hash::{fingerprint, hash_bytes};

fn create_tree(dir: &Path, dirs: usize, files_per_dir: usize) {
    for d in 0..dirs {
        let sub = dir.join(format!("dir_{d}"));
        fs::create_dir_all(&sub).unwrap();
        for f in 0..files_per_dir {
            let content = format!("<?php // file {d}/{f} with some content to hash");
            fs::write(sub.join(format!("file_{f}.php")), content).unwrap();
        }
    }
}

fn synthetic_catalog(count: usize, salt: u8) -> Catalog {
    (0..count)
        .map(|i| {
            let digest = if i % 10 == 0 { salt } else { 0 };
            (
                PathBuf::from(format!("/var/www/site/file_{i}.php")),
                hash_bytes(&[digest, (i % 251) as u8]),
            )
        })
        .collect()
}

fn benchmark_fingerprint(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let small = dir.path().join("small.txt");
    let medium = dir.path().join("medium.txt");
    let large = dir.path().join("large.txt");

    fs::write(&small, vec![b'a'; 1024]).unwrap(); // 1KB
    fs::write(&medium, vec![b'b'; 1024 * 100]).unwrap(); // 100KB, streamed
    fs::write(&large, vec![b'c'; 1024 * 1024 * 10]).unwrap(); // 10MB, mmapped

    let mut group = c.benchmark_group("fingerprint");
    group.bench_function("1kb", |b| b.iter(|| fingerprint(black_box(&small))));
    group.bench_function("100kb", |b| b.iter(|| fingerprint(black_box(&medium))));
    group.bench_function("10mb", |b| b.iter(|| fingerprint(black_box(&large))));
    group.finish();
}

fn benchmark_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk");
    group.sample_size(20);

    for files in [10, 100] {
        let dir = tempdir().unwrap();
        create_tree(dir.path(), 10, files);
        let root = dir.path().to_string_lossy().into_owned();
        let rules = ExclusionRules::default();
        let cancel = CancelToken::new();

        group.bench_with_input(BenchmarkId::from_parameter(files * 10), &root, |b, root| {
            b.iter(|| walk(black_box(root), &rules, &cancel).unwrap());
        });
    }
    group.finish();
}

fn benchmark_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    for size in [1_000, 10_000, 100_000] {
        let previous = synthetic_catalog(size, 1);
        let current = synthetic_catalog(size, 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| diff(black_box(&previous), black_box(&current)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_fingerprint, benchmark_walk, benchmark_diff);
criterion_main!(benches);
