use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use std::path::Path;
use swapcache::profile::Profile;
use swapcache::resolver::{ArtifactId, MapResolver};
use swapcache::scanner::SourceAsset;
use swapcache::store::{index_root, SnapshotStore};
use swapcache::sync::{SyncConfig, SyncEngine};
use tempfile::TempDir;

// Writes `count` artifacts into a sharded working root and returns the
// matching source assets and resolver.
fn setup_project(root: &Path, count: usize) -> (Vec<SourceAsset>, MapResolver) {
    let working = root.join("working");
    let assets = root.join("assets");
    fs::create_dir_all(&assets).expect("Failed to create assets dir");

    let mut sources = Vec::with_capacity(count);
    let mut resolver = MapResolver::new();
    for i in 0..count {
        let id = format!("{:08x}", (i as u64 * 2_654_435_761) % 0xffff_ffff);
        let artifact = working.join(&id[..2]).join(&id);
        fs::create_dir_all(artifact.parent().unwrap()).expect("Failed to create shard");
        fs::write(&artifact, vec![0u8; 4096]).expect("Failed to write artifact");

        let source = assets.join(format!("asset_{i}.png"));
        fs::write(&source, b"source").expect("Failed to write source");
        let modified = fs::metadata(&source).unwrap().modified().unwrap();

        resolver.insert(&source, ArtifactId::new(id).unwrap());
        sources.push(SourceAsset::new(source, modified));
    }
    (sources, resolver)
}

// 1. Indexing Benchmarks
fn bench_index_root(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    setup_project(dir.path(), 1000);
    let working = dir.path().join("working");

    c.bench_function("index_1000_artifacts", |b| {
        b.iter(|| black_box(index_root(&working).unwrap()))
    });
}

// 2. Save Benchmarks
fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    group.sample_size(20);

    let dir = TempDir::new().unwrap();
    let (sources, resolver) = setup_project(dir.path(), 500);
    let working = dir.path().join("working");
    let profile = Profile::new("bench").unwrap();

    // First save into a fresh store: every artifact is copied.
    group.bench_function("cold_500_artifacts", |b| {
        b.iter_with_setup(
            || {
                let data = TempDir::new().unwrap();
                let engine = SyncEngine::new(SnapshotStore::new(data.path()), SyncConfig::default());
                (data, engine)
            },
            |(_data, engine)| {
                black_box(engine.save(&profile, &working, &sources, &resolver).unwrap());
            },
        )
    });

    // Repeat save over an up-to-date store: nothing is copied.
    let data = TempDir::new().unwrap();
    let engine = SyncEngine::new(SnapshotStore::new(data.path()), SyncConfig::default());
    engine.save(&profile, &working, &sources, &resolver).unwrap();
    group.bench_function("warm_500_artifacts", |b| {
        b.iter(|| black_box(engine.save(&profile, &working, &sources, &resolver).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_index_root, bench_save);
criterion_main!(benches);
