use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geofleet::{BoundingBox, GridIndex, IndexedDriver, QuadTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MIN_LAT: f64 = 18.5204;
const MAX_LAT: f64 = 19.0760;
const MIN_LNG: f64 = 72.8777;
const MAX_LNG: f64 = 72.9982;

fn bounds() -> BoundingBox {
    BoundingBox::new(MIN_LAT, MAX_LAT, MIN_LNG, MAX_LNG)
}

fn entries(count: usize) -> Vec<IndexedDriver> {
    let mut rng = StdRng::seed_from_u64(1);
    (0..count)
        .map(|i| {
            IndexedDriver::new(
                format!("d{i}"),
                rng.gen_range(MIN_LAT..MAX_LAT),
                rng.gen_range(MIN_LNG..MAX_LNG),
            )
        })
        .collect()
}

fn benchmark_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let entries = entries(10_000);

    group.bench_function("quadtree_10k", |b| {
        b.iter(|| {
            let tree = QuadTree::new(bounds());
            for entry in &entries {
                tree.insert(black_box(entry));
            }
            tree
        })
    });

    group.bench_function("grid_10k", |b| {
        b.iter(|| {
            let grid = GridIndex::new(bounds(), 0.5);
            for entry in &entries {
                grid.insert(black_box(entry));
            }
            grid
        })
    });

    group.finish();
}

fn benchmark_search_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_radius");

    for size in [1_000usize, 10_000, 50_000] {
        let entries = entries(size);

        let tree = QuadTree::new(bounds());
        let grid = GridIndex::new(bounds(), 0.5);
        for entry in &entries {
            tree.insert(entry);
            grid.insert(entry);
        }

        group.bench_with_input(BenchmarkId::new("quadtree", size), &size, |b, _| {
            b.iter(|| tree.search_radius(black_box(18.8), black_box(72.93), black_box(2.0)))
        });

        group.bench_with_input(BenchmarkId::new("grid", size), &size, |b, _| {
            b.iter(|| grid.search_radius(black_box(18.8), black_box(72.93), black_box(2.0)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_insert, benchmark_search_radius);
criterion_main!(benches);
