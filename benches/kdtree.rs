use criterion::{criterion_group, criterion_main, Criterion};
use kd_index::kdtree::{KDTree, KDTreeIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstar::RTree;

fn random_points(rng: &mut StdRng, num_items: usize) -> Vec<[f64; 2]> {
    (0..num_items)
        .map(|_| [rng.gen_range(-180.0..180.0), rng.gen_range(-90.0..90.0)])
        .collect()
}

fn construct_kdtree(points: &[[f64; 2]]) -> KDTree<f64> {
    KDTree::build(points).unwrap()
}

fn construct_rstar(points: Vec<[f64; 2]>) -> RTree<[f64; 2]> {
    RTree::bulk_load(points)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let points = random_points(&mut rng, 100_000);
    let queries = random_points(&mut rng, 1_000);

    c.bench_function("construction (kdtree)", |b| {
        b.iter(|| construct_kdtree(&points))
    });

    c.bench_function("construction (rstar bulk)", |b| {
        b.iter(|| construct_rstar(points.to_vec()))
    });

    let kdtree = construct_kdtree(&points);
    let rstar_tree = construct_rstar(points.to_vec());

    c.bench_function("nearest (kdtree)", |b| {
        b.iter(|| {
            for query in queries.iter() {
                kdtree.nearest(&points, query).unwrap();
            }
        })
    });

    c.bench_function("nearest batch (kdtree)", |b| {
        b.iter(|| kdtree.nearest_batch(&points, &queries).unwrap())
    });

    c.bench_function("nearest (rstar)", |b| {
        b.iter(|| {
            for query in queries.iter() {
                rstar_tree.nearest_neighbor(query);
            }
        })
    });

    c.bench_function("to_bytes (kdtree)", |b| b.iter(|| kdtree.to_bytes()));

    let bytes = kdtree.to_bytes();
    c.bench_function("from_bytes (kdtree)", |b| {
        b.iter(|| KDTree::<f64>::from_bytes(&bytes).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
