use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use innovation_focus::analysis::{LinearRegression, RegressionAnalyzer};
use innovation_focus::builder::DatasetBuilder;
use innovation_focus::random::SeededRandom;
use innovation_focus::schema::RawObservation;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_raw_rows(n_rows: usize) -> Vec<RawObservation> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    (0..n_rows)
        .map(|i| RawObservation {
            year: Some(1900 + i as i64),
            rd_investment: Some(rng.gen_range(1.0..6.0)),
            equipment_investment: Some(rng.gen_range(3.0..9.0)),
        })
        .collect()
}

fn bench_regression(c: &mut Criterion) {
    let mut group = c.benchmark_group("regression");

    for n_rows in [12, 1000, 10000].iter() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let x = Array2::from_shape_fn((*n_rows, 2), |_| rng.gen::<f64>());
        let y: Array1<f64> = x.rows().into_iter().map(|r| 2.0 * r[0] + 0.5 * r[1] + rng.gen::<f64>() * 0.1).collect();

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                let mut model = LinearRegression::new();
                model.fit(black_box(x), black_box(y)).unwrap();
                model
            })
        });
    }

    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");

    for n_rows in [12, 1000].iter() {
        let raw = create_raw_rows(*n_rows);

        group.bench_with_input(BenchmarkId::new("build_and_analyze", n_rows), &raw, |b, raw| {
            b.iter(|| {
                let built = DatasetBuilder::new().build(black_box(raw), &mut SeededRandom::new(42));
                RegressionAnalyzer::default()
                    .analyze(&built.observations, &mut SeededRandom::new(42))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_regression, bench_stages);
criterion_main!(benches);
