//! Benchmarks for epi_optimiser.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use epi_core::types::{from_dense, ObservedSeries};
use epi_models::seir::{EpidemicParameters, Simulator};
use epi_optimiser::{CalibrationConfig, Calibrator};

fn observed_wave(simulator: &Simulator) -> ObservedSeries {
    let params = EpidemicParameters::new(0.5, 0.4, 0.2, 2e-4, 0.05).with_tmax(100);
    let trajectory = simulator.simulate(&params).unwrap();
    from_dense(trajectory.indicators().daily_incidence())
}

fn benchmark_loss(c: &mut Criterion) {
    let simulator = Simulator::new(100_000).unwrap();
    let observed = observed_wave(&simulator);
    let calibrator = Calibrator::new(&simulator, CalibrationConfig::default()).unwrap();
    let candidate = [0.6, 0.35, 0.18, 5e-4, 0.08];

    c.bench_function("calibration_loss_100d", |b| {
        b.iter(|| calibrator.loss(black_box(&candidate), black_box(&observed)))
    });
}

fn benchmark_calibrate(c: &mut Criterion) {
    let simulator = Simulator::new(100_000).unwrap();
    let observed = observed_wave(&simulator);
    let config = CalibrationConfig::builder()
        .restarts(2)
        .max_iterations(200)
        .max_polish_evaluations(200)
        .build()
        .unwrap();
    let calibrator = Calibrator::new(&simulator, config).unwrap();

    let mut group = c.benchmark_group("calibrate");
    group.sample_size(10);
    group.bench_function("small_budget_100d", |b| {
        b.iter(|| calibrator.calibrate(black_box(&observed)))
    });
    group.finish();
}

criterion_group!(benches, benchmark_loss, benchmark_calibrate);
criterion_main!(benches);
