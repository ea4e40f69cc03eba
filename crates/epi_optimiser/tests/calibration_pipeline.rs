//! Integration tests for calibration against simulated observations.
//!
//! These tests run the full simulate → perturb → calibrate pipeline and
//! check that known parameters are recovered from their own trajectories.

use anyhow::Result;
use epi_core::math::ode::OdeIntegrator;
use epi_core::types::{from_dense, ObservedSeries};
use epi_models::observation::{NoiseMode, ObservationNoiseModel};
use epi_models::seir::{EpidemicParameters, Simulator, PARAMETER_NAMES};
use epi_optimiser::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A full epidemic wave inside the default search space.
fn wave_scenario() -> EpidemicParameters {
    EpidemicParameters::new(0.5, 0.4, 0.2, 2e-4, 0.05).with_tmax(150)
}

fn observe<I: OdeIntegrator>(
    simulator: &Simulator<I>,
    params: &EpidemicParameters,
) -> Result<ObservedSeries> {
    let trajectory = simulator.simulate(params)?;
    Ok(from_dense(trajectory.indicators().daily_incidence()))
}

// ============================================================================
// Self-Consistency
// ============================================================================

/// Calibrating against a noiseless trajectory recovers every parameter.
#[test]
fn test_noiseless_wave_is_recovered() -> Result<()> {
    init_tracing();
    let simulator = Simulator::new(100_000)?;
    let truth = wave_scenario();
    let observed = observe(&simulator, &truth)?;

    let result = simulator.calibrate(&observed)?;

    assert!(1.0 - result.score < 1e-8, "score {}", result.score);
    assert!(result.score <= 1.0);
    assert_eq!(result.observations, 150);
    assert_eq!(result.params.tmax, Some(150));

    let space = SearchSpace::default();
    assert!(space.contains(&result.params));

    let errors = result.parameter_errors(&truth);
    for (name, error) in PARAMETER_NAMES.iter().zip(&errors) {
        assert!(*error < 0.02, "{} relative error {}", name, error);
    }
    for ((bounds, estimate), exact) in space
        .bounds()
        .iter()
        .zip(result.params.as_array())
        .zip(truth.as_array())
    {
        assert!((estimate - exact).abs() < 0.01 * bounds.width());
    }

    let r0_error = (result.params.basic_reproduction_number()
        - truth.basic_reproduction_number())
    .abs()
        / truth.basic_reproduction_number();
    assert!(r0_error < 0.01, "R0 relative error {}", r0_error);
    Ok(())
}

/// Refinement is what takes the fit from a close match to the truth.
#[test]
fn test_refinement_improves_annealed_fit() -> Result<()> {
    init_tracing();
    let simulator = Simulator::new(100_000)?;
    let truth = wave_scenario();
    let observed = observe(&simulator, &truth)?;
    let annealing_only = CalibrationConfig::builder().refine(false).build()?;

    let annealed = simulator.calibrate_with(&observed, annealing_only)?;
    let refined = simulator.calibrate(&observed)?;

    assert!(refined.score >= annealed.score);
    assert!(refined.evaluations > annealed.evaluations);
    let worst = |errors: Vec<f64>| errors.into_iter().fold(0.0, f64::max);
    assert!(
        worst(refined.parameter_errors(&truth)) <= worst(annealed.parameter_errors(&truth)),
        "refined {} annealed {}",
        refined.params,
        annealed.params
    );
    Ok(())
}

/// The default scenario is matched closely, although its early growth
/// phase does not pin every parameter individually.
#[test]
fn test_default_scenario_score() -> Result<()> {
    init_tracing();
    let simulator = Simulator::new(1_000)?;
    let observed = observe(&simulator, &EpidemicParameters::default())?;

    let result = simulator.calibrate_with(&observed, CalibrationConfig::fast())?;

    assert!(result.score >= 0.95, "score {}", result.score);
    Ok(())
}

/// Missing days are skipped rather than treated as zero.
#[test]
fn test_missing_days_are_ignored() -> Result<()> {
    init_tracing();
    let simulator = Simulator::new(100_000)?;
    let mut observed = observe(&simulator, &wave_scenario())?;
    for (day, value) in observed.iter_mut().enumerate() {
        if day % 3 == 0 {
            *value = None;
        }
    }

    let result = simulator.calibrate_with(&observed, CalibrationConfig::fast())?;

    assert_eq!(result.observations, 100);
    assert!(result.score >= 0.999, "score {}", result.score);
    Ok(())
}

// ============================================================================
// Noisy Observations
// ============================================================================

/// Delayed, underreported data still yields a bounded, in-range fit.
#[test]
fn test_noisy_observations() -> Result<()> {
    init_tracing();
    let simulator = Simulator::new(100_000)?;
    let truth = wave_scenario();
    let trajectory = simulator.simulate(&truth)?;

    let mut noise = ObservationNoiseModel::with_seed(
        trajectory.indicators().daily_incidence(),
        2.0,
        0.3,
        NoiseMode::Fixed,
        17,
    )?;
    noise.add_noise();
    let observed = noise.into_incidence();

    let calibrator = Calibrator::new(&simulator, CalibrationConfig::fast())?;
    let result = calibrator.calibrate(&observed)?;

    assert_eq!(result.observations, 148);
    assert!(result.score <= 1.0);
    assert!(result.score.is_finite());
    assert!(calibrator.search_space().contains(&result.params));
    assert!(result.evaluations >= result.iterations);
    Ok(())
}

/// Calibration is deterministic for a fixed seed.
#[test]
fn test_same_seed_same_fit() -> Result<()> {
    let simulator = Simulator::new(10_000)?;
    let observed = observe(&simulator, &wave_scenario().with_tmax(60))?;
    let config = CalibrationConfig::builder()
        .seed(99)
        .restarts(3)
        .max_iterations(150)
        .max_polish_evaluations(200)
        .build()?;

    let first = simulator.calibrate_with(&observed, config.clone())?;
    let second = simulator.calibrate_with(&observed, config)?;

    assert_eq!(first.params, second.params);
    assert_eq!(first.score, second.score);
    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Entirely missing observations cannot be calibrated.
#[test]
fn test_all_missing_is_insufficient() -> Result<()> {
    let simulator = Simulator::new(1_000)?;
    let err = simulator.calibrate(&vec![None; 30]).unwrap_err();

    assert_eq!(err, CalibrationError::insufficient_data(0, 30));
    assert!(err.to_string().contains("0 of 30"));
    Ok(())
}

/// Relative error is re-exported for judging recovered parameters.
#[test]
fn test_relative_error_export() -> Result<()> {
    let truth = EpidemicParameters::default();
    let estimate = EpidemicParameters {
        beta: truth.beta * 1.1,
        ..truth
    };
    let errors = relative_error(&truth.as_array(), &estimate.as_array())?;

    assert!(errors[0].abs() < 1e-15);
    assert!((errors[1] - 0.1).abs() < 1e-12);
    Ok(())
}
