//! Integration tests for the simulate → indicators → observation pipeline.

use approx::assert_relative_eq;
use epi_core::types::{observed_count, observed_sum};
use epi_models::observation::{NoiseMode, ObservationNoiseModel, UNDERREPORTING_SPREAD};
use epi_models::seir::{EpidemicParameters, Simulator};
use epi_models::{ModelError, NoiseError};

// ============================================================================
// Simulation and Indicators
// ============================================================================

/// Daily incidence equals the flow out of S, which is non-negative.
#[test]
fn test_incidence_matches_susceptible_depletion() {
    let simulator = Simulator::new(100_000).unwrap();
    let trajectory = simulator.simulate(&EpidemicParameters::default()).unwrap();
    let ind = trajectory.indicators();

    let total_incidence: f64 = ind.daily_incidence().iter().sum();
    let depletion = trajectory.s()[0] - trajectory.s()[trajectory.len() - 1];
    let exposed_change = trajectory.e()[trajectory.len() - 1] - trajectory.e()[0];

    // Sum of (E[i-1] - E[i]) - (S[i] - S[i-1]) telescopes
    assert_relative_eq!(
        total_incidence,
        depletion - exposed_change,
        max_relative = 1e-9
    );
}

/// Daily Rt is defined wherever recoveries move, which is every day after the first.
#[test]
fn test_daily_rt_defined_after_day_zero() {
    let simulator = Simulator::new(10_000).unwrap();
    let trajectory = simulator.simulate(&EpidemicParameters::default()).unwrap();
    let rt = trajectory.indicators().daily_rt();

    assert_eq!(rt[0], None);
    assert!(rt[1..].iter().all(Option::is_some));
}

/// Weekly series cover the horizon in blocks of seven.
#[test]
fn test_weekly_lengths_round_up() {
    let simulator = Simulator::new(10_000).unwrap();
    for (tmax, weeks) in [(7usize, 1usize), (8, 2), (150, 22)] {
        let trajectory = simulator
            .simulate(&EpidemicParameters::default().with_tmax(tmax))
            .unwrap();
        assert_eq!(trajectory.indicators().weekly_incidence().len(), weeks);
        assert_eq!(trajectory.indicators().weekly_rt().len(), weeks);
    }
}

/// Parameters decoded from a slice reproduce the same trajectory.
#[test]
fn test_slice_parameters_simulate_identically() {
    let simulator = Simulator::new(5_000).unwrap();
    let params = EpidemicParameters::new(0.4, 0.3, 0.15, 5e-4, 0.1).with_tmax(60);
    let decoded = EpidemicParameters::from_slice(&params.as_array(), Some(60)).unwrap();

    assert_eq!(
        simulator.simulate(&params).unwrap(),
        simulator.simulate(&decoded).unwrap()
    );
}

/// Invalid parameters surface as model errors rather than panics.
#[test]
fn test_invalid_rates_rejected() {
    let simulator = Simulator::new(1_000).unwrap();
    let params = EpidemicParameters {
        gamma: f64::NAN,
        ..Default::default()
    };
    assert!(matches!(
        simulator.simulate(&params),
        Err(ModelError::InvalidParameter { .. })
    ));
}

// ============================================================================
// Observation Noise
// ============================================================================

/// Noisy series keep the horizon and only lose mass.
#[test]
fn test_noisy_series_loses_mass() {
    let simulator = Simulator::new(100_000).unwrap();
    let trajectory = simulator.simulate(&EpidemicParameters::default()).unwrap();
    let truth = trajectory.indicators().daily_incidence();

    let mut model =
        ObservationNoiseModel::with_seed(truth, 3.0, 0.4, NoiseMode::Random, 2024).unwrap();
    model.add_noise();
    let observed = model.into_incidence();

    assert_eq!(observed.len(), truth.len());
    let true_mass: f64 = truth.iter().sum();
    assert!(observed_sum(&observed) <= (0.4 + UNDERREPORTING_SPREAD) * true_mass + 1e-9);
    assert!(observed_count(&observed) > 0);
}

/// Fixed mode with no delay only scales.
#[test]
fn test_fixed_mode_without_delay_scales() {
    let truth = [3.0, 0.0, 12.0, 7.5];
    let mut model =
        ObservationNoiseModel::with_seed(&truth, 0.0, 0.5, NoiseMode::Fixed, 0).unwrap();
    model.add_noise();

    assert_eq!(
        model.incidence(),
        &[Some(1.5), Some(0.0), Some(6.0), Some(3.75)]
    );
}

/// Modes can be selected by name, and unknown names are refused.
#[test]
fn test_mode_selected_by_name() {
    let mode: NoiseMode = "fixed".parse().unwrap();
    assert!(ObservationNoiseModel::with_seed(&[1.0], 1.0, 0.5, mode, 0).is_ok());
    assert!(matches!(
        "gamma".parse::<NoiseMode>(),
        Err(NoiseError::NotImplemented(_))
    ));
}

#[cfg(feature = "serde")]
#[test]
fn test_trajectory_serialises() {
    let simulator = Simulator::new(1_000).unwrap();
    let trajectory = simulator
        .simulate(&EpidemicParameters::default().with_tmax(14))
        .unwrap();
    let json = serde_json::to_value(&trajectory).unwrap();

    assert_eq!(json["population"], 1000);
    assert_eq!(json["params"]["tmax"], 14);
    assert_eq!(json["indicators"]["weekly_incidence"].as_array().unwrap().len(), 2);
}
