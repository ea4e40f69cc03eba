//! SEIR compartment simulator.

use epi_core::math::ode::{linspace, DormandPrince, OdeIntegrator};
use tracing::debug;

use super::{CompartmentTrajectory, EpidemicParameters};
use crate::ModelError;

/// Right-hand side of the fractional SEIR system, `y = [S, E, I, R]`.
///
/// # Examples
/// ```
/// use epi_models::seir::{seir_rhs, EpidemicParameters};
///
/// let params = EpidemicParameters::new(0.5, 0.4, 0.2, 0.0, 0.0);
/// let mut dy = [0.0; 4];
/// seir_rhs(&params, &[0.9, 0.05, 0.05, 0.0], &mut dy);
///
/// // Flows out of one compartment enter the next
/// assert!(dy.iter().sum::<f64>().abs() < 1e-15);
/// ```
#[inline]
pub fn seir_rhs(params: &EpidemicParameters, y: &[f64], dy: &mut [f64]) {
    let (s, e, i) = (y[0], y[1], y[2]);
    let infection = params.beta * s * i;
    let onset = params.alpha * e;
    let recovery = params.gamma * i;
    dy[0] = -infection;
    dy[1] = infection - onset;
    dy[2] = onset - recovery;
    dy[3] = recovery;
}

/// Integrates the SEIR system for a fixed population.
///
/// The simulator holds no per-run state: every call to
/// [`simulate`](Self::simulate) returns its own trajectory, so one
/// simulator can be shared freely, including across threads.
///
/// # Examples
///
/// ```
/// use epi_models::seir::{EpidemicParameters, Simulator};
///
/// let simulator = Simulator::new(1000).unwrap();
/// let trajectory = simulator.simulate(&EpidemicParameters::default()).unwrap();
///
/// assert_eq!(trajectory.len(), 150);
/// assert!((trajectory.s()[0] - 849.9).abs() < 1e-9);
/// assert_eq!(trajectory.indicators().daily_incidence()[0], 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Simulator<I = DormandPrince> {
    population: u64,
    integrator: I,
}

impl Simulator<DormandPrince> {
    /// Create a simulator using the default Dormand–Prince integrator.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidParameter`] if `population` is zero.
    pub fn new(population: u64) -> Result<Self, ModelError> {
        Self::with_integrator(population, DormandPrince::default())
    }
}

impl<I: OdeIntegrator> Simulator<I> {
    /// Create a simulator with a custom integrator.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidParameter`] if `population` is zero.
    pub fn with_integrator(population: u64, integrator: I) -> Result<Self, ModelError> {
        if population == 0 {
            return Err(ModelError::invalid_parameter(
                "population",
                "must be positive",
            ));
        }
        Ok(Self {
            population,
            integrator,
        })
    }

    /// Population size.
    pub fn population(&self) -> u64 {
        self.population
    }

    /// Integrator in use.
    pub fn integrator(&self) -> &I {
        &self.integrator
    }

    /// Simulate an outbreak and derive its indicators.
    ///
    /// Integrates the fractional system from `S0 = 1 - I0 - R0`, `E0 = 0`,
    /// `I0 = init_inf_frac`, `R0 = init_rec_frac` over `tmax` uniformly
    /// spaced points spanning `[0, tmax]`, then scales to absolute counts.
    /// Integrator noise below zero is clamped to zero.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidParameter`] if the parameters fail
    ///   [`EpidemicParameters::validate`]
    /// - [`ModelError::Integration`] if the integrator fails
    pub fn simulate(
        &self,
        params: &EpidemicParameters,
    ) -> Result<CompartmentTrajectory, ModelError> {
        params.validate()?;
        let tmax = params.horizon();

        let y0 = [
            params.init_sus_frac(),
            0.0,
            params.init_inf_frac,
            params.init_rec_frac,
        ];
        let t = linspace(0.0, tmax as f64, tmax);

        let states = self
            .integrator
            .integrate(|_t, y, dy| seir_rhs(params, y, dy), &y0, &t)?;

        let scale = self.population as f64;
        let mut compartments: [Vec<f64>; 4] = Default::default();
        for compartment in compartments.iter_mut() {
            compartment.reserve(states.len());
        }
        for state in &states {
            for (compartment, &value) in compartments.iter_mut().zip(state) {
                compartment.push((value * scale).max(0.0));
            }
        }
        let [s, e, i, r] = compartments;

        debug!(
            population = self.population,
            tmax,
            alpha = params.alpha,
            beta = params.beta,
            gamma = params.gamma,
            init_inf_frac = params.init_inf_frac,
            init_rec_frac = params.init_rec_frac,
            "simulated SEIR trajectory"
        );

        Ok(CompartmentTrajectory::new(
            t,
            s,
            e,
            i,
            r,
            self.population,
            params.with_tmax(tmax),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use epi_core::math::ode::OdeConfig;
    use epi_core::types::OdeError;
    use proptest::prelude::*;

    #[test]
    fn test_reference_scenario_initial_state() {
        let simulator = Simulator::new(1000).unwrap();
        let trajectory = simulator.simulate(&EpidemicParameters::default()).unwrap();

        assert_eq!(trajectory.len(), 150);
        assert_relative_eq!(trajectory.s()[0], 849.9, max_relative = 1e-12);
        assert_eq!(trajectory.e()[0], 0.0);
        assert_relative_eq!(trajectory.i()[0], 0.1, max_relative = 1e-12);
        assert_relative_eq!(trajectory.r()[0], 150.0, max_relative = 1e-12);
        assert_eq!(trajectory.indicators().daily_incidence()[0], 0.0);
        assert_eq!(trajectory.t()[0], 0.0);
        assert_eq!(trajectory.t()[149], 150.0);
    }

    #[test]
    fn test_population_is_conserved() {
        let simulator = Simulator::new(1000).unwrap();
        let trajectory = simulator.simulate(&EpidemicParameters::default()).unwrap();
        for day in 0..trajectory.len() {
            assert_abs_diff_eq!(trajectory.total_at(day), 1000.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let simulator = Simulator::new(50_000).unwrap();
        let params = EpidemicParameters::new(0.3, 0.4, 0.2, 1e-3, 0.05).with_tmax(90);
        let a = simulator.simulate(&params).unwrap();
        let b = simulator.simulate(&params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_params_recorded_with_horizon() {
        let simulator = Simulator::new(100).unwrap();
        let params = EpidemicParameters::new(0.3, 0.4, 0.2, 1e-3, 0.05);
        let trajectory = simulator.simulate(&params).unwrap();
        assert_eq!(trajectory.params().tmax, Some(150));
        assert_eq!(trajectory.population(), 100);
    }

    #[test]
    fn test_single_day_horizon() {
        let simulator = Simulator::new(100).unwrap();
        let trajectory = simulator
            .simulate(&EpidemicParameters::default().with_tmax(1))
            .unwrap();
        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.indicators().weekly_incidence(), &[0.0]);
        assert_eq!(trajectory.indicators().daily_rt(), &[None]);
    }

    #[test]
    fn test_zero_population_rejected() {
        assert!(matches!(
            Simulator::new(0),
            Err(ModelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let simulator = Simulator::new(1000).unwrap();
        let negative_s0 = EpidemicParameters {
            init_inf_frac: 0.5,
            init_rec_frac: 0.6,
            ..Default::default()
        };
        assert!(matches!(
            simulator.simulate(&negative_s0),
            Err(ModelError::InvalidParameter { .. })
        ));
        assert!(matches!(
            simulator.simulate(&EpidemicParameters::default().with_tmax(0)),
            Err(ModelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_integrator_failure_surfaces() {
        let integrator = DormandPrince::new(OdeConfig {
            max_steps: 2,
            max_step: 1e-3,
            ..OdeConfig::default()
        });
        let simulator = Simulator::with_integrator(1000, integrator).unwrap();
        assert!(matches!(
            simulator.simulate(&EpidemicParameters::default()),
            Err(ModelError::Integration(OdeError::MaxStepsExceeded { .. }))
        ));
    }

    #[test]
    fn test_epidemic_grows_above_threshold() {
        let simulator = Simulator::new(1_000_000).unwrap();
        let params = EpidemicParameters::new(0.5, 0.5, 0.2, 1e-4, 0.0).with_tmax(200);
        let trajectory = simulator.simulate(&params).unwrap();
        let (peak_day, peak) = trajectory.peak_prevalence().unwrap();
        assert!(peak_day > 0);
        assert!(peak > 100.0 * trajectory.i()[0]);
        // Final size is strictly below the population
        assert!(trajectory.r()[199] < 1_000_000.0);
    }

    #[test]
    fn test_weekly_incidence_sums_to_daily() {
        let simulator = Simulator::new(1000).unwrap();
        let trajectory = simulator.simulate(&EpidemicParameters::default()).unwrap();
        let ind = trajectory.indicators();
        let daily: f64 = ind.daily_incidence().iter().sum();
        let weekly: f64 = ind.weekly_incidence().iter().sum();
        assert_abs_diff_eq!(daily, weekly, epsilon = 1e-9);
        assert_eq!(ind.weekly_incidence().len(), 22);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_conservation_and_non_negativity(
            alpha in 0.2f64..1.0,
            beta in 0.12f64..0.62,
            gamma in 0.12f64..0.25,
            init_inf_frac in 1e-6f64..1e-3,
            init_rec_frac in 0.01f64..0.2,
            tmax in 1usize..200,
        ) {
            let simulator = Simulator::new(10_000).unwrap();
            let params = EpidemicParameters::new(alpha, beta, gamma, init_inf_frac, init_rec_frac)
                .with_tmax(tmax);
            let trajectory = simulator.simulate(&params).unwrap();
            prop_assert_eq!(trajectory.len(), tmax);
            for day in 0..tmax {
                prop_assert!((trajectory.total_at(day) - 10_000.0).abs() < 1e-3);
                prop_assert!(trajectory.s()[day] >= 0.0);
                prop_assert!(trajectory.e()[day] >= 0.0);
                prop_assert!(trajectory.i()[day] >= 0.0);
                prop_assert!(trajectory.r()[day] >= 0.0);
            }
        }
    }
}
