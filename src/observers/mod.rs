pub mod luenberger;
pub mod observer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{Integrator, TankParameters, TwoTankSystem};
use luenberger::LuenbergerObserver;
use observer::Observer;

/// Everything needed to build an observer before the run starts.
/// State and gain are set on the built observer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObserverConfig {
    /// Seconds between two `compute` calls
    pub sample_time: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub integrator: Integrator,
    pub tank: TankParameters,
}

impl ObserverConfig {
    pub fn new(sample_time: f64, tank: TankParameters) -> Self {
        Self {
            sample_time,
            integrator: Integrator::default(),
            tank,
        }
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn build(&self) -> Result<LuenbergerObserver<TwoTankSystem>, Error> {
        let model = TwoTankSystem::new(self.tank)?;
        LuenbergerObserver::new(model, self.sample_time, self.integrator)
    }

    pub fn into_observer(self) -> Result<Box<dyn Observer>, Error> {
        Ok(Box::new(self.build()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TankState;
    use crate::observers::observer::ObserverStatus;

    fn unit_params() -> TankParameters {
        TankParameters::new(1.0, 1.0, 1.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn build_boxed_observer() {
        let mut observer = ObserverConfig::new(0.1, unit_params()).into_observer().unwrap();
        assert_eq!(observer.status(), ObserverStatus::Uninitialized);
        assert_eq!(observer.sample_time(), 0.1);

        observer.set_initial_state(&[0.0, 0.0]).unwrap();
        observer.set_gain(&[0.5, 0.2]).unwrap();
        let x_hat = observer.compute(0.0, 1.0).unwrap();
        approx::assert_abs_diff_eq!(x_hat, TankState::new(0.1, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn variant_selected_by_integrator() {
        let config = ObserverConfig::new(0.1, unit_params());
        assert_eq!(config.build().unwrap().integrator(), Integrator::Euler);

        let config = config.with_integrator(Integrator::Rk4);
        assert_eq!(config.build().unwrap().integrator(), Integrator::Rk4);
    }

    #[test]
    fn invalid_config() {
        assert_eq!(
            ObserverConfig::new(0.0, unit_params()).build().err(),
            Some(Error::InvalidSampleTime(0.0))
        );

        let mut tank = unit_params();
        tank.a2 = -1.0;
        assert_eq!(
            ObserverConfig::new(0.1, tank).into_observer().err(),
            Some(Error::InvalidParameter {
                name: "a2",
                value: -1.0
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_from_json() {
        let config: ObserverConfig = serde_json::from_str(
            r#"{
                "sample_time": 0.05,
                "tank": { "a1": 1.5, "a2": 1.2, "k1": 0.3, "k2": 0.25, "pump_gain": 0.8 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.integrator, Integrator::Euler);
        assert_eq!(config.tank.k2, 0.25);
        assert!(config.build().is_ok());
    }
}
