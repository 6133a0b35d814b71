use crate::error::Error;
use crate::models::TankState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverStatus {
    /// Initial state or gain has not been set yet
    Uninitialized,
    Ready,
}

/// State estimator of the two tank system, driven by the measured tank 1 height
/// and the pump voltage once per sample tick.
pub trait Observer {
    /// Replace the estimated state. Must have one entry per tank.
    fn set_initial_state(&mut self, initial_state: &[f64]) -> Result<(), Error>;

    /// Replace the observer gain. Must have one entry per tank.
    fn set_gain(&mut self, gain: &[f64]) -> Result<(), Error>;

    /// Advance the estimate one sample period and return it.
    fn compute(&mut self, height1: f64, pump_voltage: f64) -> Result<TankState, Error>;

    fn estimate(&self) -> Option<TankState>;

    fn status(&self) -> ObserverStatus;

    fn sample_time(&self) -> f64;

    /// Feed a recorded series tick by tick.
    /// Returns the estimate after every tick.
    fn run(&mut self, heights1: &[f64], pump_voltages: &[f64]) -> Result<Vec<TankState>, Error> {
        if heights1.len() != pump_voltages.len() {
            return Err(Error::DimensionMismatch {
                what: "pump voltage series",
                expected: heights1.len(),
                got: pump_voltages.len(),
            });
        }
        heights1
            .iter()
            .zip(pump_voltages)
            .map(|(&y, &u)| self.compute(y, u))
            .collect()
    }
}
