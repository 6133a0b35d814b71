extern crate nalgebra as na;

use log::{debug, trace};

use crate::error::Error;
use crate::linsystheory::{euler_error_dynamics, is_stable};
use crate::models::{ContinuousModel, Differentiable, Integrator, TankState};
use crate::observers::observer::{Observer, ObserverStatus};

/// Luenberger observer for the two tank system, measuring the height of tank 1.
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct LuenbergerObserver<T>
where
    T: ContinuousModel<2, 1>,
{
    // x_hat(k+1) = x_hat(k) + T*(f(x_hat(k), u) + L*(y - x_hat_1(k)))
    model: T,
    integrator: Integrator,
    sample_time: f64,
    L: Option<TankState>,
    x_hat: Option<TankState>,
}

fn tank_state_from(values: &[f64], what: &'static str) -> Result<TankState, Error> {
    match values {
        [h1, h2] => Ok(TankState::new(*h1, *h2)),
        _ => Err(Error::DimensionMismatch {
            what,
            expected: 2,
            got: values.len(),
        }),
    }
}

/// Rejects the first entry that fails `valid`.
fn check_entries(
    values: &TankState,
    what: &'static str,
    valid: fn(f64) -> bool,
) -> Result<(), Error> {
    match values.iter().find(|v| !valid(**v)) {
        Some(&value) => Err(Error::InvalidValue { what, value }),
        None => Ok(()),
    }
}

fn check_scalar(value: f64, what: &'static str) -> Result<(), Error> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidValue { what, value })
    }
}

#[allow(non_snake_case)]
impl<T: ContinuousModel<2, 1>> LuenbergerObserver<T> {
    pub fn new(model: T, sample_time: f64, integrator: Integrator) -> Result<Self, Error> {
        if !sample_time.is_finite() || sample_time <= 0.0 {
            return Err(Error::InvalidSampleTime(sample_time));
        }
        Ok(Self {
            model,
            integrator,
            sample_time,
            L: None,
            x_hat: None,
        })
    }

    pub fn model(&self) -> &T {
        &self.model
    }

    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    pub fn gain(&self) -> Option<&TankState> {
        self.L.as_ref()
    }

    /// Right hand side of the observer ODE with y and u held over the tick.
    fn observer_dynamics(
        &self,
        x_hat: &TankState,
        L: &TankState,
        y: f64,
        u: &na::Vector1<f64>,
    ) -> TankState {
        self.model.derivative(x_hat, u) + L * (y - x_hat[0])
    }

    fn step(&self, x_hat: &TankState, L: &TankState, y: f64, u: &na::Vector1<f64>) -> TankState {
        let dt = self.sample_time;
        match self.integrator {
            Integrator::Euler => x_hat + self.observer_dynamics(x_hat, L, y, u) * dt,
            Integrator::Rk4 => {
                let k1 = self.observer_dynamics(x_hat, L, y, u);
                let k2 = self.observer_dynamics(&(x_hat + k1 * (dt / 2.0)), L, y, u);
                let k3 = self.observer_dynamics(&(x_hat + k2 * (dt / 2.0)), L, y, u);
                let k4 = self.observer_dynamics(&(x_hat + k3 * dt), L, y, u);
                x_hat + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
            }
        }
    }

    /// Logs the Uninitialized -> Ready transition, returns whether it happened.
    fn log_transition(&self, before: ObserverStatus) -> bool {
        let became_ready =
            before == ObserverStatus::Uninitialized && self.status() == ObserverStatus::Ready;
        if became_ready {
            debug!("luenberger observer ready, T = {}s", self.sample_time);
        }
        became_ready
    }
}

impl<T: ContinuousModel<2, 1> + Differentiable<2, 1>> LuenbergerObserver<T> {
    /// Whether the Euler discretized error dynamics, linearized around
    /// `operating_point`, decay with the current gain.
    /// `None` if the observer is not ready or the model is not differentiable there.
    pub fn error_dynamics_stable(&self, operating_point: &TankState, u: f64) -> Option<bool> {
        if self.status() != ObserverStatus::Ready {
            return None;
        }
        let gain = self.L.as_ref()?;
        let a_err = euler_error_dynamics(&self.model, operating_point, u, gain, self.sample_time)?;
        is_stable(&a_err)
    }
}

#[allow(non_snake_case)]
impl<T: ContinuousModel<2, 1>> Observer for LuenbergerObserver<T> {
    fn set_initial_state(&mut self, initial_state: &[f64]) -> Result<(), Error> {
        let x_hat = tank_state_from(initial_state, "initial state")?;
        check_entries(&x_hat, "initial state", |h| h.is_finite() && h >= 0.0)?;
        debug!("initial state set to ({}, {})", x_hat[0], x_hat[1]);
        let before = self.status();
        self.x_hat = Some(x_hat);
        self.log_transition(before);
        Ok(())
    }

    fn set_gain(&mut self, gain: &[f64]) -> Result<(), Error> {
        let L = tank_state_from(gain, "gain")?;
        check_entries(&L, "gain", f64::is_finite)?;
        debug!("gain set to ({}, {})", L[0], L[1]);
        let before = self.status();
        self.L = Some(L);
        self.log_transition(before);
        Ok(())
    }

    fn compute(&mut self, height1: f64, pump_voltage: f64) -> Result<TankState, Error> {
        let (x_hat, L) = match (&self.x_hat, &self.L) {
            (Some(x_hat), Some(L)) => (x_hat, L),
            (None, None) => {
                return Err(Error::Uninitialized {
                    missing: "initial state and gain",
                })
            }
            (None, Some(_)) => {
                return Err(Error::Uninitialized {
                    missing: "initial state",
                })
            }
            (Some(_), None) => return Err(Error::Uninitialized { missing: "gain" }),
        };
        check_scalar(height1, "tank 1 measurement")?;
        check_scalar(pump_voltage, "pump voltage")?;

        let u = na::Vector1::new(pump_voltage);
        trace!("residual {}", height1 - x_hat[0]);
        let x_next = self.step(x_hat, L, height1, &u);

        // Heights can't be negative
        let x_clamped = x_next.map(|h| h.max(0.0));
        if x_clamped != x_next {
            debug!(
                "estimate ({}, {}) clamped to non-negative heights",
                x_next[0], x_next[1]
            );
        }

        self.x_hat = Some(x_clamped);
        Ok(x_clamped)
    }

    fn estimate(&self) -> Option<TankState> {
        self.x_hat
    }

    fn status(&self) -> ObserverStatus {
        match (&self.x_hat, &self.L) {
            (Some(_), Some(_)) => ObserverStatus::Ready,
            _ => ObserverStatus::Uninitialized,
        }
    }

    fn sample_time(&self) -> f64 {
        self.sample_time
    }
}
