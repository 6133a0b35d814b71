extern crate nalgebra as na;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Heights of tank 1 and tank 2.
pub type TankState = na::Vector2<f64>;

/// Continuous time dynamics
/// dx/dt = f(x, u)
pub trait ContinuousModel<const NX: usize, const NU: usize> {
    fn derivative(&self, x: &na::SVector<f64, NX>, u: &na::SVector<f64, NU>)
        -> na::SVector<f64, NX>;
}

pub trait Differentiable<const NX: usize, const NU: usize> {
    /// df/dx evaluated at (x, u), `None` where f is not differentiable.
    fn jacobian(
        &self,
        x: &na::SVector<f64, NX>,
        u: &na::SVector<f64, NU>,
    ) -> Option<na::SMatrix<f64, NX, NX>>;
}

/// Fixed step integration scheme.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Integrator {
    #[default]
    Euler,
    Rk4,
}

/// Physical constants of the two tank plant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TankParameters {
    /// Cross sectional area of tank 1
    pub a1: f64,
    /// Cross sectional area of tank 2
    pub a2: f64,
    /// Outlet coefficient of tank 1
    pub k1: f64,
    /// Outlet coefficient of tank 2
    pub k2: f64,
    /// Pump flow per volt
    pub pump_gain: f64,
}

impl TankParameters {
    pub fn new(a1: f64, a2: f64, k1: f64, k2: f64, pump_gain: f64) -> Result<Self, Error> {
        let params = Self {
            a1,
            a2,
            k1,
            k2,
            pump_gain,
        };
        params.validate()?;
        Ok(params)
    }

    /// Areas must be strictly positive, coefficients non-negative. All finite.
    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [("a1", self.a1), ("a2", self.a2)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParameter { name, value });
            }
        }
        for (name, value) in [("k1", self.k1), ("k2", self.k2), ("pump_gain", self.pump_gain)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Cascaded two tank system. Tank 1 is fed by the pump and drains into tank 2.
/// dh1/dt = (pump_gain*u - k1*sqrt(h1)) / A1
/// dh2/dt = (k1*sqrt(h1) - k2*sqrt(h2)) / A2
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoTankSystem {
    params: TankParameters,
}

impl TwoTankSystem {
    pub fn new(params: TankParameters) -> Result<Self, Error> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &TankParameters {
        &self.params
    }

    /// Outflow through the outlet of a tank. Negative heights are treated as empty.
    fn outflow(k: f64, h: f64) -> f64 {
        k * h.max(0.0).sqrt()
    }

    /// Steady state heights for a constant pump voltage.
    pub fn equilibrium(&self, u: f64) -> Option<TankState> {
        let p = &self.params;
        if u < 0.0 || p.k1 == 0.0 || p.k2 == 0.0 {
            return None;
        }
        let inflow = p.pump_gain * u;
        Some(TankState::new(
            (inflow / p.k1).powi(2),
            (inflow / p.k2).powi(2),
        ))
    }
}

impl ContinuousModel<2, 1> for TwoTankSystem {
    fn derivative(&self, x: &TankState, u: &na::Vector1<f64>) -> TankState {
        let p = &self.params;
        let q1 = Self::outflow(p.k1, x[0]);
        let q2 = Self::outflow(p.k2, x[1]);
        TankState::new((p.pump_gain * u[0] - q1) / p.a1, (q1 - q2) / p.a2)
    }
}

impl Differentiable<2, 1> for TwoTankSystem {
    fn jacobian(&self, x: &TankState, _u: &na::Vector1<f64>) -> Option<na::Matrix2<f64>> {
        if x[0] <= 0.0 || x[1] <= 0.0 {
            return None;
        }
        let p = &self.params;
        let dq1 = p.k1 / (2.0 * x[0].sqrt());
        let dq2 = p.k2 / (2.0 * x[1].sqrt());
        Some(na::Matrix2::new(
            -dq1 / p.a1,
            0.0,
            dq1 / p.a2,
            -dq2 / p.a2,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tanks() -> TwoTankSystem {
        TwoTankSystem::new(TankParameters::new(1.0, 1.0, 1.0, 1.0, 1.0).unwrap()).unwrap()
    }

    #[test]
    fn derivative_empty_tanks() {
        let model = unit_tanks();
        let dx = model.derivative(&TankState::zeros(), &na::Vector1::new(1.0));
        assert_eq!(dx, TankState::new(1.0, 0.0));
    }

    #[test]
    fn derivative_matches_closed_form() {
        let params = TankParameters::new(2.0, 0.5, 0.3, 0.7, 1.5).unwrap();
        let model = TwoTankSystem::new(params).unwrap();
        let x = TankState::new(0.81, 0.25);
        let dx = model.derivative(&x, &na::Vector1::new(2.0));

        approx::assert_relative_eq!(dx[0], (1.5 * 2.0 - 0.3 * 0.9) / 2.0);
        approx::assert_relative_eq!(dx[1], (0.3 * 0.9 - 0.7 * 0.5) / 0.5);
    }

    #[test]
    fn derivative_negative_heights_are_empty() {
        let model = unit_tanks();
        let u = na::Vector1::new(0.5);

        for x in [
            TankState::new(-0.2, 0.4),
            TankState::new(0.4, -1e-12),
            TankState::new(-3.0, -7.0),
        ] {
            let dx = model.derivative(&x, &u);
            let clamped = model.derivative(&x.map(|h| h.max(0.0)), &u);
            assert!(dx.iter().all(|v| v.is_finite()), "NaN for {x:?}");
            assert_eq!(dx, clamped);
        }
    }

    #[test]
    fn equilibrium_is_stationary() {
        let params = TankParameters::new(1.3, 0.8, 0.4, 0.6, 1.1).unwrap();
        let model = TwoTankSystem::new(params).unwrap();
        let u = na::Vector1::new(0.7);
        let x_eq = model.equilibrium(u[0]).unwrap();

        approx::assert_abs_diff_eq!(model.derivative(&x_eq, &u), TankState::zeros(), epsilon = 1e-12);
        assert!(model.equilibrium(-1.0).is_none());
    }

    #[test]
    fn jacobian_matches_finite_difference() {
        let model = unit_tanks();
        let x = TankState::new(0.6, 1.4);
        let u = na::Vector1::new(1.0);
        let jac = model.jacobian(&x, &u).unwrap();

        let eps = 1e-7;
        for j in 0..2 {
            let mut dx = TankState::zeros();
            dx[j] = eps;
            let column = (model.derivative(&(x + dx), &u) - model.derivative(&(x - dx), &u)) / (2.0 * eps);
            approx::assert_abs_diff_eq!(jac.column(j).into_owned(), column, epsilon = 1e-6);
        }

        assert!(model.jacobian(&TankState::new(0.0, 1.0), &u).is_none());
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(
            TankParameters::new(0.0, 1.0, 1.0, 1.0, 1.0),
            Err(Error::InvalidParameter { name: "a1", value: 0.0 })
        );
        assert_eq!(
            TankParameters::new(1.0, 1.0, -0.1, 1.0, 1.0),
            Err(Error::InvalidParameter { name: "k1", value: -0.1 })
        );
        assert!(TankParameters::new(1.0, f64::NAN, 1.0, 1.0, 1.0).is_err());
    }
}
