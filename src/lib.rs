extern crate nalgebra as na;

pub mod error;
pub mod linsystheory;
pub mod models;
pub mod observers;

pub use error::Error;
pub use models::{ContinuousModel, Differentiable, Integrator, TankParameters, TankState, TwoTankSystem};
pub use observers::luenberger::LuenbergerObserver;
pub use observers::observer::{Observer, ObserverStatus};
pub use observers::ObserverConfig;
