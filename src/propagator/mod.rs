//! Tangent-linear and adjoint model collaborators.
//!
//! The minimizer never integrates the physical equations itself; it
//! drives a [`TangentLinearModel`] and an [`AdjointModel`] supplied by
//! the surrounding model. The two must implement mutually adjoint linear
//! operators to floating-point precision — the Lanczos recurrence
//! assumes it, and [`TracerMix4`](crate::propagator::TracerMix4) shows
//! the pattern with a self-adjoint biharmonic tracer-mixing operator.
//!
//! [`CostModel`] bundles what one inner iteration needs from the outer
//! cycle: the observation-term gradient (a TL sweep, a misfit against
//! the innovation, an AD sweep) and the background-term gradient at a
//! trial increment. [`TlAdCostModel`] is the standard composition.

mod tracer_mix4;

pub use tracer_mix4::TracerMix4;

use thiserror::Error;

use crate::grid::LandMask;
use crate::state::StateVector;

/// Error surfaced by a model propagation sweep.
#[derive(Debug, Error)]
#[error("model propagation failed: {0}")]
pub struct PropagationError(pub String);

/// Tangent-linear propagator: perturbation at initial time to
/// perturbation at final time.
pub trait TangentLinearModel {
    /// Propagate `initial` forward; write the final-time perturbation
    /// into `trajectory`.
    fn run(
        &mut self,
        initial: &StateVector,
        trajectory: &mut StateVector,
    ) -> Result<(), PropagationError>;
}

/// Adjoint propagator: cost-gradient seed at final time to sensitivity
/// at initial time.
pub trait AdjointModel {
    /// Propagate `seed` backward; write the initial-time sensitivity
    /// into `gradient`.
    fn run(&mut self, seed: &StateVector, gradient: &mut StateVector)
        -> Result<(), PropagationError>;
}

/// What the outer 4D-Var cycle computes between inner iterations.
pub trait CostModel {
    /// Gradient of the observation term at trial increment `increment`.
    fn observation_gradient(
        &mut self,
        increment: &StateVector,
        out: &mut StateVector,
    ) -> Result<(), PropagationError>;

    /// Gradient of the background term at trial increment `increment`.
    fn background_gradient(
        &mut self,
        increment: &StateVector,
        out: &mut StateVector,
    ) -> Result<(), PropagationError>;
}

/// Standard composition of a TL propagator, an innovation vector and an
/// AD propagator, with the identity background term of the
/// preconditioned increment space.
pub struct TlAdCostModel<T, A> {
    tl: T,
    ad: A,
    innovation: StateVector,
    trajectory: StateVector,
    mask: LandMask,
}

impl<T, A> TlAdCostModel<T, A>
where
    T: TangentLinearModel,
    A: AdjointModel,
{
    /// Compose the cost model. `innovation` is the observation-minus-
    /// background misfit at final time; its allocation doubles as the
    /// shape template for the trajectory scratch vector.
    pub fn new(tl: T, ad: A, innovation: StateVector, mask: LandMask) -> Self {
        let trajectory = innovation.clone();
        Self {
            tl,
            ad,
            innovation,
            trajectory,
            mask,
        }
    }
}

impl<T, A> CostModel for TlAdCostModel<T, A>
where
    T: TangentLinearModel,
    A: AdjointModel,
{
    fn observation_gradient(
        &mut self,
        increment: &StateVector,
        out: &mut StateVector,
    ) -> Result<(), PropagationError> {
        self.tl.run(increment, &mut self.trajectory)?;
        self.trajectory.add_scaled(&self.innovation, -1.0, &self.mask);
        self.ad.run(&self.trajectory, out)
    }

    fn background_gradient(
        &mut self,
        increment: &StateVector,
        out: &mut StateVector,
    ) -> Result<(), PropagationError> {
        out.copy_from(increment, &self.mask);
        Ok(())
    }
}
