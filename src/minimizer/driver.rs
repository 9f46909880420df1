//! Conjugate-gradient driver.
//!
//! Orchestrates one inner iteration: curvature estimate (skipped at
//! iteration 0), Lanczos basis extension, new descent direction,
//! tridiagonal solve and reduction norm, optional Ritz analysis with
//! final-iteration eigenvector materialization, and the seeding of the
//! next tangent-linear initial condition. [`Minimizer::run`] drives full
//! inner loops against a [`CostModel`].

use std::fmt;

use crate::grid::{LandMask, StaggeredGrid};
use crate::propagator::CostModel;
use crate::state::{StateCapabilities, StateVector};
use crate::store::StateStore;
use crate::types::RecordIndex;

use super::config::MinimizerConfig;
use super::error::MinimizerError;
use super::hessian::estimate_curvature;
use super::lanczos::extend_basis;
use super::ritz::{
    analyze_spectrum, materialize_eigenvectors, ConvergedEigenpair, FaerEigensolver,
    RitzAnalysis, TridiagonalEigensolver,
};
use super::state::MinimizerState;
use super::tridiagonal::{gradient_reduction, solve_into_state};
use super::workspace::Workspace;

/// Per-iteration descent parameters.
#[derive(Clone, Debug)]
pub struct StepReport {
    /// Inner iteration number.
    pub iteration: usize,
    /// Trial step size used.
    pub tau: f64,
    /// Curvature estimate `delta(k)` (absent at iteration 0).
    pub delta: Option<f64>,
    /// New coupling coefficient `beta(k+1)` (at iteration 0 this norm
    /// becomes `gnorm` instead).
    pub beta: Option<f64>,
    /// Norm of the initial gradient.
    pub gnorm: f64,
    /// Gradient-norm reduction `||g_new|| / gnorm` (from iteration 1).
    pub preduc: Option<f64>,
    /// Ritz analysis of the projected Hessian, when enabled.
    pub ritz: Option<RitzAnalysis>,
    /// Residual dot products from the orthogonality self-test, newest
    /// record first, when enabled.
    pub orthogonality: Option<Vec<f64>>,
    /// Hessian eigenpairs persisted on the final inner iteration.
    pub eigenpairs: Vec<ConvergedEigenpair>,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inner {:3}: tau = {:.6e}, gnorm = {:.6e}",
            self.iteration, self.tau, self.gnorm
        )?;
        if let Some(delta) = self.delta {
            write!(f, ", delta = {:.6e}", delta)?;
        }
        if let Some(beta) = self.beta {
            write!(f, ", beta = {:.6e}", beta)?;
        }
        if let Some(preduc) = self.preduc {
            write!(f, ", preduc = {:.6e}", preduc)?;
        }
        if let Some(ref ritz) = self.ritz {
            write!(f, ", converged eigenpairs = {}", ritz.n_converged)?;
        }
        Ok(())
    }
}

/// Result of a full inner loop.
#[derive(Debug)]
pub struct RunSummary {
    /// Norm of the initial gradient.
    pub gnorm: f64,
    /// Per-iteration reports.
    pub reports: Vec<StepReport>,
    /// Converged Hessian eigenpairs persisted to the eigenvector store.
    pub eigenpairs: Vec<ConvergedEigenpair>,
    /// The minimizer increment: the tangent-linear initial condition
    /// assembled on the final inner iteration.
    pub increment: StateVector,
}

/// The conjugate-gradient/Lanczos minimizer.
///
/// One instance corresponds to one outer-loop invocation; all
/// cross-iteration state lives in the contained [`MinimizerState`] and
/// is reset by [`Minimizer::run`].
pub struct Minimizer<E = FaerEigensolver> {
    config: MinimizerConfig,
    grid: StaggeredGrid,
    mask: LandMask,
    eigensolver: E,
    state: MinimizerState,
}

impl Minimizer<FaerEigensolver> {
    /// Create a minimizer with the default eigensolver backing.
    pub fn new(grid: StaggeredGrid, mask: LandMask, config: MinimizerConfig) -> Self {
        Self::with_eigensolver(grid, mask, config, FaerEigensolver)
    }
}

impl<E: TridiagonalEigensolver> Minimizer<E> {
    /// Create a minimizer with an explicit eigensolver backing.
    pub fn with_eigensolver(
        grid: StaggeredGrid,
        mask: LandMask,
        config: MinimizerConfig,
        eigensolver: E,
    ) -> Self {
        let state = MinimizerState::new(config.n_inner);
        Self {
            config,
            grid,
            mask,
            eigensolver,
            state,
        }
    }

    /// The cross-iteration state (inspection only).
    pub fn state(&self) -> &MinimizerState {
        &self.state
    }

    /// Perform one inner iteration.
    ///
    /// On entry `ws.ad_new` holds the raw adjoint gradient at the
    /// current trial increment and `ws.tl_old` the background gradient
    /// there (both zero-increment values at iteration 0). On return
    /// `ws.tl_new` holds the next tangent-linear initial condition — on
    /// the final iteration, the assembled minimizer increment.
    pub fn step(
        &mut self,
        iter: usize,
        ws: &mut Workspace,
        store: &mut dyn StateStore,
        mut evec_store: Option<&mut dyn StateStore>,
    ) -> Result<StepReport, MinimizerError> {
        assert!(iter < self.config.n_inner, "iteration out of range");
        self.state.tau = self.config.cg_step_init;
        let last = iter == self.config.n_inner - 1;

        // Curvature estimate from the TL/AD pair.
        let delta = if iter > 0 {
            Some(estimate_curvature(
                ws,
                &self.grid,
                &self.mask,
                store,
                &mut self.state,
                iter,
            )?)
        } else {
            None
        };

        // Extend the orthonormal basis; record iter + 1 is written here.
        let orthogonality = extend_basis(
            ws,
            &self.grid,
            &self.mask,
            store,
            &mut self.state,
            iter,
            self.config.check_orthogonality,
        )?;
        if iter == 0 {
            // Keep the first normalized gradient resident for the whole
            // run; every later projection and curvature estimate needs it.
            ws.ad_old.copy_from(&ws.ad_new, &self.mask);
        }

        // New descent direction: the latest orthonormal gradient.
        ws.descent.copy_from(&ws.ad_new, &self.mask);

        // Reduction coefficients and achieved gradient-norm reduction.
        let preduc = if iter >= 1 {
            solve_into_state(&mut self.state, iter);
            let preduc =
                gradient_reduction(ws, &self.grid, &self.mask, store, &self.state, iter)?;
            store.read(RecordIndex::new(1), &mut ws.ad_old)?;
            Some(preduc)
        } else {
            None
        };

        // Ritz spectrum of the projected Hessian.
        let mut ritz = None;
        let mut eigenpairs = Vec::new();
        if self.config.compute_ritz && iter > 0 {
            let analysis = analyze_spectrum(
                &mut self.state,
                iter,
                self.config.grad_err,
                &self.eigensolver,
            )?;
            if last {
                if let Some(evec_store) = evec_store.as_deref_mut() {
                    eigenpairs = materialize_eigenvectors(
                        ws,
                        &self.grid,
                        &self.mask,
                        store,
                        evec_store,
                        &analysis,
                        iter,
                        self.config.hevec_err,
                    )?;
                    if self.config.verbose {
                        println!(
                            "converged Hessian eigenvectors found: {}",
                            eigenpairs.len()
                        );
                    }
                }
            }
            ritz = Some(analysis);
        }

        // Seed the next tangent-linear initial condition.
        if !last {
            // X(k+1) = tau(k+1) * d(k+1)
            ws.tl_new.linear_combine(0.0, &ws.descent, self.state.tau, &self.mask);
        } else {
            // Assemble the minimizer increment from all prior gradients
            // with the reduction coefficients.
            ws.ad_old.fill(0.0, &self.mask);
            for rec in RecordIndex::ascending(iter) {
                store.read(rec, &mut ws.tl_work)?;
                ws.ad_old
                    .add_scaled(&ws.tl_work, self.state.work[rec.get()], &self.mask);
            }
            ws.tl_new.copy_from(&ws.ad_old, &self.mask);
        }

        let report = StepReport {
            iteration: iter,
            tau: self.state.tau,
            delta,
            beta: if iter > 0 {
                Some(self.state.beta[iter + 1])
            } else {
                None
            },
            gnorm: self.state.gnorm,
            preduc,
            ritz,
            orthogonality,
            eigenpairs,
        };
        if self.config.verbose {
            println!("{}", report);
        }
        Ok(report)
    }

    /// Run a full inner loop against a cost model.
    ///
    /// The model is asked for the observation- and background-term
    /// gradients at the zero increment first, then at each trial
    /// increment the driver seeds.
    pub fn run<M: CostModel>(
        &mut self,
        model: &mut M,
        caps: &StateCapabilities,
        store: &mut dyn StateStore,
        mut evec_store: Option<&mut dyn StateStore>,
    ) -> Result<RunSummary, MinimizerError> {
        self.state = MinimizerState::new(self.config.n_inner);
        let mut ws = Workspace::allocate(&self.grid, caps);

        model.observation_gradient(&ws.tl_new, &mut ws.ad_new)?;
        model.background_gradient(&ws.tl_new, &mut ws.tl_old)?;

        let mut reports = Vec::with_capacity(self.config.n_inner);
        for iter in 0..self.config.n_inner {
            let evec_ref: Option<&mut dyn StateStore> = match evec_store {
                Some(ref mut s) => Some(&mut **s),
                None => None,
            };
            let report = self.step(iter, &mut ws, store, evec_ref)?;
            reports.push(report);

            if iter + 1 < self.config.n_inner {
                model.observation_gradient(&ws.tl_new, &mut ws.ad_new)?;
                model.background_gradient(&ws.tl_new, &mut ws.tl_old)?;
            }
        }

        let eigenpairs = reports
            .last()
            .map(|r| r.eigenpairs.clone())
            .unwrap_or_default();

        Ok(RunSummary {
            gnorm: self.state.gnorm,
            reports,
            eigenpairs,
            increment: ws.tl_new.clone(),
        })
    }
}
