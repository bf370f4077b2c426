// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Compute steady-state cosmic-ray electron spectra in galactic media.

Relativistic electrons injected into an interstellar medium lose energy
continuously — to synchrotron radiation, inverse-Compton scattering,
bremsstrahlung, atomic ionization/excitation, and Coulomb/plasma drag — while
diffusing out of the region on an energy-dependent escape timescale. This
crate solves the resulting steady-state continuity equation in energy space,

```text
d/dE [ b(E) N(E) ] + N(E) / tau_esc(E) = Q(E),
```

for one or two electron populations ("structures", e.g. a gas-rich disk and a
diffuse halo), and packages the solved spectra as evaluable functions that
downstream radiative-emission integrators can fold against target tables.

The basic structure of the problem is a two-point boundary-value solve over a
logarithmic energy grid: the natural boundary condition `N(E_max) -> 0` lives
at the high-energy end where losses dominate, so the grid is swept downward
from the top with the loss term handled implicitly. Loss rates that are not
closed-form (inverse Compton, bremsstrahlung) are evaluated on the fly from
externally supplied 2D kernel tables through the interpolation layer.

All quantities are CGS-flavored: energies in GeV, densities in cm^-3,
magnetic fields in Gauss, scale heights in parsecs, diffusion coefficients
in cm^2/s.

*/

#![deny(missing_docs)]

#[macro_use] extern crate slog;
extern crate thiserror;

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

use thiserror::Error;

pub mod spline;
pub mod quad;
pub mod losses;
pub mod injection;
pub mod transport;
pub mod spectrum;
pub mod emission;

pub use injection::{Injection, InjectionLaw};
pub use spectrum::{SolvedSpectrum, ZoneSpectrum};
pub use spline::{Spline1d, Spline2d};
pub use transport::{SteadyStateProblem, Zone};

/// The mass of the electron in GeV.
pub const MASS_ELECTRON_GEV: f64 = 0.5109989461e-3;

/// The mass of the electron in cgs (grams).
pub const MASS_ELECTRON_GRAMS: f64 = 9.10938356e-28;

/// The speed of light in cgs (centimeters per second).
pub const SPEED_LIGHT: f64 = 2.99792458e10;

/// The charge of the electron, in cgs (esu's).
pub const ELECTRON_CHARGE: f64 = 4.80320425e-10;

/// The Thomson cross-section, in millibarns.
pub const SIGMA_T_MILLIBARN: f64 = 0.665245873;

/// One millibarn in square centimeters.
pub const MILLIBARN_CM2: f64 = 1e-27;

/// The Planck constant in GeV-seconds.
pub const PLANCK_GEVS: f64 = 6.582119569e-25;

/// One parsec in centimeters.
pub const PARSEC_CM: f64 = 3.085677581e18;

/// One erg in GeV.
pub const ERG_GEV: f64 = 6.242e8;

/// Mean molecular weight of the interstellar medium, for a 91% H / 9% He
/// composition by number.
pub const MU_ISM: f64 = 1.1;

/// Everything that can go wrong while setting up or running a solve.
///
/// Table- and input-validation problems are detected eagerly, before any
/// integration step runs; `Instability` is the only mid-solve failure.
#[derive(Error, Debug)]
pub enum Error {
    /// A scalar input was non-physical or out of range: a non-positive
    /// density, mass, or energy bound, or inverted bounds.
    #[error("non-physical input: {0}")]
    Domain(String),

    /// A sample table was non-monotonic, too short, or had mismatched
    /// lengths.
    #[error("bad sample table: {0}")]
    Table(String),

    /// An interpolant was queried outside the domain recorded when it was
    /// built.
    #[error("evaluation point {value:e} outside interpolant domain [{min:e}, {max:e}]")]
    OutOfDomain {
        /// The offending query point.
        value: f64,
        /// Lower edge of the valid domain.
        min: f64,
        /// Upper edge of the valid domain.
        max: f64,
    },

    /// The backward sweep drove a density negative (or lost a finite
    /// denominator), signalling an invalid loss/diffusion combination. The
    /// solve is aborted rather than clamped.
    #[error("numerical instability in zone {zone} at grid index {index}")]
    Instability {
        /// Index of the zone being swept when the solve failed.
        zone: usize,
        /// Grid index at which the update broke down.
        index: usize,
    },
}

/// A convenience alias for results using our error type.
pub type Result<T> = std::result::Result<T, Error>;

/// An ordered, strictly increasing sequence of energies in GeV, spaced
/// logarithmically between user-supplied bounds. Immutable after
/// construction.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyGrid {
    energies: Vec<f64>,
}

impl EnergyGrid {
    /// Build a logarithmic grid of `n` energies between `e_min` and `e_max`
    /// GeV inclusive. Requires `0 < e_min < e_max` and `n >= 4`.
    pub fn logarithmic(e_min: f64, e_max: f64, n: usize) -> Result<Self> {
        if !(e_min > 0. && e_max > 0.) || !e_min.is_finite() || !e_max.is_finite() {
            return Err(Error::Domain(format!(
                "energy bounds must be positive and finite; got [{:e}, {:e}]",
                e_min, e_max
            )));
        }
        if e_min >= e_max {
            return Err(Error::Domain(format!(
                "energy bounds inverted or degenerate: [{:e}, {:e}]",
                e_min, e_max
            )));
        }
        if n < 4 {
            return Err(Error::Domain(format!("grid needs at least 4 points; got {}", n)));
        }

        let log_min = e_min.ln();
        let log_max = e_max.ln();
        let delta = (log_max - log_min) / (n - 1) as f64;
        let energies = (0..n)
            .map(|i| (log_min + delta * i as f64).exp())
            .collect();

        Ok(EnergyGrid { energies: energies })
    }

    /// The grid energies in GeV, ascending.
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// The number of grid points.
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// Whether the grid is empty. It never is, post-construction.
    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// The lowest grid energy in GeV.
    pub fn e_min(&self) -> f64 {
        self.energies[0]
    }

    /// The highest grid energy in GeV.
    pub fn e_max(&self) -> f64 {
        self.energies[self.energies.len() - 1]
    }
}

/// One physical loss process contributing to the total electron energy-loss
/// rate.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Channel {
    /// Atomic ionization and excitation losses on the neutral medium.
    Ionization,

    /// Coulomb/plasma losses on the ionized medium.
    Coulomb,

    /// Synchrotron losses in the ambient magnetic field.
    Synchrotron,

    /// Inverse-Compton losses on the tabulated target photon field.
    InverseCompton,

    /// Bremsstrahlung losses on the gas.
    Bremsstrahlung,
}

/// A selectable physical configuration determining which loss channels
/// apply to an electron population.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Structure {
    /// A gas-rich disk: all five loss channels are active.
    Disk,

    /// A diffuse halo: the gas-collision channels (bremsstrahlung,
    /// ionization) are switched off.
    Halo,
}

impl Structure {
    /// The loss channels enabled for this structure.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Structure::Disk => &[
                Channel::Ionization,
                Channel::Coulomb,
                Channel::Synchrotron,
                Channel::InverseCompton,
                Channel::Bremsstrahlung,
            ],
            Structure::Halo => &[
                Channel::Coulomb,
                Channel::Synchrotron,
                Channel::InverseCompton,
            ],
        }
    }

    /// Whether a particular channel is enabled for this structure.
    pub fn enables(self, channel: Channel) -> bool {
        self.channels().contains(&channel)
    }
}
