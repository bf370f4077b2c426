// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Injection spectra: the source term `Q(E)` of the transport equation.

Injection is either an analytic power law with an exponential cutoff,

```text
J(E) = C E^-q exp(-E / T_cutoff)   for E >= m,  zero below,
```

or an externally tabulated spectrum wrapped in a 1D interpolant. The
normalization `C` is chosen so that the total injected energy
`int_m^inf E J(E) dE` is unity, and can then be rescaled to a
caller-supplied total. The power-law index must satisfy `q > 1` — the
normalization integral is treated as divergent otherwise — and the cutoff
must sit above the particle rest mass.

*/

use quad::IntegrationWorkspace;
use spline::Spline1d;
use {Error, Result};

/// Compute the normalization constant `C` such that the total injected
/// energy of the parametrized law integrates to unity over `[m, inf)`.
pub fn c_norm_e(q: f64, mass: f64, t_cutoff: f64) -> Result<f64> {
    if !(mass > 0.) || !mass.is_finite() {
        return Err(Error::Domain(format!("rest mass must be positive; got {:e} GeV", mass)));
    }
    if q <= 1. || !q.is_finite() {
        return Err(Error::Domain(format!(
            "spectral index must exceed 1 for a normalizable injection law; got {}",
            q
        )));
    }
    if !(t_cutoff > mass) || !t_cutoff.is_finite() {
        return Err(Error::Domain(format!(
            "cutoff energy must exceed the rest mass; got {:e} GeV vs {:e} GeV",
            t_cutoff, mass
        )));
    }

    let mut ws = IntegrationWorkspace::new(50);
    let total = ws
        .qagiu(|e| e * e.powf(-q) * (-e / t_cutoff).exp(), mass)
        .tolerance(0., 1e-10)
        .compute()?
        .value;

    if !(total > 0.) || !total.is_finite() {
        return Err(Error::Domain(format!(
            "injection normalization integral did not converge (got {:e})",
            total
        )));
    }

    Ok(1. / total)
}

/// An analytic injection law: power law in total energy with an exponential
/// cutoff, normalized at construction so the injected energy totals unity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InjectionLaw {
    c: f64,
    q: f64,
    mass: f64,
    t_cutoff: f64,
}

impl InjectionLaw {
    /// Build a law with spectral index `q`, particle rest mass `mass` (GeV),
    /// and cutoff `t_cutoff` (GeV). Fails for `q <= 1` or
    /// `t_cutoff <= mass`.
    pub fn new(q: f64, mass: f64, t_cutoff: f64) -> Result<Self> {
        let c = c_norm_e(q, mass, t_cutoff)?;
        Ok(InjectionLaw {
            c: c,
            q: q,
            mass: mass,
            t_cutoff: t_cutoff,
        })
    }

    /// Rescale so the total injected energy is `total` (GeV per unit volume
    /// per unit time, in the solver's unit system) rather than unity.
    pub fn with_total(mut self, total: f64) -> Result<Self> {
        if !(total > 0.) || !total.is_finite() {
            return Err(Error::Domain(format!(
                "injection total must be positive; got {:e}",
                total
            )));
        }
        self.c *= total;
        Ok(self)
    }

    /// The current normalization constant `C`.
    pub fn normalization(&self) -> f64 {
        self.c
    }

    /// Evaluate the law at total energy `e_gev`. Zero below the rest mass.
    pub fn eval(&self, e_gev: f64) -> f64 {
        if e_gev < self.mass {
            0.
        } else {
            self.c * e_gev.powf(-self.q) * (-e_gev / self.t_cutoff).exp()
        }
    }
}

/// The injection source for one zone: analytic or tabulated.
#[derive(Debug)]
pub enum Injection {
    /// A parametrized power law with exponential cutoff.
    Law(InjectionLaw),

    /// An externally tabulated spectrum; the table must cover the full
    /// energy grid of the solve.
    Table(Spline1d),
}

impl Injection {
    /// The source term `Q(E)` at energy `e_gev`, in electrons per GeV per
    /// cm^3 per second. Tabulated spectra are evaluated strictly, so a grid
    /// point outside the table's domain is an error rather than zero.
    pub fn source(&self, e_gev: f64) -> Result<f64> {
        match *self {
            Injection::Law(ref law) => Ok(law.eval(e_gev)),
            Injection::Table(ref table) => table.eval(e_gev),
        }
    }

    /// The tabulated domain, if any; analytic laws are defined everywhere.
    pub fn domain(&self) -> Option<[f64; 2]> {
        match *self {
            Injection::Law(_) => None,
            Injection::Table(ref table) => Some([table.x_min(), table.x_max()]),
        }
    }
}
