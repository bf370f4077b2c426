// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! The steady-state transport equation solver.

For each configured zone we solve

```text
d/dE [ b(E) N(E) ] + N(E) / tau_esc(E) = Q(E)
```

on the logarithmic energy grid, where `b(E)` sums the loss channels enabled
by the zone's structure, `tau_esc(E) = h^2 / D(E)` is the leaky-box escape
time implied by the diffusion coefficient over the scale height, and `Q(E)`
is the injection source. Losses dominate at the top of the grid, so the
natural boundary condition is `N(E_max) = 0` and the grid is swept downward
from there.

The downward update is implicit in the loss term: writing
`d/dE (b N) = b dN/dE + N db/dE` and differencing `dN/dE` upwind (toward
higher energy) gives

```text
N_i = (Q_i - b_i N_{i+1} / dE) / (-b_i / dE + b'_i + 1 / tau_i)
```

which stays stable even where the loss timescale is orders of magnitude
shorter than the grid spacing, because the stiff `-b_i / dE` term sits in
the denominator. `b'` is the precomputed loss-rate derivative from the
channel evaluators, so nothing is numerically re-differenced inside the
sweep. A non-positive denominator means the loss/diffusion combination
cannot support a non-negative steady state on this grid; that aborts the
solve with the failing grid index rather than silently clamping.

Everything the sweep needs is validated eagerly while the problem is being
assembled: table domains must cover the grid, kernels must be present for
the channels the structure enables, and the total loss rate must come out
strictly negative at every grid point.

*/

use slog::Logger;

use injection::Injection;
use losses;
use spectrum::{SolvedSpectrum, ZoneSpectrum};
use spline::{Spline1d, Spline2d};
use {Channel, EnergyGrid, Error, Result, Structure, PARSEC_CM};

/// One electron population and the medium it lives in: structure selector,
/// medium parameters, diffusion coefficient, injection source, and the 2D
/// loss kernels for the non-analytic channels.
#[derive(Debug)]
pub struct Zone {
    structure: Structure,
    n_h: f64,
    b_field: f64,
    h_pc: f64,
    diffusion: Spline1d,
    injection: Injection,
    ic_kernel: Option<Spline2d>,
    bs_kernel: Option<Spline2d>,
}

impl Zone {
    /// Describe a zone: its structure, hydrogen density `n_h` (cm^-3),
    /// magnetic field `b_field` (Gauss), scale height `h_pc` (parsecs), the
    /// tabulated diffusion coefficient `D(E)` (cm^2/s vs. GeV), and the
    /// injection source.
    pub fn new(
        structure: Structure,
        n_h: f64,
        b_field: f64,
        h_pc: f64,
        diffusion: Spline1d,
        injection: Injection,
    ) -> Self {
        Zone {
            structure: structure,
            n_h: n_h,
            b_field: b_field,
            h_pc: h_pc,
            diffusion: diffusion,
            injection: injection,
            ic_kernel: None,
            bs_kernel: None,
        }
    }

    /// Attach the inverse-Compton loss kernel `K(E_gamma, E_e)`. Required
    /// when the structure enables the inverse-Compton channel.
    pub fn ic_kernel(mut self, kernel: Spline2d) -> Self {
        self.ic_kernel = Some(kernel);
        self
    }

    /// Attach the bremsstrahlung loss kernel. Required when the structure
    /// enables the bremsstrahlung channel.
    pub fn bs_kernel(mut self, kernel: Spline2d) -> Self {
        self.bs_kernel = Some(kernel);
        self
    }

    fn validate(&self, grid: &EnergyGrid) -> Result<()> {
        if !(self.n_h > 0.) || !self.n_h.is_finite() {
            return Err(Error::Domain(format!(
                "zone density must be positive; got {:e} cm^-3",
                self.n_h
            )));
        }
        if !(self.b_field > 0.) || !self.b_field.is_finite() {
            return Err(Error::Domain(format!(
                "zone magnetic field must be positive; got {:e} G",
                self.b_field
            )));
        }
        if !(self.h_pc > 0.) || !self.h_pc.is_finite() {
            return Err(Error::Domain(format!(
                "zone scale height must be positive; got {:e} pc",
                self.h_pc
            )));
        }

        check_covers("diffusion coefficient table",
                     [self.diffusion.x_min(), self.diffusion.x_max()], grid)?;

        if let Some(dom) = self.injection.domain() {
            check_covers("injection table", dom, grid)?;
        }

        if self.structure.enables(Channel::InverseCompton) {
            match self.ic_kernel {
                Some(ref k) => check_covers("inverse-Compton kernel", k.y_lim(), grid)?,
                None => {
                    return Err(Error::Domain(format!(
                        "structure {:?} requires an inverse-Compton kernel but none was supplied",
                        self.structure
                    )));
                }
            }
        }

        if self.structure.enables(Channel::Bremsstrahlung) {
            match self.bs_kernel {
                Some(ref k) => check_covers("bremsstrahlung kernel", k.y_lim(), grid)?,
                None => {
                    return Err(Error::Domain(format!(
                        "structure {:?} requires a bremsstrahlung kernel but none was supplied",
                        self.structure
                    )));
                }
            }
        }

        Ok(())
    }

    /// Total loss rate and its derivative at `e_gev`, summed over the
    /// channels this zone's structure enables.
    fn loss_rate(&self, e_gev: f64) -> Result<losses::LossRate> {
        let mut rate = 0.;
        let mut deriv = 0.;

        for &channel in self.structure.channels() {
            let lr = match channel {
                Channel::Ionization => losses::ionization(e_gev, self.n_h)?,
                Channel::Coulomb => losses::coulomb(e_gev, self.n_h)?,
                Channel::Synchrotron => losses::synchrotron(e_gev, self.b_field)?,
                Channel::InverseCompton => {
                    let kernel = self.require_kernel(&self.ic_kernel, "inverse-Compton")?;
                    losses::kernel_channel(e_gev, kernel, 1.)?
                }
                Channel::Bremsstrahlung => {
                    let kernel = self.require_kernel(&self.bs_kernel, "bremsstrahlung")?;
                    losses::kernel_channel(e_gev, kernel, self.n_h)?
                }
            };
            rate += lr.rate;
            deriv += lr.deriv;
        }

        Ok(losses::LossRate { rate: rate, deriv: deriv })
    }

    fn require_kernel<'a>(&self, kernel: &'a Option<Spline2d>, name: &str) -> Result<&'a Spline2d> {
        kernel.as_ref().ok_or_else(|| {
            Error::Domain(format!("{} kernel missing for structure {:?}", name, self.structure))
        })
    }
}

fn check_covers(name: &str, dom: [f64; 2], grid: &EnergyGrid) -> Result<()> {
    if dom[0] > grid.e_min() || dom[1] < grid.e_max() {
        Err(Error::Table(format!(
            "{} spans [{:e}, {:e}] GeV but must cover the grid [{:e}, {:e}] GeV",
            name,
            dom[0],
            dom[1],
            grid.e_min(),
            grid.e_max()
        )))
    } else {
        Ok(())
    }
}

/// A fully assembled steady-state solve: an energy grid plus one or two
/// zones. Build it, then call `solve`.
#[derive(Debug)]
pub struct SteadyStateProblem {
    grid: EnergyGrid,
    zones: Vec<Zone>,
}

impl SteadyStateProblem {
    /// Start assembling a problem on a logarithmic grid of `n_e` energies
    /// between `e_min` and `e_max` GeV.
    pub fn new(e_min: f64, e_max: f64, n_e: usize) -> Result<Self> {
        Ok(SteadyStateProblem {
            grid: EnergyGrid::logarithmic(e_min, e_max, n_e)?,
            zones: Vec::new(),
        })
    }

    /// Add a zone, validating it against the grid immediately. At most two
    /// zones (two physically separated reservoirs) are supported.
    pub fn zone(mut self, zone: Zone) -> Result<Self> {
        if self.zones.len() >= 2 {
            return Err(Error::Domain("at most two zones are supported".to_owned()));
        }
        zone.validate(&self.grid)?;
        self.zones.push(zone);
        Ok(self)
    }

    /// The energy grid the solve will run on.
    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    /// Run the solve: precompute losses, escape times and sources for each
    /// zone, sweep downward from `E_max`, and package the results.
    pub fn solve(&self, log: &Logger) -> Result<SolvedSpectrum> {
        if self.zones.is_empty() {
            return Err(Error::Domain("a solve needs at least one zone".to_owned()));
        }

        trace!(log, "beginning steady-state solve";
               "n_e" => self.grid.len(),
               "e_min" => self.grid.e_min(),
               "e_max" => self.grid.e_max(),
               "n_zones" => self.zones.len(),
        );

        let energies = self.grid.energies();
        let n = energies.len();
        let mut zone_spectra = Vec::with_capacity(self.zones.len());

        for (zi, zone) in self.zones.iter().enumerate() {
            let h_cm = zone.h_pc * PARSEC_CM;

            // Precompute the per-point loss rates, escape times and source
            // terms. Any unphysical value surfaces here, before the sweep.
            let mut b = Vec::with_capacity(n);
            let mut b_deriv = Vec::with_capacity(n);
            let mut tau = Vec::with_capacity(n);
            let mut q = Vec::with_capacity(n);

            for (i, &e) in energies.iter().enumerate() {
                let lr = zone.loss_rate(e)?;
                if !(lr.rate < 0.) || !lr.rate.is_finite() {
                    return Err(Error::Domain(format!(
                        "total loss rate must be strictly negative; got {:e} GeV/s \
                         at grid index {} (E = {:e} GeV)",
                        lr.rate, i, e
                    )));
                }
                b.push(lr.rate);
                b_deriv.push(lr.deriv);

                let d = zone.diffusion.eval(e)?;
                if !(d > 0.) || !d.is_finite() {
                    return Err(Error::Domain(format!(
                        "diffusion coefficient must be positive; got {:e} cm^2/s at E = {:e} GeV",
                        d, e
                    )));
                }
                tau.push(h_cm * h_cm / d);

                let source = zone.injection.source(e)?;
                if source < 0. || !source.is_finite() {
                    return Err(Error::Domain(format!(
                        "injection source must be non-negative; got {:e} at E = {:e} GeV",
                        source, e
                    )));
                }
                q.push(source);
            }

            trace!(log, "zone precomputation done";
                   "zone" => zi,
                   "structure" => ?zone.structure,
                   "b_bottom" => b[0],
                   "b_top" => b[n - 1],
                   "tau_bottom" => tau[0],
                   "tau_top" => tau[n - 1],
            );

            let density = sweep(zi, energies, &b, &b_deriv, &tau, &q)?;

            trace!(log, "zone sweep finished";
                   "zone" => zi,
                   "n_bottom" => density[0],
            );

            zone_spectra.push(ZoneSpectrum::from_arrays(
                zone.structure,
                energies.to_vec(),
                density,
            )?);
        }

        Ok(SolvedSpectrum::new(&self.grid, zone_spectra))
    }
}

/// The downward sweep itself. `N(E_max) = 0`; each step solves the local
/// finite-difference update implicitly in the loss term.
fn sweep(
    zone: usize,
    energies: &[f64],
    b: &[f64],
    b_deriv: &[f64],
    tau: &[f64],
    q: &[f64],
) -> Result<Vec<f64>> {
    let n = energies.len();
    let mut density = vec![0.; n];

    for i in (0..n - 1).rev() {
        let de = energies[i + 1] - energies[i];
        let denom = -b[i] / de + b_deriv[i] + 1. / tau[i];

        if !denom.is_finite() || denom <= 0. {
            return Err(Error::Instability { zone: zone, index: i });
        }

        let numer = q[i] - b[i] * density[i + 1] / de;
        let value = numer / denom;

        if !value.is_finite() || value < 0. {
            return Err(Error::Instability { zone: zone, index: i });
        }

        density[i] = value;
    }

    Ok(density)
}

#[cfg(test)]
mod tests {
    use super::*;
    use injection::InjectionLaw;
    use {Injection, Structure};

    fn flat_diffusion(d: f64) -> Spline1d {
        Spline1d::linear(vec![1e-4, 1e4], vec![d, d]).unwrap()
    }

    fn dead_kernel() -> Spline2d {
        Spline2d::bilinear(
            vec![1e-9, 1e-3],
            vec![1e-4, 1., 1e4],
            vec![0.; 6],
        )
        .unwrap()
    }

    fn toy_injection() -> Injection {
        Injection::Law(InjectionLaw::new(2.2, ::MASS_ELECTRON_GEV, 1e5).unwrap())
    }

    fn disk_zone() -> Zone {
        Zone::new(
            Structure::Disk,
            1.,
            5e-6,
            100.,
            flat_diffusion(1e28),
            toy_injection(),
        )
        .ic_kernel(dead_kernel())
        .bs_kernel(dead_kernel())
    }

    #[test]
    fn disk_without_kernels_is_rejected() {
        let zone = Zone::new(
            Structure::Disk,
            1.,
            5e-6,
            100.,
            flat_diffusion(1e28),
            toy_injection(),
        );
        let r = SteadyStateProblem::new(1e-3, 1e3, 64).unwrap().zone(zone);
        assert!(r.is_err());
    }

    #[test]
    fn halo_needs_no_bremsstrahlung_kernel() {
        let zone = Zone::new(
            Structure::Halo,
            1e-3,
            2e-6,
            1000.,
            flat_diffusion(1e29),
            toy_injection(),
        )
        .ic_kernel(dead_kernel());
        assert!(SteadyStateProblem::new(1e-3, 1e3, 64).unwrap().zone(zone).is_ok());
    }

    #[test]
    fn narrow_diffusion_table_is_rejected() {
        let zone = Zone::new(
            Structure::Disk,
            1.,
            5e-6,
            100.,
            Spline1d::linear(vec![1e-2, 1e2], vec![1e28, 1e28]).unwrap(),
            toy_injection(),
        )
        .ic_kernel(dead_kernel())
        .bs_kernel(dead_kernel());

        let r = SteadyStateProblem::new(1e-3, 1e3, 64).unwrap().zone(zone);
        match r {
            Err(Error::Table(_)) => {}
            other => panic!("expected TableError, got {:?}", other),
        }
    }

    #[test]
    fn bad_medium_parameters_are_rejected() {
        for &(n_h, b, h) in &[(0., 5e-6, 100.), (1., 0., 100.), (1., 5e-6, 0.)] {
            let zone = Zone::new(
                Structure::Disk,
                n_h,
                b,
                h,
                flat_diffusion(1e28),
                toy_injection(),
            )
            .ic_kernel(dead_kernel())
            .bs_kernel(dead_kernel());
            assert!(SteadyStateProblem::new(1e-3, 1e3, 64).unwrap().zone(zone).is_err());
        }
    }

    #[test]
    fn three_zones_are_rejected() {
        let p = SteadyStateProblem::new(1e-3, 1e3, 64)
            .unwrap()
            .zone(disk_zone())
            .unwrap()
            .zone(disk_zone())
            .unwrap();
        assert!(p.zone(disk_zone()).is_err());
    }

    #[test]
    fn solve_needs_a_zone() {
        let log = ::slog::Logger::root(::slog::Discard, o!());
        let p = SteadyStateProblem::new(1e-3, 1e3, 64).unwrap();
        assert!(p.solve(&log).is_err());
    }

    #[test]
    fn boundary_condition_pins_top_of_grid() {
        let log = ::slog::Logger::root(::slog::Discard, o!());
        let solved = SteadyStateProblem::new(1e-3, 1e3, 256)
            .unwrap()
            .zone(disk_zone())
            .unwrap()
            .solve(&log)
            .unwrap();

        let dens = solved.densities(0).unwrap();
        assert_eq!(*dens.last().unwrap(), 0.);
        for &d in dens {
            assert!(d >= 0.);
        }
        assert!(dens[0] > 0.);
    }
}
