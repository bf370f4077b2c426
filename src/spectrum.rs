// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Packaging of solved electron spectra.

The transport solver produces plain density arrays aligned to its energy
grid. Here they are wrapped back into interpolants so callers can query the
spectrum at arbitrary energies, while bulk consumers (the radiative-emission
integrators) read the arrays directly. Packaged spectra interpolate
linearly between grid points, matching how solved spectra are tabulated and
re-read elsewhere in the pipeline; with the grids used in practice the
spacing is far finer than any feature in the spectrum.

*/

use spline::Spline1d;
use {EnergyGrid, Result, Structure};

/// The solved spectrum of a single electron population, queryable at
/// arbitrary energies within the solved domain.
#[derive(Debug)]
pub struct ZoneSpectrum {
    structure: Structure,
    energies: Vec<f64>,
    density: Vec<f64>,
    interp: Spline1d,
}

impl ZoneSpectrum {
    /// Wrap a density array tabulated on `energies` (GeV, strictly
    /// increasing) into an evaluable spectrum.
    pub fn from_arrays(structure: Structure, energies: Vec<f64>, density: Vec<f64>) -> Result<Self> {
        let interp = Spline1d::linear(energies.clone(), density.clone())?;
        Ok(ZoneSpectrum {
            structure: structure,
            energies: energies,
            density: density,
            interp: interp,
        })
    }

    /// Which physical structure this population lives in.
    pub fn structure(&self) -> Structure {
        self.structure
    }

    /// The tabulation energies in GeV.
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// The electron density array, in electrons per GeV per cm^3, aligned
    /// to `energies()`.
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Evaluate the spectrum at `e_gev`, failing outside the solved domain.
    pub fn eval(&self, e_gev: f64) -> Result<f64> {
        self.interp.eval(e_gev)
    }

    /// Evaluate the spectrum at `e_gev`, treating out-of-domain queries as
    /// zero. Emission integrators use this form.
    pub fn eval_or_zero(&self, e_gev: f64) -> f64 {
        self.interp.eval_or_zero(e_gev)
    }
}

/// The output of a steady-state solve: the energy grid plus one evaluable
/// spectrum per configured zone.
#[derive(Debug)]
pub struct SolvedSpectrum {
    energies: Vec<f64>,
    zones: Vec<ZoneSpectrum>,
}

impl SolvedSpectrum {
    pub(crate) fn new(grid: &EnergyGrid, zones: Vec<ZoneSpectrum>) -> Self {
        SolvedSpectrum {
            energies: grid.energies().to_vec(),
            zones: zones,
        }
    }

    /// The solve's energy grid in GeV.
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// How many zones were solved.
    pub fn n_zones(&self) -> usize {
        self.zones.len()
    }

    /// The packaged spectrum of zone `index`, if it exists.
    pub fn zone(&self, index: usize) -> Option<&ZoneSpectrum> {
        self.zones.get(index)
    }

    /// Direct access to zone `index`'s density array.
    pub fn densities(&self, index: usize) -> Option<&[f64]> {
        self.zones.get(index).map(|z| z.density())
    }

    /// Re-tabulate every zone onto a fresh logarithmic grid. The new bounds
    /// must lie within the solved domain; there is no extrapolation.
    pub fn resample(&self, e_min: f64, e_max: f64, n: usize) -> Result<SolvedSpectrum> {
        let grid = EnergyGrid::logarithmic(e_min, e_max, n)?;

        let mut zones = Vec::with_capacity(self.zones.len());
        for z in &self.zones {
            let density = grid
                .energies()
                .iter()
                .map(|&e| z.eval(e))
                .collect::<Result<Vec<f64>>>()?;
            zones.push(ZoneSpectrum::from_arrays(
                z.structure(),
                grid.energies().to_vec(),
                density,
            )?);
        }

        Ok(SolvedSpectrum::new(&grid, zones))
    }
}
