// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Radiative emission from solved electron spectra.

These integrators sit downstream of the transport solver: they fold a
packaged `ZoneSpectrum` against caller-supplied emission tables to produce
photon emissivities at a requested photon energy. Unlike the solver path,
which treats an out-of-domain table query as an error, everything here uses
the zero-outside-domain evaluation contract: photon energies or electron
energies that fall off a table simply contribute nothing.

The inverse-Compton and bremsstrahlung emissivities fold a 2D emission
kernel `K(E_gamma, E_e)` directly against the electron density. Synchrotron
emission folds the tabulated single-electron spectral shape `F(x)` through
the critical frequency of each electron energy in the ambient field.

*/

use quad::IntegrationWorkspace;
use spectrum::ZoneSpectrum;
use spline::{Spline1d, Spline2d};
use {Error, Result};
use {ELECTRON_CHARGE, ERG_GEV, MASS_ELECTRON_GEV, MASS_ELECTRON_GRAMS, PLANCK_GEVS, SPEED_LIGHT};

fn check_photon_energy(e_gam: f64) -> Result<()> {
    if !(e_gam > 0.) || !e_gam.is_finite() {
        Err(Error::Domain(format!(
            "photon energy must be positive; got {:e} GeV",
            e_gam
        )))
    } else {
        Ok(())
    }
}

/// Fold a 2D emission kernel against the electron spectrum:
/// `int K(E_gamma, E_e) N(E_e) dE_e` over the spectrum's energy domain.
fn fold_kernel(e_gam: f64, kernel: &Spline2d, spectrum: &ZoneSpectrum) -> Result<f64> {
    let energies = spectrum.energies();
    let e_lo = energies[0];
    let e_hi = energies[energies.len() - 1];

    let mut ws = IntegrationWorkspace::new(40);
    let integral = ws
        .qag(
            |e_e| kernel.eval_or_zero(e_gam, e_e) * spectrum.eval_or_zero(e_e),
            e_lo,
            e_hi,
        )
        .tolerance(0., 1e-6)
        .compute()?;

    Ok(integral.value)
}

/// Inverse-Compton emissivity at photon energy `e_gam` (GeV), folding the
/// tabulated kernel `K(E_gamma, E_e)` against the electron spectrum. A
/// photon energy outside the kernel's domain yields zero, not an error.
pub fn inverse_compton(e_gam: f64, kernel: &Spline2d, spectrum: &ZoneSpectrum) -> Result<f64> {
    check_photon_energy(e_gam)?;
    fold_kernel(e_gam, kernel, spectrum)
}

/// Bremsstrahlung emissivity at photon energy `e_gam` (GeV) against a gas
/// of density `n_h` (cm^-3). Same folding as inverse Compton, scaled by the
/// target density.
pub fn bremsstrahlung(
    e_gam: f64,
    n_h: f64,
    kernel: &Spline2d,
    spectrum: &ZoneSpectrum,
) -> Result<f64> {
    check_photon_energy(e_gam)?;

    if !(n_h >= 0.) || !n_h.is_finite() {
        return Err(Error::Domain(format!(
            "target density must be non-negative; got {:e} cm^-3",
            n_h
        )));
    }

    Ok(n_h * fold_kernel(e_gam, kernel, spectrum)?)
}

/// Synchrotron emissivity at photon energy `e_gam` (GeV) in a field of
/// `b_gauss` Gauss. `shape` tabulates the single-electron synchrotron
/// spectral shape `F(x)` against `x = nu / nu_c`; each electron energy is
/// folded in through its critical frequency
/// `nu_c = (3/2) gamma^2 e B / (2 pi m_e c)`. Electron energies whose `x`
/// falls off the shape table contribute nothing.
pub fn synchrotron(
    e_gam: f64,
    b_gauss: f64,
    shape: &Spline1d,
    spectrum: &ZoneSpectrum,
) -> Result<f64> {
    check_photon_energy(e_gam)?;

    if !(b_gauss > 0.) || !b_gauss.is_finite() {
        return Err(Error::Domain(format!(
            "magnetic field must be positive; got {:e} G",
            b_gauss
        )));
    }

    let two_pi = 2. * ::std::f64::consts::PI;

    // The requested photon frequency and the gyrofrequency, both in Hz.
    let nu = e_gam / (two_pi * PLANCK_GEVS);
    let nu_g = ELECTRON_CHARGE * b_gauss / (two_pi * MASS_ELECTRON_GRAMS * SPEED_LIGHT);

    // Single-electron power normalization, converted from erg/s/Hz to an
    // emissivity per unit photon energy.
    let p_coeff = 3_f64.sqrt() * ELECTRON_CHARGE.powi(3) * b_gauss
        / (MASS_ELECTRON_GRAMS * SPEED_LIGHT * SPEED_LIGHT)
        * ERG_GEV
        / (two_pi * PLANCK_GEVS);

    let energies = spectrum.energies();
    let e_lo = energies[0];
    let e_hi = energies[energies.len() - 1];

    let mut ws = IntegrationWorkspace::new(40);
    let integral = ws
        .qag(
            |e_e| {
                let gamma = e_e / MASS_ELECTRON_GEV;
                let nu_c = 1.5 * gamma * gamma * nu_g;
                shape.eval_or_zero(nu / nu_c) * spectrum.eval_or_zero(e_e)
            },
            e_lo,
            e_hi,
        )
        .tolerance(0., 1e-6)
        .compute()?;

    Ok(p_coeff * integral.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spline::{Spline1d, Spline2d};
    use Structure;

    fn flat_spectrum(e_lo: f64, e_hi: f64, value: f64) -> ZoneSpectrum {
        let energies: Vec<f64> = (0..32)
            .map(|i| e_lo * (e_hi / e_lo).powf(i as f64 / 31.))
            .collect();
        let density = vec![value; 32];
        ZoneSpectrum::from_arrays(Structure::Disk, energies, density).unwrap()
    }

    #[test]
    fn constant_kernel_folds_exactly() {
        // K = k0 over a box that covers the whole spectrum: the emissivity
        // is k0 times the integral of N, which for N = 1 over [1, 10] is 9.
        let k0 = 0.75;
        let kernel = Spline2d::bilinear(
            vec![1e-4, 1e-2],
            vec![0.5, 5., 20.],
            vec![k0; 6],
        )
        .unwrap();
        let spec = flat_spectrum(1., 10., 1.);

        let eps = inverse_compton(5e-3, &kernel, &spec).unwrap();
        assert!(((eps - 9. * k0) / eps).abs() < 1e-4, "eps was {}", eps);
    }

    #[test]
    fn bremsstrahlung_scales_with_density() {
        let kernel = Spline2d::bilinear(
            vec![1e-4, 1e-2],
            vec![0.5, 5., 20.],
            vec![1.; 6],
        )
        .unwrap();
        let spec = flat_spectrum(1., 10., 1.);

        let e1 = bremsstrahlung(5e-3, 1., &kernel, &spec).unwrap();
        let e2 = bremsstrahlung(5e-3, 3., &kernel, &spec).unwrap();
        assert!(((e2 / e1) - 3.).abs() < 1e-12);
        assert!(bremsstrahlung(5e-3, -1., &kernel, &spec).is_err());
    }

    #[test]
    fn photon_energy_off_the_kernel_contributes_nothing() {
        let kernel = Spline2d::bilinear(
            vec![1e-4, 1e-2],
            vec![0.5, 20.],
            vec![1.; 4],
        )
        .unwrap();
        let spec = flat_spectrum(1., 10., 1.);

        assert_eq!(inverse_compton(1., &kernel, &spec).unwrap(), 0.);
        assert!(inverse_compton(-1., &kernel, &spec).is_err());
    }

    #[test]
    fn synchrotron_folds_flat_shape() {
        // With F(x) = f0 over an x range wide enough to catch every grid
        // energy, the fold reduces to p_coeff * f0 * int N dE.
        let f0 = 2.;
        let shape = Spline1d::linear(vec![1e-12, 1e12], vec![f0, f0]).unwrap();
        let spec = flat_spectrum(1., 10., 1.);

        let eps = synchrotron(1e-14, 5e-6, &shape, &spec).unwrap();

        let two_pi = 2. * ::std::f64::consts::PI;
        let p_coeff = 3_f64.sqrt() * ELECTRON_CHARGE.powi(3) * 5e-6
            / (MASS_ELECTRON_GRAMS * SPEED_LIGHT * SPEED_LIGHT)
            * ERG_GEV
            / (two_pi * PLANCK_GEVS);
        let expected = p_coeff * f0 * 9.;

        assert!(((eps - expected) / expected).abs() < 1e-4, "eps was {}", eps);
        assert!(synchrotron(1e-14, 0., &shape, &spec).is_err());
    }
}
