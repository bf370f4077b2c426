// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/// Solve one fiducial two-zone (disk plus halo) galaxy model and print spot
/// values of the resulting electron spectra and emissivities.
///
/// The loss kernels here are crude box approximations, normalized so the
/// integrated inverse-Compton rate reproduces the Thomson-regime loss on the
/// CMB energy density. Real applications supply externally computed tables.

extern crate leptran;
extern crate leptran_test_support;

use leptran::{emission, Injection, InjectionLaw, Spline1d, Spline2d, SteadyStateProblem,
              Structure, Zone, MASS_ELECTRON_GEV, MILLIBARN_CM2, SIGMA_T_MILLIBARN, SPEED_LIGHT};

const E_MIN: f64 = 1e-3;
const E_MAX: f64 = 1e3;
const N_E: usize = 512;

const U_CMB: f64 = 2.6e-10; // GeV cm^-3

fn log_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| lo * (hi / lo).powf(i as f64 / (n - 1) as f64))
        .collect()
}

/// A box kernel over photon energies [x0, x1], with the electron-energy
/// dependence chosen so the integrated rate matches `rate_of(e_e)`.
fn box_kernel<F>(x0: f64, x1: f64, rate_of: F) -> Spline2d
where
    F: Fn(f64) -> f64,
{
    let xs = log_grid(x0, x1, 16);
    let ys = log_grid(1e-4, 1e4, 64);
    let norm = 0.5 * (x1 * x1 - x0 * x0);

    let mut zs = Vec::with_capacity(xs.len() * ys.len());
    for &e_e in &ys {
        let amplitude = rate_of(e_e) / norm;
        for _ in &xs {
            zs.push(amplitude);
        }
    }

    Spline2d::bilinear(xs, ys, zs).unwrap()
}

fn ic_kernel() -> Spline2d {
    box_kernel(1e-9, 1e-3, |e_e| {
        let gamma = e_e / MASS_ELECTRON_GEV;
        4. / 3. * SPEED_LIGHT * SIGMA_T_MILLIBARN * MILLIBARN_CM2 * U_CMB * gamma * gamma
    })
}

fn bs_kernel() -> Spline2d {
    // An effective cross-section of 3.4e-26 cm^2 stands in for the
    // logarithmic bremsstrahlung factor; the n_H scaling is applied by the
    // solver, so this kernel is per target atom.
    box_kernel(1e-9, 1e-3, |e_e| SPEED_LIGHT * 3.4e-26 * e_e)
}

/// A smooth approximation of the single-electron synchrotron shape,
/// F(x) ~ 1.85 x^(1/3) exp(-x).
fn sync_shape() -> Spline1d {
    let xs = log_grid(1e-6, 50., 64);
    let fs = xs.iter().map(|&x| 1.85 * x.powf(1. / 3.) * (-x).exp()).collect();
    Spline1d::cubic(xs, fs).unwrap()
}

fn diffusion_table(d0: f64) -> Spline1d {
    // D(E) = D0 (E / 3 GeV)^0.5, the usual Kraichnan-like scaling.
    let xs = log_grid(1e-4, 1e4, 64);
    let ds = xs.iter().map(|&e| d0 * (e / 3.).sqrt()).collect();
    Spline1d::cubic(xs, ds).unwrap()
}

fn main() {
    let log = leptran_test_support::default_log();

    let injection = || {
        Injection::Law(
            InjectionLaw::new(2.2, MASS_ELECTRON_GEV, 1e5)
                .unwrap()
                .with_total(1e-25)
                .unwrap(),
        )
    };

    let disk = Zone::new(Structure::Disk, 1., 5e-6, 100., diffusion_table(3e28), injection())
        .ic_kernel(ic_kernel())
        .bs_kernel(bs_kernel());

    let halo = Zone::new(Structure::Halo, 1e-3, 2e-6, 2e3, diffusion_table(3e29), injection())
        .ic_kernel(ic_kernel());

    let solved = SteadyStateProblem::new(E_MIN, E_MAX, N_E)
        .unwrap()
        .zone(disk)
        .unwrap()
        .zone(halo)
        .unwrap()
        .solve(&log)
        .unwrap();

    for &e in &[1e-2, 1e-1, 1., 1e1, 1e2] {
        println!(
            "N({:8.1e} GeV)   disk: {:.6e}   halo: {:.6e}  cm^-3 GeV^-1",
            e,
            solved.zone(0).unwrap().eval(e).unwrap(),
            solved.zone(1).unwrap().eval(e).unwrap(),
        );
    }

    let kernel = ic_kernel();
    let shape = sync_shape();
    let disk_spec = solved.zone(0).unwrap();

    for &e_gam in &[1e-8, 1e-6, 1e-4] {
        println!(
            "eps_IC({:8.1e} GeV) = {:.6e}",
            e_gam,
            emission::inverse_compton(e_gam, &kernel, disk_spec).unwrap()
        );
    }

    for &e_gam in &[1e-15, 1e-14, 1e-13] {
        println!(
            "eps_SY({:8.1e} GeV) = {:.6e}",
            e_gam,
            emission::synchrotron(e_gam, 5e-6, &shape, disk_spec).unwrap()
        );
    }
}
