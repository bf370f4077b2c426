// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

//! Check the solver against the analytic limits of the transport equation.

extern crate leptran;
extern crate leptran_test_support;

use leptran::{
    Injection, InjectionLaw, SolvedSpectrum, Spline1d, Spline2d, SteadyStateProblem, Structure,
    Zone, ERG_GEV, MASS_ELECTRON_GEV, MILLIBARN_CM2, PARSEC_CM, SIGMA_T_MILLIBARN, SPEED_LIGHT,
};

/// A loss kernel that is identically zero but covers the full solve domain,
/// so that channel contributes nothing without tripping coverage checks.
fn dead_kernel() -> Spline2d {
    Spline2d::bilinear(vec![1e-9, 1e-3], vec![1e-4, 1., 2e3], vec![0.; 6]).unwrap()
}

fn flat_diffusion(d: f64) -> Spline1d {
    Spline1d::linear(vec![1e-4, 1e4], vec![d, d]).unwrap()
}

fn fiducial_injection() -> Injection {
    Injection::Law(InjectionLaw::new(2.2, MASS_ELECTRON_GEV, 1e5).unwrap())
}

fn fiducial_disk(injection: Injection) -> Zone {
    Zone::new(Structure::Disk, 1., 1e-5, 100., flat_diffusion(1e28), injection)
        .ic_kernel(dead_kernel())
        .bs_kernel(dead_kernel())
}

fn solve_fiducial(injection: Injection) -> SolvedSpectrum {
    let log = leptran_test_support::default_log();
    SteadyStateProblem::new(1e-3, 1e3, 512)
        .unwrap()
        .zone(fiducial_disk(injection))
        .unwrap()
        .solve(&log)
        .unwrap()
}

#[test]
fn doubling_injection_doubles_the_spectrum() {
    let base_law = InjectionLaw::new(2.2, MASS_ELECTRON_GEV, 1e5).unwrap();
    let doubled_law = base_law.with_total(2.).unwrap();

    let base = solve_fiducial(Injection::Law(base_law));
    let doubled = solve_fiducial(Injection::Law(doubled_law));

    let nb = base.densities(0).unwrap();
    let nd = doubled.densities(0).unwrap();

    // The final grid point is pinned to zero in both solves.
    for i in 0..nb.len() - 1 {
        let ratio = nd[i] / nb[i];
        if ((ratio - 2.) / 2.).abs() > 1e-12 {
            panic!(
                "transport must be linear in the injection; at index {} the \
                 density ratio was {:.16e}",
                i, ratio
            );
        }
    }
}

#[test]
fn identical_solves_agree_bitwise() {
    let a = solve_fiducial(fiducial_injection());
    let b = solve_fiducial(fiducial_injection());

    let na = a.densities(0).unwrap();
    let nb = b.densities(0).unwrap();
    assert_eq!(na.len(), nb.len());

    for (i, (&x, &y)) in na.iter().zip(nb.iter()).enumerate() {
        if x != y {
            panic!("solves diverged at index {}: {:.17e} vs {:.17e}", i, x, y);
        }
    }
}

#[test]
fn top_of_grid_is_pinned_to_zero() {
    let solved = solve_fiducial(fiducial_injection());
    let dens = solved.densities(0).unwrap();

    assert_eq!(*dens.last().unwrap(), 0.);

    for (i, &d) in dens.iter().enumerate() {
        if d < 0. {
            panic!("negative density {:.6e} at index {}", d, i);
        }
    }
}

/// With a huge diffusion coefficient the escape time is far shorter than any
/// loss timescale, and the steady state reduces to `N = Q tau_esc`.
#[test]
fn escape_dominated_limit() {
    const D: f64 = 1e36;
    const H_PC: f64 = 100.;

    let log = leptran_test_support::default_log();
    let law = InjectionLaw::new(2.2, MASS_ELECTRON_GEV, 1e5).unwrap();

    let zone = Zone::new(
        Structure::Disk,
        1.,
        1e-5,
        H_PC,
        flat_diffusion(D),
        Injection::Law(law),
    )
    .ic_kernel(dead_kernel())
    .bs_kernel(dead_kernel());

    let solved = SteadyStateProblem::new(1e-3, 1e3, 512)
        .unwrap()
        .zone(zone)
        .unwrap()
        .solve(&log)
        .unwrap();

    let h_cm = H_PC * PARSEC_CM;
    let tau = h_cm * h_cm / D;

    // The top of the grid is excluded: the boundary condition pins it to
    // zero, and just below it the residual loss term is largest.
    for (&e, &n) in solved
        .energies()
        .iter()
        .zip(solved.densities(0).unwrap().iter())
        .filter(|&(&e, _)| e <= 1e2)
    {
        let expected = law.eval(e) * tau;
        let rel_err = ((n - expected) / expected).abs();

        if rel_err > 1e-3 {
            panic!(
                "escape-dominated limit violated at E = {:.6e} GeV: \
                 expected {:.6e}, got {:.6e} (rel err {:.3e})",
                e, expected, n, rel_err
            );
        }
    }
}

/// With escape switched off and synchrotron the only effective loss channel,
/// the steady state is the classic `N = (1/|b|) int_E^Emax Q dE'`.
#[test]
fn loss_dominated_limit() {
    const B: f64 = 1e-3;
    const Q0: f64 = 1e-20;
    const E_MAX: f64 = 1e3;

    let log = leptran_test_support::default_log();

    let problem = SteadyStateProblem::new(1e-3, E_MAX, 2000).unwrap();
    let energies = problem.grid().energies().to_vec();

    // Inject Q0 E^-2, tabulated on the solve grid itself so the source is
    // sampled exactly. The halo structure with a near-vacuum medium and a
    // dead IC kernel leaves synchrotron as the only significant loss.
    let q_values: Vec<f64> = energies.iter().map(|&e| Q0 / (e * e)).collect();
    let injection = Injection::Table(Spline1d::linear(energies, q_values).unwrap());

    let zone = Zone::new(
        Structure::Halo,
        1e-10,
        B,
        1e3,
        flat_diffusion(1e20),
        injection,
    )
    .ic_kernel(dead_kernel());

    let solved = problem.zone(zone).unwrap().solve(&log).unwrap();

    // b(E) = -k E^2 for synchrotron alone.
    let u_b = B * B / (8. * std::f64::consts::PI) * ERG_GEV;
    let k = 4. / 3. * SPEED_LIGHT * SIGMA_T_MILLIBARN * MILLIBARN_CM2 * u_b
        / (MASS_ELECTRON_GEV * MASS_ELECTRON_GEV);

    for (&e, &n) in solved
        .energies()
        .iter()
        .zip(solved.densities(0).unwrap().iter())
        .filter(|&(&e, _)| e >= 1e-2 && e <= 1.)
    {
        let expected = Q0 / k * (e.powi(-3) - e.powi(-2) / E_MAX);
        let rel_err = ((n - expected) / expected).abs();

        if rel_err > 0.05 {
            panic!(
                "loss-dominated limit violated at E = {:.6e} GeV: \
                 expected {:.6e}, got {:.6e} (rel err {:.3e})",
                e, expected, n, rel_err
            );
        }
    }
}

#[test]
fn two_zone_solve_produces_two_spectra() {
    let log = leptran_test_support::default_log();

    let disk = fiducial_disk(fiducial_injection());
    let halo = Zone::new(
        Structure::Halo,
        1e-3,
        2e-6,
        2e3,
        flat_diffusion(1e29),
        fiducial_injection(),
    )
    .ic_kernel(dead_kernel());

    let solved = SteadyStateProblem::new(1e-3, 1e3, 256)
        .unwrap()
        .zone(disk)
        .unwrap()
        .zone(halo)
        .unwrap()
        .solve(&log)
        .unwrap();

    assert_eq!(solved.n_zones(), 2);
    assert_eq!(solved.zone(0).unwrap().structure(), Structure::Disk);
    assert_eq!(solved.zone(1).unwrap().structure(), Structure::Halo);

    for zi in 0..2 {
        for &d in solved.densities(zi).unwrap() {
            assert!(d >= 0.);
        }
        assert!(solved.densities(zi).unwrap()[0] > 0.);
    }

    // The halo sees weaker losses and slower escape, so the two spectra
    // must genuinely differ.
    assert!(solved.densities(0).unwrap()[0] != solved.densities(1).unwrap()[0]);
}

#[test]
fn under_covering_tables_fail_at_construction() {
    // Diffusion table stops short of the grid top.
    let zone = Zone::new(
        Structure::Halo,
        1e-3,
        2e-6,
        1e3,
        Spline1d::linear(vec![1e-4, 1e2], vec![1e28, 1e28]).unwrap(),
        fiducial_injection(),
    )
    .ic_kernel(dead_kernel());
    assert!(SteadyStateProblem::new(1e-3, 1e3, 64).unwrap().zone(zone).is_err());

    // Tabulated injection that misses the bottom of the grid.
    let injection = Injection::Table(Spline1d::linear(vec![1e-2, 1e4], vec![1., 1.]).unwrap());
    let zone = Zone::new(Structure::Halo, 1e-3, 2e-6, 1e3, flat_diffusion(1e28), injection)
        .ic_kernel(dead_kernel());
    assert!(SteadyStateProblem::new(1e-3, 1e3, 64).unwrap().zone(zone).is_err());

    // A halo zone with no inverse-Compton kernel at all.
    let zone = Zone::new(
        Structure::Halo,
        1e-3,
        2e-6,
        1e3,
        flat_diffusion(1e28),
        fiducial_injection(),
    );
    assert!(SteadyStateProblem::new(1e-3, 1e3, 64).unwrap().zone(zone).is_err());
}

#[test]
fn solved_spectra_resample_cleanly() {
    let solved = solve_fiducial(fiducial_injection());
    let finer = solved.resample(1e-2, 1e2, 300).unwrap();

    assert_eq!(finer.energies().len(), 300);

    let z = finer.zone(0).unwrap();
    for (&e, &d) in z.energies().iter().zip(z.density().iter()) {
        let direct = solved.zone(0).unwrap().eval(e).unwrap();
        if (d - direct).abs() > 1e-12 * direct.abs().max(1e-300) {
            panic!("resampled density at {:.6e} GeV drifted: {:.6e} vs {:.6e}", e, d, direct);
        }
    }

    assert!(solved.resample(1e-4, 1., 100).is_err());
}
