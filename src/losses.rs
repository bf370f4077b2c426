// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Continuous energy-loss rates for relativistic electrons.

Each evaluator maps an electron energy and the relevant medium parameters to
a loss rate `dE/dt` in GeV/s — negative, since the electron is losing energy
— together with the energy-derivative of that rate in 1/s. The transport
solver consumes the derivative directly so it never has to re-difference the
stiff loss term on the fly.

Ionization/excitation and Coulomb/plasma losses follow Schlickeiser's
treatment of a mostly neutral medium (91% H, 9% He by number; mean excitation
energies of 15 eV for H and 41.5 eV for He). Synchrotron losses are the
closed-form Thomson-regime rate in the ambient field. Inverse-Compton and
bremsstrahlung rates are not analytic — their target photon fields and
cross-sections arrive as tabulated 2D kernels and are integrated numerically
over the photon axis.

*/

use quad::IntegrationWorkspace;
use spline::Spline2d;
use {Error, Result};
use {ERG_GEV, MASS_ELECTRON_GEV, MASS_ELECTRON_GRAMS, MILLIBARN_CM2, MU_ISM,
     ELECTRON_CHARGE, PLANCK_GEVS, SIGMA_T_MILLIBARN, SPEED_LIGHT};

/// A loss rate and its energy-derivative: `rate` is `dE/dt` in GeV/s
/// (negative), `deriv` is `d/dE (dE/dt)` in 1/s.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LossRate {
    /// The energy-loss rate in GeV/s; negative for an energy-losing process.
    pub rate: f64,
    /// The derivative of the rate with respect to energy, in 1/s.
    pub deriv: f64,
}

fn check_energy(e_gev: f64) -> Result<()> {
    if !(e_gev > 0.) || !e_gev.is_finite() {
        Err(Error::Domain(format!("electron energy must be positive; got {:e} GeV", e_gev)))
    } else {
        Ok(())
    }
}

fn check_density(n_h: f64) -> Result<()> {
    if !(n_h > 0.) || !n_h.is_finite() {
        Err(Error::Domain(format!("medium density must be positive; got {:e} cm^-3", n_h)))
    } else {
        Ok(())
    }
}

/// Atomic ionization and excitation losses on a medium of density `n_h`
/// (cm^-3).
pub fn ionization(e_gev: f64, n_h: f64) -> Result<LossRate> {
    check_energy(e_gev)?;
    check_density(n_h)?;

    let gamma = e_gev / MASS_ELECTRON_GEV;
    let prefactor = -9. / 4. * SPEED_LIGHT * SIGMA_T_MILLIBARN * MILLIBARN_CM2
        * MASS_ELECTRON_GEV * n_h * MU_ISM;
    let bracket = gamma.ln()
        + 0.91 * 2. / 3. * (MASS_ELECTRON_GEV * 1e9 / 15.0).ln()
        + 2. * 0.09 * 2. / 3. * (MASS_ELECTRON_GEV * 1e9 / 41.5).ln();

    Ok(LossRate {
        rate: prefactor * bracket,
        deriv: prefactor / e_gev,
    })
}

/// Coulomb/plasma losses on the ionized component of a medium of density
/// `n_h` (cm^-3). The Coulomb logarithm is cut off at the plasma frequency.
pub fn coulomb(e_gev: f64, n_h: f64) -> Result<LossRate> {
    check_energy(e_gev)?;
    check_density(n_h)?;

    let gamma = e_gev / MASS_ELECTRON_GEV;
    let nu_p = ELECTRON_CHARGE
        * (n_h * MU_ISM / (::std::f64::consts::PI * MASS_ELECTRON_GRAMS)).sqrt();
    let prefactor = -3. / 4. * SPEED_LIGHT * SIGMA_T_MILLIBARN * MILLIBARN_CM2
        * MASS_ELECTRON_GEV * n_h * MU_ISM;
    let bracket = gamma.ln() + 2. * (MASS_ELECTRON_GEV / (PLANCK_GEVS * nu_p)).ln();

    Ok(LossRate {
        rate: prefactor * bracket,
        deriv: prefactor / e_gev,
    })
}

/// Synchrotron losses in a field of `b_gauss` Gauss, in the Thomson regime:
/// `dE/dt = -(4/3) c sigma_T u_B gamma^2` with `u_B = B^2 / 8 pi`.
pub fn synchrotron(e_gev: f64, b_gauss: f64) -> Result<LossRate> {
    check_energy(e_gev)?;
    if !(b_gauss > 0.) || !b_gauss.is_finite() {
        return Err(Error::Domain(format!(
            "magnetic field must be positive; got {:e} G",
            b_gauss
        )));
    }

    let gamma = e_gev / MASS_ELECTRON_GEV;
    let u_b = b_gauss * b_gauss / (8. * ::std::f64::consts::PI) * ERG_GEV;
    let rate = -4. / 3. * SPEED_LIGHT * SIGMA_T_MILLIBARN * MILLIBARN_CM2 * u_b * gamma * gamma;

    Ok(LossRate {
        rate: rate,
        deriv: 2. * rate / e_gev,
    })
}

/// Losses against a tabulated 2D kernel `K(E_gamma, E_e)`: the rate at
/// electron energy `E_e` is `-scale * int E_gamma K(E_gamma, E_e) dE_gamma`
/// over the kernel's photon axis. Inverse Compton uses `scale = 1`;
/// bremsstrahlung uses `scale = n_H`.
///
/// The derivative is obtained by symmetric differencing in energy, with the
/// sample points clamped to the kernel's electron-energy domain.
pub fn kernel_channel(e_gev: f64, kernel: &Spline2d, scale: f64) -> Result<LossRate> {
    check_energy(e_gev)?;
    if !(scale >= 0.) || !scale.is_finite() {
        return Err(Error::Domain(format!(
            "kernel channel scale must be non-negative; got {:e}",
            scale
        )));
    }

    let y_lim = kernel.y_lim();
    if e_gev < y_lim[0] || e_gev > y_lim[1] {
        return Err(Error::OutOfDomain {
            value: e_gev,
            min: y_lim[0],
            max: y_lim[1],
        });
    }

    let rate = kernel_rate(kernel, scale, e_gev)?;

    let step = 1e-3 * e_gev;
    let e_hi = (e_gev + step).min(y_lim[1]);
    let e_lo = (e_gev - step).max(y_lim[0]);
    let deriv = if e_hi > e_lo {
        (kernel_rate(kernel, scale, e_hi)? - kernel_rate(kernel, scale, e_lo)?) / (e_hi - e_lo)
    } else {
        0.
    };

    Ok(LossRate {
        rate: rate,
        deriv: deriv,
    })
}

fn kernel_rate(kernel: &Spline2d, scale: f64, e_gev: f64) -> Result<f64> {
    let x_lim = kernel.x_lim();
    let mut ws = IntegrationWorkspace::new(40);
    let integral = ws
        .qag(|e_gam| e_gam * kernel.eval_or_zero(e_gam, e_gev), x_lim[0], x_lim[1])
        .tolerance(0., 1e-6)
        .compute()?;
    Ok(-scale * integral.value)
}
