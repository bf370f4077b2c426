// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Numerical quadrature over finite and semi-infinite intervals.

The builder mirrors the shape of the usual QAG/QAGIU workflow: make a
workspace, hand it an integrand and bounds, tweak the tolerances, and
`compute()`. Underneath sits globally adaptive Simpson integration; the
semi-infinite variant maps `[a, inf)` onto `[0, 1)` with `x = a + t/(1-t)`,
which needs the integrand to decay at large argument (all of ours do, thanks
to exponential cutoffs).

*/

use {Error, Result};

/// Scratch state for the adaptive integrators. `new(n)` caps the bisection
/// depth so a pathological integrand terminates instead of recursing
/// forever; 50 is plenty for everything this crate integrates.
#[derive(Clone, Copy, Debug)]
pub struct IntegrationWorkspace {
    max_depth: usize,
}

impl IntegrationWorkspace {
    /// Create a workspace with the given maximum bisection depth.
    pub fn new(max_depth: usize) -> Self {
        IntegrationWorkspace { max_depth: max_depth }
    }

    /// Integrate `f` over the finite interval `[lower, upper]`.
    pub fn qag<F>(&mut self, f: F, lower: f64, upper: f64) -> IntegrationBuilder<F>
    where
        F: FnMut(f64) -> f64,
    {
        IntegrationBuilder {
            max_depth: self.max_depth,
            function: f,
            kind: Integrator::Qag,
            lower_bound: lower,
            upper_bound: upper,
            epsabs: 0.,
            epsrel: 1e-8,
        }
    }

    /// Integrate `f` over `[lower, inf)`.
    pub fn qagiu<F>(&mut self, f: F, lower: f64) -> IntegrationBuilder<F>
    where
        F: FnMut(f64) -> f64,
    {
        IntegrationBuilder {
            max_depth: self.max_depth,
            function: f,
            kind: Integrator::Qagiu,
            lower_bound: lower,
            upper_bound: f64::INFINITY,
            epsabs: 0.,
            epsrel: 1e-8,
        }
    }
}

/// The result of a quadrature: the value and an estimate of the absolute
/// error actually achieved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationResult {
    /// The estimated value of the integral.
    pub value: f64,
    /// An (approximate) bound on the absolute error.
    pub abserr: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Integrator {
    Qag,
    Qagiu,
}

/// A pending integration; finish it with `compute()`.
pub struct IntegrationBuilder<F>
where
    F: FnMut(f64) -> f64,
{
    max_depth: usize,
    function: F,
    kind: Integrator,
    lower_bound: f64,
    upper_bound: f64,
    epsabs: f64,
    epsrel: f64,
}

impl<F> IntegrationBuilder<F>
where
    F: FnMut(f64) -> f64,
{
    /// Set the absolute and relative tolerance targets.
    pub fn tolerance(mut self, epsabs: f64, epsrel: f64) -> Self {
        self.epsabs = epsabs;
        self.epsrel = epsrel;
        self
    }

    /// Run the integration.
    pub fn compute(mut self) -> Result<IntegrationResult> {
        match self.kind {
            Integrator::Qag => {
                let lo = self.lower_bound;
                let hi = self.upper_bound;
                let (epsabs, epsrel, depth) = (self.epsabs, self.epsrel, self.max_depth);
                adaptive_simpson(&mut self.function, lo, hi, epsabs, epsrel, depth)
            }
            Integrator::Qagiu => {
                let a = self.lower_bound;
                let (epsabs, epsrel, depth) = (self.epsabs, self.epsrel, self.max_depth);
                let f = &mut self.function;

                // Map [a, inf) onto [0, 1); the Jacobian is (1-t)^-2. The
                // integrand is taken to vanish at the compactified endpoint.
                let mut g = |t: f64| {
                    if t >= 1. {
                        0.
                    } else {
                        let onemt = 1. - t;
                        f(a + t / onemt) / (onemt * onemt)
                    }
                };

                adaptive_simpson(&mut g, 0., 1., epsabs, epsrel, depth)
            }
        }
    }
}

fn simpson_estimate(fa: f64, fm: f64, fb: f64, h: f64) -> f64 {
    h / 6. * (fa + 4. * fm + fb)
}

fn adaptive_simpson<F>(
    f: &mut F,
    a: f64,
    b: f64,
    epsabs: f64,
    epsrel: f64,
    max_depth: usize,
) -> Result<IntegrationResult>
where
    F: FnMut(f64) -> f64,
{
    if !(a.is_finite() && b.is_finite()) || a >= b {
        return Err(Error::Domain(format!(
            "integration bounds must be finite and ordered; got [{:e}, {:e}]",
            a, b
        )));
    }

    let m = 0.5 * (a + b);
    let fa = f(a);
    let fm = f(m);
    let fb = f(b);
    let whole = simpson_estimate(fa, fm, fb, b - a);

    let mut abserr = 0.;
    let value = refine(
        f, a, b, fa, fm, fb, whole, epsabs, epsrel, max_depth, &mut abserr,
    )?;

    Ok(IntegrationResult {
        value: value,
        abserr: abserr,
    })
}

fn refine<F>(
    f: &mut F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    epsabs: f64,
    epsrel: f64,
    depth: usize,
    abserr: &mut f64,
) -> Result<f64>
where
    F: FnMut(f64) -> f64,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);

    if flm.is_nan() || frm.is_nan() {
        return Err(Error::Domain(format!(
            "integrand evaluated to NaN near x = {:e}",
            if flm.is_nan() { lm } else { rm }
        )));
    }

    let left = simpson_estimate(fa, flm, fm, m - a);
    let right = simpson_estimate(fm, frm, fb, b - m);
    let delta = left + right - whole;

    let tol = epsabs.max(epsrel * (left + right).abs());

    // Standard acceptance test; the factor 15 comes from the error model of
    // Simpson bisection.
    if depth == 0 || delta.abs() <= 15. * tol {
        *abserr += delta.abs() / 15.;
        return Ok(left + right + delta / 15.);
    }

    let lv = refine(
        f, a, m, fa, flm, fm, left, 0.5 * epsabs, epsrel, depth - 1, abserr,
    )?;
    let rv = refine(
        f, m, b, fm, frm, fb, right, 0.5 * epsabs, epsrel, depth - 1, abserr,
    )?;
    Ok(lv + rv)
}
