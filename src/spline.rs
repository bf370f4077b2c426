// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Monotone 1D and 2D interpolants over externally supplied tables.

Each interpolant records the domain bounds of its abscissae at build time and
refuses to evaluate outside them; callers that want the "missing data means
no contribution" behavior use the `eval_or_zero` variants instead. Interval
location goes through a small accelerator that remembers the last bracketing
interval, so sequential scans (the common access pattern during a solve) hit
the cache and random access falls back to a binary search.

Interpolants are value-owned by the solve that builds them and are not meant
to be shared across threads; the accelerator state is interior-mutable so
that evaluation can take `&self`.

*/

use std::cell::Cell;

use {Error, Result};

/// Cached last-interval locator. `find` returns an index `i` such that
/// `xs[i] <= x <= xs[i + 1]`, preferring the interval found by the previous
/// call.
#[derive(Debug)]
struct Accel {
    cached: Cell<usize>,
}

impl Accel {
    fn new() -> Self {
        Accel { cached: Cell::new(0) }
    }

    fn find(&self, xs: &[f64], x: f64) -> usize {
        let c = self.cached.get();

        if c + 1 < xs.len() && xs[c] <= x && x <= xs[c + 1] {
            return c;
        }

        // Cache miss: binary search for the left edge of the bracketing
        // interval, clamped so that i + 1 is always a valid sample.
        let i = match xs.partition_point(|&v| v <= x) {
            0 => 0,
            p if p >= xs.len() => xs.len() - 2,
            p => p - 1,
        };

        self.cached.set(i);
        i
    }
}

fn check_table(name: &str, xs: &[f64], min_points: usize) -> Result<()> {
    if xs.len() < min_points {
        return Err(Error::Table(format!(
            "{} needs at least {} samples; got {}",
            name,
            min_points,
            xs.len()
        )));
    }

    for (i, w) in xs.windows(2).enumerate() {
        if !(w[1] > w[0]) {
            return Err(Error::Table(format!(
                "{} abscissae must be strictly increasing; violated between indices {} and {}",
                name,
                i,
                i + 1
            )));
        }
    }

    Ok(())
}

fn check_domain(x: f64, lim: [f64; 2]) -> Result<()> {
    if x < lim[0] || x > lim[1] || !x.is_finite() {
        Err(Error::OutOfDomain {
            value: x,
            min: lim[0],
            max: lim[1],
        })
    } else {
        Ok(())
    }
}

/// A 1D interpolant over a table of (x, y) samples with strictly increasing
/// x. Linear interpolation needs at least 2 samples; the natural cubic
/// variant needs at least 4.
#[derive(Debug)]
pub struct Spline1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots; `None` for the linear variant.
    y2s: Option<Vec<f64>>,
    accel: Accel,
    x_lim: [f64; 2],
}

impl Spline1d {
    /// Build a piecewise-linear interpolant.
    pub fn linear(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(Error::Table(format!(
                "1D table length mismatch: {} abscissae vs {} ordinates",
                xs.len(),
                ys.len()
            )));
        }
        check_table("1D linear table", &xs, 2)?;

        let x_lim = [xs[0], xs[xs.len() - 1]];
        Ok(Spline1d {
            xs: xs,
            ys: ys,
            y2s: None,
            accel: Accel::new(),
            x_lim: x_lim,
        })
    }

    /// Build a natural cubic spline: continuous first and second derivatives
    /// in the interior, zero second derivative at the ends.
    pub fn cubic(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(Error::Table(format!(
                "1D table length mismatch: {} abscissae vs {} ordinates",
                xs.len(),
                ys.len()
            )));
        }
        check_table("1D cubic table", &xs, 4)?;

        let n = xs.len();
        let mut y2s = vec![0.; n];
        let mut u = vec![0.; n - 1];

        // Tridiagonal forward sweep for the natural-spline second
        // derivatives, then back substitution.
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.;
            y2s[i] = (sig - 1.) / p;
            let d = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6. * d / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        for k in (1..n - 1).rev() {
            y2s[k] = y2s[k] * y2s[k + 1] + u[k];
        }

        let x_lim = [xs[0], xs[n - 1]];
        Ok(Spline1d {
            xs: xs,
            ys: ys,
            y2s: Some(y2s),
            accel: Accel::new(),
            x_lim: x_lim,
        })
    }

    /// The lower edge of the valid domain.
    pub fn x_min(&self) -> f64 {
        self.x_lim[0]
    }

    /// The upper edge of the valid domain.
    pub fn x_max(&self) -> f64 {
        self.x_lim[1]
    }

    /// Evaluate at `x`, failing with `OutOfDomain` outside the recorded
    /// bounds. No extrapolation, ever.
    pub fn eval(&self, x: f64) -> Result<f64> {
        check_domain(x, self.x_lim)?;
        Ok(self.eval_inner(x))
    }

    /// Evaluate at `x`, treating out-of-domain queries as zero. This is the
    /// contract the radiative-emission integrators rely on.
    pub fn eval_or_zero(&self, x: f64) -> f64 {
        if x < self.x_lim[0] || x > self.x_lim[1] || !x.is_finite() {
            0.
        } else {
            self.eval_inner(x)
        }
    }

    fn eval_inner(&self, x: f64) -> f64 {
        let i = self.accel.find(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;

        match self.y2s {
            None => a * self.ys[i] + b * self.ys[i + 1],
            Some(ref y2s) => {
                a * self.ys[i]
                    + b * self.ys[i + 1]
                    + ((a * a * a - a) * y2s[i] + (b * b * b - b) * y2s[i + 1]) * h * h / 6.
            }
        }
    }
}

/// A bilinear interpolant over a rectilinear table of (x, y, z) samples.
///
/// `zs` is row-major with x varying fastest: the sample at `(xs[i], ys[j])`
/// lives at `zs[j * xs.len() + i]`. Both abscissa sequences must be strictly
/// increasing with at least 2 samples each.
#[derive(Debug)]
pub struct Spline2d {
    xs: Vec<f64>,
    ys: Vec<f64>,
    zs: Vec<f64>,
    xaccel: Accel,
    yaccel: Accel,
    x_lim: [f64; 2],
    y_lim: [f64; 2],
}

impl Spline2d {
    /// Build a bilinear interpolant over the given table.
    pub fn bilinear(xs: Vec<f64>, ys: Vec<f64>, zs: Vec<f64>) -> Result<Self> {
        check_table("2D table x axis", &xs, 2)?;
        check_table("2D table y axis", &ys, 2)?;

        if zs.len() != xs.len() * ys.len() {
            return Err(Error::Table(format!(
                "2D table needs {} x {} = {} values; got {}",
                xs.len(),
                ys.len(),
                xs.len() * ys.len(),
                zs.len()
            )));
        }

        let x_lim = [xs[0], xs[xs.len() - 1]];
        let y_lim = [ys[0], ys[ys.len() - 1]];
        Ok(Spline2d {
            xs: xs,
            ys: ys,
            zs: zs,
            xaccel: Accel::new(),
            yaccel: Accel::new(),
            x_lim: x_lim,
            y_lim: y_lim,
        })
    }

    /// The valid domain along x, as `[min, max]`.
    pub fn x_lim(&self) -> [f64; 2] {
        self.x_lim
    }

    /// The valid domain along y, as `[min, max]`.
    pub fn y_lim(&self) -> [f64; 2] {
        self.y_lim
    }

    /// Evaluate at `(x, y)`, failing with `OutOfDomain` outside the recorded
    /// bounds on either axis.
    pub fn eval(&self, x: f64, y: f64) -> Result<f64> {
        check_domain(x, self.x_lim)?;
        check_domain(y, self.y_lim)?;
        Ok(self.eval_inner(x, y))
    }

    /// Evaluate at `(x, y)`, treating out-of-domain queries as zero.
    pub fn eval_or_zero(&self, x: f64, y: f64) -> f64 {
        if x < self.x_lim[0] || x > self.x_lim[1] || !x.is_finite() {
            return 0.;
        }
        if y < self.y_lim[0] || y > self.y_lim[1] || !y.is_finite() {
            return 0.;
        }
        self.eval_inner(x, y)
    }

    fn eval_inner(&self, x: f64, y: f64) -> f64 {
        let nx = self.xs.len();
        let i = self.xaccel.find(&self.xs, x);
        let j = self.yaccel.find(&self.ys, y);

        let tx = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        let ty = (y - self.ys[j]) / (self.ys[j + 1] - self.ys[j]);

        let z00 = self.zs[j * nx + i];
        let z10 = self.zs[j * nx + i + 1];
        let z01 = self.zs[(j + 1) * nx + i];
        let z11 = self.zs[(j + 1) * nx + i + 1];

        z00 * (1. - tx) * (1. - ty) + z10 * tx * (1. - ty) + z01 * (1. - tx) * ty + z11 * tx * ty
    }
}
