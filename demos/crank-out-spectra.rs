// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/// Crank out solved spectra for randomly sampled medium parameters,
/// appending spot densities to a text file. Useful for mapping out how the
/// steady-state spectrum responds across the plausible parameter space.

extern crate clap;
extern crate leptran;
extern crate leptran_test_support;

use leptran::{Injection, InjectionLaw, Spline1d, Spline2d, SteadyStateProblem, Structure, Zone,
              MASS_ELECTRON_GEV};
use leptran_test_support::Sampler;
use std::fs::OpenOptions;
use std::io::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

const E_MIN: f64 = 1e-3;
const E_MAX: f64 = 1e3;
const N_E: usize = 256;

fn dead_kernel() -> Spline2d {
    Spline2d::bilinear(vec![1e-9, 1e-3], vec![1e-4, 1., 2e3], vec![0.; 6]).unwrap()
}

fn main() {
    let matches = clap::Command::new("crank-out-spectra")
        .version("0.1.0")
        .about("Solve steady-state spectra for random medium parameters")
        .arg(clap::Arg::new("OUTFILE")
             .help("The path of the output file to create")
             .required(true)
             .index(1))
        .arg(clap::Arg::new("NH_MIN")
             .help("The minimum hydrogen density to sample, in cm^-3")
             .required(true)
             .index(2))
        .arg(clap::Arg::new("NH_MAX")
             .help("The maximum hydrogen density to sample, in cm^-3")
             .required(true)
             .index(3))
        .arg(clap::Arg::new("B_MIN")
             .help("The minimum magnetic field to sample, in Gauss")
             .required(true)
             .index(4))
        .arg(clap::Arg::new("B_MAX")
             .help("The maximum magnetic field to sample, in Gauss")
             .required(true)
             .index(5))
        .arg(clap::Arg::new("D_MIN")
             .help("The minimum diffusion coefficient to sample, in cm^2/s")
             .required(true)
             .index(6))
        .arg(clap::Arg::new("D_MAX")
             .help("The maximum diffusion coefficient to sample, in cm^2/s")
             .required(true)
             .index(7))
        .get_matches();

    let outfile = PathBuf::from(matches.get_one::<String>("OUTFILE").unwrap());

    let parse = |name: &str| {
        matches
            .get_one::<String>(name)
            .unwrap()
            .parse::<f64>()
            .unwrap()
    };

    let nh_sampler = Sampler::new(true, parse("NH_MIN"), parse("NH_MAX"));
    let b_sampler = Sampler::new(true, parse("B_MIN"), parse("B_MAX"));
    let d_sampler = Sampler::new(true, parse("D_MIN"), parse("D_MAX"));

    let log = leptran_test_support::default_log();

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(true)
        .open(outfile)
        .unwrap();

    writeln!(file, "# n_h(log) B(log) D(log) !time_ms N(1e-2) N(1) N(1e2)").expect("write error");

    loop {
        let n_h = nh_sampler.get();
        let b = b_sampler.get();
        let d = d_sampler.get();

        let zone = Zone::new(
            Structure::Disk,
            n_h,
            b,
            100.,
            Spline1d::linear(vec![1e-4, 1e4], vec![d, d]).unwrap(),
            Injection::Law(InjectionLaw::new(2.2, MASS_ELECTRON_GEV, 1e5).unwrap()),
        )
        .ic_kernel(dead_kernel())
        .bs_kernel(dead_kernel());

        let t0 = Instant::now();
        let solved = SteadyStateProblem::new(E_MIN, E_MAX, N_E)
            .unwrap()
            .zone(zone)
            .unwrap()
            .solve(&log)
            .unwrap();
        let elapsed = t0.elapsed();
        let ms = elapsed.as_secs() as f64 * 1000. + elapsed.subsec_nanos() as f64 * 1e-6;

        let spec = solved.zone(0).unwrap();
        writeln!(
            file,
            "{:.16e}\t{:.16e}\t{:.16e}\t{:.16e}\t{:.16e}\t{:.16e}\t{:.16e}",
            n_h,
            b,
            d,
            ms,
            spec.eval(1e-2).unwrap(),
            spec.eval(1.).unwrap(),
            spec.eval(1e2).unwrap()
        )
        .expect("write error");
    }
}
