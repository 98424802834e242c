extern crate clap;
extern crate mandelview;
extern crate num_cpus;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

use clap::{App, Arg, ArgMatches};
use mandelview::palette::DEFAULT_PALETTE;
use mandelview::{
    Bitmap, BuiltinPalettes, Coloring, Complex, Config, Error, GridSize, PaletteProvider,
    Parameters, Variant, ViewCache, ViewWindow,
};
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex::new(re, im)),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_size(s: &str) -> Result<(), String> {
    match parse_pair::<u32>(s, 'x') {
        Some((w, h)) if w > 0 && h > 0 => Ok(()),
        Some(_) => Err("Image dimensions must be positive".to_string()),
        None => Err("Could not parse output image size".to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const SIDE: &str = "side";
const JULIA: &str = "julia";
const ITERATIONS: &str = "iterations";
const PALETTE: &str = "palette";
const HISTOGRAM: &str = "histogram";
const THREADS: &str = "threads";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandelview")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Mandelbrot and Julia set renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (PNG)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| validate_size(&s))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.5,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse the center"))
                .help("Center of the view on the complex plane"),
        )
        .arg(
            Arg::with_name(SIDE)
                .required(false)
                .long(SIDE)
                .short("w")
                .takes_value(true)
                .default_value("3,3")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse the side lengths"))
                .help("Width and height of the view on the complex plane"),
        )
        .arg(
            Arg::with_name(JULIA)
                .required(false)
                .long(JULIA)
                .short("j")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse the Julia constant"))
                .help("Render the Julia set for this constant instead of the Mandelbrot set"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(move |s| {
                    validate_range(
                        &s,
                        0,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 0 and 1000000",
                    )
                })
                .help("Maximum number of iterations per point"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .required(false)
                .long(PALETTE)
                .short("p")
                .takes_value(true)
                .default_value(DEFAULT_PALETTE)
                .validator(|s| {
                    if BuiltinPalettes.contains(&s) {
                        Ok(())
                    } else {
                        Err(format!(
                            "Unknown palette; choose one of {}",
                            BuiltinPalettes.names().join(", ")
                        ))
                    }
                })
                .help("Palette to color with"),
        )
        .arg(
            Arg::with_name(HISTOGRAM)
                .required(false)
                .long(HISTOGRAM)
                .help("Equalize colors over the iteration histogram"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the kernel (default: all)"),
        )
        .get_matches()
}

fn complex_arg(matches: &ArgMatches, name: &str) -> Result<Complex, Error> {
    matches
        .value_of(name)
        .and_then(parse_complex)
        .ok_or_else(|| Error::InvalidArgument(format!("could not parse --{}", name)))
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| Error::InvalidArgument("no output file".to_string()))?;
    let (width, height) = matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<u32>(s, 'x'))
        .ok_or_else(|| Error::InvalidArgument("could not parse --size".to_string()))?;
    let view = ViewWindow::new(complex_arg(matches, CENTER)?, complex_arg(matches, SIDE)?);
    let variant = if matches.is_present(JULIA) {
        Variant::Julia {
            c: complex_arg(matches, JULIA)?,
        }
    } else {
        Variant::Mandelbrot
    };
    let iterations = matches
        .value_of(ITERATIONS)
        .and_then(|s| u32::from_str(s).ok())
        .ok_or_else(|| Error::InvalidArgument("could not parse --iterations".to_string()))?;
    let threads = match matches.value_of(THREADS) {
        Some(s) => usize::from_str(s)
            .map_err(|_| Error::InvalidArgument("could not parse --threads".to_string()))?,
        None => num_cpus::get(),
    };

    let config = Config {
        palette: matches.value_of(PALETTE).unwrap_or(DEFAULT_PALETTE).to_string(),
        coloring: if matches.is_present(HISTOGRAM) {
            Coloring::Histogram
        } else {
            Coloring::Direct
        },
        threads,
        view,
        max_iterations: iterations,
        grid_size: GridSize::new(width as usize, height as usize),
        ..Config::default()
    };

    let mut cache = ViewCache::new(&config);
    let params = Parameters::new(config.max_iterations, config.grid_size);
    let status = cache.update(view, variant, params, true)?;
    info!("{:?} {}x{} at {:?}", status, width, height, view);

    let mut target = Bitmap::new(width, height);
    cache.render(&mut target, &view);
    target.save(output)?;
    info!("wrote {}", output);
    Ok(())
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
