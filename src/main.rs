
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate regex;
extern crate term_grid;

pub mod parser;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::File;
use std::io::Write;
use std::path::Path;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tDebug Table: {}\n\tOutfile: {}\n\tInfile: {}",
        match args.occurrences_of("verbose") {
            0 => log::LevelFilter::Error.to_string(),
            1 => log::LevelFilter::Warn.to_string(),
            2 => log::LevelFilter::Info.to_string(),
            3 | _ => log::LevelFilter::Debug.to_string(),
        },
        args.is_present("print-debug"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap()
    );

    let ifile = args.value_of("INPUT").unwrap();
    // Read the specified input file.
    let ipath = Path::new(ifile);

    // Open the path in read-only mode, returns `io::Result<File>`
    let ifile = match File::open(&ipath) {
        Err(err) => {
            error!("fatal: unable to open input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    let config = match parser::parse(ifile, parser::config::default_handlers()) {
        Err(err) => {
            error!("fatal: unable to parse `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(config) => config,
    };

    if args.is_present("print-debug") {
        let mut grid = Grid::new(GridOptions {
            filling:     Filling::Spaces(1),
            direction:   Direction::LeftToRight,
        });

        for (name, interface) in config.interfaces.iter() {
            grid.add(Cell::from(format!("{}:", name)));
            grid.add(Cell::from(
                interface.nameif.clone().unwrap_or_else(|| "-".to_owned()),
            ));
            grid.add(Cell::from(match interface.security_level {
                Some(level) => format!("security-level {}", level),
                None => "security-level -".to_owned(),
            }));
            grid.add(Cell::from(match &interface.address {
                Some(ip) => format!("{} {}", ip.address, ip.netmask),
                None => "-".to_owned(),
            }));
        }

        println!("{}", grid.fit_into_columns(4));
    }

    match args.value_of("output") {
        Some(filename) => {
            let opath = Path::new(filename);
            let mut ofile = match File::create(&opath) {
                Err(err) => {
                    error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
                    std::process::exit(1);
                },
                Ok(file) => file,
            };

            if let Err(err) = ofile.write_all(config.to_string().as_bytes()) {
                error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
                std::process::exit(1);
            }
        },
        None => print!("{}", config),
    }
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap())
        .version(option_env!("CARGO_PKG_VERSION").unwrap())
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap())
        .arg(Arg::with_name("INPUT")
            .help("Sets the configuration file to parse")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write the parsed summary to an outfile"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints an aligned table of parsed interfaces to STDOUT"))
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 | _ => log::LevelFilter::Debug,
        })
        .chain(std::io::stdout())
        .apply().ok();
}
