
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

pub mod assembler;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs;
use std::path::Path;

use assembler::container::Container;
use assembler::resolver::Resolution;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tPreprocess Only: {}\n\tExecutable: {}\n\tOutfile: {}\n\tInfile: {}",
        verbosity(args.occurrences_of("verbose")),
        args.is_present("preprocess"),
        args.is_present("executable"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap_or("None")
    );

    // INPUT is a required argument, clap exits before we get here without it.
    let ifile = args.value_of("INPUT").unwrap_or_default();
    let ipath = Path::new(ifile);

    let source = match fs::read_to_string(&ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(source) => source,
    };

    let tokens = assembler::lexer::tokenize(&source, &ipath.display().to_string());

    if args.is_present("preprocess") {
        match assembler::resolver::resolve(tokens) {
            Ok(resolution) => print_resolution(&resolution),
            Err(err) => {
                error!("fatal {} error: {}", err.kind(), err);
                std::process::exit(1);
            },
        }
        return;
    }

    let container = match assembler::assemble(tokens) {
        Err(err) => {
            error!("fatal {} error: {}", err.kind(), err);
            error!("Stopped assembly of `{}`.", ipath.display());
            std::process::exit(1);
        },
        Ok(container) => container,
    };

    if args.is_present("print-debug") {
        print_listing(&container);
    }

    let opath = match args.value_of("output") {
        Some(filename) => Path::new(filename),
        None => match ipath.file_stem() {
            Some(stem) => Path::new(stem),
            None => {
                error!("fatal: cannot derive an output name from `{}`, use -o", ipath.display());
                std::process::exit(1);
            },
        },
    };

    let executable = args.is_present("executable");
    if let Err(err) = container.write_file(&opath, executable) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }

    info!("Assembled `{}` into `{}` ({} bytes).",
        ipath.display(), opath.display(), container.byte_len(executable));
}

/// Prints every instruction slot alongside its encoding.
fn print_listing(container: &Container) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for (idx, record) in container.program.iter().enumerate() {
        let marker = if idx as u64 == container.entry_point { ">" } else { " " };
        grid.add(Cell::from(format!("{}0x{:04X}:", marker, idx)));
        grid.add(Cell::from(format!("{}", record)));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(hex(&record.assemble())));
    }

    println!("{}", grid.fit_into_columns(4));
    println!("memory: {} byte(s)", container.memory_size);
    if !container.memory.is_empty() {
        println!("{}", hex(&container.memory));
    }
}

/// Prints the label table and the filtered token stream.
fn print_resolution(resolution: &Resolution) {
    let mut labels: Vec<_> = resolution.labels.iter().collect();
    labels.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));

    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });
    for (name, slot) in labels {
        grid.add(Cell::from(format!("{}:", name)));
        grid.add(Cell::from(format!("0x{:04X}", slot)));
    }
    println!("{}", grid.fit_into_columns(2));

    println!("program size: {}, entry point: 0x{:04X}",
        resolution.program_size, resolution.entry_point);

    for tok in resolution.tokens.iter() {
        println!("{}\t{}", tok.at, tok);
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn verbosity(occurrences: u64) -> log::LevelFilter {
    match occurrences {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
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
            .help("write output to an outfile"))
        .arg(Arg::with_name("preprocess")
            .short("e")
            .takes_value(false)
            .help("preprocess only: print the labels and filtered tokens, write nothing"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints the debug information alongside the assembly to STDOUT"))
        .arg(Arg::with_name("executable")
            .short("x")
            .takes_value(false)
            .help("make the output executable through the avm interpreter"))
        .get_matches()
}

fn initialize_logging(verbosity_level: u64) {
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
        .level(verbosity(verbosity_level))
        .chain(std::io::stdout())
        .apply().ok();
}
