
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate regex;
extern crate term_grid;
extern crate thiserror;

pub mod assembler;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::path::Path;

use assembler::isa::InstructionSet;
use assembler::output::{self, HeaderMode};

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tLayout Only: {}\n\tISA: {}\n\tHeader: {}\n\tOutfile: {}\n\tInfile: {}",
        match args.occurrences_of("verbose") {
            0 => log::LevelFilter::Error.to_string(),
            1 => log::LevelFilter::Warn.to_string(),
            2 => log::LevelFilter::Info.to_string(),
            3 | _ => log::LevelFilter::Debug.to_string(),
        },
        args.is_present("preprocess"),
        args.value_of("isa").unwrap_or("flat"),
        args.value_of("header").unwrap_or("default"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap()
    );

    let isa = match InstructionSet::by_name(args.value_of("isa").unwrap_or("flat")) {
        Some(isa) => isa,
        None => {
            error!("fatal: unknown instruction set `{}`", args.value_of("isa").unwrap_or(""));
            std::process::exit(1);
        },
    };

    let magic = match isa.header {
        HeaderMode::Framed { magic } => magic,
        HeaderMode::Raw => output::DEFAULT_MAGIC,
    };
    let header = match args.value_of("header") {
        None => isa.header,
        Some(name) => match HeaderMode::by_name(name, magic) {
            Some(header) => header,
            None => {
                error!("fatal: unknown header mode `{}`", name);
                std::process::exit(1);
            },
        },
    };

    let ipath = Path::new(args.value_of("INPUT").unwrap());

    let source = match std::fs::read_to_string(&ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(source) => source,
    };

    if args.is_present("preprocess") {
        match assembler::layout_only(&source, &isa) {
            Ok(layout) => {
                println!("{}", output::symbol_table(&layout.symbols));
                println!("end: 0x{:04X}", layout.end);
            },
            Err(err) => {
                error!("fatal: {}: {}", ipath.display(), err);
                std::process::exit(1);
            },
        }
        return;
    }

    let program = match assembler::assemble(&source, &isa) {
        Ok(program) => program,
        Err(err) => {
            error!("fatal: {}: {}", ipath.display(), err);
            std::process::exit(1);
        },
    };

    if args.is_present("print-debug") {
        print_listing(&program, &isa);
    }

    let image = match output::serialize(&program.bytes, header) {
        Ok(image) => image,
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
    };

    println!("Generated machine code:");
    println!("{}", output::hex_dump(&image));

    let opath = Path::new(args.value_of("output").unwrap_or("output.cx"));

    if let Err(err) = output::write_image(opath, &image) {
        error!("fatal: unable to write output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }
    info!("wrote {} byte(s) to `{}`", image.len(), opath.display());
}

fn print_listing(program: &assembler::Program, isa: &InstructionSet) {
    let listing = match program.listing(isa) {
        Ok(listing) => listing,
        Err(err) => {
            error!("unable to build listing: {}", err);
            return;
        },
    };

    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for (addr, located, bytes) in listing {
        grid.add(Cell::from(format!("0x{:04X}:", addr)));
        grid.add(Cell::from(format!("{}", located.statement)));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(bytes.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")));
    }

    println!("{}", grid.fit_into_columns(4));
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap_or("cxasm"))
        .version(option_env!("CARGO_PKG_VERSION").unwrap_or("0.0.0"))
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap_or(""))
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap_or(""))
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
            .default_value("output.cx")
            .help("write output to an outfile"))
        .arg(Arg::with_name("isa")
            .short("i")
            .long("isa")
            .takes_value(true)
            .default_value("flat")
            .help("instruction set to assemble for: flat or packed"))
        .arg(Arg::with_name("header")
            .long("header")
            .takes_value(true)
            .help("overrides the instruction set's output header: raw or framed"))
        .arg(Arg::with_name("preprocess")
            .short("e")
            .takes_value(false)
            .help("lay out only: print the symbol table and write nothing"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints the listing alongside the assembly to STDOUT"))
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
