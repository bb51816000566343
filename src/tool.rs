// Copyright (c) 2018 Fabian Schuiki
#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;
extern crate memmap;
extern crate stderrlog;
extern crate tinypg;

use std::fs::File;
use std::path::Path;
use std::process;

use clap::{App, Arg};
use memmap::Mmap;
use tinypg::backend::{write_artifacts, GenerateMode};
use tinypg::config::Options;

/// Exit code for a grammar file that cannot be found.
const EXIT_NOT_FOUND: i32 = 1;
/// Exit code for a grammar with errors, or a failure to write the output.
const EXIT_FAILED: i32 = 10;

fn main() {
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about("Compiles LL(1) grammar descriptions into recursive-descent parsers")
        .arg(Arg::with_name("GRAMMAR").help("The grammar file to compile"))
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help("Increase message verbosity"),
        )
        .arg(Arg::with_name("quiet").short("q").help("Silence all output"))
        .arg(
            Arg::with_name("templates")
                .long("templates")
                .value_name("DIR")
                .help("Directory containing the templates directory"),
        )
        .arg(
            Arg::with_name("debug")
                .long("debug")
                .help("Generate code for the interactive host instead of a release build"),
        )
        .arg(
            Arg::with_name("input")
                .long("input")
                .value_name("FILE")
                .help("Parse a sample input with the grammar"),
        )
        .arg(
            Arg::with_name("dry-run")
                .long("dry-run")
                .help("Do not write any generated files"),
        )
        .get_matches();

    stderrlog::new()
        .module(module_path!())
        .module("tinypg")
        .quiet(matches.is_present("quiet"))
        .verbosity(matches.occurrences_of("verbosity") as usize + 1)
        .init()
        .ok();

    let grammar_path = match matches.value_of("GRAMMAR") {
        Some(path) => Path::new(path),
        None => {
            println!("The interactive shell is not part of this build.");
            println!("{}", matches.usage());
            return;
        }
    };

    let text = match read_file(grammar_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("cannot read {}: {}", grammar_path.display(), e);
            process::exit(EXIT_NOT_FOUND);
        }
    };

    let mut options = Options::from_env();
    if let Some(dir) = grammar_path.parent() {
        if !dir.as_os_str().is_empty() {
            options = options.with_base_dir(dir);
        }
    }
    if let Some(dir) = matches.value_of("templates") {
        options.app_dir = dir.into();
    }

    let file = grammar_path.to_string_lossy();
    let compilation = tinypg::compile(&text, &file, &options);
    if !compilation.is_ok() {
        eprint!("{}", compilation.diagnostics);
        process::exit(EXIT_FAILED);
    }
    if let Some(ref grammar) = compilation.grammar {
        println!("{}", grammar);
        println!("{}", grammar.first_sets().pretty(grammar));
    }
    if let (Some(g), Some(p)) = (&compilation.grammar, &compilation.program) {
        debug!("routines:\n{}", p.pretty(g));
    }

    let mode = if matches.is_present("debug") {
        GenerateMode::Debug
    } else {
        GenerateMode::Release
    };
    let artifacts = match compilation.generate(mode) {
        Ok(artifacts) => artifacts,
        Err(diag) => {
            eprint!("{}", diag);
            process::exit(EXIT_FAILED);
        }
    };
    if matches.is_present("dry-run") {
        for artifact in &artifacts {
            info!("would write {}", artifact.file_name);
        }
    } else {
        let dir = match compilation.output_dir() {
            Some(dir) => dir,
            None => {
                eprintln!("output directory of {} does not exist", file);
                process::exit(EXIT_FAILED);
            }
        };
        match write_artifacts(&artifacts, &dir) {
            Ok(paths) => {
                for path in paths {
                    info!("wrote {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("cannot write output to {}: {}", dir.display(), e);
                process::exit(EXIT_FAILED);
            }
        }
    }

    if let Some(input_path) = matches.value_of("input") {
        let input = match read_file(Path::new(input_path)) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("cannot read {}: {}", input_path, e);
                process::exit(EXIT_NOT_FOUND);
            }
        };
        if let Some(mut interp) = compilation.interpreter() {
            let tree = interp.parse(&input, input_path);
            print!("{}", tree);
            for err in &tree.errors {
                eprintln!("{}{}: error 0x{:04X}", input_path, err, err.code);
            }
        }
    }
}

/// Read a file through a memory map.
fn read_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    // Mapping an empty file fails on some platforms.
    if file.metadata()?.len() == 0 {
        return Ok(String::new());
    }
    let map = unsafe { Mmap::map(&file)? };
    Ok(String::from_utf8_lossy(&map).into_owned())
}
