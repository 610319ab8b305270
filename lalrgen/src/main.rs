// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>
use clap::crate_authors;
use structopt::StructOpt;

use std::{
    fs,
    io::prelude::*,
    path::{Path, PathBuf},
};

use lalrgen::{emit, pipeline};

fn with_changed_extension(path: &Path, new_extension: &str) -> PathBuf {
    let mut new_path = PathBuf::new();
    if let Some(dir) = path.parent() {
        new_path.push(dir);
    };
    new_path.push(path.file_stem().unwrap());
    new_path.set_extension(new_extension);
    new_path
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "lalrgen",
    about = "LALR(1) parser generator",
    author = crate_authors!(),
)]
struct CLOptions {
    /// Overwrite the output files (if they exist)
    #[structopt(short, long)]
    force: bool,
    /// Total number of shift/reduce conflicts that are expected.
    #[structopt(short, long)]
    expect: Option<usize>,
    /// Total number of reduce/reduce conflicts that are expected.
    #[structopt(long = "expect-rr")]
    expect_rr: Option<usize>,
    /// Treat warnings (unreachable symbols, unused rules) as errors.
    #[structopt(long)]
    strict: bool,
    /// Create a backtracking parser: shift/reduce conflicts with undeclared
    /// precedence keep their suppressed reduces as runtime retry
    /// alternatives instead of just logging them.
    #[structopt(short = "B", long)]
    backtrack: bool,
    /// Write a verbose description of the automaton (states, items,
    /// transitions, conflicts) to the `.output` companion file.
    #[structopt(short = "v", long)]
    verbose: bool,
    /// Write a Graphviz description of the automaton to the `.dot` companion
    /// file.
    #[structopt(short = "g", long)]
    graph: bool,
    /// Write a token-value header to the `.h` companion file, for a lexer
    /// maintained outside this crate.
    #[structopt(short = "d", long)]
    header: bool,
    /// Write `extern` declarations for the token values to the `.externs.rs`
    /// companion file.
    #[structopt(short = "i", long)]
    externs: bool,
    /// Type substituted for semantic action attributes (`$$`, `$1`, ...).
    #[structopt(long = "attribute-type", default_value = "AttributeData")]
    attribute_type: String,
    /// Type the generated `impl lalr1_plus::Parser` block targets.
    #[structopt(long = "target-type", default_value = "Parser")]
    target_type: String,
    /// The path of the file containing the grammar specification.
    #[structopt(parse(from_os_str))]
    specification: PathBuf,
}

fn fail(message: impl std::fmt::Display, code: i32) -> ! {
    writeln!(std::io::stderr(), "{}", message).unwrap();
    std::process::exit(code);
}

fn open_output(path: &Path, force: bool) -> fs::File {
    if path.exists() && !force {
        fail(format!("{}: output file already exists", path.to_string_lossy()), 1);
    }
    match fs::File::create(path) {
        Ok(file) => file,
        Err(error) => fail(format!("{}: {}", path.to_string_lossy(), error), 2),
    }
}

fn main() {
    let cl_options = CLOptions::from_args();

    let mut file = match fs::File::open(&cl_options.specification) {
        Ok(file) => file,
        Err(error) => fail(format!("Error opening specification file: {}", error), 2),
    };
    let mut specification_text = String::new();
    if let Err(error) = file.read_to_string(&mut specification_text) {
        fail(format!("Error reading specification file: {}", error), 2);
    };

    let label = cl_options.specification.to_string_lossy().to_string();
    let (generated, warnings) = match pipeline::build(&specification_text, &label, cl_options.backtrack) {
        Ok(result) => result,
        Err(error) => fail(format!("{}", error), 4),
    };

    for warning in &warnings {
        writeln!(std::io::stderr(), "warning: {}", warning).unwrap();
    }
    if cl_options.strict && !warnings.is_empty() {
        fail(format!("{} warning(s) treated as errors under --strict", warnings.len()), 5);
    }

    if let Some(expected) = cl_options.expect {
        if expected != generated.action_table.shift_reduce_conflicts {
            fail(
                format!(
                    "expected {} shift/reduce conflicts, found {}",
                    expected, generated.action_table.shift_reduce_conflicts
                ),
                5,
            );
        }
    }
    if let Some(expected_rr) = cl_options.expect_rr {
        if expected_rr != generated.action_table.reduce_reduce_conflicts {
            fail(
                format!(
                    "expected {} reduce/reduce conflicts, found {}",
                    expected_rr, generated.action_table.reduce_reduce_conflicts
                ),
                5,
            );
        }
    }

    let output_path = with_changed_extension(&cl_options.specification, "rs");
    let mut output = open_output(&output_path, cl_options.force);
    if let Err(error) = emit::write_parser_code(
        &generated,
        &cl_options.attribute_type,
        &cl_options.target_type,
        &mut output,
    ) {
        fail(format!("Error writing {}: {}", output_path.to_string_lossy(), error), 3);
    }

    if cl_options.verbose {
        let path = with_changed_extension(&cl_options.specification, "output");
        let mut file = open_output(&path, cl_options.force);
        if let Err(error) = emit::write_description(&generated, &mut file) {
            fail(format!("Error writing {}: {}", path.to_string_lossy(), error), 3);
        }
    }
    if cl_options.graph {
        let path = with_changed_extension(&cl_options.specification, "dot");
        let mut file = open_output(&path, cl_options.force);
        if let Err(error) = emit::write_graph(&generated, &mut file) {
            fail(format!("Error writing {}: {}", path.to_string_lossy(), error), 3);
        }
    }
    if cl_options.header {
        let path = with_changed_extension(&cl_options.specification, "h");
        let mut file = open_output(&path, cl_options.force);
        if let Err(error) = emit::write_header(&generated, &mut file) {
            fail(format!("Error writing {}: {}", path.to_string_lossy(), error), 3);
        }
    }
    if cl_options.externs {
        let stem = cl_options.specification.file_stem().unwrap().to_string_lossy().to_string();
        let mut path = PathBuf::new();
        if let Some(dir) = cl_options.specification.parent() {
            path.push(dir);
        }
        path.push(format!("{}_externs.rs", stem));
        let mut file = open_output(&path, cl_options.force);
        if let Err(error) = emit::write_externs(&generated, &mut file) {
            fail(format!("Error writing {}: {}", path.to_string_lossy(), error), 3);
        }
    }
}
