use clap::Parser;
use std::path::PathBuf;

use daffodil_codegen::backend::BackendKind;
use daffodil_codegen::driver::FileId;
use daffodil_codegen::writer::DEFAULT_INDENT;

/// Generate source code from the intermediate representation of a program
#[derive(Parser)]
#[clap(author, version, about)]
enum Cli {
    /// Generate source files from an IR document, printing them to stdout
    #[clap(after_help = COMPILE_COMMAND_AFTER_HELP)]
    Compile {
        /// Language to generate source files for
        #[clap(long = "backend", value_enum, default_value = "cpp", display_order = 0)]
        backend: BackendKind,
        /// Write the generated files to this directory, instead of to stdout
        #[clap(long = "out-dir", name = "OUT_DIR", display_order = 1)]
        out_dir: Option<PathBuf>,
        /// Number of spaces per level of indentation
        #[clap(long = "indent", default_value_t = DEFAULT_INDENT, display_order = 2)]
        indent: usize,
        /// Path to the IR document, or `-` to read from stdin
        #[clap(name = "IR_FILE")]
        ir_file: PathOrStdin,
    },
    /// Pretty print an IR document
    Dump {
        /// Maximum line width, defaulting to the width of the terminal
        #[clap(long = "width")]
        width: Option<usize>,
        /// Path to the IR document, or `-` to read from stdin
        #[clap(name = "IR_FILE")]
        ir_file: PathOrStdin,
    },
}

const COMPILE_COMMAND_AFTER_HELP: &str = "\
Examples:

  $ daffodil-codegen compile record.json
  $ daffodil-codegen compile --backend java --out-dir generated record.json
";

#[derive(Clone, Debug)]
enum PathOrStdin {
    StdIn,
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(src: &str) -> Result<PathOrStdin, std::convert::Infallible> {
        match src {
            "-" => Ok(PathOrStdin::StdIn),
            _ => Ok(PathOrStdin::Path(PathBuf::from(src))),
        }
    }
}

fn unwrap_or_exit<T>(option: Option<T>) -> T {
    option.unwrap_or_else(|| std::process::exit(daffodil_codegen::Status::Error.exit_code()))
}

fn load_file_or_exit(driver: &mut daffodil_codegen::Driver, file: PathOrStdin) -> FileId {
    unwrap_or_exit(match file {
        PathOrStdin::StdIn => driver.load_source("<stdin>".to_owned(), std::io::stdin()),
        PathOrStdin::Path(path) => driver.load_source_path(&path),
    })
}

const MAX_PRETTY_WIDTH: usize = 80;

fn get_pretty_width() -> usize {
    let term_width = termsize::get().map_or(usize::MAX, |size| usize::from(size.cols));
    std::cmp::min(term_width, MAX_PRETTY_WIDTH)
}

fn main() -> ! {
    match Cli::parse() {
        Cli::Compile {
            backend,
            out_dir,
            indent,
            ir_file,
        } => {
            let mut driver = daffodil_codegen::Driver::new();
            driver.install_panic_hook();
            driver.set_indent(indent);
            driver.set_out_dir(out_dir);

            let file_id = load_file_or_exit(&mut driver, ir_file);
            let status = driver.generate_and_emit(file_id, backend);

            std::process::exit(status.exit_code());
        }
        Cli::Dump { width, ir_file } => {
            let mut driver = daffodil_codegen::Driver::new();
            driver.install_panic_hook();
            driver.set_emit_width(width.unwrap_or_else(get_pretty_width));

            let file_id = load_file_or_exit(&mut driver, ir_file);
            let status = driver.dump_and_emit(file_id);

            std::process::exit(status.exit_code());
        }
    }
}
