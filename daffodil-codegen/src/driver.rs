use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::backend::cpp::Cpp;
use crate::backend::java::Java;
use crate::backend::BackendKind;
use crate::generate::{Generator, OutputFile};
use crate::ir::Node;
use crate::pass::ir_to_pretty;
use crate::writer::{IndentWriterFactory, DEFAULT_INDENT};
use crate::BUG_REPORT_URL;

pub type FileId = usize;

#[derive(Debug, Copy, Clone)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

pub struct Driver {
    files: SimpleFiles<String, String>,

    seen_errors: RefCell<bool>,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,

    emit_width: usize,
    emit_writer: RefCell<Box<dyn WriteColor>>,

    indent: usize,
    out_dir: Option<PathBuf>,
}

fn color_choice(stream: atty::Stream) -> ColorChoice {
    match atty::is(stream) {
        true => ColorChoice::Auto,
        false => ColorChoice::Never,
    }
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: SimpleFiles::new(),

            seen_errors: RefCell::new(false),
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                color_choice(atty::Stream::Stderr),
            ))),

            emit_width: usize::MAX,
            emit_writer: RefCell::new(Box::new(BufferedStandardStream::stdout(color_choice(
                atty::Stream::Stdout,
            )))),

            indent: DEFAULT_INDENT,
            out_dir: None,
        }
    }

    /// Setup a global panic hook
    pub fn install_panic_hook(&self) {
        // Use the currently set codespan configuration
        let term_config = self.codespan_config.clone();
        // Fetch the default hook (which prints the panic message and an optional backtrace)
        let default_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let location = info.location();
            let message = if let Some(message) = info.payload().downcast_ref::<String>() {
                message.as_str()
            } else if let Some(message) = info.payload().downcast_ref::<&str>() {
                message
            } else {
                "unknown panic type"
            };

            let diagnostic = Diagnostic::bug()
                .with_message(format!("code generator panicked at '{message}'"))
                .with_notes(vec![
                    match location {
                        Some(location) => format!("panicked at: {location}"),
                        None => "panicked at: unknown location".to_owned(),
                    },
                    format!("please file a bug report at: {BUG_REPORT_URL}"),
                ]);

            let mut writer = BufferedStandardStream::stderr(color_choice(atty::Stream::Stderr));
            let dummy_files = SimpleFiles::<String, String>::new();

            default_hook(info);
            eprintln!();
            codespan_reporting::term::emit(&mut writer, &term_config, &dummy_files, &diagnostic)
                .unwrap();
        }));
    }

    /// Set the width to use when pretty printing trees
    pub fn set_emit_width(&mut self, emit_width: usize) {
        self.emit_width = emit_width;
    }

    /// Set the number of spaces used per level of indentation in generated code
    pub fn set_indent(&mut self, indent: usize) {
        self.indent = indent;
    }

    /// Write generated files to a directory, instead of to the emit writer
    pub fn set_out_dir(&mut self, out_dir: Option<PathBuf>) {
        self.out_dir = out_dir;
    }

    /// Load a source string into the file database.
    pub fn load_source_string(&mut self, name: String, source: String) -> FileId {
        self.files.add(name, source)
    }

    /// Load a source file into the file database using a reader.
    pub fn load_source(&mut self, name: String, mut reader: impl Read) -> Option<FileId> {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(_) => Some(self.load_source_string(name, source)),
            Err(error) => {
                self.emit_read_diagnostic(name, error);
                None
            }
        }
    }

    /// Load a source file into the file database from the given path.
    pub fn load_source_path(&mut self, path: &Path) -> Option<FileId> {
        match std::fs::File::open(path) {
            Ok(file) => self.load_source(path.display().to_string(), file),
            Err(error) => {
                self.emit_read_diagnostic(path.display(), error);
                None
            }
        }
    }

    pub fn generate_and_emit(&self, file_id: FileId, backend: BackendKind) -> Status {
        let root = match self.parse_ir(file_id) {
            Some(root) => root,
            None => return Status::Error,
        };

        let factory = IndentWriterFactory::new(self.indent);
        let result = match backend {
            BackendKind::Cpp => Generator::new(&Cpp, factory).generate(&root),
            BackendKind::Java => Generator::new(&Java, factory).generate(&root),
        };

        match result {
            Ok(output_files) => match &self.out_dir {
                Some(out_dir) => self.write_output_files(out_dir, &output_files),
                None => self.emit_output_files(&output_files),
            },
            Err(error) => {
                self.emit_diagnostic(error.to_diagnostic());
                Status::Error
            }
        }
    }

    pub fn dump_and_emit(&self, file_id: FileId) -> Status {
        let root = match self.parse_ir(file_id) {
            Some(root) => root,
            None => return Status::Error,
        };

        let context = ir_to_pretty::Context::new();
        let doc = context.node(&root);

        let mut emit_writer = self.emit_writer.borrow_mut();
        match writeln!(emit_writer, "{}", doc.pretty(self.emit_width)).and(emit_writer.flush()) {
            Ok(()) => self.status(),
            Err(error) => {
                self.emit_write_diagnostic("<stdout>", error);
                Status::Error
            }
        }
    }

    fn parse_ir(&self, file_id: FileId) -> Option<Node> {
        let source = self.files.get(file_id).ok()?.source();

        match serde_json::from_str(source) {
            Ok(node) => Some(node),
            Err(error) => {
                self.emit_diagnostic(self.json_error_to_diagnostic(file_id, &error));
                None
            }
        }
    }

    fn json_error_to_diagnostic(
        &self,
        file_id: FileId,
        error: &serde_json::Error,
    ) -> Diagnostic<FileId> {
        use serde_json::error::Category;

        let label_message = match error.classify() {
            Category::Io => "could not read the document",
            Category::Syntax => "invalid JSON",
            Category::Data => "unexpected IR structure",
            Category::Eof => "unexpected end of document",
        };

        // Lines and columns are one-based, and the column is zero at the start
        // of a line.
        let offset = (self.files.line_range(file_id, error.line().saturating_sub(1)).ok())
            .map(|range| std::cmp::min(range.start + error.column().saturating_sub(1), range.end));

        Diagnostic::error()
            .with_message("failed to load IR document")
            .with_labels(
                (offset.into_iter())
                    .map(|offset| Label::primary(file_id, offset..offset).with_message(label_message))
                    .collect(),
            )
            .with_notes(vec![error.to_string()])
    }

    fn emit_output_files(&self, output_files: &[OutputFile]) -> Status {
        let mut emit_writer = self.emit_writer.borrow_mut();

        let result = output_files.iter().enumerate().try_for_each(|(index, output_file)| {
            if index > 0 {
                writeln!(emit_writer)?;
            }
            writeln!(emit_writer, "==> {} <==", output_file.name)?;
            write!(emit_writer, "{}", output_file.content)
        });

        match result.and(emit_writer.flush()) {
            Ok(()) => self.status(),
            Err(error) => {
                self.emit_write_diagnostic("<stdout>", error);
                Status::Error
            }
        }
    }

    fn write_output_files(&self, out_dir: &Path, output_files: &[OutputFile]) -> Status {
        if let Err(error) = std::fs::create_dir_all(out_dir) {
            self.emit_write_diagnostic(out_dir.display(), error);
            return Status::Error;
        }

        for output_file in output_files {
            let path = out_dir.join(&output_file.name);
            if let Err(error) = std::fs::write(&path, &output_file.content) {
                self.emit_write_diagnostic(path.display(), error);
                return Status::Error;
            }
        }

        self.status()
    }

    /// The status of the run so far, based on the diagnostics emitted.
    fn status(&self) -> Status {
        match *self.seen_errors.borrow() {
            true => Status::Error,
            false => Status::Ok,
        }
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic).unwrap();
        writer.flush().unwrap();

        if diagnostic.severity >= Severity::Error {
            *self.seen_errors.borrow_mut() = true;
        }
    }

    fn emit_read_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't read `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }

    fn emit_write_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't write `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}
