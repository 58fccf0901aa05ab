//! Line-oriented text emission.
//!
//! Backends render source code through a [`CodeWriter`], which takes care of
//! indentation. A fresh writer is created by a [`WriterFactory`] for every
//! file that is generated, and is not shared between files.

/// Incremental, indentation-aware construction of source text.
pub trait CodeWriter {
    /// Begin a new line at the current indentation, starting with `prefix`.
    fn start_line(&mut self, prefix: &str);

    /// Append text to the current line.
    fn write(&mut self, text: &str);

    /// Terminate the current line.
    fn end_line(&mut self);

    /// Write a complete line at the current indentation.
    fn write_line(&mut self, text: &str) {
        self.start_line(text);
        self.end_line();
    }

    /// Increase the indentation of subsequent lines.
    fn start_block(&mut self);

    /// Decrease the indentation of subsequent lines.
    fn end_block(&mut self);

    /// The text that has been written so far.
    fn code(&self) -> &str;
}

/// Creates a fresh [`CodeWriter`] for each file to be rendered.
pub trait WriterFactory {
    type Writer: CodeWriter;

    fn create(&self) -> Self::Writer;
}

pub const DEFAULT_INDENT: usize = 4;

/// A [`CodeWriter`] that indents with spaces.
///
/// Indentation is only written once a line has some content, so empty lines
/// never carry trailing whitespace.
#[derive(Debug, Clone)]
pub struct IndentWriter {
    code: String,
    indent: usize,
    level: usize,
    pending_indent: bool,
}

impl IndentWriter {
    pub fn new(indent: usize) -> IndentWriter {
        IndentWriter {
            code: String::new(),
            indent,
            level: 0,
            pending_indent: false,
        }
    }

    pub fn into_code(self) -> String {
        self.code
    }
}

impl Default for IndentWriter {
    fn default() -> IndentWriter {
        IndentWriter::new(DEFAULT_INDENT)
    }
}

impl CodeWriter for IndentWriter {
    fn start_line(&mut self, prefix: &str) {
        self.pending_indent = true;
        self.write(prefix);
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.pending_indent {
            let width = self.indent * self.level;
            self.code.extend(std::iter::repeat(' ').take(width));
            self.pending_indent = false;
        }
        self.code.push_str(text);
    }

    fn end_line(&mut self) {
        self.code.push('\n');
        self.pending_indent = false;
    }

    fn start_block(&mut self) {
        self.level += 1;
    }

    fn end_block(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    fn code(&self) -> &str {
        &self.code
    }
}

/// Creates [`IndentWriter`]s with a fixed indentation width.
#[derive(Debug, Copy, Clone)]
pub struct IndentWriterFactory {
    indent: usize,
}

impl IndentWriterFactory {
    pub fn new(indent: usize) -> IndentWriterFactory {
        IndentWriterFactory { indent }
    }
}

impl Default for IndentWriterFactory {
    fn default() -> IndentWriterFactory {
        IndentWriterFactory::new(DEFAULT_INDENT)
    }
}

impl WriterFactory for IndentWriterFactory {
    type Writer = IndentWriter;

    fn create(&self) -> IndentWriter {
        IndentWriter::new(self.indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_nested_blocks() {
        let mut writer = IndentWriter::new(2);
        writer.write_line("outer {");
        writer.start_block();
        writer.start_line("inner");
        writer.write(" {");
        writer.end_line();
        writer.start_block();
        writer.write_line("body;");
        writer.end_block();
        writer.write_line("}");
        writer.end_block();
        writer.write_line("}");

        assert_eq!(
            writer.into_code(),
            "outer {\n  inner {\n    body;\n  }\n}\n",
        );
    }

    #[test]
    fn blank_lines_have_no_trailing_whitespace() {
        let mut writer = IndentWriter::new(4);
        writer.start_block();
        writer.write_line("a;");
        writer.write_line("");
        writer.write_line("b;");

        assert_eq!(writer.code(), "    a;\n\n    b;\n");
    }

    #[test]
    fn indentation_is_written_lazily() {
        let mut writer = IndentWriter::new(4);
        writer.start_block();
        writer.start_line("");
        writer.write("");
        writer.write("x");
        writer.write(" = 1;");
        writer.end_line();

        assert_eq!(writer.code(), "    x = 1;\n");
    }

    #[test]
    fn unbalanced_end_block_saturates() {
        let mut writer = IndentWriter::default();
        writer.end_block();
        writer.write_line("top");

        assert_eq!(writer.code(), "top\n");
    }

    #[test]
    fn factory_creates_fresh_writers() {
        let factory = IndentWriterFactory::new(3);
        let mut first = factory.create();
        first.start_block();
        first.write_line("first");

        let mut second = factory.create();
        second.write_line("second");

        assert_eq!(first.code(), "   first\n");
        assert_eq!(second.code(), "second\n");
    }
}
