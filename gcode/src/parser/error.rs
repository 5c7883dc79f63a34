use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

use crate::parser::block::BlockError;

/// A malformed line, located within the whole source file.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    /// Byte span in the file (not the line).
    pub span: Range<usize>,
    pub file_id: usize,
    /// 1-based source line.
    pub line: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize, line: usize) -> Self {
        ParseError {
            message: message.into(),
            span,
            file_id,
            line,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    /// Lift a line-level error; `line_start` is the byte offset of the line in the file.
    pub fn from_block_error(
        error: &BlockError,
        line_start: usize,
        file_id: usize,
        line: usize,
    ) -> Self {
        let span = error.span();
        let err = ParseError::error(
            error.to_string(),
            line_start + span.start..line_start + span.end,
            file_id,
            line,
        );
        match error {
            BlockError::MissingValue { .. } | BlockError::InvalidNumber { .. } => {
                err.with_note("every word letter must be followed by a number")
            }
            _ => err,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
