mod block;
pub mod error;
pub mod scanner;

pub use block::{BlockError, parse_block, parse_block_len, parse_line};
pub use error::ParseError;

use log::debug;

use crate::{Line, Program};

/// Whole-file entry point: parses every line of a G-code source.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source, failing if any line is malformed.
    pub fn parse(&self) -> Result<Program, Vec<ParseError>> {
        let (program, errors) = self.parse_lossy();
        if errors.is_empty() {
            Ok(program)
        } else {
            Err(errors)
        }
    }

    /// Parse every line, keeping the good ones and collecting an error for
    /// each malformed one. Malformed lines are left out of the program.
    pub fn parse_lossy(&self) -> (Program, Vec<ParseError>) {
        let mut lines = Vec::new();
        let mut errors = Vec::new();
        let mut offset = 0;

        for (index, raw) in self.source.split_inclusive('\n').enumerate() {
            let start = offset;
            offset += raw.len();
            let number = index + 1;
            let text = raw.trim_end_matches(|c: char| c == '\r' || c == '\n');

            match parse_block(text.as_bytes()) {
                Ok(block) => lines.push(Line {
                    number,
                    span: start..start + text.len(),
                    text: text.to_string(),
                    block,
                }),
                Err(error) => {
                    debug!("line {}: {}", number, error);
                    errors.push(ParseError::from_block_error(
                        &error,
                        start,
                        self.file_id,
                        number,
                    ));
                }
            }
        }

        let program = Program {
            lines,
            source_id: self.file_id,
        };
        (program, errors)
    }
}
