use std::ops::Range;

use log::trace;
use thiserror::Error;

use crate::block::Block;
use crate::parser::scanner::{next_significant, scan_float, scan_integer};
use crate::word::{Value, Word, takes_integer};

/// Why a non-blank line could not be turned into a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("word `{letter}` has no value")]
    MissingValue { letter: char, offset: usize },
    #[error("word `{letter}` is not followed by a number")]
    InvalidNumber { letter: char, span: Range<usize> },
    #[error("expected a word letter, found byte {byte:#04x}")]
    InvalidLetter { byte: u8, offset: usize },
    #[error("out of memory while collecting words")]
    Allocation,
}

impl BlockError {
    /// Byte range within the line that the error points at.
    pub fn span(&self) -> Range<usize> {
        match self {
            BlockError::MissingValue { offset, .. } | BlockError::InvalidLetter { offset, .. } => {
                *offset..*offset + 1
            }
            BlockError::InvalidNumber { span, .. } => span.clone(),
            BlockError::Allocation => 0..0,
        }
    }
}

/// Parse one line of G-code.
///
/// Returns `Ok(None)` when the line holds nothing but whitespace; that is an
/// absent block, not a malformed one. The whole slice is the line: parsing
/// stops at `buffer.len()` whatever follows in memory.
///
/// ```
/// let block = gcode::parse_block(b"N5 G1 X10").unwrap().unwrap();
/// assert_eq!(block.line_number, 5);
/// assert_eq!(block.words.len(), 2);
/// ```
pub fn parse_block(buffer: &[u8]) -> Result<Option<Block>, BlockError> {
    let start = next_significant(buffer, 0);
    if start == buffer.len() {
        return Ok(None);
    }

    let mut tokenizer = Tokenizer {
        buffer,
        pos: start,
        block: Block::default(),
    };
    tokenizer.delete_marker();
    tokenizer.line_number();
    tokenizer.words()?;

    trace!("parsed block: {}", tokenizer.block);
    Ok(Some(tokenizer.block))
}

/// Like [`parse_block`], for callers holding a buffer and a separate length.
/// Bytes at or after `len` are never read; `len` is clamped to the buffer.
pub fn parse_block_len(buffer: &[u8], len: usize) -> Result<Option<Block>, BlockError> {
    parse_block(&buffer[..len.min(buffer.len())])
}

/// Parse a line, folding "blank" and "malformed" into `None`.
pub fn parse_line(text: &str) -> Option<Block> {
    parse_block(text.as_bytes()).ok().flatten()
}

/// Walks a line through delete marker, line number, then words.
struct Tokenizer<'a> {
    buffer: &'a [u8],
    pos: usize,
    block: Block,
}

impl Tokenizer<'_> {
    fn delete_marker(&mut self) {
        if self.buffer.get(self.pos) == Some(&b'/') {
            self.block.delete = true;
            self.pos = next_significant(self.buffer, self.pos + 1);
        }
    }

    /// `N` needs at least one byte after it to count as a line number; blanks
    /// may separate it from the digits. Without digits the line number stays 0
    /// and scanning resumes after the letter.
    fn line_number(&mut self) {
        let at = self.pos;
        if !matches!(self.buffer.get(at), Some(b'N' | b'n')) || at + 1 >= self.buffer.len() {
            return;
        }
        let digits = next_significant(self.buffer, at + 1);
        let end = match scan_integer(self.buffer, digits) {
            Some((number, end)) => {
                self.block.line_number = number;
                end
            }
            None => at + 1,
        };
        self.pos = next_significant(self.buffer, end);
    }

    fn words(&mut self) -> Result<(), BlockError> {
        while self.pos < self.buffer.len() {
            let offset = self.pos;
            let byte = self.buffer[offset];
            if !byte.is_ascii_alphabetic() {
                return Err(BlockError::InvalidLetter { byte, offset });
            }
            let letter = char::from(byte);

            self.pos = next_significant(self.buffer, offset + 1);
            if self.pos == self.buffer.len() {
                return Err(BlockError::MissingValue { letter, offset });
            }

            let scanned = if takes_integer(letter) {
                scan_integer(self.buffer, self.pos).map(|(n, end)| (Value::Integer(n), end))
            } else {
                scan_float(self.buffer, self.pos).map(|(x, end)| (Value::Float(x), end))
            };
            let Some((value, end)) = scanned else {
                return Err(BlockError::InvalidNumber {
                    letter,
                    span: offset..self.pos + 1,
                });
            };

            self.block
                .words
                .try_reserve(1)
                .map_err(|_| BlockError::Allocation)?;
            self.block.words.push(Word::new(letter, value));
            self.pos = next_significant(self.buffer, end);
        }
        Ok(())
    }
}
