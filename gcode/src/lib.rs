pub mod block;
pub mod parser;
pub mod word;

use std::ops::Range;

pub use block::Block;
pub use parser::{BlockError, ParseError, Parser, parse_block, parse_block_len, parse_line};
pub use word::{Value, Word};

/// A parsed G-code file.
#[derive(Debug, Clone)]
pub struct Program {
    /// Every well-formed source line in order, blank ones included.
    pub lines: Vec<Line>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

/// One source line and the block parsed from it.
#[derive(Debug, Clone)]
pub struct Line {
    /// 1-based line number in the file.
    pub number: usize,
    /// Byte span of the line text, without its line terminator.
    pub span: Range<usize>,
    /// The raw text, as it should be sent to a device.
    pub text: String,
    /// `None` for blank lines.
    pub block: Option<Block>,
}

impl Program {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.lines.iter().filter_map(|line| line.block.as_ref())
    }

    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// The program in normalized form, one block per line.
    pub fn normalized(&self) -> String {
        let mut out = String::new();
        for block in self.blocks() {
            out.push_str(&block.to_string());
            out.push('\n');
        }
        out
    }
}
