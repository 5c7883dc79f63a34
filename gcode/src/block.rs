use std::fmt;

use crate::word::Word;

/// One parsed line of G-code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// Set when the line starts with `/` (block delete).
    pub delete: bool,
    /// Value of the leading `N` word, or 0 when the line has none.
    pub line_number: i64,
    /// Words in source order. Repeated letters are kept as written.
    pub words: Vec<Word>,
    /// Link slot for callers that keep blocks in a list. Never set by the parser.
    pub next: Option<Box<Block>>,
}

impl Block {
    /// First word with the given letter, ignoring case.
    pub fn word(&self, letter: char) -> Option<&Word> {
        self.words.iter().find(|w| w.is(letter))
    }

    /// Append `block` at the end of the list starting at `self`.
    pub fn push_next(&mut self, block: Block) {
        match self.next {
            Some(ref mut next) => next.push_next(block),
            None => self.next = Some(Box::new(block)),
        }
    }

    /// Iterate over `self` and every block linked after it.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            current: Some(self),
        }
    }
}

/// Renders the block in normalized form: `/N10 G1 X2.5`.
/// The `next` link is not part of the rendering.
impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delete {
            f.write_str("/")?;
        }
        let mut first = true;
        // An explicit `N0` keeps a leading `N` word, or an otherwise empty
        // block, from reading back as a line number or a blank line.
        let leading_n = self.words.first().is_some_and(|w| w.is('N'));
        let empty = self.words.is_empty() && !self.delete;
        if self.line_number != 0 || leading_n || empty {
            write!(f, "N{}", self.line_number)?;
            first = false;
        }
        for word in &self.words {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", word)?;
            first = false;
        }
        Ok(())
    }
}

pub struct Chain<'a> {
    current: Option<&'a Block>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<&'a Block> {
        let block = self.current?;
        self.current = block.next.as_deref();
        Some(block)
    }
}
