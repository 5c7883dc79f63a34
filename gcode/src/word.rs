use std::fmt;

/// The numeric part of a word.
///
/// `G` and `M` words carry an integer code; every other letter carries a real
/// number. A word never holds both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Integer(n) => *n as f64,
            Value::Float(x) => *x,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Whether words with this letter carry an integer value.
pub fn takes_integer(letter: char) -> bool {
    matches!(letter, 'G' | 'g' | 'M' | 'm')
}

/// A single letter/value token, e.g. `G1` or `x-2.5`.
///
/// Words only come out of a successful block parse, so the letter is always
/// alphabetic and the value kind always matches the letter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    letter: char,
    value: Value,
}

impl Word {
    pub(crate) fn new(letter: char, value: Value) -> Self {
        Word { letter, value }
    }

    /// The letter as written in the source (case preserved).
    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn value(&self) -> Value {
        self.value
    }

    /// Case-insensitive letter comparison.
    pub fn is(&self, letter: char) -> bool {
        self.letter.eq_ignore_ascii_case(&letter)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.value)
    }
}
