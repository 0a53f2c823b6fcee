//! Operand canonicalization.
//!
//! Disassemblers disagree on cosmetics: `0x10` versus `16`, `SP` versus `sp`,
//! `a0,a0` versus `a0, a0`. Canonicalization maps each operand to a tagged
//! [`CanonicalToken`] so that two renderings of the same instruction compare
//! equal while an immediate never compares equal to a register or a memory
//! reference.
//!
//! Every function here is pure: the same input text always produces the same
//! tokens.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// `<displacement>(<base>)`, matched against the case-folded token.
static MEMORY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn memory_pattern() -> &'static Regex {
    MEMORY_PATTERN.get_or_init(|| {
        Regex::new(r"^([+-]?(?:0x)?[0-9a-f]+)\(([^)]+)\)$").expect("memory operand pattern is valid")
    })
}

/// A normalized disassembly operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalToken {
    /// Numeric operand with sign and base normalized.
    Immediate(i128),
    /// Anything that is not purely numeric: registers, labels, qualifiers.
    Symbolic(String),
    /// `displacement(base)` addressing.
    ///
    /// The base is always a [`CanonicalToken::Symbolic`]; use
    /// [`CanonicalToken::memory`] to build one.
    Memory {
        /// Signed displacement.
        offset: i128,
        /// Base operand, always symbolic.
        base: Box<CanonicalToken>,
    },
}

impl CanonicalToken {
    /// Creates an immediate token.
    pub fn imm(value: i128) -> Self {
        Self::Immediate(value)
    }

    /// Creates a symbolic token, case-folding the name.
    pub fn sym(name: impl AsRef<str>) -> Self {
        Self::Symbolic(name.as_ref().to_lowercase())
    }

    /// Creates a memory token.
    ///
    /// A base that is not already symbolic is wrapped as a symbol holding its
    /// canonical text, so the base slot of a memory token is always symbolic.
    pub fn memory(offset: i128, base: CanonicalToken) -> Self {
        let base = match base {
            Self::Symbolic(_) => base,
            other => Self::Symbolic(other.to_string()),
        };
        Self::Memory {
            offset,
            base: Box::new(base),
        }
    }

    /// Returns true if this is an immediate token.
    pub fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate(_))
    }

    /// Returns true if this is a symbolic token.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic(_))
    }

    /// Returns true if this is a memory token.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory { .. })
    }
}

impl fmt::Display for CanonicalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(value) => write!(f, "{}", value),
            Self::Symbolic(name) => write!(f, "{}", name),
            Self::Memory { offset, base } => write!(f, "{}({})", offset, base),
        }
    }
}

/// Parses a signed integer in the operand grammar.
///
/// Accepts an optional leading `+` or `-`, then either `0x`-prefixed hex
/// digits or bare decimal digits. Case-insensitive. Returns `None` for
/// anything else, including values that overflow `i128`.
pub fn parse_int(token: &str) -> Option<i128> {
    let token = token.trim().to_ascii_lowercase();
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(&token)),
    };
    let (radix, digits) = match unsigned.strip_prefix("0x") {
        Some(hex) => (16, hex),
        None => (10, unsigned),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Canonicalizes a single operand token.
///
/// Tried in order: memory form, bare integer, symbolic fallback. A memory
/// form whose displacement is not a valid integer in the grammar above (for
/// example `1f(sp)`) falls back to a symbol.
pub fn canonicalize_token(token: &str) -> CanonicalToken {
    let token = token.trim().to_lowercase();

    if let Some(caps) = memory_pattern().captures(&token) {
        if let Some(offset) = parse_int(&caps[1]) {
            return CanonicalToken::memory(offset, canonicalize_token(&caps[2]));
        }
    }

    match parse_int(&token) {
        Some(value) => CanonicalToken::Immediate(value),
        None => CanonicalToken::Symbolic(token),
    }
}

/// Canonicalizes a raw operand string into an ordered token sequence.
///
/// Whitespace and commas both separate operands; runs of separators collapse.
pub fn canonicalize(operands: &str) -> Vec<CanonicalToken> {
    operands
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(canonicalize_token)
        .collect()
}

/// Renders a token sequence back to operand text.
///
/// Feeding the result to [`canonicalize`] yields the same tokens.
pub fn canonicalize_to_text(tokens: &[CanonicalToken]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
