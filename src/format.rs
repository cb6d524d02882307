//! Value format patterns.
//!
//! A small printf-style renderer used for the `str_fmt` table option.
//! A pattern is literal text with at most one conversion:
//!
//! ```text
//! %[flags][width][.precision]conversion
//!
//! flags        - + space 0 #
//! conversion   d i u f F e E g G s x X o, and %% for a literal percent
//! ```
//!
//! Width and precision are capped at [`MAX_WIDTH`]. Patterns are parsed
//! once, when the table configuration is validated.

use crate::error::CrunchError;
use std::fmt;

/// Largest width or precision a pattern may ask for.
pub const MAX_WIDTH: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Integer,
    Fixed,
    Exponent { upper: bool },
    General { upper: bool },
    Text,
    Hex { upper: bool },
    Octal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Flags {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alternate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Spec {
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: Conversion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Value(Spec),
}

/// A parsed value format pattern.
///
/// # Examples
///
/// ```rust
/// use statcrunch::format::ValueFormat;
///
/// let fmt = ValueFormat::parse("%.2f EUR").unwrap();
/// assert_eq!(fmt.render(3.14159), "3.14 EUR");
///
/// let fmt = ValueFormat::parse("%05d").unwrap();
/// assert_eq!(fmt.render(42.9), "00042");
///
/// assert!(ValueFormat::parse("%q").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFormat {
    pattern: String,
    pieces: Vec<Piece>,
}

impl ValueFormat {
    /// Parse a pattern.
    pub fn parse(pattern: &str) -> Result<Self, CrunchError> {
        let invalid = || CrunchError::InvalidFormat(pattern.to_string());
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();
        let mut conversions = 0;

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }

            let mut flags = Flags::default();
            while let Some(&flag) = chars.peek() {
                match flag {
                    '-' => flags.left = true,
                    '+' => flags.plus = true,
                    ' ' => flags.space = true,
                    '0' => flags.zero = true,
                    '#' => flags.alternate = true,
                    _ => break,
                }
                chars.next();
            }

            let width = take_number(&mut chars).map_err(|_| invalid())?;
            let precision = if chars.peek() == Some(&'.') {
                chars.next();
                Some(take_number(&mut chars).map_err(|_| invalid())?.unwrap_or(0))
            } else {
                None
            };

            let conversion = match chars.next().ok_or_else(invalid)? {
                'd' | 'i' | 'u' => Conversion::Integer,
                'f' | 'F' => Conversion::Fixed,
                'e' => Conversion::Exponent { upper: false },
                'E' => Conversion::Exponent { upper: true },
                'g' => Conversion::General { upper: false },
                'G' => Conversion::General { upper: true },
                's' => Conversion::Text,
                'x' => Conversion::Hex { upper: false },
                'X' => Conversion::Hex { upper: true },
                'o' => Conversion::Octal,
                _ => return Err(invalid()),
            };

            conversions += 1;
            if conversions > 1 {
                return Err(invalid());
            }
            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Value(Spec {
                flags,
                width,
                precision,
                conversion,
            }));
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            pieces,
        })
    }

    /// The pattern this format was parsed from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render a value through the pattern.
    pub fn render(&self, value: f64) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Value(spec) => out.push_str(&spec.render(value)),
            }
        }
        out
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Digits at the cursor. `Err` when they exceed [`MAX_WIDTH`].
fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Option<usize>, ()> {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    if digits.is_empty() {
        return Ok(None);
    }
    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_WIDTH => Ok(Some(n)),
        _ => Err(()),
    }
}

impl Spec {
    fn render(&self, value: f64) -> String {
        let negative = value.is_sign_negative() && value != 0.0;
        let magnitude = value.abs();

        let body = match self.conversion {
            Conversion::Integer => format!("{}", magnitude.trunc()),
            Conversion::Fixed => format!("{:.*}", self.precision.unwrap_or(6), magnitude),
            Conversion::Exponent { upper } => {
                exponent(magnitude, self.precision.unwrap_or(6), upper)
            }
            Conversion::General { upper } => {
                general(magnitude, self.precision.unwrap_or(6), upper, self.flags.alternate)
            }
            Conversion::Hex { upper } => {
                let n = magnitude.trunc() as u64;
                let digits = if upper {
                    format!("{n:X}")
                } else {
                    format!("{n:x}")
                };
                if self.flags.alternate && n != 0 {
                    format!("{}{digits}", if upper { "0X" } else { "0x" })
                } else {
                    digits
                }
            }
            Conversion::Octal => format!("{:o}", magnitude.trunc() as u64),
            Conversion::Text => {
                let text = value.to_string();
                let text = match self.precision {
                    Some(p) => text.chars().take(p).collect(),
                    None => text,
                };
                return pad(&text, "", self.width, self.flags.left, false);
            }
        };

        let sign = if negative && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
            "-"
        } else if self.flags.plus {
            "+"
        } else if self.flags.space {
            " "
        } else {
            ""
        };

        pad(&body, sign, self.width, self.flags.left, self.flags.zero)
    }
}

fn pad(body: &str, sign: &str, width: Option<usize>, left: bool, zero: bool) -> String {
    let len = sign.len() + body.chars().count();
    let fill = width.unwrap_or(0).saturating_sub(len);
    if left {
        format!("{sign}{body}{}", " ".repeat(fill))
    } else if zero {
        format!("{sign}{}{body}", "0".repeat(fill))
    } else {
        format!("{}{sign}{body}", " ".repeat(fill))
    }
}

fn exponent(magnitude: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{:.*e}", precision, magnitude);
    let (mantissa, exp) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{sign}{:02}", exp.abs())
}

fn general(magnitude: f64, precision: usize, upper: bool, alternate: bool) -> String {
    let precision = precision.max(1);
    if magnitude == 0.0 {
        return if alternate {
            format!("{:.*}", precision - 1, 0.0)
        } else {
            "0".to_string()
        };
    }

    // Exponent after rounding to the requested significant digits.
    let rounded = format!("{:.*e}", precision - 1, magnitude);
    let exp: i64 = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let text = if exp < -4 || exp >= precision as i64 {
        exponent(magnitude, precision - 1, upper)
    } else {
        let decimals = (precision as i64 - 1 - exp).max(0) as usize;
        format!("{:.*}", decimals, magnitude)
    };

    if alternate {
        text
    } else {
        strip_zeros(&text)
    }
}

fn strip_zeros(text: &str) -> String {
    let (number, suffix) = match text.find(['e', 'E']) {
        Some(idx) => text.split_at(idx),
        None => (text, ""),
    };
    let number = if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    };
    format!("{number}{suffix}")
}
