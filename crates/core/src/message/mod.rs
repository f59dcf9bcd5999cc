//! Message rendering: a small printf-like template language whose arguments
//! are read from the probed stream.
//!
//! Rendering starts at the position just past the bytes a test consumed and
//! advances with every conversion that reads from the stream. Rendering never
//! fails: a conversion whose read comes up short substitutes nothing.

use serde::{Deserialize, Serialize};

use crate::source::{read_array, read_c_string, ByteSource};

/// Default cap on the bytes a single `%s` conversion may read.
pub const DEFAULT_MAX_STRING_LEN: usize = 1024;

/// Knobs for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Maximum bytes read by one `%s` conversion.
    pub max_string_len: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { max_string_len: DEFAULT_MAX_STRING_LEN }
    }
}

/// Render `template` reading arguments from `source` starting at `anchor`.
pub fn render<S: ByteSource + ?Sized>(source: &S, anchor: u64, template: &str) -> String {
    render_with(source, anchor, template, None, &RenderOptions::default())
}

/// Render with explicit options.
///
/// When `text` is set, `%s` conversions substitute it instead of reading a
/// string from the stream (date tests use this to print the decoded time).
pub fn render_with<S: ByteSource + ?Sized>(
    source: &S,
    anchor: u64,
    template: &str,
    text: Option<&str>,
    options: &RenderOptions,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut position = anchor;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        let mut raw = String::from("%");
        while let Some(&flag) = chars.peek() {
            match flag {
                '#' => spec.alternate = true,
                '+' => spec.plus = true,
                '-' => spec.left = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                _ => break,
            }
            raw.push(flag);
            chars.next();
        }
        while let Some(&digit) = chars.peek() {
            let Some(d) = digit.to_digit(10) else { break };
            spec.width = spec.width.saturating_mul(10).saturating_add(d as usize);
            raw.push(digit);
            chars.next();
        }
        // Padding never exceeds what a single `%s` may produce.
        spec.width = spec.width.min(options.max_string_len);

        match chars.next() {
            None => out.push_str(&raw),
            Some('%') => out.push('%'),
            Some('s') => {
                let value = match text {
                    Some(text) => text.to_string(),
                    None => {
                        match read_c_string(source, position, options.max_string_len) {
                            Ok((bytes, consumed)) => {
                                position = position.saturating_add(consumed as u64);
                                String::from_utf8_lossy(&bytes).into_owned()
                            }
                            Err(_) => String::new(),
                        }
                    }
                };
                out.push_str(&spec.pad("", &value));
            }
            Some(conv @ ('d' | 'i' | 'u' | 'x' | 'X')) => {
                let word = read_array::<4, S>(source, position).ok().flatten();
                position = position.saturating_add(4);
                if let Some(bytes) = word {
                    let value = u32::from_le_bytes(bytes);
                    let formatted = match conv {
                        'd' | 'i' => spec.signed(value as i32 as i64),
                        _ => spec.unsigned(value as u64, conv),
                    };
                    out.push_str(&formatted);
                }
            }
            Some(other) => {
                out.push_str(&raw);
                out.push(other);
            }
        }
    }

    out
}

/// Parsed flags and width of one conversion.
#[derive(Debug, Default)]
struct Spec {
    alternate: bool,
    plus: bool,
    left: bool,
    space: bool,
    zero: bool,
    width: usize,
}

impl Spec {
    fn signed(&self, value: i64) -> String {
        let sign = if value < 0 {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        };
        self.pad_numeric(sign, &value.unsigned_abs().to_string())
    }

    fn unsigned(&self, value: u64, conv: char) -> String {
        match conv {
            'x' => self.pad_numeric(if self.alternate { "0x" } else { "" }, &format!("{value:x}")),
            'X' => self.pad_numeric(if self.alternate { "0X" } else { "" }, &format!("{value:X}")),
            _ => self.pad_numeric("", &value.to_string()),
        }
    }

    fn pad_numeric(&self, prefix: &str, digits: &str) -> String {
        if self.zero && !self.left {
            let len = prefix.len() + digits.len();
            let zeros = self.width.saturating_sub(len);
            return format!("{prefix}{}{digits}", "0".repeat(zeros));
        }
        self.pad(prefix, digits)
    }

    fn pad(&self, prefix: &str, body: &str) -> String {
        let len = prefix.chars().count() + body.chars().count();
        let fill = " ".repeat(self.width.saturating_sub(len));
        if self.left {
            format!("{prefix}{body}{fill}")
        } else {
            format!("{fill}{prefix}{body}")
        }
    }
}
