//! Rule compiler: turns magic rule text into a tree of compiled [`Rule`]s.
//!
//! One rule per line:
//!
//! ```text
//! <offset> <type>[/<extender>] <rel><value> [message text]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Leading `>`
//! characters on the offset mark a child rule; their count is the nesting
//! depth, and a child attaches to the nearest preceding rule one level up.
//! Compilation stops at the first malformed line and returns no rules.

pub mod literal;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::rules::Rule;
use crate::tester::{Directive, Epoch, OffsetResolver, Operator, TestError, Tester, Zone};

pub use literal::{parse_int, parse_offset, parse_type, BaseType, TypeSpec};

/// Relation symbol meaning "any value".
const MATCH_ANY: &str = "x";

/// Relation prefixes, two-character symbols first.
const RELATION_SYMBOLS: [&str; 6] = [">=", "<=", ">", "<", "!", "="];

/// Error type for rule compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The rule source itself could not be read.
    #[error("Failed to read magic source: {0}")]
    Io(#[from] io::Error),

    /// A line was malformed; carries the line and the underlying failure.
    #[error("invalid line {line_number} '{line}': {reason}")]
    Parse { line_number: usize, line: String, reason: ParseFailure },

    /// A registered rule group failed to compile.
    #[error("rule group '{name}' failed to compile: {source}")]
    Group { name: String, source: Box<CompileError> },
}

/// Why a single line failed to compile.
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("invalid offset '{value}': {detail}")]
    InvalidOffset { value: String, detail: String },

    #[error("missing read type")]
    MissingType,

    #[error("unknown read type '{0}'")]
    UnknownType(String),

    #[error("missing test value")]
    MissingValue,

    #[error("empty comparator value '{0}'")]
    EmptyValue(String),

    #[error("invalid {kind} test value '{value}': {detail}")]
    InvalidValue { kind: &'static str, value: String, detail: String },

    /// Operator, regex or extender rejected by the tester constructor.
    #[error(transparent)]
    Test(#[from] TestError),

    #[error("child rule at depth {depth} has no parent at depth {}", .depth - 1)]
    OrphanChild { depth: usize },
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Compile every rule read from `reader`.
pub fn compile<R: BufRead>(reader: R) -> CompileResult<Vec<Rule>> {
    let mut roots: Vec<Rule> = Vec::new();
    // Open ancestors of the next line, outermost first.
    let mut open: Vec<Rule> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        let fail = |reason: ParseFailure| CompileError::Parse {
            line_number,
            line: line.clone(),
            reason,
        };

        let Some((depth, rule)) = parse_rule_line(&line).map_err(fail)? else {
            continue;
        };
        if !rule.test.is_supported() {
            tracing::debug!(
                line = line_number,
                directive = rule.test.kind().name(),
                "directive recognized but not evaluated"
            );
        }
        if depth > open.len() {
            return Err(fail(ParseFailure::OrphanChild { depth }));
        }
        while open.len() > depth {
            close_rule(&mut open, &mut roots);
        }
        open.push(rule);
    }
    while !open.is_empty() {
        close_rule(&mut open, &mut roots);
    }

    tracing::debug!(rules = roots.len(), "compiled magic source");
    Ok(roots)
}

fn close_rule(open: &mut Vec<Rule>, roots: &mut Vec<Rule>) {
    if let Some(done) = open.pop() {
        match open.last_mut() {
            Some(parent) => parent.children.push(done),
            None => roots.push(done),
        }
    }
}

/// Compile rules from an in-memory string.
pub fn compile_str(source: &str) -> CompileResult<Vec<Rule>> {
    compile(source.as_bytes())
}

/// Compile rules from a magic file on disk.
pub fn compile_file(path: impl AsRef<Path>) -> CompileResult<Vec<Rule>> {
    let file = File::open(path.as_ref())?;
    compile(BufReader::new(file))
}

/// Parse one line into its nesting depth and rule.
///
/// Returns `Ok(None)` for blank and comment lines.
pub fn parse_rule_line(line: &str) -> Result<Option<(usize, Rule)>, ParseFailure> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut fields = trimmed.split_whitespace();
    let Some(first) = fields.next() else {
        return Ok(None);
    };
    let offset_text = first.trim_start_matches('>');
    let depth = first.len() - offset_text.len();
    let offset = parse_offset(offset_text).map_err(|detail| ParseFailure::InvalidOffset {
        value: offset_text.to_string(),
        detail,
    })?;

    let type_token = fields.next().ok_or(ParseFailure::MissingType)?;
    let spec = parse_type(type_token).ok_or_else(|| {
        let keyword = type_token.split('/').next().unwrap_or(type_token);
        ParseFailure::UnknownType(keyword.to_string())
    })?;
    let value_token = fields.next().ok_or(ParseFailure::MissingValue)?;
    let message = fields.collect::<Vec<_>>().join(" ");

    // Regex literals carry no relation; a leading `<` or `!` is pattern text.
    let (op, value) = match spec.base {
        BaseType::Regex => (Operator::Equal, value_token),
        _ => split_relation(value_token)?,
    };
    let test = build_tester(&spec, offset, op, value)?;
    Ok(Some((depth, Rule::new(test, message))))
}

/// Split the leading relation symbol off a value token.
fn split_relation(token: &str) -> Result<(Operator, &str), ParseFailure> {
    if token == MATCH_ANY {
        return Ok((Operator::from_symbol(token)?, ""));
    }
    let (op, value) = match RELATION_SYMBOLS.iter().find(|symbol| token.starts_with(**symbol)) {
        Some(symbol) => (Operator::from_symbol(symbol)?, &token[symbol.len()..]),
        None => (Operator::Equal, token),
    };
    if value.is_empty() {
        return Err(ParseFailure::EmptyValue(token.to_string()));
    }
    Ok((op, value))
}

fn build_tester(
    spec: &TypeSpec,
    offset: OffsetResolver,
    op: Operator,
    value: &str,
) -> Result<Tester, ParseFailure> {
    let order = spec.order;
    let tester = match spec.base {
        BaseType::Byte => {
            let v = int_value(value, op, 8, "byte")?;
            if spec.unsigned {
                Tester::number(offset, v as u8, op, order)
            } else {
                Tester::number(offset, v as i8, op, order)
            }
        }
        BaseType::Short => {
            let v = int_value(value, op, 16, "short")?;
            if spec.unsigned {
                Tester::number(offset, v as u16, op, order)
            } else {
                Tester::number(offset, v as i16, op, order)
            }
        }
        BaseType::Long => {
            let v = int_value(value, op, 32, "long")?;
            if spec.unsigned {
                Tester::number(offset, v as u32, op, order)
            } else {
                Tester::number(offset, v as i32, op, order)
            }
        }
        BaseType::Quad => {
            let v = int_value(value, op, 64, "quad")?;
            if spec.unsigned {
                Tester::number(offset, v as u64, op, order)
            } else {
                Tester::number(offset, v as i64, op, order)
            }
        }
        BaseType::Float => {
            Tester::number(offset, float_value::<f32>(value, op, "float")?, op, order)
        }
        BaseType::Double => {
            Tester::number(offset, float_value::<f64>(value, op, "double")?, op, order)
        }
        BaseType::String => Tester::string(offset, value.as_bytes(), op)?,
        BaseType::Date => {
            let v = int_value(value, op, 32, "4-byte date")? as u32;
            Tester::date32(offset, v, op, order, Zone::Utc)
        }
        BaseType::LDate => {
            let v = int_value(value, op, 32, "4-byte date")? as u32;
            Tester::date32(offset, v, op, order, Zone::Local)
        }
        BaseType::QDate => {
            let v = int_value(value, op, 64, "8-byte date")? as u64;
            Tester::date64(offset, v, op, order, Epoch::Unix, Zone::Utc)
        }
        BaseType::QLDate => {
            let v = int_value(value, op, 64, "8-byte date")? as u64;
            Tester::date64(offset, v, op, order, Epoch::Unix, Zone::Local)
        }
        BaseType::QWDate => {
            let v = int_value(value, op, 64, "8-byte date")? as u64;
            Tester::date64(offset, v, op, order, Epoch::WindowsFileTime, Zone::Utc)
        }
        BaseType::Regex => Tester::regex(offset, value, &spec.extender)?,
        BaseType::Guid => Tester::guid(offset, value, op)?,
        BaseType::Default => {
            require_any(op, value, "default")?;
            Tester::default_at(offset)
        }
        BaseType::Directive(Directive::Clear) => {
            require_any(op, value, "clear")?;
            Tester::unsupported(offset, Directive::Clear)
        }
        BaseType::Directive(directive) => Tester::unsupported(offset, directive),
    };
    Ok(tester)
}

fn int_value(
    value: &str,
    op: Operator,
    bits: u32,
    kind: &'static str,
) -> Result<i128, ParseFailure> {
    if op == Operator::Any {
        return Ok(0);
    }
    parse_int(value, bits).map_err(|detail| ParseFailure::InvalidValue {
        kind,
        value: value.to_string(),
        detail,
    })
}

fn float_value<F>(value: &str, op: Operator, kind: &'static str) -> Result<F, ParseFailure>
where
    F: std::str::FromStr + Default,
    F::Err: std::fmt::Display,
{
    if op == Operator::Any {
        return Ok(F::default());
    }
    value.parse::<F>().map_err(|e| ParseFailure::InvalidValue {
        kind,
        value: value.to_string(),
        detail: e.to_string(),
    })
}

fn require_any(op: Operator, value: &str, kind: &'static str) -> Result<(), ParseFailure> {
    if op == Operator::Any {
        return Ok(());
    }
    Err(ParseFailure::InvalidValue {
        kind,
        value: value.to_string(),
        detail: format!("expected '{MATCH_ANY}'"),
    })
}
