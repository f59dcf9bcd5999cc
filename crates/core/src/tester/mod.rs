//! Typed testers: compiled, immutable predicates over a byte stream.
//!
//! A [`Tester`] binds an [`OffsetResolver`] to one of the [`TestKind`]s. It can
//! be evaluated against any number of streams; evaluation only performs
//! positional reads and never fails on truncated input. A read that comes up
//! short is a plain non-match, only a stream that cannot be read at all
//! surfaces as [`TestError::Io`].

pub mod compare;
pub mod date;
pub mod offset;
pub mod pattern;

use std::io;

use thiserror::Error;

use crate::endian::ByteOrder;
use crate::message::{render_with, RenderOptions};
use crate::source::{read_array, read_full, ByteSource};

pub use compare::Operator;
pub use date::{format_timestamp, Epoch, Zone};
pub use offset::{OffsetResolver, PointerWidth};
pub use pattern::{RegexExtender, RegexTest};

/// Errors raised while building or evaluating a tester.
#[derive(Debug, Error)]
pub enum TestError {
    /// The stream could not be read (distinct from a short read).
    #[error("I/O error while probing: {0}")]
    Io(#[from] io::Error),

    #[error("operator '{operator}' is not valid for {kind} tests")]
    InvalidOperator { operator: Operator, kind: &'static str },

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("invalid regex: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid regex extender '{0}'")]
    InvalidExtender(String),
}

pub type TestResult<T> = Result<T, TestError>;

/// Result of evaluating one tester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The test matched; carries the rendered message.
    Match(String),
    NoMatch,
}

impl Outcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Match(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Match(message) => Some(message),
            Outcome::NoMatch => None,
        }
    }
}

/// A typed numeric operand. The variant fixes both width and signedness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

macro_rules! number_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Number {
            fn from(value: $ty) -> Self {
                Number::$variant(value)
            }
        })*
    };
}

number_from!(i8 => I8, u8 => U8, i16 => I16, u16 => U16, i32 => I32, u32 => U32,
    i64 => I64, u64 => U64, f32 => F32, f64 => F64);

impl Number {
    /// Bytes occupied in the stream.
    pub fn size(&self) -> usize {
        match self {
            Number::I8(_) | Number::U8(_) => 1,
            Number::I16(_) | Number::U16(_) => 2,
            Number::I32(_) | Number::U32(_) | Number::F32(_) => 4,
            Number::I64(_) | Number::U64(_) | Number::F64(_) => 8,
        }
    }

    /// Read a value of this same kind at `offset`; `None` on a short read.
    pub fn read_same<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        offset: u64,
        order: ByteOrder,
    ) -> io::Result<Option<Number>> {
        let value = match self {
            Number::I8(_) => read_array::<1, S>(source, offset)?.map(|b| Number::I8(b[0] as i8)),
            Number::U8(_) => read_array::<1, S>(source, offset)?.map(|b| Number::U8(b[0])),
            Number::I16(_) => {
                read_array::<2, S>(source, offset)?.map(|b| Number::I16(order.u16_from(b) as i16))
            }
            Number::U16(_) => {
                read_array::<2, S>(source, offset)?.map(|b| Number::U16(order.u16_from(b)))
            }
            Number::I32(_) => {
                read_array::<4, S>(source, offset)?.map(|b| Number::I32(order.u32_from(b) as i32))
            }
            Number::U32(_) => {
                read_array::<4, S>(source, offset)?.map(|b| Number::U32(order.u32_from(b)))
            }
            Number::I64(_) => {
                read_array::<8, S>(source, offset)?.map(|b| Number::I64(order.u64_from(b) as i64))
            }
            Number::U64(_) => {
                read_array::<8, S>(source, offset)?.map(|b| Number::U64(order.u64_from(b)))
            }
            Number::F32(_) => read_array::<4, S>(source, offset)?
                .map(|b| Number::F32(f32::from_bits(order.u32_from(b)))),
            Number::F64(_) => read_array::<8, S>(source, offset)?
                .map(|b| Number::F64(f64::from_bits(order.u64_from(b)))),
        };
        Ok(value)
    }

    /// Compare `self` (the value read) against `expected`.
    ///
    /// Operands of different kinds never match, except under `Any`.
    pub fn satisfies(&self, expected: &Number, op: Operator) -> bool {
        use Number::*;
        match (*self, *expected) {
            _ if op == Operator::Any => true,
            (I8(a), I8(b)) => op.compare(a, b),
            (U8(a), U8(b)) => op.compare(a, b),
            (I16(a), I16(b)) => op.compare(a, b),
            (U16(a), U16(b)) => op.compare(a, b),
            (I32(a), I32(b)) => op.compare(a, b),
            (U32(a), U32(b)) => op.compare(a, b),
            (I64(a), I64(b)) => op.compare(a, b),
            (U64(a), U64(b)) => op.compare(a, b),
            (F32(a), F32(b)) => op.compare(a, b),
            (F64(a), F64(b)) => op.compare(a, b),
            _ => false,
        }
    }

    /// The raw value as an unsigned integer, for date conversion.
    fn as_u64(&self) -> Option<u64> {
        match *self {
            Number::U32(v) => Some(v as u64),
            Number::U64(v) => Some(v),
            _ => None,
        }
    }
}

/// Keywords the rule grammar recognizes but the engine never evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Pstring,
    Indirect,
    Name,
    Use,
    Search,
    Der,
    Id3,
    Clear,
    Offset,
}

impl Directive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Directive::Pstring => "pstring",
            Directive::Indirect => "indirect",
            Directive::Name => "name",
            Directive::Use => "use",
            Directive::Search => "search",
            Directive::Der => "der",
            Directive::Id3 => "id3",
            Directive::Clear => "clear",
            Directive::Offset => "offset",
        }
    }
}

/// What a tester reads and how it compares.
#[derive(Debug, Clone)]
pub enum TestKind {
    Number { expected: Number, op: Operator, order: ByteOrder },
    /// Byte-for-byte comparison against a literal of the same length.
    String { expected: Vec<u8>, op: Operator },
    Regex(RegexTest),
    /// Integer timestamp rendered as a calendar date through `%s`.
    Date { expected: Number, op: Operator, order: ByteOrder, epoch: Epoch, zone: Zone },
    /// 16 raw bytes compared as an uppercase hyphenated UUID.
    Guid { expected: String, op: Operator },
    /// Always matches.
    Default,
    /// Parsed but never evaluated.
    Unsupported(Directive),
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::Number { .. } => "numeric",
            TestKind::String { .. } => "string",
            TestKind::Regex(_) => "regex",
            TestKind::Date { .. } => "date",
            TestKind::Guid { .. } => "guid",
            TestKind::Default => "default",
            TestKind::Unsupported(d) => d.as_str(),
        }
    }
}

/// A compiled test: where to read and what to expect there.
#[derive(Debug, Clone)]
pub struct Tester {
    offset: OffsetResolver,
    kind: TestKind,
}

impl Tester {
    /// Integer or float comparison; the width follows `expected`'s type.
    pub fn number(
        offset: OffsetResolver,
        expected: impl Into<Number>,
        op: Operator,
        order: ByteOrder,
    ) -> Self {
        Self { offset, kind: TestKind::Number { expected: expected.into(), op, order } }
    }

    /// Fixed-length literal comparison. Ordering operators are rejected;
    /// under `Any` nothing is read and the message renders at the offset.
    pub fn string(
        offset: OffsetResolver,
        expected: impl Into<Vec<u8>>,
        op: Operator,
    ) -> TestResult<Self> {
        if !op.is_equality() {
            return Err(TestError::InvalidOperator { operator: op, kind: "string" });
        }
        Ok(Self { offset, kind: TestKind::String { expected: expected.into(), op } })
    }

    pub fn regex(offset: OffsetResolver, pattern: &str, extender: &str) -> TestResult<Self> {
        let extender = RegexExtender::parse(extender)?;
        Ok(Self { offset, kind: TestKind::Regex(RegexTest::new(pattern, extender)?) })
    }

    /// 32-bit Unix timestamp.
    pub fn date32(
        offset: OffsetResolver,
        expected: u32,
        op: Operator,
        order: ByteOrder,
        zone: Zone,
    ) -> Self {
        let kind =
            TestKind::Date { expected: expected.into(), op, order, epoch: Epoch::Unix, zone };
        Self { offset, kind }
    }

    /// 64-bit timestamp counted from `epoch`.
    pub fn date64(
        offset: OffsetResolver,
        expected: u64,
        op: Operator,
        order: ByteOrder,
        epoch: Epoch,
        zone: Zone,
    ) -> Self {
        Self { offset, kind: TestKind::Date { expected: expected.into(), op, order, epoch, zone } }
    }

    /// GUID comparison. Ordering operators are rejected.
    pub fn guid(offset: OffsetResolver, expected: &str, op: Operator) -> TestResult<Self> {
        if !op.is_equality() {
            return Err(TestError::InvalidOperator { operator: op, kind: "guid" });
        }
        let kind = TestKind::Guid { expected: expected.to_ascii_uppercase(), op };
        Ok(Self { offset, kind })
    }

    pub fn default_at(offset: OffsetResolver) -> Self {
        Self { offset, kind: TestKind::Default }
    }

    pub fn unsupported(offset: OffsetResolver, directive: Directive) -> Self {
        Self { offset, kind: TestKind::Unsupported(directive) }
    }

    pub fn offset(&self) -> &OffsetResolver {
        &self.offset
    }

    pub fn kind(&self) -> &TestKind {
        &self.kind
    }

    /// Whether this tester is ever evaluated.
    pub fn is_supported(&self) -> bool {
        !matches!(self.kind, TestKind::Unsupported(_))
    }

    pub fn evaluate<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        template: &str,
    ) -> TestResult<Outcome> {
        self.evaluate_with(source, template, &RenderOptions::default())
    }

    /// Run the test and, on a match, render `template`.
    pub fn evaluate_with<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        template: &str,
        options: &RenderOptions,
    ) -> TestResult<Outcome> {
        if let TestKind::Unsupported(_) = self.kind {
            return Ok(Outcome::NoMatch);
        }
        let Some(offset) = self.offset.resolve(source)? else {
            return Ok(Outcome::NoMatch);
        };
        let rendered = |anchor: u64, text: Option<&str>| {
            Outcome::Match(render_with(source, anchor, template, text, options))
        };

        match &self.kind {
            TestKind::Number { expected, op, order } => {
                let Some(actual) = expected.read_same(source, offset, *order)? else {
                    return Ok(Outcome::NoMatch);
                };
                if !actual.satisfies(expected, *op) {
                    return Ok(Outcome::NoMatch);
                }
                Ok(rendered(offset.saturating_add(expected.size() as u64), None))
            }
            TestKind::String { expected, op } => {
                if !op.is_equality() {
                    return Err(TestError::InvalidOperator { operator: *op, kind: "string" });
                }
                if *op == Operator::Any {
                    return Ok(rendered(offset, None));
                }
                let mut buf = vec![0u8; expected.len()];
                let n = read_full(source, &mut buf, offset)?;
                if n != expected.len() || !op.compare(buf.as_slice(), expected.as_slice()) {
                    return Ok(Outcome::NoMatch);
                }
                Ok(rendered(offset.saturating_add(expected.len() as u64), None))
            }
            TestKind::Regex(regex) => match regex.find(source, offset)? {
                Some(anchor) => Ok(rendered(anchor, None)),
                None => Ok(Outcome::NoMatch),
            },
            TestKind::Date { expected, op, order, epoch, zone } => {
                let Some(actual) = expected.read_same(source, offset, *order)? else {
                    return Ok(Outcome::NoMatch);
                };
                if !actual.satisfies(expected, *op) {
                    return Ok(Outcome::NoMatch);
                }
                let text = actual
                    .as_u64()
                    .and_then(|raw| format_timestamp(raw, *epoch, *zone))
                    .unwrap_or_default();
                Ok(rendered(offset.saturating_add(expected.size() as u64), Some(text.as_str())))
            }
            TestKind::Guid { expected, op } => {
                if !op.is_equality() {
                    return Err(TestError::InvalidOperator { operator: *op, kind: "guid" });
                }
                let Some(bytes) = read_array::<16, S>(source, offset)? else {
                    return Ok(Outcome::NoMatch);
                };
                let actual =
                    uuid::Uuid::from_bytes(bytes).hyphenated().to_string().to_ascii_uppercase();
                if !op.compare(actual.as_str(), expected.as_str()) {
                    return Ok(Outcome::NoMatch);
                }
                Ok(rendered(offset.saturating_add(16), None))
            }
            TestKind::Default => Ok(rendered(offset, None)),
            TestKind::Unsupported(_) => Ok(Outcome::NoMatch),
        }
    }
}
