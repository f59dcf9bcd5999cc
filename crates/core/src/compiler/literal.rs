//! Literal and keyword parsing for rule lines.

use crate::endian::ByteOrder;
use crate::tester::{Directive, OffsetResolver, PointerWidth};

/// Parse an integer literal with auto-detected base.
///
/// Accepts an optional sign, `0x`/`0o`/`0b` prefixes, a bare leading `0`
/// for octal and `_` separators. The result must fit `bits` bits either as a
/// signed or as an unsigned value, so `0xAA55` is a valid 16-bit literal.
pub fn parse_int(text: &str, bits: u32) -> Result<i128, String> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = if let Some(rest) = strip_prefix_ci(body, "0x") {
        (16, rest)
    } else if let Some(rest) = strip_prefix_ci(body, "0b") {
        (2, rest)
    } else if let Some(rest) = strip_prefix_ci(body, "0o") {
        (8, rest)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("not a base-{radix} integer"));
    }
    let magnitude = u128::from_str_radix(&digits, radix).map_err(|e| e.to_string())?;
    let magnitude = i128::try_from(magnitude).map_err(|_| "value out of range".to_string())?;
    let value = if negative { -magnitude } else { magnitude };

    let min = -(1i128 << (bits - 1));
    let max = (1i128 << bits) - 1;
    if value < min || value > max {
        return Err(format!("value out of range for {bits}-bit integer"));
    }
    Ok(value)
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

/// Parse a rule offset: a plain integer or an indirect `(base[.t][+-delta])`.
pub fn parse_offset(text: &str) -> Result<OffsetResolver, String> {
    let Some(inner) = text.strip_prefix('(') else {
        let value = parse_int(text, 64)?;
        return u64::try_from(value)
            .map(OffsetResolver::Constant)
            .map_err(|_| "negative offsets are not supported".to_string());
    };
    let inner = inner.strip_suffix(')').ok_or_else(|| "unterminated indirect offset".to_string())?;

    let split = inner.find(['.', '+', '-']).unwrap_or(inner.len());
    let base = u64::try_from(parse_int(&inner[..split], 64)?)
        .map_err(|_| "negative indirect base".to_string())?;
    let mut rest = &inner[split..];

    let (width, order) = match rest.strip_prefix('.') {
        Some(after) => {
            let mut chars = after.chars();
            let code = chars.next().ok_or_else(|| "missing indirect type".to_string())?;
            rest = chars.as_str();
            pointer_type(code).ok_or_else(|| format!("unknown indirect type '{code}'"))?
        }
        None => (PointerWidth::Long, ByteOrder::Little),
    };
    let indirect = OffsetResolver::indirect(base, width, order);
    if rest.is_empty() {
        return Ok(indirect);
    }

    if !rest.starts_with(['+', '-']) {
        return Err(format!("unexpected '{rest}' in indirect offset"));
    }
    let delta =
        i64::try_from(parse_int(rest, 64)?).map_err(|_| "indirect delta out of range".to_string())?;
    let adjust = match u64::try_from(delta) {
        Ok(forward) => OffsetResolver::Constant(forward),
        Err(_) => OffsetResolver::Delta(delta),
    };
    Ok(OffsetResolver::chained([indirect, adjust]))
}

fn pointer_type(code: char) -> Option<(PointerWidth, ByteOrder)> {
    let parsed = match code {
        'b' | 'B' | 'c' | 'C' => (PointerWidth::Byte, ByteOrder::Little),
        's' | 'h' => (PointerWidth::Short, ByteOrder::Little),
        'S' | 'H' => (PointerWidth::Short, ByteOrder::Big),
        'l' => (PointerWidth::Long, ByteOrder::Little),
        'L' => (PointerWidth::Long, ByteOrder::Big),
        'm' => (PointerWidth::Long, ByteOrder::Middle),
        'q' => (PointerWidth::Quad, ByteOrder::Little),
        'Q' => (PointerWidth::Quad, ByteOrder::Big),
        _ => return None,
    };
    Some(parsed)
}

/// The class/width selected by a type keyword once prefixes are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Byte,
    Short,
    Long,
    Quad,
    Float,
    Double,
    String,
    /// 32-bit Unix time, UTC.
    Date,
    /// 64-bit Unix time, UTC.
    QDate,
    /// 32-bit Unix time, local zone.
    LDate,
    /// 64-bit Unix time, local zone.
    QLDate,
    /// 64-bit Windows FILETIME.
    QWDate,
    Regex,
    Default,
    Guid,
    Directive(Directive),
}

impl BaseType {
    fn from_keyword(keyword: &str) -> Option<Self> {
        let base = match keyword {
            "byte" => BaseType::Byte,
            "short" => BaseType::Short,
            "long" => BaseType::Long,
            "quad" => BaseType::Quad,
            "float" => BaseType::Float,
            "double" => BaseType::Double,
            "string" => BaseType::String,
            "date" => BaseType::Date,
            "qdate" => BaseType::QDate,
            "ldate" => BaseType::LDate,
            "qldate" => BaseType::QLDate,
            "qwdate" => BaseType::QWDate,
            "regex" => BaseType::Regex,
            "default" => BaseType::Default,
            "guid" => BaseType::Guid,
            "pstring" => BaseType::Directive(Directive::Pstring),
            "indirect" => BaseType::Directive(Directive::Indirect),
            "name" => BaseType::Directive(Directive::Name),
            "use" => BaseType::Directive(Directive::Use),
            "search" => BaseType::Directive(Directive::Search),
            "der" => BaseType::Directive(Directive::Der),
            "clear" => BaseType::Directive(Directive::Clear),
            "offset" => BaseType::Directive(Directive::Offset),
            _ => return None,
        };
        Some(base)
    }

    fn is_integer(&self) -> bool {
        matches!(self, BaseType::Byte | BaseType::Short | BaseType::Long | BaseType::Quad)
    }

    fn takes_byte_order(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                BaseType::Float
                    | BaseType::Double
                    | BaseType::Date
                    | BaseType::QDate
                    | BaseType::LDate
                    | BaseType::QLDate
                    | BaseType::QWDate
            )
    }
}

/// A fully decoded type token such as `ubeshort` or `regex/80c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub base: BaseType,
    pub unsigned: bool,
    pub order: ByteOrder,
    pub extender: String,
}

/// Decode a type token; `None` when the keyword is not recognized.
pub fn parse_type(token: &str) -> Option<TypeSpec> {
    let (name, extender) = match token.split_once('/') {
        Some((name, extender)) => (name, extender.to_string()),
        None => (token, String::new()),
    };

    if let Some(base) = BaseType::from_keyword(name) {
        return Some(TypeSpec { base, unsigned: false, order: ByteOrder::Native, extender });
    }

    let (unsigned, rest) = match name.strip_prefix('u') {
        Some(rest) => (true, rest),
        None => (false, name),
    };
    let (order, keyword) = if let Some(k) = rest.strip_prefix("le") {
        (Some(ByteOrder::Little), k)
    } else if let Some(k) = rest.strip_prefix("be") {
        (Some(ByteOrder::Big), k)
    } else if let Some(k) = rest.strip_prefix("me") {
        (Some(ByteOrder::Middle), k)
    } else {
        (None, rest)
    };

    let base = match (keyword, order) {
        ("id3", Some(ByteOrder::Little | ByteOrder::Big)) if !unsigned => {
            BaseType::Directive(Directive::Id3)
        }
        _ => BaseType::from_keyword(keyword)?,
    };
    if unsigned && !base.is_integer() {
        return None;
    }
    if order.is_some() && !base.takes_byte_order() && base != BaseType::Directive(Directive::Id3) {
        return None;
    }
    Some(TypeSpec { base, unsigned, order: order.unwrap_or(ByteOrder::Native), extender })
}
