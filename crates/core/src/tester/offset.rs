use std::io;

use serde::{Deserialize, Serialize};

use crate::endian::ByteOrder;
use crate::source::{read_array, ByteSource};

/// Width of the pointer read by an indirect offset stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerWidth {
    Byte,
    Short,
    Long,
    Quad,
}

impl PointerWidth {
    pub fn size(&self) -> usize {
        match self {
            PointerWidth::Byte => 1,
            PointerWidth::Short => 2,
            PointerWidth::Long => 4,
            PointerWidth::Quad => 8,
        }
    }
}

/// Computes the absolute position a test reads from.
///
/// Every stage is resolved against a reference position. The top-level
/// reference is the start of the stream; inside a [`OffsetResolver::Chained`]
/// each stage's result becomes the reference for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetResolver {
    /// Fixed distance from the reference position.
    Constant(u64),
    /// Signed adjustment of the reference position.
    Delta(i64),
    /// Read an unsigned pointer at `base` (relative to the reference); the
    /// pointer's value becomes the result.
    Indirect { base: u64, width: PointerWidth, order: ByteOrder },
    /// Stages applied left to right.
    Chained(Vec<OffsetResolver>),
}

impl OffsetResolver {
    pub fn constant(offset: u64) -> Self {
        OffsetResolver::Constant(offset)
    }

    pub fn indirect(base: u64, width: PointerWidth, order: ByteOrder) -> Self {
        OffsetResolver::Indirect { base, width, order }
    }

    pub fn chained(stages: impl IntoIterator<Item = OffsetResolver>) -> Self {
        OffsetResolver::Chained(stages.into_iter().collect())
    }

    /// Resolve the absolute offset for `source`.
    ///
    /// `Ok(None)` means the offset cannot be computed from this stream
    /// (a pointer lies beyond its end, or the arithmetic leaves the
    /// addressable range); callers treat that as a non-match.
    pub fn resolve<S: ByteSource + ?Sized>(&self, source: &S) -> io::Result<Option<u64>> {
        self.resolve_from(source, 0)
    }

    fn resolve_from<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        reference: u64,
    ) -> io::Result<Option<u64>> {
        match self {
            OffsetResolver::Constant(offset) => Ok(reference.checked_add(*offset)),
            OffsetResolver::Delta(delta) => Ok(reference.checked_add_signed(*delta)),
            OffsetResolver::Indirect { base, width, order } => {
                let Some(at) = reference.checked_add(*base) else {
                    return Ok(None);
                };
                read_pointer(source, at, *width, *order)
            }
            OffsetResolver::Chained(stages) => {
                let mut position = reference;
                for stage in stages {
                    match stage.resolve_from(source, position)? {
                        Some(next) => position = next,
                        None => return Ok(None),
                    }
                }
                Ok(Some(position))
            }
        }
    }
}

fn read_pointer<S: ByteSource + ?Sized>(
    source: &S,
    at: u64,
    width: PointerWidth,
    order: ByteOrder,
) -> io::Result<Option<u64>> {
    let value = match width {
        PointerWidth::Byte => read_array::<1, S>(source, at)?.map(|b| b[0] as u64),
        PointerWidth::Short => read_array::<2, S>(source, at)?.map(|b| order.u16_from(b) as u64),
        PointerWidth::Long => read_array::<4, S>(source, at)?.map(|b| order.u32_from(b) as u64),
        PointerWidth::Quad => read_array::<8, S>(source, at)?.map(|b| order.u64_from(b)),
    };
    Ok(value)
}
