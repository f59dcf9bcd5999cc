use std::io;

use regex::bytes::{Regex, RegexBuilder};

use crate::source::{read_full, read_remaining, ByteSource};
use crate::tester::{TestError, TestResult};

/// Flags carried by a regex test's `/extender`.
///
/// Flag letters and the numeric window may appear in any order:
/// `80c` and `c80` describe the same search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexExtender {
    /// `c`: case-insensitive matching.
    pub case_insensitive: bool,
    /// `l`: the window counts lines instead of bytes.
    pub lines: bool,
    /// `s`: render from the start of the match instead of its end.
    pub start_of_match: bool,
    /// Size of the search window; `None` searches to the end of the stream.
    pub window: Option<u64>,
}

impl RegexExtender {
    pub fn parse(extender: &str) -> TestResult<Self> {
        let mut parsed = RegexExtender::default();
        let mut digits = String::new();
        for c in extender.chars() {
            match c {
                'c' => parsed.case_insensitive = true,
                'l' => parsed.lines = true,
                's' => parsed.start_of_match = true,
                d if d.is_ascii_digit() => digits.push(d),
                _ => return Err(TestError::InvalidExtender(extender.to_string())),
            }
        }
        if !digits.is_empty() {
            let count: u64 =
                digits.parse().map_err(|_| TestError::InvalidExtender(extender.to_string()))?;
            parsed.window = (count > 0).then_some(count);
        }
        Ok(parsed)
    }
}

/// A compiled regular-expression search.
#[derive(Debug, Clone)]
pub struct RegexTest {
    regex: Regex,
    extender: RegexExtender,
}

impl RegexTest {
    pub fn new(pattern: &str, extender: RegexExtender) -> TestResult<Self> {
        let regex = RegexBuilder::new(pattern).case_insensitive(extender.case_insensitive).build()?;
        Ok(Self { regex, extender })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn extender(&self) -> RegexExtender {
        self.extender
    }

    /// Search the window starting at `offset`.
    ///
    /// Returns the stream position the message should be rendered from, or
    /// `None` when the window is empty, cannot be fully read, or holds no match.
    pub fn find<S: ByteSource + ?Sized>(&self, source: &S, offset: u64) -> io::Result<Option<u64>> {
        let window = match (self.extender.window, self.extender.lines) {
            (None, _) => Some(read_remaining(source, offset, None)?),
            (Some(bytes), false) => {
                let want = usize::try_from(bytes).unwrap_or(usize::MAX);
                let buf = read_remaining(source, offset, Some(want))?;
                (buf.len() == want).then_some(buf)
            }
            (Some(lines), true) => read_lines(source, offset, lines)?,
        };
        let Some(window) = window.filter(|w| !w.is_empty()) else {
            return Ok(None);
        };
        let Some(found) = self.regex.find(&window) else {
            return Ok(None);
        };
        let within = if self.extender.start_of_match { found.start() } else { found.end() };
        Ok(offset.checked_add(within as u64))
    }
}

/// Collect `count` lines from `offset`, newline terminators included.
///
/// A final unterminated line counts; fewer lines than requested yields `None`.
fn read_lines<S: ByteSource + ?Sized>(
    source: &S,
    offset: u64,
    count: u64,
) -> io::Result<Option<Vec<u8>>> {
    let mut out = Vec::new();
    let mut seen = 0u64;
    let mut chunk = [0u8; 4096];
    loop {
        let Some(pos) = offset.checked_add(out.len() as u64) else {
            break;
        };
        let n = read_full(source, &mut chunk, pos)?;
        for (i, &b) in chunk[..n].iter().enumerate() {
            if b == b'\n' {
                seen += 1;
                if seen == count {
                    out.extend_from_slice(&chunk[..=i]);
                    return Ok(Some(out));
                }
            }
        }
        out.extend_from_slice(&chunk[..n]);
        if n < chunk.len() {
            break;
        }
    }
    if out.last().is_some_and(|&b| b != b'\n') {
        seen += 1;
    }
    Ok((seen >= count).then_some(out))
}
