//! Grammar for the scripting bridge's single-line output.
//!
//! The bridge returns a list, which the interpreter prints as one line with
//! items separated by `", "`. Each item carries four fields joined by a field
//! delimiter (`|` for events, TAB for calendars).
//!
//! Two tiers:
//! 1. Primary: `f1 D f2 D f3 D f4 (", " | end)` where `f1..f3` contain no
//!    delimiter and `f4` contains neither the delimiter nor a comma. Dates in
//!    `f2`/`f3` may themselves contain `", "`.
//! 2. Fallback, only when the primary rule matches nothing: split the line on
//!    `", "` and split each item on the delimiter.
//!
//! Items that yield fewer than four fields are skipped and reported. A name
//! containing both a comma and the delimiter cannot be represented.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

const RECORD_SEPARATOR: &str = ", ";

#[allow(clippy::expect_used)]
static PIPE_RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^|]*)\|([^|]*)\|([^|]*)\|([^|,]*)(?:, |$)").expect("valid event record regex")
});

#[allow(clippy::expect_used)]
static TAB_RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\t]*)\t([^\t]*)\t([^\t]*)\t([^\t,]*)(?:, |$)")
        .expect("valid calendar record regex")
});

/// Field delimiter used by a bridge script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDelimiter {
    Pipe,
    Tab,
}

impl FieldDelimiter {
    fn as_char(self) -> char {
        match self {
            Self::Pipe => '|',
            Self::Tab => '\t',
        }
    }

    fn record_regex(self) -> &'static Regex {
        match self {
            Self::Pipe => &PIPE_RECORD,
            Self::Tab => &TAB_RECORD,
        }
    }
}

/// One well-formed item with its four trimmed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord(pub [String; 4]);

/// Records recovered from one output line plus the items that were skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BridgeOutput {
    pub records: Vec<RawRecord>,
    pub errors: Vec<String>,
}

/// Parse one bridge output line.
pub fn parse_output(line: &str, delimiter: FieldDelimiter) -> BridgeOutput {
    let line = line.trim();
    if line.is_empty() {
        return BridgeOutput::default();
    }

    let primary = parse_primary(line, delimiter);
    if !primary.records.is_empty() {
        return primary;
    }

    debug!(?delimiter, "primary record rule matched nothing; splitting on separator");
    parse_fallback(line, delimiter)
}

fn parse_primary(line: &str, delimiter: FieldDelimiter) -> BridgeOutput {
    let mut output = BridgeOutput::default();
    let mut consumed = 0;

    for captures in delimiter.record_regex().captures_iter(line) {
        let Some(whole) = captures.get(0) else { continue };
        if whole.as_str().is_empty() {
            continue;
        }
        note_skipped(&line[consumed..whole.start()], &mut output.errors);
        consumed = whole.end();

        let field = |i: usize| captures.get(i).map_or("", |m| m.as_str()).trim().to_string();
        output.records.push(RawRecord([field(1), field(2), field(3), field(4)]));
    }

    if !output.records.is_empty() {
        note_skipped(&line[consumed..], &mut output.errors);
    }
    output
}

fn parse_fallback(line: &str, delimiter: FieldDelimiter) -> BridgeOutput {
    let mut output = BridgeOutput::default();

    for item in line.split(RECORD_SEPARATOR) {
        let fields: Vec<&str> = item.split(delimiter.as_char()).map(str::trim).collect();
        match fields.as_slice() {
            [a, b, c, d, ..] => output.records.push(RawRecord([
                a.to_string(),
                b.to_string(),
                c.to_string(),
                d.to_string(),
            ])),
            _ => note_skipped(item, &mut output.errors),
        }
    }
    output
}

fn note_skipped(fragment: &str, errors: &mut Vec<String>) {
    let fragment = fragment.trim().trim_matches(',').trim();
    if fragment.is_empty() {
        return;
    }
    warn!(record = %fragment, "skipping malformed bridge record");
    errors.push(format!("Malformed record skipped: {fragment}"));
}
