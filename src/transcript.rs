/*!
 * Subtitle-to-transcript normalization.
 *
 * Turns the raw text of a SubRip-style subtitle file into the flat
 * `[MM:SS] text` transcript format stored on video records and sent to the
 * analysis provider. The conversion is a single forward pass over the lines
 * of the input and never fails: anything it does not recognize is either
 * cue text or noise.
 */

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

// @const: Full-line time range, e.g. `00:01:02,500 --> 00:01:04.000`
static TIME_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2}:[0-9]{2}:[0-9]{2}[,.][0-9]{3}) --> ([0-9]{2}:[0-9]{2}:[0-9]{2}[,.][0-9]{3})$").unwrap()
});

// @const: Sequence counters and other ASCII digit-only lines
static SEQUENCE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

// @const: A single `[...]`, `(...)` or `{...}` span covering the whole line
static DIRECTIVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\[[^\]]*\]|\([^)]*\)|\{[^}]*\})$").unwrap()
});

/// One subtitle block as found in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Counter line preceding the time range, if any
    pub sequence_index: Option<u32>,
    /// Left side of the time range (`HH:MM:SS,mmm` or `HH:MM:SS.mmm`)
    pub start_time: String,
    /// Right side of the time range
    pub end_time: String,
    /// Retained text lines, trimmed, directives removed
    pub text_lines: Vec<String>,
}

impl Cue {
    /// Joined cue text; empty when every line was filtered out
    pub fn text(&self) -> String {
        self.text_lines.join(" ").trim().to_string()
    }

    /// Convert to an output segment, or `None` for a cue without text
    pub fn to_segment(&self) -> Option<NormalizedSegment> {
        let text = self.text();
        if text.is_empty() {
            return None;
        }

        Some(NormalizedSegment {
            timestamp: format_cue_timestamp(&self.start_time),
            text,
        })
    }
}

/// One `[MM:SS] text` line of a normalized transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSegment {
    /// `[MM:SS]` label derived from the cue start time
    pub timestamp: String,
    /// Cue text joined with single spaces
    pub text: String,
}

impl fmt::Display for NormalizedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.timestamp, self.text)
    }
}

/// Classification of a single input line
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    TimeRange { start: &'a str, end: &'a str },
    Sequence(&'a str),
    Blank,
    Directive,
    Text(&'a str),
}

/// Trim whitespace and byte-order marks from both ends of a line
fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

fn classify(raw_line: &str) -> Line<'_> {
    let line = trim_line(raw_line);

    if let Some(caps) = TIME_RANGE_REGEX.captures(line) {
        // Both groups are mandatory in the pattern
        let start = caps.get(1).map_or("", |m| m.as_str());
        let end = caps.get(2).map_or("", |m| m.as_str());
        return Line::TimeRange { start, end };
    }

    if line.is_empty() {
        Line::Blank
    } else if SEQUENCE_REGEX.is_match(line) {
        Line::Sequence(line)
    } else if DIRECTIVE_REGEX.is_match(line) {
        Line::Directive
    } else {
        Line::Text(line)
    }
}

/// Check whether a line is a subtitle time range
pub fn is_time_range_line(line: &str) -> bool {
    TIME_RANGE_REGEX.is_match(trim_line(line))
}

/// Check whether a line is a bracket/paren/brace-only annotation such as `[Music]`
pub fn is_directive_line(line: &str) -> bool {
    DIRECTIVE_REGEX.is_match(trim_line(line))
}

/// Format a cue start time as `[MM:SS]`.
///
/// The first delimited field (hours) is ignored, so `01:02:03,000` becomes
/// `[02:03]`. Missing or non-numeric minute/second fields count as zero.
pub fn format_cue_timestamp(start_time: &str) -> String {
    let mut fields = start_time
        .split([':', ',', '.'])
        .skip(1)
        .map(|field| field.trim().parse::<u32>().unwrap_or(0));

    let minutes = fields.next().unwrap_or(0);
    let seconds = fields.next().unwrap_or(0);

    format!("[{:02}:{:02}]", minutes, seconds)
}

/// Split raw subtitle text into cues.
///
/// Text that appears before the first time range has no timestamp to attach
/// to and is dropped.
pub fn parse_cues(raw_text: &str) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut current: Option<Cue> = None;
    let mut last_sequence: Option<u32> = None;

    for raw_line in raw_text.lines() {
        match classify(raw_line) {
            Line::TimeRange { start, end } => {
                if let Some(cue) = current.take() {
                    cues.push(cue);
                }
                current = Some(Cue {
                    sequence_index: last_sequence.take(),
                    start_time: start.to_string(),
                    end_time: end.to_string(),
                    text_lines: Vec::new(),
                });
            }
            Line::Sequence(digits) => {
                last_sequence = digits.parse().ok();
            }
            Line::Blank | Line::Directive => {}
            Line::Text(text) => {
                if let Some(cue) = current.as_mut() {
                    cue.text_lines.push(text.to_string());
                }
            }
        }
    }

    if let Some(cue) = current {
        cues.push(cue);
    }

    cues
}

/// Parse raw subtitle text into the segments that carry text, in input order
pub fn segments(raw_text: &str) -> Vec<NormalizedSegment> {
    parse_cues(raw_text)
        .iter()
        .filter_map(Cue::to_segment)
        .collect()
}

/// Normalize raw subtitle text into newline-joined `[MM:SS] text` lines.
///
/// Total over any input: empty or unrecognized input yields an empty string.
pub fn normalize(raw_text: &str) -> String {
    segments(raw_text)
        .iter()
        .map(NormalizedSegment::to_string)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
