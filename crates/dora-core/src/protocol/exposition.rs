//! Prometheus text exposition format (version 0.0.4).
//!
//! Rendering rules:
//! - Families are written in name order, each with `# HELP` and `# TYPE`.
//! - Families without series are omitted, so an empty snapshot renders as "".
//! - Labels are written sorted by name, values escaped (`\\`, `\"`, `\n`).
//!
//! Parsing is panic-free and line-oriented: every malformed line is reported as
//! `DoraError::SnapshotUnparsable` with its 1-based line number.

use std::collections::HashMap;
use std::fmt::Write;

use crate::error::{DoraError, Result};
use crate::metric::{LabelSet, MetricKind, Snapshot};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a sample value so that parsing it back yields the same `f64`.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        format!("{v}")
    }
}

/// Render a snapshot in text exposition format.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    render_into(snapshot, &mut out);
    out
}

pub fn render_into(snapshot: &Snapshot, out: &mut String) {
    let mut current = None;
    for (family, labels, value) in snapshot.iter() {
        if current != Some(family) {
            let _ = writeln!(out, "# HELP {} {}", family.name(), escape_help(family.help()));
            let _ = writeln!(out, "# TYPE {} {}", family.name(), family.kind().as_str());
            current = Some(family);
        }
        out.push_str(family.name());
        if !labels.is_empty() {
            let label_str = labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                .collect::<Vec<_>>()
                .join(",");
            let _ = write!(out, "{{{}}}", label_str);
        }
        let _ = writeln!(out, " {}", format_value(value));
    }
}

/// Type declared by a `# TYPE` line (`Untyped` when absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    Untyped,
}

impl DeclaredType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "counter" => Some(DeclaredType::Counter),
            "gauge" => Some(DeclaredType::Gauge),
            "histogram" => Some(DeclaredType::Histogram),
            "summary" => Some(DeclaredType::Summary),
            "untyped" => Some(DeclaredType::Untyped),
            _ => None,
        }
    }

    /// The accumulator kind this type maps onto, if any.
    pub fn as_kind(self) -> Option<MetricKind> {
        match self {
            DeclaredType::Counter => Some(MetricKind::Counter),
            DeclaredType::Gauge => Some(MetricKind::Gauge),
            DeclaredType::Histogram | DeclaredType::Summary | DeclaredType::Untyped => None,
        }
    }

    fn has_suffixed_samples(self) -> bool {
        matches!(self, DeclaredType::Histogram | DeclaredType::Summary)
    }
}

/// One sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Full sample name (differs from the family name for `_bucket`/`_sum`/`_count`).
    pub name: String,
    pub labels: LabelSet,
    pub value: f64,
    pub timestamp_ms: Option<i64>,
}

/// A decoded family with its metadata and samples, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFamily {
    pub name: String,
    pub help: Option<String>,
    pub declared_type: DeclaredType,
    pub samples: Vec<Sample>,
    type_seen: bool,
}

impl ParsedFamily {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            help: None,
            declared_type: DeclaredType::Untyped,
            samples: Vec::new(),
            type_seen: false,
        }
    }

    fn owns_sample(&self, sample_name: &str) -> bool {
        if sample_name == self.name {
            return true;
        }
        self.declared_type.has_suffixed_samples()
            && sample_name
                .strip_prefix(self.name.as_str())
                .is_some_and(|suffix| matches!(suffix, "_bucket" | "_sum" | "_count"))
    }
}

/// Parse text exposition into families, in order of first appearance.
pub fn parse(text: &str) -> Result<Vec<ParsedFamily>> {
    let mut families: Vec<ParsedFamily> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;

    for (i, raw) in text.lines().enumerate() {
        let mut cur = Cursor::new(raw.trim_start(), i + 1);
        match cur.peek() {
            None => continue,
            Some('#') => {
                cur.bump();
                cur.skip_ws();
                let keyword = cur.take_while(|c| !c.is_whitespace());
                if keyword != "HELP" && keyword != "TYPE" {
                    // plain comment
                    continue;
                }
                cur.skip_ws();
                let name = cur.metric_name()?;
                let idx = *index.entry(name.to_string()).or_insert_with(|| {
                    families.push(ParsedFamily::new(name));
                    families.len() - 1
                });
                let family = &mut families[idx];

                if keyword == "TYPE" {
                    cur.skip_ws();
                    let ty = cur.take_while(|c| !c.is_whitespace());
                    let declared = DeclaredType::parse(ty)
                        .ok_or_else(|| cur.err(format!("unknown metric type {ty:?}")))?;
                    cur.skip_ws();
                    if !cur.rest().is_empty() {
                        return Err(cur.err("trailing characters after TYPE"));
                    }
                    if family.type_seen {
                        return Err(cur.err(format!("second TYPE line for {name}")));
                    }
                    if !family.samples.is_empty() {
                        return Err(cur.err(format!("TYPE line for {name} after its samples")));
                    }
                    family.declared_type = declared;
                    family.type_seen = true;
                } else {
                    if family.help.is_some() {
                        return Err(cur.err(format!("second HELP line for {name}")));
                    }
                    // Exactly one separator; the rest is the docstring.
                    if matches!(cur.peek(), Some(' ' | '\t')) {
                        cur.bump();
                    }
                    family.help = Some(unescape(cur.rest(), false).map_err(|r| cur.err(r))?);
                }
                current = Some(idx);
            }
            Some(_) => {
                let sample = cur.sample()?;
                let idx = match current {
                    Some(c) if families[c].owns_sample(&sample.name) => c,
                    _ => *index.entry(sample.name.clone()).or_insert_with(|| {
                        families.push(ParsedFamily::new(&sample.name));
                        families.len() - 1
                    }),
                };
                families[idx].samples.push(sample);
                current = Some(idx);
            }
        }
    }

    Ok(families)
}

fn unescape(s: &str, quoted: bool) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('"') if quoted => out.push('"'),
            Some(other) => return Err(format!("invalid escape sequence \\{other}")),
            None => return Err("dangling escape at end of line".into()),
        }
    }
    Ok(out)
}

fn parse_value(s: &str) -> Option<f64> {
    match s {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => s.parse::<f64>().ok(),
    }
}

/// Byte cursor over a single line.
struct Cursor<'a> {
    s: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str, line: usize) -> Self {
        Self { s, pos: 0, line }
    }

    fn err(&self, reason: impl Into<String>) -> DoraError {
        DoraError::SnapshotUnparsable {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.s[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn rest(&self) -> &'a str {
        &self.s[self.pos..]
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !f(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.s[start..self.pos]
    }

    fn metric_name(&mut self) -> Result<&'a str> {
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.err("invalid metric name"));
        }
        Ok(name)
    }

    fn label_name(&mut self) -> Result<&'a str> {
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.err("invalid label name"));
        }
        Ok(name)
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(self.err(format!("expected {want:?}, found {c:?}"))),
            None => Err(self.err(format!("expected {want:?}, found end of line"))),
        }
    }

    fn quoted(&mut self) -> Result<String> {
        self.expect('"')?;
        let start = self.pos;
        let mut escaped = false;
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated label value")),
                Some('\\') if !escaped => escaped = true,
                Some('"') if !escaped => break,
                Some(_) => escaped = false,
            }
        }
        let raw = &self.s[start..self.pos - 1];
        unescape(raw, true).map_err(|r| self.err(r))
    }

    fn labels(&mut self) -> Result<LabelSet> {
        let mut labels = LabelSet::new();
        self.expect('{')?;
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(labels);
            }
            let name = self.label_name()?;
            self.skip_ws();
            self.expect('=')?;
            self.skip_ws();
            let value = self.quoted()?;
            if labels.get(name).is_some() {
                return Err(self.err(format!("duplicate label {name}")));
            }
            labels.insert(name, value);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(labels),
                _ => return Err(self.err("expected ',' or '}' in label set")),
            }
        }
    }

    fn sample(&mut self) -> Result<Sample> {
        let name = self.metric_name()?.to_string();
        self.skip_ws();
        let labels = if self.peek() == Some('{') {
            self.labels()?
        } else {
            LabelSet::new()
        };

        let before = self.pos;
        self.skip_ws();
        if self.pos == before && !labels.is_empty() && self.peek().is_some() {
            return Err(self.err("missing whitespace before value"));
        }
        let raw_value = self.take_while(|c| !c.is_whitespace());
        let value = parse_value(raw_value)
            .ok_or_else(|| self.err(format!("invalid sample value {raw_value:?}")))?;

        self.skip_ws();
        let raw_ts = self.take_while(|c| !c.is_whitespace());
        let timestamp_ms = if raw_ts.is_empty() {
            None
        } else {
            Some(
                raw_ts
                    .parse::<i64>()
                    .map_err(|_| self.err(format!("invalid timestamp {raw_ts:?}")))?,
            )
        };

        self.skip_ws();
        if !self.rest().is_empty() {
            return Err(self.err("trailing characters after sample"));
        }

        Ok(Sample {
            name,
            labels,
            value,
            timestamp_ms,
        })
    }
}
