use crate::core::segment::{Element, Segment};
use crate::utils::error::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Service characters for one message. Passed explicitly into every decode
/// and encode call; never process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub segment: char,
    pub element: char,
    pub component: char,
    pub release: char,
    pub decimal: char,
    pub repetition: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            segment: '\'',
            element: '+',
            component: ':',
            release: '?',
            decimal: '.',
            repetition: '*',
        }
    }
}

impl Delimiters {
    /// Reads a UNA service string advice from the start of a message.
    /// Layout after the tag: component, element, decimal, release,
    /// repetition, segment terminator.
    pub fn from_una(message: &str) -> Option<Self> {
        let rest = message.trim_start().strip_prefix("UNA")?;
        let mut chars = rest.chars();
        let component = chars.next()?;
        let element = chars.next()?;
        let decimal = chars.next()?;
        let release = chars.next()?;
        let repetition = chars.next()?;
        let segment = chars.next()?;
        Some(Self {
            segment,
            element,
            component,
            release,
            decimal,
            repetition,
        })
    }

    pub fn service_string(&self) -> String {
        format!(
            "UNA{}{}{}{}{}{}",
            self.component, self.element, self.decimal, self.release, self.repetition, self.segment
        )
    }

    fn needs_release(&self, c: char) -> bool {
        c == self.segment || c == self.element || c == self.component || c == self.release
    }
}

/// One raw segment slice with its byte offset in the original input.
#[derive(Debug, Clone, Copy)]
pub struct RawSegment<'a> {
    pub text: &'a str,
    pub offset: usize,
}

/// Lazy iterator over the raw segments of a message. Restartable by
/// constructing a fresh iterator over the same input. Honours the release
/// character when looking for the segment terminator and tolerates
/// newlines/whitespace between segments (upstream systems emit one segment
/// per line). A leading UNA service string is skipped; read it separately
/// via [`Delimiters::from_una`].
pub struct SegmentIter<'a> {
    input: &'a str,
    pos: usize,
    delimiters: Delimiters,
}

impl<'a> SegmentIter<'a> {
    pub fn new(input: &'a str, delimiters: Delimiters) -> Self {
        let mut pos = input.len() - input.trim_start().len();
        let trimmed = &input[pos..];
        if trimmed.starts_with("UNA") {
            // tag plus six service characters
            pos += trimmed
                .char_indices()
                .map(|(i, _)| i)
                .nth(9)
                .unwrap_or(trimmed.len());
        }
        Self {
            input,
            pos,
            delimiters,
        }
    }
}

impl<'a> Iterator for SegmentIter<'a> {
    type Item = Result<RawSegment<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.input[self.pos..];
            let trimmed = rest.trim_start_matches(['\r', '\n', ' ', '\t']);
            self.pos += rest.len() - trimmed.len();
            if trimmed.is_empty() {
                return None;
            }

            let start = self.pos;
            let mut chars = trimmed.char_indices();
            while let Some((i, c)) = chars.next() {
                if c == self.delimiters.release {
                    if chars.next().is_none() {
                        self.pos = self.input.len();
                        return Some(Err(CodecError::MalformedEscape { offset: start + i }));
                    }
                } else if c == self.delimiters.segment {
                    self.pos = start + i + c.len_utf8();
                    if i == 0 {
                        // empty segment between terminators; skip
                        break;
                    }
                    return Some(Ok(RawSegment {
                        text: &trimmed[..i],
                        offset: start,
                    }));
                }
            }
            if self.pos == start {
                // no terminator before end of input: yield the trailing text
                self.pos = self.input.len();
                return Some(Ok(RawSegment {
                    text: trimmed,
                    offset: start,
                }));
            }
        }
    }
}

/// Splits one raw segment into its tag, elements and components, applying
/// un-escaping: a character immediately following the release character is
/// taken literally.
pub fn split_segment(raw: &RawSegment<'_>, delimiters: &Delimiters) -> Result<Segment> {
    let mut elements: Vec<Vec<String>> = vec![vec![String::new()]];
    let mut chars = raw.text.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == delimiters.release {
            match chars.next() {
                Some((_, escaped)) => {
                    if let Some(component) = elements.last_mut().and_then(|e| e.last_mut()) {
                        component.push(escaped);
                    }
                }
                None => {
                    return Err(CodecError::MalformedEscape {
                        offset: raw.offset + i,
                    })
                }
            }
        } else if c == delimiters.element {
            elements.push(vec![String::new()]);
        } else if c == delimiters.component {
            if let Some(element) = elements.last_mut() {
                element.push(String::new());
            }
        } else if let Some(component) = elements.last_mut().and_then(|e| e.last_mut()) {
            component.push(c);
        }
    }

    let mut chunks = elements.into_iter();
    let tag = chunks
        .next()
        .and_then(|c| c.into_iter().next())
        .unwrap_or_default();
    Ok(Segment {
        tag,
        elements: chunks.map(Element::new).collect(),
    })
}

/// Escapes a component value by prefixing each reserved character with the
/// release character. Exact inverse of [`unescape_component`].
pub fn escape_component(value: &str, delimiters: &Delimiters) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if delimiters.needs_release(c) {
            out.push(delimiters.release);
        }
        out.push(c);
    }
    out
}

/// Un-escapes a component value. The offset in a [`CodecError::MalformedEscape`]
/// is relative to the component start.
pub fn unescape_component(value: &str, delimiters: &Delimiters) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == delimiters.release {
            match chars.next() {
                Some((_, escaped)) => out.push(escaped),
                None => return Err(CodecError::MalformedEscape { offset: i }),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Serializes one segment: components joined by the component separator,
/// elements by the element separator, the segment terminator appended.
pub fn write_segment(segment: &Segment, delimiters: &Delimiters, out: &mut String) {
    out.push_str(&segment.tag);
    for element in &segment.elements {
        out.push(delimiters.element);
        for (i, component) in element.components.iter().enumerate() {
            if i > 0 {
                out.push(delimiters.component);
            }
            out.push_str(&escape_component(component, delimiters));
        }
    }
    out.push(delimiters.segment);
}

/// Serializes a whole message: UNA service string advice first, then one
/// segment per line as upstream reservation systems emit them.
pub fn write_message(segments: &[Segment], delimiters: &Delimiters) -> String {
    let mut out = String::new();
    out.push_str(&delimiters.service_string());
    out.push('\n');
    for segment in segments {
        write_segment(segment, delimiters, &mut out);
        out.push('\n');
    }
    out
}
