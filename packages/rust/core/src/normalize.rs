//! Whitespace normalization around custom tags.
//!
//! Blank lines directly inside a tag (after `<x>`, before `</x>`) would make
//! the Markdown converter break the tag's content into separate blocks. They
//! are trimmed here, on the raw text, before conversion. Self-closing tags
//! are left alone, and so are fenced code blocks.
//!
//! A scenario tag whose content still spans several blocks after trimming
//! (paragraphs, fenced code) cannot stay inline: the converter would close
//! it at the end of the first paragraph. [`frame_block_tags`] moves such
//! tags onto lines of their own so they become HTML blocks.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use rasaeco_shared::TagKind;

/// A start, end or self-closing tag; the name may be padded with whitespace
/// and newlines on either side.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(/)?\s*([A-Za-z][A-Za-z0-9_-]*)(?:\s[^<>]*?)?\s*(/)?\s*>").expect("tag regex")
});

/// Elements that never have content; they behave like self-closing tags.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagToken {
    Open,
    Close,
    SelfClosing,
}

fn classify(caps: &Captures<'_>) -> TagToken {
    if caps.get(1).is_some() {
        TagToken::Close
    } else if caps.get(3).is_some() || VOID_ELEMENTS.contains(&caps[2].to_ascii_lowercase().as_str()) {
        TagToken::SelfClosing
    } else {
        TagToken::Open
    }
}

/// Trim whitespace-only lines after every opening tag and before every
/// closing tag. Idempotent.
pub fn normalize(text: &str) -> String {
    let fences = code_fences(text);
    let mut out = String::with_capacity(text.len());

    let mut cursor = 0;
    for fence in &fences {
        normalize_chunk(&text[cursor..fence.start], cursor > 0, true, &mut out);
        out.push_str(&text[fence.clone()]);
        cursor = fence.end;
    }
    normalize_chunk(&text[cursor..], cursor > 0, false, &mut out);

    out
}

/// Normalize text free of code fences. Whitespace that borders a fence is
/// kept, since the fence must stay on a line of its own.
fn normalize_chunk(chunk: &str, after_fence: bool, before_fence: bool, out: &mut String) {
    let mut last = 0;
    let mut after_open = false;

    for caps in TAG_RE.captures_iter(chunk) {
        let Some(tag) = caps.get(0) else { continue };
        let token = classify(&caps);

        let mut segment = &chunk[last..tag.start()];
        if after_open {
            segment = trim_leading_blank_lines(segment);
        }
        if token == TagToken::Close && !(last == 0 && after_fence) {
            segment = trim_trailing_blank_lines(segment);
        }
        out.push_str(segment);
        out.push_str(tag.as_str());

        after_open = token == TagToken::Open;
        last = tag.end();
    }

    let mut tail = &chunk[last..];
    if after_open && !before_fence {
        tail = trim_leading_blank_lines(tail);
    }
    out.push_str(tail);
}

/// A scenario tag outside of code fences.
struct TagSpan {
    span: Range<usize>,
    token: TagToken,
    name: String,
}

/// Frame every scenario tag whose content holds more than one block with
/// blank lines, the tag alone on its line. Apply after [`normalize`].
pub fn frame_block_tags(text: &str) -> String {
    let fences = code_fences(text);
    let tags: Vec<TagSpan> = TAG_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let tag = caps.get(0)?;
            if fences.iter().any(|fence| fence.contains(&tag.start())) {
                return None;
            }
            let name = caps[2].to_ascii_lowercase();
            TagKind::from_tag(&name)?;
            Some(TagSpan {
                span: tag.range(),
                token: classify(&caps),
                name,
            })
        })
        .collect();

    let mut framed = vec![false; tags.len()];
    let mut open: Vec<usize> = Vec::new();
    for (i, tag) in tags.iter().enumerate() {
        match tag.token {
            TagToken::Open => open.push(i),
            TagToken::Close => {
                let Some(depth) = open.iter().rposition(|&j| tags[j].name == tag.name) else {
                    continue;
                };
                let start = tags[open[depth]].span.end;
                let end = tag.span.start;
                let fenced = fences.iter().any(|fence| fence.start >= start && fence.start < end);
                if fenced || BLANK_LINE_RE.is_match(&text[start..end]) {
                    framed[open[depth]] = true;
                    framed[i] = true;
                }
                open.truncate(depth);
            }
            TagToken::SelfClosing => {}
        }
    }

    let mut out = String::with_capacity(text.len() + 4 * tags.len());
    let mut last = None;
    for tag in tags.iter().zip(&framed).filter_map(|(tag, framed)| framed.then_some(tag)) {
        let mut segment = &text[last.unwrap_or(0)..tag.span.start];
        if last.is_some() {
            segment = trim_leading_blank_lines(segment);
        }
        out.push_str(segment);
        out.truncate(out.trim_end().len());
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&text[tag.span.clone()]);
        out.push_str("\n\n");
        last = Some(tag.span.end);
    }

    match last {
        Some(end) => out.push_str(trim_leading_blank_lines(&text[end..])),
        None => out.push_str(text),
    }
    out
}

static BLANK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\r?\n").expect("blank line regex"));

/// Drop the leading whitespace up to and including its last newline.
fn trim_leading_blank_lines(segment: &str) -> &str {
    let rest = segment.trim_start();
    let blank = &segment[..segment.len() - rest.len()];
    match blank.rfind('\n') {
        Some(pos) => &segment[pos + 1..],
        None => segment,
    }
}

/// Drop the trailing whitespace from its first newline on.
fn trim_trailing_blank_lines(segment: &str) -> &str {
    let kept = segment.trim_end();
    let blank = &segment[kept.len()..];
    match blank.find('\n') {
        Some(pos) => &segment[..kept.len() + pos],
        None => segment,
    }
}

/// Byte ranges of fenced code blocks, from the start of the opening fence
/// line to the end of the closing fence line (its newline excluded). An
/// unclosed fence runs to the end of the text.
fn code_fences(text: &str) -> Vec<Range<usize>> {
    let mut fences = Vec::new();
    let mut open: Option<(usize, char, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        match open {
            None => {
                if let Some((marker, len)) = fence_marker(content) {
                    open = Some((start, marker, len));
                }
            }
            Some((begin, marker, len)) => {
                if let Some((closing, closing_len)) = fence_marker(content) {
                    let bare = content.trim().chars().all(|c| c == closing);
                    if closing == marker && closing_len >= len && bare {
                        fences.push(begin..start + content.len());
                        open = None;
                    }
                }
            }
        }
    }

    if let Some((begin, _, _)) = open {
        fences.push(begin..text.len());
    }
    fences
}

/// The fence character and its run length, if `line` opens or closes a fence.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}
