//! Extraction of the `<rasaeco-meta>` block of a scenario.
//!
//! The block holds a JSON object:
//!
//! ```json
//! {
//!   "identifier": "pump-maintenance",
//!   "title": "Pump maintenance",
//!   "contact": "jane@example.com",
//!   "relations": [{"target": "pump-design", "nature": "refines"}],
//!   "volumetric": [{
//!     "phase_from": "operation", "phase_to": "renovation",
//!     "level_from": "building", "level_to": "room",
//!     "aspect_from": "building_services", "aspect_to": "energy"
//!   }]
//! }
//! ```
//!
//! The payload is checked against this shape field by field so that a single
//! report names every violation.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use rasaeco_shared::Issue;

/// Matches the opening delimiter; attributes are ignored.
static OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*rasaeco-meta(\s[^>]*)?>").expect("meta open regex"));

/// Matches the closing delimiter.
static CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*/\s*rasaeco-meta\s*>").expect("meta close regex"));

const META_FIELDS: &[&str] = &["identifier", "title", "contact", "relations", "volumetric"];
const RELATION_FIELDS: &[&str] = &["target", "nature"];
const VOLUMETRIC_FIELDS: &[&str] = &[
    "aspect_from",
    "aspect_to",
    "phase_from",
    "phase_to",
    "level_from",
    "level_to",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Parsed metadata of one scenario document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaBlock {
    pub identifier: String,
    pub title: String,
    pub contact: String,
    pub relations: Vec<RelationEntry>,
    pub volumetric: Vec<VolumetricEntry>,
    /// Byte span of the whole block, delimiters included.
    pub span: Range<usize>,
}

/// A declared relation to another scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEntry {
    pub target: String,
    pub nature: String,
}

/// A declared cubelet, not yet checked against the axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumetricEntry {
    pub aspect_from: String,
    pub aspect_to: String,
    pub phase_from: String,
    pub phase_to: String,
    pub level_from: String,
    pub level_to: String,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Locate, parse and validate the metadata block of `text`.
pub fn extract_meta(text: &str) -> Result<MetaBlock, Issue> {
    let open = OPEN_RE.find(text).ok_or(Issue::MissingOpenDelimiter)?;
    let close = CLOSE_RE.find(text).ok_or(Issue::MissingCloseDelimiter)?;

    if open.end() > close.start() {
        return Err(Issue::DelimiterOrder);
    }

    let second = OPEN_RE.find_at(text, close.end()).map(|m| m.start());
    let stray_close = CLOSE_RE.find_at(text, close.end()).map(|m| m.start());
    if let Some(start) = second.or(stray_close) {
        return Err(Issue::DuplicateMetaBlock {
            line: text[..start].matches('\n').count() + 1,
        });
    }

    let payload = &text[open.end()..close.start()];
    let value: Value = serde_json::from_str(payload).map_err(|err| {
        let preceding_lines = text[..open.end()].matches('\n').count();
        Issue::MalformedMetaSyntax {
            line: err.line() + preceding_lines,
            message: strip_location(&err.to_string()),
        }
    })?;

    let mut violations = Vec::new();
    let meta = check_meta(&value, &mut violations);
    match meta {
        Some(mut meta) if violations.is_empty() => {
            meta.span = open.start()..close.end();
            Ok(meta)
        }
        _ => Err(Issue::SchemaMismatch { fields: violations }),
    }
}

/// Remove the block at `span` from `text`.
pub fn excise(text: &str, span: &Range<usize>) -> String {
    let mut out = String::with_capacity(text.len() - span.len());
    out.push_str(&text[..span.start]);
    out.push_str(&text[span.end..]);
    out
}

/// `serde_json` appends " at line L column C"; the line is reported separately.
fn strip_location(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(pos) => message[..pos].to_string(),
        None => message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Schema checks
// ---------------------------------------------------------------------------

fn check_meta(value: &Value, violations: &mut Vec<String>) -> Option<MetaBlock> {
    let map = check_object(value, "", META_FIELDS, violations)?;

    let identifier = string_field(map, "", "identifier", violations);
    let title = string_field(map, "", "title", violations);
    let contact = string_field(map, "", "contact", violations);

    let relations = list_field(map, "", "relations", violations).map(|items| {
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| check_relation(item, &format!("relations[{i}]"), violations))
            .collect::<Vec<_>>()
    });

    let volumetric = list_field(map, "", "volumetric", violations).map(|items| {
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                check_volumetric(item, &format!("volumetric[{i}]"), violations)
            })
            .collect::<Vec<_>>()
    });

    Some(MetaBlock {
        identifier: identifier?,
        title: title?,
        contact: contact?,
        relations: relations?,
        volumetric: volumetric?,
        span: 0..0,
    })
}

fn check_relation(value: &Value, path: &str, violations: &mut Vec<String>) -> Option<RelationEntry> {
    let map = check_object(value, path, RELATION_FIELDS, violations)?;
    let target = string_field(map, path, "target", violations);
    let nature = string_field(map, path, "nature", violations);
    Some(RelationEntry {
        target: target?,
        nature: nature?,
    })
}

fn check_volumetric(
    value: &Value,
    path: &str,
    violations: &mut Vec<String>,
) -> Option<VolumetricEntry> {
    let map = check_object(value, path, VOLUMETRIC_FIELDS, violations)?;
    let mut field = |name: &str| string_field(map, path, name, violations);
    let aspect_from = field("aspect_from");
    let aspect_to = field("aspect_to");
    let phase_from = field("phase_from");
    let phase_to = field("phase_to");
    let level_from = field("level_from");
    let level_to = field("level_to");
    Some(VolumetricEntry {
        aspect_from: aspect_from?,
        aspect_to: aspect_to?,
        phase_from: phase_from?,
        phase_to: phase_to?,
        level_from: level_from?,
        level_to: level_to?,
    })
}

/// Check that `value` is an object with exactly `fields`. Missing and
/// unexpected fields are reported; the object is returned whenever it is one.
fn check_object<'a>(
    value: &'a Value,
    path: &str,
    fields: &[&str],
    violations: &mut Vec<String>,
) -> Option<&'a Map<String, Value>> {
    let Some(map) = value.as_object() else {
        let at = if path.is_empty() { "meta" } else { path };
        violations.push(format!("{at}: expected an object, got {}", kind_of(value)));
        return None;
    };

    let prefix = if path.is_empty() {
        String::new()
    } else {
        format!("{path}: ")
    };
    for field in fields {
        if !map.contains_key(*field) {
            violations.push(format!("{prefix}missing field {field:?}"));
        }
    }
    for key in map.keys() {
        if !fields.contains(&key.as_str()) {
            violations.push(format!("{prefix}unexpected field {key:?}"));
        }
    }

    Some(map)
}

/// A string field; `None` when missing (already reported) or mistyped.
fn string_field(
    map: &Map<String, Value>,
    path: &str,
    field: &str,
    violations: &mut Vec<String>,
) -> Option<String> {
    match map.get(field)? {
        Value::String(s) => Some(s.clone()),
        other => {
            violations.push(format!(
                "{}: expected a string, got {}",
                field_path(path, field),
                kind_of(other)
            ));
            None
        }
    }
}

fn list_field<'a>(
    map: &'a Map<String, Value>,
    path: &str,
    field: &str,
    violations: &mut Vec<String>,
) -> Option<&'a Vec<Value>> {
    match map.get(field)? {
        Value::Array(items) => Some(items),
        other => {
            violations.push(format!(
                "{}: expected a list, got {}",
                field_path(path, field),
                kind_of(other)
            ));
            None
        }
    }
}

fn field_path(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"# Pumps

<rasaeco-meta>
{
    "identifier": "pumps",
    "title": "Pumps",
    "contact": "jane@example.com",
    "relations": [{"target": "valves", "nature": "refines"}],
    "volumetric": [{
        "aspect_from": "structure", "aspect_to": "energy",
        "phase_from": "design", "phase_to": "operation",
        "level_from": "building", "level_to": "room"
    }]
}
</rasaeco-meta>

Body text.
"#;

    #[test]
    fn extracts_valid_block() {
        let meta = extract_meta(VALID).expect("valid meta");
        assert_eq!(meta.identifier, "pumps");
        assert_eq!(meta.contact, "jane@example.com");
        assert_eq!(
            meta.relations,
            vec![RelationEntry {
                target: "valves".into(),
                nature: "refines".into()
            }]
        );
        assert_eq!(meta.volumetric[0].phase_to, "operation");
        assert!(VALID[meta.span.clone()].starts_with("<rasaeco-meta>"));
        assert!(VALID[meta.span.clone()].ends_with("</rasaeco-meta>"));
    }

    #[test]
    fn excise_removes_the_block() {
        let meta = extract_meta(VALID).unwrap();
        let rest = excise(VALID, &meta.span);
        assert!(!rest.contains("rasaeco-meta"));
        assert!(rest.starts_with("# Pumps\n\n"));
        assert!(rest.ends_with("Body text.\n"));
    }

    #[test]
    fn opening_attributes_and_whitespace_are_tolerated() {
        let text = "< rasaeco-meta version=\"1\">{\"identifier\": \"a\", \"title\": \"A\", \
                    \"contact\": \"c\", \"relations\": [], \"volumetric\": []}< / rasaeco-meta >";
        assert_eq!(extract_meta(text).unwrap().identifier, "a");
    }

    #[test]
    fn missing_delimiters() {
        assert_eq!(extract_meta("no meta"), Err(Issue::MissingOpenDelimiter));
        assert_eq!(
            extract_meta("<rasaeco-meta>{}"),
            Err(Issue::MissingCloseDelimiter)
        );
        assert_eq!(
            extract_meta("</rasaeco-meta> <rasaeco-meta>"),
            Err(Issue::DelimiterOrder)
        );
    }

    #[test]
    fn second_meta_block_is_rejected() {
        let block = "<rasaeco-meta>{\"identifier\": \"a\", \"title\": \"A\", \"contact\": \"c\", \
                     \"relations\": [], \"volumetric\": []}</rasaeco-meta>";
        assert!(extract_meta(block).is_ok());
        assert_eq!(
            extract_meta(&format!("{block}\n\ntext\n{block}\n")),
            Err(Issue::DuplicateMetaBlock { line: 4 })
        );
        assert_eq!(
            extract_meta(&format!("{block}\n</rasaeco-meta>")),
            Err(Issue::DuplicateMetaBlock { line: 2 })
        );
    }

    #[test]
    fn syntax_error_reports_document_line() {
        let text = "line one\nline two\n<rasaeco-meta>\n{\n  \"identifier\": ,\n}\n</rasaeco-meta>\n";
        match extract_meta(text) {
            Err(Issue::MalformedMetaSyntax { line, message }) => {
                // Payload line 3 (`"identifier": ,`) is document line 5.
                assert_eq!(line, 5);
                assert!(!message.contains("at line"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn schema_mismatch_lists_every_violation() {
        let text = r#"<rasaeco-meta>
{
    "identifier": 3,
    "contact": "c",
    "extra": true,
    "relations": [{"target": "x"}, "oops"],
    "volumetric": {}
}
</rasaeco-meta>"#;
        let Err(Issue::SchemaMismatch { fields }) = extract_meta(text) else {
            panic!("expected a schema mismatch");
        };
        assert!(fields.contains(&"missing field \"title\"".to_string()));
        assert!(fields.contains(&"unexpected field \"extra\"".to_string()));
        assert!(fields.contains(&"identifier: expected a string, got a number".to_string()));
        assert!(fields.contains(&"relations[0]: missing field \"nature\"".to_string()));
        assert!(fields.contains(&"relations[1]: expected an object, got a string".to_string()));
        assert!(fields.contains(&"volumetric: expected a list, got an object".to_string()));
        assert_eq!(fields.len(), 6);
    }

    #[test]
    fn mistyped_nested_field_is_named_with_its_path() {
        let text = r#"<rasaeco-meta>{"identifier": "a", "title": "A", "contact": "c",
            "relations": [],
            "volumetric": [{"aspect_from": "cost", "aspect_to": "cost",
                "phase_from": "design", "phase_to": 7,
                "level_from": "site", "level_to": "site"}]}</rasaeco-meta>"#;
        assert_eq!(
            extract_meta(text),
            Err(Issue::SchemaMismatch {
                fields: vec!["volumetric[0].phase_to: expected a string, got a number".into()]
            })
        );
    }

    #[test]
    fn non_object_payload_is_a_mismatch() {
        assert_eq!(
            extract_meta("<rasaeco-meta>[]</rasaeco-meta>"),
            Err(Issue::SchemaMismatch {
                fields: vec!["meta: expected an object, got a list".into()]
            })
        );
    }
}
