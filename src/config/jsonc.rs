//! JSON-with-comments exchange format for diagram configurations.
//!
//! Documents are parsed by stripping comments, merging the result onto the
//! kind's preset and deserializing. Fields unknown to this version ride
//! along in each struct's `extra` map, so parse → serialize is lossless.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::diagram::{
    CallConfiguration, DiagramConfig, DiagramConfiguration, FlowConfiguration,
    StructureConfiguration, PRESET_VERSION,
};
use super::details::{Aggregation, EdgeMode};
use crate::diagram::DiagramKind;
use crate::error::{Result, TrellisError, Warning};

const METADATA_START: &str = "/' diagram meta data start";
const METADATA_END: &str = "diagram meta data end '/";

/// Remove `//` line comments and `/* */` block comments outside strings.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    previous = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Overlay `user` onto `defaults`. Objects merge key by key, everything
/// else in `user` replaces the default. Keys only `user` has are kept.
pub fn merge_with_defaults(user: Value, defaults: Value) -> Value {
    match (user, defaults) {
        (Value::Object(user), Value::Object(mut defaults)) => {
            for (key, value) in user {
                let merged = match defaults.remove(&key) {
                    Some(default) => merge_with_defaults(value, default),
                    None => value,
                };
                defaults.insert(key, merged);
            }
            Value::Object(defaults)
        }
        (user, _) => user,
    }
}

/// Parse a commented JSON document into a configuration, filling missing
/// fields from the kind's preset.
pub fn parse_config<C: DiagramConfig>(text: &str) -> Result<(C, Vec<Warning>)> {
    let stripped = strip_comments(text);
    let user: Value = if stripped.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(&stripped)
            .map_err(|e| TrellisError::Config(format!("{}: {}", C::NAME, e)))?
    };
    if !user.is_object() {
        return Err(TrellisError::Config(format!(
            "{}: expected a JSON object",
            C::NAME
        )));
    }

    let defaults = serde_json::to_value(C::preset())?;
    let merged = merge_with_defaults(user, defaults);
    let config: C = serde_json::from_value(merged)
        .map_err(|e| TrellisError::Config(format!("{}: {}", C::NAME, e)))?;

    let mut warnings = Vec::new();
    if config.version() > PRESET_VERSION {
        warn!(
            version = config.version(),
            supported = PRESET_VERSION,
            "configuration written by a newer version"
        );
        warnings.push(Warning::configuration(format!(
            "{} version {} is newer than supported version {}",
            C::NAME,
            config.version(),
            PRESET_VERSION
        )));
    }
    debug!(config = C::NAME, "configuration parsed");
    Ok((config, warnings))
}

/// Serialize a configuration as pretty JSON with explanatory comments.
pub fn to_commented_json<C: DiagramConfig>(config: &C) -> Result<String> {
    let pretty = serde_json::to_string_pretty(config)?;
    let lines: Vec<String> = pretty
        .lines()
        .map(|line| match comment_for(line) {
            Some(comment) => format!("{} // {}", line, comment),
            None => line.to_string(),
        })
        .collect();
    Ok(lines.join("\n"))
}

fn comment_for(line: &str) -> Option<String> {
    let key = line.trim_start().strip_prefix('"')?.split('"').next()?;
    let listing = |values: Vec<String>| values.join(", ");
    match key {
        "aggregation" => Some(listing(
            Aggregation::ALL.iter().map(ToString::to_string).collect(),
        )),
        "edgeMode" => Some(listing(EdgeMode::ALL.iter().map(ToString::to_string).collect())),
        "forwardDepth" | "backwardDepth" => Some("0 disables this direction".to_string()),
        "showPackageLevels" => Some("package segments kept for grouping".to_string()),
        "version" => Some(format!("preset version, current {}", PRESET_VERSION)),
        k if k.ends_with("Filter") => Some("';'-separated, '*' is a wildcard".to_string()),
        _ => None,
    }
}

// ─── Metadata Blocks ────────────────────────────────────────────

/// Wrap a configuration in the block embedded into generated diagrams.
pub fn metadata_block<C: DiagramConfig>(config: &C) -> Result<String> {
    Ok(format!(
        "{}\nconfig={};\n{}\n{}",
        METADATA_START,
        C::NAME,
        to_commented_json(config)?,
        METADATA_END
    ))
}

/// Find and parse the metadata block inside `text`.
pub fn parse_metadata_block(text: &str) -> Result<(DiagramConfiguration, Vec<Warning>)> {
    let start = text
        .find(METADATA_START)
        .ok_or_else(|| TrellisError::Config("no diagram metadata block found".to_string()))?;
    let body = &text[start + METADATA_START.len()..];
    let end = body
        .find(METADATA_END)
        .ok_or_else(|| TrellisError::Config("unterminated diagram metadata block".to_string()))?;
    let body = body[..end].trim_start();

    let header = body
        .lines()
        .next()
        .ok_or_else(|| TrellisError::Config("empty diagram metadata block".to_string()))?;
    let name = header
        .trim()
        .strip_prefix("config=")
        .map(|n| n.trim_end_matches(';').trim())
        .ok_or_else(|| TrellisError::Config(format!("missing config header in '{}'", header)))?;
    let json = &body[header.len()..];

    if name == CallConfiguration::NAME {
        parse_config::<CallConfiguration>(json).map(|(c, w)| (DiagramConfiguration::Call(c), w))
    } else if name == StructureConfiguration::NAME {
        parse_config::<StructureConfiguration>(json)
            .map(|(c, w)| (DiagramConfiguration::Structure(c), w))
    } else if name == FlowConfiguration::NAME {
        parse_config::<FlowConfiguration>(json).map(|(c, w)| (DiagramConfiguration::Flow(c), w))
    } else {
        Err(TrellisError::Config(format!(
            "unknown configuration type '{}'",
            name
        )))
    }
}

/// Parse a configuration of `kind` from either a bare document or text
/// carrying a metadata block. A block of another kind is an error.
pub fn parse_configuration(
    kind: DiagramKind,
    text: &str,
) -> Result<(DiagramConfiguration, Vec<Warning>)> {
    if text.contains(METADATA_START) {
        let (config, warnings) = parse_metadata_block(text)?;
        if config.kind() != kind {
            return Err(TrellisError::Config(format!(
                "expected a {} configuration, found {}",
                kind,
                config.kind()
            )));
        }
        return Ok((config, warnings));
    }
    match kind {
        DiagramKind::Call => parse_config::<CallConfiguration>(text)
            .map(|(c, w)| (DiagramConfiguration::Call(c), w)),
        DiagramKind::Structure => parse_config::<StructureConfiguration>(text)
            .map(|(c, w)| (DiagramConfiguration::Structure(c), w)),
        DiagramKind::Flow => parse_config::<FlowConfiguration>(text)
            .map(|(c, w)| (DiagramConfiguration::Flow(c), w)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_strip_comments_keeps_strings() {
        let text = r#"{
            // a line comment
            "pattern": "http://x/*y*/", /* block
            comment */ "n": 1
        }"#;
        let value: Value = serde_json::from_str(&strip_comments(text)).unwrap();
        assert_eq!(value, json!({ "pattern": "http://x/*y*/", "n": 1 }));
    }

    #[test]
    fn test_merge_with_defaults() {
        let defaults = json!({ "a": 1, "nested": { "x": true, "y": false } });
        let user = json!({ "nested": { "y": true }, "unknown": "kept" });
        assert_eq!(
            merge_with_defaults(user, defaults),
            json!({ "a": 1, "nested": { "x": true, "y": true }, "unknown": "kept" })
        );
    }

    #[test]
    fn test_parse_fills_from_preset() {
        let text = r#"{
            // only override what differs
            "graphTraversal": { "forwardDepth": 1 }
        }"#;
        let (config, warnings) = parse_config::<CallConfiguration>(text).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.graph_traversal.forward_depth, 1);
        assert_eq!(
            config.graph_traversal.backward_depth,
            CallConfiguration::preset().graph_traversal.backward_depth
        );
        assert_eq!(config.details, CallConfiguration::preset().details);
    }

    #[test]
    fn test_roundtrip_preserves_unknown_fields() {
        let text = r#"{
            "rendering": { "theme": "dark" },
            "graphRestriction": { "cutTests": false, "experimental": [1, 2] },
            "details": { "edgeMode": "MERGED" }
        }"#;
        let (config, _) = parse_config::<CallConfiguration>(text).unwrap();
        assert_eq!(config.details.edge_mode, EdgeMode::Merged);

        let rendered = to_commented_json(&config).unwrap();
        assert!(rendered.contains("// DIRECT, ORDERED, MERGED"));

        let (reparsed, _) = parse_config::<CallConfiguration>(&rendered).unwrap();
        assert_eq!(reparsed, config);
        assert_eq!(reparsed.extra["rendering"], json!({ "theme": "dark" }));
        assert_eq!(
            reparsed.graph_restriction.extra["experimental"],
            json!([1, 2])
        );
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let result = parse_config::<FlowConfiguration>("{ \"graphTraversal\": ");
        assert!(matches!(result, Err(TrellisError::Config(_))));
        let result = parse_config::<FlowConfiguration>("[1, 2]");
        assert!(matches!(result, Err(TrellisError::Config(_))));
    }

    #[test]
    fn test_newer_version_warns() {
        let (_, warnings) = parse_config::<StructureConfiguration>(r#"{ "version": 99 }"#).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_metadata_block_roundtrip() {
        let config = StructureConfiguration::preset();
        let diagram = format!("@startuml\n{}\n@enduml", metadata_block(&config).unwrap());
        let (parsed, warnings) = parse_metadata_block(&diagram).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(parsed, DiagramConfiguration::Structure(config));
    }

    #[test]
    fn test_metadata_block_unknown_type() {
        let text = format!("{}\nconfig=SequenceConfiguration;\n{{}}\n{}", METADATA_START, METADATA_END);
        assert!(parse_metadata_block(&text).is_err());
    }

    #[test]
    fn test_parse_configuration_by_kind() {
        let (config, _) = parse_configuration(DiagramKind::Flow, "{}").unwrap();
        assert_eq!(config, DiagramConfiguration::Flow(FlowConfiguration::preset()));

        let block = metadata_block(&CallConfiguration::preset()).unwrap();
        let (config, _) = parse_configuration(DiagramKind::Call, &block).unwrap();
        assert_eq!(config.kind(), DiagramKind::Call);
        assert!(matches!(
            parse_configuration(DiagramKind::Structure, &block),
            Err(TrellisError::Config(m)) if m.contains("found call")
        ));
    }
}
