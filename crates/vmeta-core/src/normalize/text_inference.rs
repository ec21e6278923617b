//! Lexical inference documents: per time span, lemmas mapped to inferred classes.

use serde_json::Value;

use super::{Context, Parsed, strip_keys};
use crate::error::ParseError;
use crate::source::TimedEntry;

pub(super) fn parse(document: &Value, ctx: &Context<'_>) -> Result<Parsed, ParseError> {
    let data = document
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::missing("data"))?;

    let mut entries = Vec::with_capacity(data.len());
    for (index, raw) in data.iter().enumerate() {
        let entry = convert(raw, ctx).map_err(|e| e.in_entry(index))?;
        entries.push(entry);
    }

    Ok(Parsed {
        title: None,
        multi_region: false,
        entries,
        details: strip_keys(document, &["data"]),
    })
}

fn convert(raw: &Value, ctx: &Context<'_>) -> Result<TimedEntry, ParseError> {
    let (start, end) = ctx.bounds(ctx.entry_object(raw)?)?;

    let mut payload = raw.clone();
    if let Some(obj) = payload.as_object_mut() {
        obj.remove("TS");
    }
    let mappings = payload
        .get_mut("mappings")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| ParseError::missing("mappings"))?;
    for mapping in mappings {
        if mapping.get("lemma").and_then(Value::as_str).is_none() {
            return Err(ParseError::missing("lemma"));
        }
        let classes = mapping
            .get_mut("classes")
            .filter(|c| c.is_array())
            .ok_or_else(|| ParseError::missing("classes"))?;
        ctx.map_labels(classes);
    }

    Ok(TimedEntry::new(start, end, payload))
}

#[cfg(test)]
mod tests {
    use super::super::{SourceInput, normalize};
    use crate::config::AlignConfig;
    use crate::label_map::LabelMapper;
    use crate::source_kind::SourceKind;
    use crate::types::SourceId;
    use serde_json::json;

    fn input(document: serde_json::Value) -> SourceInput {
        SourceInput::new(
            SourceId::new("text_inference_1").unwrap(),
            SourceKind::TextInference,
            document,
        )
    }

    #[test]
    fn mappings_are_label_mapped() {
        let mapper = LabelMapper::new([("pet.*".to_string(), "animal".to_string())]).unwrap();
        let source = normalize(
            &input(json!({
                "model": "lexical-v2",
                "data": [{
                    "TS": ["T00:00:02", "T00:00:04"],
                    "mappings": [{"lemma": "dog", "classes": ["pet-dog", "wolf"], "scores": [0.8, 0.1]}]
                }]
            })),
            &AlignConfig::default(),
            Some(&mapper),
        )
        .unwrap();

        let entry = &source.entries[0];
        assert_eq!((entry.start_ms, entry.end_ms), (2000.0, 4000.0));
        assert_eq!(entry.payload["mappings"][0]["classes"], json!(["animal", "wolf"]));
        assert!(entry.payload.get("TS").is_none());
        assert_eq!(source.details, json!({"model": "lexical-v2"}));
    }

    #[test]
    fn mapping_requires_lemma() {
        let err = normalize(
            &input(json!({"data": [{"start": 0, "end": 1, "mappings": [{"classes": []}]}]})),
            &AlignConfig::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "entry 0: missing required field `lemma`");
    }
}
