//! Video action inference documents.
//!
//! Each prediction carries top-K `classes`/`scores`. With `multi_predictions` the
//! prediction instead holds `regions`, each with its own `bbox`, `classes` and `scores`.

use serde_json::Value;

use super::{Context, Parsed, strip_keys};
use crate::error::ParseError;
use crate::source::TimedEntry;

pub(super) fn parse(document: &Value, ctx: &Context<'_>) -> Result<Parsed, ParseError> {
    let predictions = document
        .get("predictions")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::missing("predictions"))?;
    let multi_region = document
        .get("multi_predictions")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut entries = Vec::with_capacity(predictions.len());
    for (index, raw) in predictions.iter().enumerate() {
        let entry = convert(raw, multi_region, ctx).map_err(|e| e.in_entry(index))?;
        entries.push(entry);
    }

    Ok(Parsed {
        title: None,
        multi_region,
        entries,
        details: strip_keys(document, &["predictions"]),
    })
}

fn convert(raw: &Value, multi_region: bool, ctx: &Context<'_>) -> Result<TimedEntry, ParseError> {
    let (start, end) = ctx.bounds(ctx.entry_object(raw)?)?;
    let mut payload = raw.clone();

    if multi_region {
        let regions = payload
            .get_mut("regions")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| ParseError::missing("regions"))?;
        for region in regions {
            map_classes(region, ctx)?;
        }
    } else {
        map_classes(&mut payload, ctx)?;
    }

    Ok(TimedEntry::new(start, end, payload))
}

fn map_classes(prediction: &mut Value, ctx: &Context<'_>) -> Result<(), ParseError> {
    let classes = prediction
        .get_mut("classes")
        .filter(|c| c.is_array())
        .ok_or_else(|| ParseError::missing("classes"))?;
    ctx.map_labels(classes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::{SourceInput, normalize};
    use crate::config::AlignConfig;
    use crate::error::ParseError;
    use crate::label_map::LabelMapper;
    use crate::source::Source;
    use crate::source_kind::SourceKind;
    use crate::types::SourceId;
    use serde_json::{Value, json};

    fn run(document: Value, mapper: Option<&LabelMapper>) -> Result<Source, ParseError> {
        let input = SourceInput::new(
            SourceId::new("video_inference_1").unwrap(),
            SourceKind::VideoInference,
            document,
        );
        normalize(&input, &AlignConfig::default(), mapper)
    }

    #[test]
    fn seconds_become_milliseconds() {
        let source = run(
            json!({"predictions": [{"start": 1.2345, "end": 2.5, "classes": ["walk"], "scores": [0.9]}]}),
            None,
        )
        .unwrap();
        assert_eq!(source.entries[0].start_ms, 1234.5);
        assert_eq!(source.entries[0].end_ms, 2500.0);
        assert!(!source.multi_region);
    }

    #[test]
    fn labels_are_mapped() {
        let mapper =
            LabelMapper::new([("carry/hold (an object)".to_string(), "carry".to_string())])
                .unwrap();
        let source = run(
            json!({"predictions": [{
                "start": 0, "end": 1,
                "classes": ["carry/hold (an object)", "sit"],
                "scores": [0.7, 0.2]
            }]}),
            Some(&mapper),
        )
        .unwrap();
        assert_eq!(source.entries[0].payload["classes"], json!(["carry", "sit"]));
    }

    #[test]
    fn multi_region_labels_are_mapped_per_region() {
        let mapper = LabelMapper::new([("sit".to_string(), "rest".to_string())]).unwrap();
        let source = run(
            json!({
                "multi_predictions": true,
                "predictions": [{
                    "start": 0, "end": 1,
                    "regions": [
                        {"bbox": [0, 0, 10, 10], "classes": ["sit"], "scores": [0.5]},
                        {"bbox": [5, 5, 20, 20], "classes": ["run"], "scores": [0.4]}
                    ]
                }]
            }),
            Some(&mapper),
        )
        .unwrap();
        assert!(source.multi_region);
        assert_eq!(source.entries[0].regions().len(), 2);
        let regions = source.entries[0].regions();
        assert_eq!(regions[0]["classes"], json!(["rest"]));
        assert_eq!(regions[1]["classes"], json!(["run"]));
    }

    #[test]
    fn multi_region_requires_regions() {
        let err = run(
            json!({"multi_predictions": true, "predictions": [{"start": 0, "end": 1}]}),
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "entry 0: missing required field `regions`");
    }

    #[test]
    fn missing_predictions() {
        let err = run(json!({"results": []}), None).unwrap_err();
        assert_eq!(err, ParseError::missing("predictions"));
    }
}
