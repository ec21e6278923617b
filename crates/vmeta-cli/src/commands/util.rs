//! Shared utilities for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use vmeta_core::time::format_timestamp;
use vmeta_core::{
    LabelMapper, SlotState, Source, SourceId, SourceInput, SourceKind, Timeline, normalize_all,
};

use crate::Config;
use crate::cli::SourceArgs;

/// Whether `path` names a YAML file.
pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Reads a JSON or YAML document, chosen by extension.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON in {}", path.display()))
    }
}

/// Loads the label mapping from `--mapping`, falling back to the configured table.
pub fn load_mapper(args: &SourceArgs, config: &Config) -> Result<Option<LabelMapper>> {
    let Some(path) = args.mapping.as_ref().or(config.mapping_path.as_ref()) else {
        return Ok(None);
    };
    let document = load_document(path)?;
    let mapper = LabelMapper::from_document(&document)
        .with_context(|| format!("invalid label mapping in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded label mapping");
    Ok(Some(mapper))
}

/// Pairs every requested file with its kind and source ID.
///
/// Dedicated flags come before `--source` documents of the same kind. Single-source kinds
/// use the kind name as ID; repeatable kinds are numbered from 1.
pub fn requested_sources(args: &SourceArgs) -> Result<Vec<(SourceId, SourceKind, PathBuf)>> {
    let mut requested = Vec::new();
    for kind in SourceKind::ALL {
        let flagged: Vec<&PathBuf> = match kind {
            SourceKind::VideoDescription => args.video_description.iter().collect(),
            SourceKind::TextAnnotation => args.text_annotation.iter().collect(),
            SourceKind::VideoInference => args.video_inference.iter().collect(),
            SourceKind::TextInference => args.text_inference.iter().collect(),
        };
        let paths: Vec<&PathBuf> = flagged
            .into_iter()
            .chain(args.sources.iter().filter(|s| s.kind == kind).map(|s| &s.path))
            .collect();

        if !kind.allows_multiple() {
            if paths.len() > 1 {
                bail!("{kind} takes a single document, got {}", paths.len());
            }
            if let Some(path) = paths.first() {
                requested.push((SourceId::new(kind.as_str())?, kind, (*path).clone()));
            }
            continue;
        }
        for (n, path) in paths.into_iter().enumerate() {
            let id = SourceId::new(format!("{kind}_{}", n + 1))?;
            requested.push((id, kind, path.clone()));
        }
    }
    Ok(requested)
}

/// Loads and normalizes every requested source.
///
/// A file that cannot be read or parsed is logged and becomes an absent source, like a
/// document the engine rejects.
pub fn load_sources(
    args: &SourceArgs,
    config: &Config,
) -> Result<(Vec<Source>, Option<LabelMapper>)> {
    let mapper = load_mapper(args, config)?;
    let inputs: Vec<SourceInput> = requested_sources(args)?
        .into_iter()
        .map(|(id, kind, path)| {
            let document = load_document(&path).unwrap_or_else(|e| {
                let error = format!("{e:#}");
                tracing::warn!(source = %id, %error, "failed to load metadata document");
                Value::Null
            });
            SourceInput::new(id, kind, document)
        })
        .collect();

    if inputs.is_empty() {
        tracing::warn!("no metadata documents given");
    }

    let sources = normalize_all(&inputs, &config.align(), mapper.as_ref());
    Ok((sources, mapper))
}

/// One-line text of a payload.
pub fn summarize(payload: &Value) -> String {
    if let Some(vd) = payload.get("vd").and_then(Value::as_str) {
        return vd.to_string();
    }
    if let Some(classes) = payload.get("classes").and_then(Value::as_array) {
        return join_labels(classes);
    }
    if let Some(annotations) = payload.get("annotations").and_then(Value::as_array) {
        return annotations
            .iter()
            .filter_map(|a| a.get("sentence").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" ");
    }
    if let Some(mappings) = payload.get("mappings").and_then(Value::as_array) {
        return mappings
            .iter()
            .map(|m| {
                let lemma = m.get("lemma").and_then(Value::as_str).unwrap_or("?");
                let classes = m
                    .get("classes")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .map(join_labels)
                    .unwrap_or_default();
                format!("{lemma}: {classes}")
            })
            .collect::<Vec<_>>()
            .join("; ");
    }
    payload.to_string()
}

fn join_labels(labels: &[Value]) -> String {
    labels
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display lines for every slot of the timeline, in its current state.
pub fn slot_lines(timeline: &Timeline) -> Vec<String> {
    timeline
        .slots()
        .iter()
        .map(|slot| {
            let label = match slot.region {
                Some(region) => format!("{}#{}", slot.source.id, region + 1),
                None => slot.source.id.to_string(),
            };
            let text = match slot.state {
                SlotState::Entry { entry, region, .. } => format!(
                    "[{} - {}] {}",
                    format_timestamp(entry.start_ms),
                    format_timestamp(entry.end_ms),
                    summarize(region.unwrap_or(&entry.payload))
                ),
                other => other.placeholder().unwrap_or_default().to_string(),
            };
            format!("{label}: {text}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SourceSpec;
    use serde_json::json;

    #[test]
    fn yaml_is_detected_by_extension() {
        assert!(is_yaml(Path::new("a.yaml")));
        assert!(is_yaml(Path::new("a.YML")));
        assert!(!is_yaml(Path::new("a.json")));
        assert!(!is_yaml(Path::new("yaml")));
    }

    #[test]
    fn yaml_and_json_load_the_same_document() {
        let temp = tempfile::tempdir().unwrap();
        let json_path = temp.path().join("doc.json");
        let yaml_path = temp.path().join("doc.yml");
        std::fs::write(&json_path, r#"{"predictions": [{"start": 0, "end": 1.5}]}"#).unwrap();
        std::fs::write(&yaml_path, "predictions:\n  - start: 0\n    end: 1.5\n").unwrap();

        assert_eq!(
            load_document(&json_path).unwrap(),
            load_document(&yaml_path).unwrap()
        );
    }

    #[test]
    fn source_ids_number_repeatable_kinds() {
        let args = SourceArgs {
            video_description: Some(PathBuf::from("vd.json")),
            video_inference: vec![PathBuf::from("a.json"), PathBuf::from("b.json")],
            ..SourceArgs::default()
        };
        let ids: Vec<String> = requested_sources(&args)
            .unwrap()
            .into_iter()
            .map(|(id, _, _)| id.to_string())
            .collect();
        assert_eq!(
            ids,
            ["video_description", "video_inference_1", "video_inference_2"]
        );
    }

    #[test]
    fn kind_tagged_sources_follow_dedicated_flags() {
        let spec = |s: &str| s.parse::<SourceSpec>().unwrap();
        let args = SourceArgs {
            video_inference: vec![PathBuf::from("a.json")],
            sources: vec![spec("vi=b.json"), spec("text_annotation=ta.yaml")],
            ..SourceArgs::default()
        };
        let requested: Vec<(String, SourceKind, PathBuf)> = requested_sources(&args)
            .unwrap()
            .into_iter()
            .map(|(id, kind, path)| (id.to_string(), kind, path))
            .collect();
        assert_eq!(
            requested,
            [
                (
                    "text_annotation".to_string(),
                    SourceKind::TextAnnotation,
                    PathBuf::from("ta.yaml")
                ),
                (
                    "video_inference_1".to_string(),
                    SourceKind::VideoInference,
                    PathBuf::from("a.json")
                ),
                (
                    "video_inference_2".to_string(),
                    SourceKind::VideoInference,
                    PathBuf::from("b.json")
                ),
            ]
        );
    }

    #[test]
    fn single_source_kinds_take_one_document() {
        let args = SourceArgs {
            video_description: Some(PathBuf::from("vd.json")),
            sources: vec!["vd=other.json".parse().unwrap()],
            ..SourceArgs::default()
        };
        let err = requested_sources(&args).unwrap_err();
        assert_eq!(
            err.to_string(),
            "video_description takes a single document, got 2"
        );
    }

    #[test]
    fn unreadable_files_become_absent_sources() {
        let args = SourceArgs {
            text_annotation: Some(PathBuf::from("/nonexistent/ta.json")),
            ..SourceArgs::default()
        };
        let (sources, mapper) = load_sources(&args, &Config::default()).unwrap();
        assert!(mapper.is_none());
        assert_eq!(sources.len(), 1);
        assert!(sources[0].is_empty());
    }

    #[test]
    fn payload_summaries() {
        assert_eq!(summarize(&json!({"vd": "A dog runs."})), "A dog runs.");
        assert_eq!(
            summarize(&json!({"classes": ["run", "walk"], "scores": [0.6, 0.3]})),
            "run, walk"
        );
        assert_eq!(
            summarize(&json!({"annotations": [{"sentence": "A dog.", "tokens": []}, {"sentence": "It runs.", "tokens": []}]})),
            "A dog. It runs."
        );
        assert_eq!(
            summarize(&json!({"mappings": [{"lemma": "dog", "classes": ["animal"]}, {"lemma": "run", "classes": ["move", "sport"]}]})),
            "dog: animal; run: move, sport"
        );
        assert_eq!(summarize(&json!({"x": 1})), r#"{"x":1}"#);
    }
}
