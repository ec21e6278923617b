//! Linguistic text annotation documents.
//!
//! Annotation entries went through several format revisions. The revision is not tagged
//! in the documents, so it is detected per entry from the shape of its fields, most
//! structured shape first:
//!
//! - V4: `sentences: [{text, tokens: [{word, pos, lemma, type}]}]`
//! - V3: `annotations: [{sentence, tokens: [{pos, lemma, type}]}]`
//! - V2: `annotations: [{sentence, annot_sentence: [{POS, lemme, type}]}]`
//! - V1: `annotations: [[{POS, lemme, type}], ...]`, sentences only in the `vd` paragraph
//!
//! All of them become `{sentence, tokens: [{word?, pos, lemma, type}]}` groups.

use serde::Serialize;
use serde_json::{Map, Value};

use super::sentences::{reconcile_groups, split_sentences};
use super::{Context, Parsed, strip_keys};
use crate::error::ParseError;
use crate::source::TimedEntry;

/// One annotated word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    pub pos: String,
    pub lemma: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A sentence with its annotated tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedSentence {
    pub sentence: String,
    pub tokens: Vec<Token>,
}

/// Format revision of one annotation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSchema {
    V4,
    V3,
    V2,
    V1,
    /// No annotation at all, in any revision.
    Empty,
}

impl TextSchema {
    /// Detects the revision of an entry, `None` when no known shape matches.
    pub fn detect(entry: &Map<String, Value>) -> Option<Self> {
        if let Some(sentences) = entry.get("sentences").and_then(Value::as_array) {
            if sentences.iter().all(|s| has_keys(s, &["text", "tokens"])) {
                return Some(Self::V4);
            }
        }

        let annotations = entry.get("annotations")?.as_array()?;
        if annotations.is_empty() {
            return Some(Self::Empty);
        }
        if annotations.iter().all(|a| has_keys(a, &["sentence", "tokens"])) {
            return Some(Self::V3);
        }
        if annotations
            .iter()
            .all(|a| has_keys(a, &["sentence", "annot_sentence"]))
        {
            let all_empty = annotations
                .iter()
                .all(|a| a["annot_sentence"].as_array().is_some_and(Vec::is_empty));
            return Some(if all_empty { Self::Empty } else { Self::V2 });
        }
        if annotations.iter().all(Value::is_array) {
            return Some(Self::V1);
        }
        None
    }
}

fn has_keys(value: &Value, keys: &[&str]) -> bool {
    value
        .as_object()
        .is_some_and(|obj| keys.iter().all(|k| obj.contains_key(*k)))
}

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
    let obj = ctx.entry_object(raw)?;
    let (start, end) = ctx.bounds(obj)?;

    let schema = TextSchema::detect(obj)
        .ok_or_else(|| ParseError::unrecognized(ctx.kind, "unknown annotation layout"))?;
    let sentences = match schema {
        TextSchema::V4 => from_v4(obj, ctx)?,
        TextSchema::V3 => from_v3(obj, ctx)?,
        TextSchema::V2 => from_v2(obj, ctx)?,
        TextSchema::V1 => from_v1(obj, ctx)?,
        TextSchema::Empty => Vec::new(),
    };

    let mut payload: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "annotations" | "sentences" | "vd" | "TS"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let annotations = serde_json::to_value(&sentences)
        .map_err(|e| ParseError::unrecognized(ctx.kind, e.to_string()))?;
    payload.insert("annotations".to_string(), annotations);

    Ok(TimedEntry::new(start, end, Value::Object(payload)))
}

fn from_v4(obj: &Map<String, Value>, ctx: &Context<'_>) -> Result<Vec<AnnotatedSentence>, ParseError> {
    items(obj, "sentences")?
        .iter()
        .map(|s| sentence(s, "text", "tokens", ctx))
        .collect()
}

fn from_v3(obj: &Map<String, Value>, ctx: &Context<'_>) -> Result<Vec<AnnotatedSentence>, ParseError> {
    items(obj, "annotations")?
        .iter()
        .map(|s| sentence(s, "sentence", "tokens", ctx))
        .collect()
}

fn from_v2(obj: &Map<String, Value>, ctx: &Context<'_>) -> Result<Vec<AnnotatedSentence>, ParseError> {
    let sentences: Vec<AnnotatedSentence> = items(obj, "annotations")?
        .iter()
        .map(|s| sentence(s, "sentence", "annot_sentence", ctx))
        .collect::<Result<_, _>>()?;

    // annotated sentences are kept as-is, only report how the legacy split would differ
    if tracing::enabled!(tracing::Level::DEBUG) {
        let paragraph = obj.get("vd").and_then(Value::as_str).unwrap_or_default();
        let split = split_sentences(paragraph);
        let annotated: Vec<&str> = sentences.iter().map(|s| s.sentence.as_str()).collect();
        if split != annotated {
            tracing::debug!(?split, ?annotated, "annotated sentences differ from split paragraph");
        }
    }
    Ok(sentences)
}

fn from_v1(obj: &Map<String, Value>, ctx: &Context<'_>) -> Result<Vec<AnnotatedSentence>, ParseError> {
    let groups = items(obj, "annotations")?
        .iter()
        .map(|group| tokens(group, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    let paragraph = obj.get("vd").and_then(Value::as_str).unwrap_or_default();
    let sentences = split_sentences(paragraph);
    let groups = reconcile_groups(&sentences, groups);

    Ok(sentences
        .into_iter()
        .zip(groups)
        .map(|(sentence, tokens)| AnnotatedSentence { sentence, tokens })
        .collect())
}

fn items<'o>(obj: &'o Map<String, Value>, key: &str) -> Result<&'o Vec<Value>, ParseError> {
    obj.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::missing(key))
}

fn sentence(
    raw: &Value,
    text_key: &str,
    tokens_key: &str,
    ctx: &Context<'_>,
) -> Result<AnnotatedSentence, ParseError> {
    let text = raw
        .get(text_key)
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::missing(text_key))?;
    let list = raw
        .get(tokens_key)
        .ok_or_else(|| ParseError::missing(tokens_key))?;
    Ok(AnnotatedSentence {
        sentence: text.to_string(),
        tokens: tokens(list, ctx)?,
    })
}

fn tokens(list: &Value, ctx: &Context<'_>) -> Result<Vec<Token>, ParseError> {
    list.as_array()
        .ok_or_else(|| ParseError::unrecognized(ctx.kind, "token groups must be lists"))?
        .iter()
        .map(|raw| token(raw, ctx))
        .collect()
}

fn token(raw: &Value, ctx: &Context<'_>) -> Result<Token, ParseError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ParseError::unrecognized(ctx.kind, "tokens must be objects"))?;
    Ok(Token {
        word: field(obj, &["word", "text"]).ok().map(str::to_string),
        pos: field(obj, &["pos", "POS"])?.to_string(),
        lemma: field(obj, &["lemma", "lemme"])?.to_string(),
        kind: ctx.map_label(field(obj, &["type"])?),
    })
}

/// First present string among alternative field names.
fn field<'o>(obj: &'o Map<String, Value>, names: &[&str]) -> Result<&'o str, ParseError> {
    names
        .iter()
        .find_map(|name| obj.get(*name).and_then(Value::as_str))
        .ok_or_else(|| ParseError::missing(names[0]))
}
