//! Video description documents.

use serde_json::{Map, Value};

use super::{Context, Parsed, strip_keys};
use crate::error::ParseError;
use crate::source::TimedEntry;

const AUGMENTED: &str = "augmented_vd_metadata";
const STANDARD: &str = "standard_vd_metadata";

pub(super) fn parse(document: &Value, ctx: &Context<'_>) -> Result<Parsed, ParseError> {
    let list = select_entries(document, ctx)?;

    let mut entries = Vec::with_capacity(list.len());
    for (index, raw) in list.iter().enumerate() {
        let obj = ctx.entry_object(raw).map_err(|e| e.in_entry(index))?;
        let (start, end) = ctx.bounds(obj).map_err(|e| e.in_entry(index))?;
        entries.push(TimedEntry::new(start, end, raw.clone()));
    }

    Ok(Parsed {
        title: title(document),
        multi_region: false,
        entries,
        details: strip_keys(document, &[AUGMENTED, STANDARD]),
    })
}

/// Augmented descriptions are preferred; standard ones are the fallback.
fn select_entries<'d>(document: &'d Value, ctx: &Context<'_>) -> Result<&'d Vec<Value>, ParseError> {
    let augmented = document.get(AUGMENTED).and_then(Value::as_array);
    let standard = document.get(STANDARD).and_then(Value::as_array);

    match (augmented, standard) {
        (Some(list), _) if !list.is_empty() => {
            tracing::info!("retrieved augmented video-description metadata");
            Ok(list)
        }
        (_, Some(list)) => {
            tracing::info!("retrieved standard video-description metadata (augmented not provided)");
            Ok(list)
        }
        (Some(list), None) => Ok(list),
        (None, None) => Err(ParseError::unrecognized(
            ctx.kind,
            format!("neither `{AUGMENTED}` nor `{STANDARD}` is a list"),
        )),
    }
}

/// Builds `[collection] title - Episode N` from the `metadata_files` section.
fn title(document: &Value) -> Option<String> {
    let meta = document.get("metadata_files")?.as_object()?;
    let title = text(meta, "serie_name").or_else(|| text(meta, "film_export_subpath"))?;
    let collection = text(meta, "serie_collection_name")
        .or_else(|| text(meta, "film_collection_name"))
        .unwrap_or_default();
    let episode = match meta.get("serie_episode_number") {
        Some(Value::Number(n)) => format!(" - Episode {n}"),
        Some(Value::String(s)) if !s.is_empty() => format!(" - Episode {s}"),
        _ => String::new(),
    };
    Some(format!("[{collection}] {title}{episode}"))
}

fn text<'m>(meta: &'m Map<String, Value>, key: &str) -> Option<&'m str> {
    meta.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
