//! Sentence reconstruction for legacy text annotations.
//!
//! The oldest annotation format only provides the description paragraph and one token
//! group per sentence, without the sentences themselves. Sentences are split on
//! punctuation, and the group list is patched until both counts agree. The patch is a
//! best-effort approximation and never fails.

use super::text_annotation::Token;

const STOPS: [char; 3] = ['.', '!', '?'];

/// Splits a paragraph on `.`, `!` or `?` followed by a space.
///
/// Each returned sentence ends with punctuation; a `.` is appended when missing.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if STOPS.contains(&c) && chars.peek() == Some(&' ') {
            chars.next();
            push_sentence(&mut sentences, std::mem::take(&mut current));
        }
    }
    push_sentence(&mut sentences, current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, mut sentence: String) {
    if sentence.is_empty() {
        return;
    }
    if !sentence.ends_with(STOPS) {
        sentence.push('.');
    }
    sentences.push(sentence);
}

/// Pads or merges token groups until there is exactly one per sentence.
///
/// With more sentences than groups, an empty group is inserted at the first sentence whose
/// candidate group shares no lemma with it. With more groups than sentences, the first two
/// groups are merged.
pub fn reconcile_groups(sentences: &[String], mut groups: Vec<Vec<Token>>) -> Vec<Vec<Token>> {
    if sentences.is_empty() {
        if !groups.is_empty() {
            tracing::debug!(groups = groups.len(), "dropping token groups without sentences");
        }
        return Vec::new();
    }

    while sentences.len() != groups.len() {
        if sentences.len() > groups.len() {
            let mut at = 0;
            for (i, sentence) in sentences.iter().enumerate() {
                at = i;
                if i >= groups.len() || !shares_lemma(sentence, &groups[i]) {
                    break;
                }
            }
            groups.insert(at, Vec::new());
        } else {
            let second = groups.remove(1);
            groups[0].extend(second);
        }
    }
    groups
}

fn shares_lemma(sentence: &str, group: &[Token]) -> bool {
    group
        .iter()
        .any(|token| sentence.contains(&token.lemma.replace('_', " ")))
}
