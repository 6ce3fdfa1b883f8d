use crate::models::{LabelBasis, SourceLabel, TemplateStack, LOCAL_SOURCE};

/// Label shown for objects owned by the device itself
pub const LOCAL_LABEL: &str = "local configuration";

/// Label used when no stack contains the owning template
pub const DEFAULT_FALLBACK_LABEL: &str = "Template Stack";

const EDGE_KEYWORDS: &[&str] = &["edge", "border", "perimeter", "boundary", "branch", "wan"];
const CORE_KEYWORDS: &[&str] = &["core", "datacenter", "data-center", "dc", "spine"];

/// Determine which stack an object is presented under.
///
/// Pure and deterministic: candidate order is the only tie-breaker, so
/// repeated calls with the same inputs return the same label.
pub fn resolve_label(
    source_template_id: &str,
    candidate_stacks: &[&TemplateStack],
    hints: &[&str],
    fallback_label: &str,
) -> SourceLabel {
    if source_template_id == LOCAL_SOURCE {
        return SourceLabel {
            label: LOCAL_LABEL.to_string(),
            is_ambiguous: false,
            stack_id: None,
            basis: LabelBasis::Local,
        };
    }

    let matches: Vec<&TemplateStack> = candidate_stacks
        .iter()
        .copied()
        .filter(|s| s.contains_template(source_template_id))
        .collect();

    match matches.as_slice() {
        [] => {
            tracing::warn!(
                "Template {} is not part of any candidate stack, using fallback label",
                source_template_id
            );
            SourceLabel {
                label: fallback_label.to_string(),
                is_ambiguous: false,
                stack_id: None,
                basis: LabelBasis::Fallback,
            }
        }
        [only] => labelled(only, false, LabelBasis::Unique),
        [first, ..] => match pick_by_hint(&matches, hints) {
            Some(stack) => labelled(stack, false, LabelBasis::Heuristic),
            None => labelled(first, true, LabelBasis::FirstCandidate),
        },
    }
}

fn labelled(stack: &TemplateStack, is_ambiguous: bool, basis: LabelBasis) -> SourceLabel {
    SourceLabel {
        label: stack.name.clone(),
        is_ambiguous,
        stack_id: Some(stack.id.clone()),
        basis,
    }
}

/// Keyword tie-break: an object hinting at an edge (or core) role prefers
/// the first stack whose name carries the same role. Edge is checked first.
fn pick_by_hint<'a>(stacks: &[&'a TemplateStack], hints: &[&str]) -> Option<&'a TemplateStack> {
    let hints: Vec<String> = hints.iter().map(|h| h.to_lowercase()).collect();

    for keywords in [EDGE_KEYWORDS, CORE_KEYWORDS] {
        if !hints.iter().any(|h| mentions(h, keywords)) {
            continue;
        }
        if let Some(stack) = stacks
            .iter()
            .copied()
            .find(|s| mentions(&s.name.to_lowercase(), keywords))
        {
            return Some(stack);
        }
    }
    None
}

/// Keyword match on word-ish boundaries so "dc" does not match "ddc01x"
/// but does match "dc1-fw" or "fw-dc".
fn mentions(text: &str, keywords: &[&str]) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|word| {
            let stem = word.trim_end_matches(|c: char| c.is_ascii_digit());
            keywords.iter().any(|k| {
                // multi-part keywords ("data-center") are matched as substrings
                if k.contains('-') {
                    text.contains(k)
                } else if k.len() <= 2 {
                    stem == *k
                } else {
                    word.contains(k)
                }
            })
        })
}
