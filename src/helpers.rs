use strsim::levenshtein;

/// IDs further apart than this are not offered as suggestions.
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Find the closest ID to a mistyped one, if any is close enough.
pub fn find_similar_id<'a>(target: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, levenshtein(target, candidate)))
        .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(_, distance)| *distance)
        .map(|(id, _)| id)
}

/// True when the text has something other than whitespace in it.
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}
