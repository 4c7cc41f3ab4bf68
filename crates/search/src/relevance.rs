use toolbelt_index::{tokenize, MatchMode};

/// Normalized Levenshtein similarity in `[0, 1]`
///
/// `1 - distance / max_len`; two empty strings are identical.
#[must_use]
pub fn normalized_levenshtein(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// Does one query token match field content under a mode?
///
/// This is the authoritative check behind the text criterion; the text
/// index only pre-prunes candidates.
#[must_use]
pub(crate) fn token_matches(token: &str, texts: &[String], mode: MatchMode) -> bool {
    match mode {
        MatchMode::Exact => texts
            .iter()
            .any(|text| tokenize(text).iter().any(|t| t == token)),
        MatchMode::Contains => texts
            .iter()
            .any(|text| text.to_lowercase().contains(token)),
        MatchMode::Fuzzy { threshold } => texts.iter().any(|text| {
            tokenize(text)
                .iter()
                .any(|t| normalized_levenshtein(token, t) >= f64::from(threshold))
        }),
    }
}

/// Tiered relevance of one query token against field content, in `[0, 1]`
///
/// Whole-token equality scores 1.0, a prefix hit 0.9, a substring hit
/// 0.75; otherwise the best token similarity that clears the fuzzy
/// threshold counts, capped at the prefix tier.
#[must_use]
pub(crate) fn token_relevance(token: &str, texts: &[String], fuzzy_threshold: f32) -> f64 {
    let mut best = 0.0_f64;
    for text in texts {
        let lower = text.to_lowercase();
        for field_token in tokenize(&lower) {
            if field_token == token {
                return 1.0;
            }
            if field_token.starts_with(token) {
                best = best.max(0.9);
                continue;
            }
            let similarity = normalized_levenshtein(token, &field_token);
            if similarity >= f64::from(fuzzy_threshold) {
                best = best.max(similarity.min(0.9));
            }
        }
        if lower.contains(token) {
            best = best.max(0.75);
        }
    }
    best
}

/// Blended relevance of a whole query against one field: mean of the
/// per-token bests
#[must_use]
pub(crate) fn field_relevance(tokens: &[String], texts: &[String], fuzzy_threshold: f32) -> f64 {
    if tokens.is_empty() || texts.is_empty() {
        return 0.0;
    }
    let total: f64 = tokens
        .iter()
        .map(|token| token_relevance(token, texts, fuzzy_threshold))
        .sum();
    total / tokens.len() as f64
}
