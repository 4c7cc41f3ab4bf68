use std::collections::{HashMap, HashSet};
use toolbelt_catalog::{TextField, Tool, ToolId};

/// How a text criterion matches field content
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchMode {
    /// Whole-token equality
    Exact,
    /// Substring containment
    Contains,
    /// Normalized similarity at or above the threshold, `0 < t <= 1`
    Fuzzy { threshold: f32 },
}

/// Lowercase tokens of a text: maximal alphanumeric runs
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Admissible candidate token lengths for a fuzzy query token
///
/// A similarity of at least `t` between strings of lengths `l` and `L`
/// requires `l` within `[ceil(L*t), floor(L/t)]`; anything outside can be
/// pruned without scoring.
#[must_use]
pub fn fuzzy_length_window(query_len: usize, threshold: f32) -> (usize, usize) {
    let len = query_len as f32;
    let min = (len * threshold).ceil() as usize;
    let max = (len / threshold).floor() as usize;
    (min.max(1), max)
}

/// Token buckets for one queryable field
#[derive(Debug, Default)]
struct FieldBuckets {
    exact: HashMap<String, HashSet<ToolId>>,
    by_len: HashMap<usize, HashSet<ToolId>>,
    by_char: HashMap<char, HashSet<ToolId>>,
    bigrams: HashMap<String, HashSet<ToolId>>,
    trigrams: HashMap<String, HashSet<ToolId>>,
}

impl FieldBuckets {
    fn insert(&mut self, id: ToolId, tokens: &HashSet<String>) {
        for token in tokens {
            let chars: Vec<char> = token.chars().collect();
            self.exact.entry(token.clone()).or_default().insert(id);
            self.by_len.entry(chars.len()).or_default().insert(id);
            for c in dedup_chars(&chars) {
                self.by_char.entry(c).or_default().insert(id);
            }
            for gram in grams(&chars, 2) {
                self.bigrams.entry(gram).or_default().insert(id);
            }
            for gram in grams(&chars, 3) {
                self.trigrams.entry(gram).or_default().insert(id);
            }
        }
    }

    /// Remove a tool from every bucket its tokens derived, pruning empties
    /// so the index mirrors live content exactly
    fn remove(&mut self, id: ToolId, tokens: &HashSet<String>) {
        for token in tokens {
            let chars: Vec<char> = token.chars().collect();
            prune(&mut self.exact, token.clone(), id);
            prune(&mut self.by_len, chars.len(), id);
            for c in dedup_chars(&chars) {
                prune(&mut self.by_char, c, id);
            }
            for gram in grams(&chars, 2) {
                prune(&mut self.bigrams, gram, id);
            }
            for gram in grams(&chars, 3) {
                prune(&mut self.trigrams, gram, id);
            }
        }
    }

    fn exact_candidates(&self, token: &str) -> HashSet<ToolId> {
        self.exact.get(token).cloned().unwrap_or_default()
    }

    /// Containment candidates: trigram intersection, degrading to the
    /// bigram bucket for 2-char tokens and the char bucket for 1-char
    fn contains_candidates(&self, token: &str) -> HashSet<ToolId> {
        let chars: Vec<char> = token.chars().collect();
        match chars.len() {
            0 => HashSet::new(),
            1 => self.by_char.get(&chars[0]).cloned().unwrap_or_default(),
            2 => self
                .bigrams
                .get(token)
                .cloned()
                .unwrap_or_default(),
            _ => {
                let mut out: Option<HashSet<ToolId>> = None;
                for gram in grams(&chars, 3) {
                    let Some(bucket) = self.trigrams.get(&gram) else {
                        return HashSet::new();
                    };
                    out = Some(match out {
                        None => bucket.clone(),
                        Some(mut acc) => {
                            acc.retain(|id| bucket.contains(id));
                            acc
                        }
                    });
                    if out.as_ref().is_some_and(HashSet::is_empty) {
                        return HashSet::new();
                    }
                }
                out.unwrap_or_default()
            }
        }
    }

    /// Fuzzy candidates: length-window union intersected with tools
    /// sharing at least one character with the query token
    fn fuzzy_candidates(&self, token: &str, threshold: f32) -> HashSet<ToolId> {
        let chars: Vec<char> = token.chars().collect();
        let (min_len, max_len) = fuzzy_length_window(chars.len(), threshold);

        let mut by_length = HashSet::new();
        for len in min_len..=max_len {
            if let Some(bucket) = self.by_len.get(&len) {
                by_length.extend(bucket);
            }
        }
        if by_length.is_empty() {
            return by_length;
        }

        let mut shares_char: HashSet<ToolId> = HashSet::new();
        for c in dedup_chars(&chars) {
            if let Some(bucket) = self.by_char.get(&c) {
                shares_char.extend(bucket);
            }
        }

        by_length.retain(|id| shares_char.contains(id));
        by_length
    }

    fn candidates(&self, token: &str, mode: MatchMode) -> HashSet<ToolId> {
        match mode {
            MatchMode::Exact => self.exact_candidates(token),
            MatchMode::Contains => self.contains_candidates(token),
            MatchMode::Fuzzy { threshold } => self.fuzzy_candidates(token, threshold),
        }
    }
}

/// Per-field text index over tool content
#[derive(Debug, Default)]
pub struct TextIndex {
    fields: HashMap<TextField, FieldBuckets>,
}

impl TextIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tool(&mut self, id: ToolId, tool: &Tool) {
        for field in TextField::ALL {
            let tokens = field_tokens(field, tool);
            if tokens.is_empty() {
                continue;
            }
            self.fields.entry(field).or_default().insert(id, &tokens);
        }
    }

    pub fn remove_tool(&mut self, id: ToolId, tool: &Tool) {
        for field in TextField::ALL {
            let tokens = field_tokens(field, tool);
            if tokens.is_empty() {
                continue;
            }
            if let Some(buckets) = self.fields.get_mut(&field) {
                buckets.remove(id, &tokens);
            }
        }
    }

    /// Candidate tools for a query: union across tokens and fields
    #[must_use]
    pub fn candidates(
        &self,
        fields: &[TextField],
        tokens: &[String],
        mode: MatchMode,
    ) -> HashSet<ToolId> {
        let mut out = HashSet::new();
        for field in fields {
            let Some(buckets) = self.fields.get(field) else {
                continue;
            };
            for token in tokens {
                out.extend(buckets.candidates(token, mode));
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Live token count for a field's exact map (diagnostics)
    #[must_use]
    pub fn token_count(&self, field: TextField) -> usize {
        self.fields.get(&field).map_or(0, |b| b.exact.len())
    }
}

fn field_tokens(field: TextField, tool: &Tool) -> HashSet<String> {
    field
        .texts_of(tool)
        .iter()
        .flat_map(|text| tokenize(text))
        .collect()
}

fn dedup_chars(chars: &[char]) -> HashSet<char> {
    chars.iter().copied().collect()
}

fn grams(chars: &[char], n: usize) -> HashSet<String> {
    if chars.len() < n {
        return HashSet::new();
    }
    chars
        .windows(n)
        .map(|window| window.iter().collect())
        .collect()
}

fn prune<K: std::hash::Hash + Eq>(
    buckets: &mut HashMap<K, HashSet<ToolId>>,
    key: K,
    id: ToolId,
) {
    if let Some(bucket) = buckets.get_mut(&key) {
        bucket.remove(&id);
        if bucket.is_empty() {
            buckets.remove(&key);
        }
    }
}
