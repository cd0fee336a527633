//! Fuzzy command-name matching for "did you mean" suggestions.

/// Largest edit distance still considered a typo.
pub const MAX_EDIT_DISTANCE: usize = 2;

/// Number of leading characters compared for prefix matches.
const PREFIX_LEN: usize = 2;

/// Unit-cost Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Candidates that share the input's first two characters or sit within
/// [`MAX_EDIT_DISTANCE`] edits of it. Prefix matches come first; each group is
/// ordered by distance, then name. Comparison is case-insensitive.
pub fn similar_names<'a, I>(input: &str, candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let input = input.trim().to_lowercase();
    if input.is_empty() || limit == 0 {
        return Vec::new();
    }
    let prefix: String = input.chars().take(PREFIX_LEN).collect();

    let mut scored: Vec<(bool, usize, String)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let lowered = candidate.to_lowercase();
            let distance = levenshtein(&input, &lowered);
            let prefix_match = prefix.chars().count() == PREFIX_LEN && lowered.starts_with(&prefix);
            (prefix_match || distance <= MAX_EDIT_DISTANCE)
                .then(|| (!prefix_match, distance, candidate.to_string()))
        })
        .collect();

    scored.sort();
    let mut out: Vec<String> = Vec::with_capacity(limit);
    for (_, _, name) in scored {
        if !out.contains(&name) {
            out.push(name);
        }
        if out.len() == limit {
            break;
        }
    }
    out
}
