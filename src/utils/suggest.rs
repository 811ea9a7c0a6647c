fn normalize(value: &str) -> Vec<char> {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn edit_distance(a: &[char], b: &[char]) -> usize {
    if a == b {
        return 0;
    }
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn score(input: &[char], candidate: &str) -> Option<usize> {
    let candidate = normalize(candidate);
    if input.is_empty() || candidate.is_empty() {
        return None;
    }
    let haystack: String = candidate.iter().collect();
    let needle: String = input.iter().collect();
    if haystack.contains(&needle) || needle.contains(&haystack) {
        return Some(usize::from(haystack != needle));
    }
    Some(edit_distance(input, &candidate))
}

/// Closest candidates to `input`, best first. Used for "did you mean" hints
/// on unknown tool names and schema field names.
pub fn suggest(input: &str, candidates: &[&str], limit: usize) -> Vec<String> {
    let needle = normalize(input);
    if needle.is_empty() {
        return Vec::new();
    }
    let allowed = match needle.len() {
        0..=4 => 1,
        5..=8 => 2,
        n => (n as f32 * 0.35).floor().max(3.0) as usize,
    };
    let mut scored: Vec<(&str, usize)> = candidates
        .iter()
        .filter_map(|candidate| score(&needle, candidate).map(|s| (*candidate, s)))
        .filter(|(_, s)| *s <= allowed)
        .collect();
    scored.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    let mut out: Vec<String> = Vec::new();
    for (candidate, _) in scored {
        if !out.iter().any(|existing| existing == candidate) {
            out.push(candidate.to_string());
        }
        if out.len() >= limit.max(1) {
            break;
        }
    }
    out
}
