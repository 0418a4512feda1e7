//! Bounded Levenshtein distance

/// Edit distance between `a` and `b`, giving up once it exceeds `max`.
///
/// Counts single-character insertions, deletions and substitutions over
/// Unicode scalar values. Only two rows of `len(shorter) + 1` cells are kept.
///
/// Returns the exact distance when it is `<= max`, and `max + 1` otherwise.
/// The result does not depend on argument order.
pub fn distance(a: &str, b: &str, max: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // The longer string drives the outer loop so the rows stay short.
    let (long, short) = if a.len() < b.len() { (&b, &a) } else { (&a, &b) };
    let too_far = max.saturating_add(1);

    if short.is_empty() {
        return long.len().min(too_far);
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr: Vec<usize> = vec![0; short.len() + 1];

    for (i, long_char) in long.iter().enumerate() {
        curr[0] = i + 1;

        for (j, short_char) in short.iter().enumerate() {
            let cost = usize::from(long_char != short_char);
            curr[j + 1] = (prev[j + 1] + 1) // deletion
                .min(curr[j] + 1) // insertion
                .min(prev[j] + cost); // substitution
        }

        let row_min = curr.iter().copied().min().unwrap_or(too_far);
        if row_min > max {
            return too_far;
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()].min(too_far)
}
