//! Gestalt (Ratcliff/Obershelp) string similarity.
//!
//! `ratio = 2 * M / (len(a) + len(b))`, where `M` is the total length of matching
//! blocks found by repeatedly taking the longest common run and recursing on the
//! pieces to its left and right. Lengths are in chars.

/// Similarity ratio in `[0, 1]`; two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Total length of all matching blocks between `a` and `b`.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common run in `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties go to the run starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run[j + 1] = length of the common run ending at a[i - 1], b[j]
    let width = bhi - blo + 1;
    let mut prev = vec![0usize; width];
    let mut curr = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let k = j - blo + 1;
            if a[i] == b[j] {
                curr[k] = prev[k - 1] + 1;
                if curr[k] > best_size {
                    best_size = curr[k];
                    best_i = i + 1 - best_size;
                    best_j = j + 1 - best_size;
                }
            } else {
                curr[k] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_strings_score_one() {
        assert!(approx(ratio("python", "python"), 1.0));
        assert!(approx(ratio("", ""), 1.0));
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert!(approx(ratio("abc", "xyz"), 0.0));
        assert!(approx(ratio("", "rust"), 0.0));
    }

    #[test]
    fn matches_known_values() {
        // "bcd" is the only block: 2 * 3 / 8
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        // "react" inside "reactjs": 2 * 5 / 12
        assert!(approx(ratio("reactjs", "react"), 10.0 / 12.0));
        // "tensor" then "flow": 2 * 10 / 21
        assert!(approx(ratio("tensor flow", "tensorflow"), 20.0 / 21.0));
    }

    #[test]
    fn recurses_on_both_sides_of_the_longest_block() {
        // blocks "a", "cd", "f" -> 2 * 4 / 12
        assert!(approx(ratio("abcdef", "axcdyf"), 8.0 / 12.0));
    }

    #[test]
    fn is_symmetric_for_simple_inputs() {
        assert!(approx(ratio("java", "javascript"), ratio("javascript", "java")));
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert!(approx(ratio("café", "cafe"), 0.75));
    }
}
