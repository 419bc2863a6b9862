//! Comparison and search helpers over rune slices.
//!
//! The line buffer stores text as `[char]`, so history search and completion
//! work on slices directly instead of round-tripping through `String`.

/// Compare two runes, optionally folding ASCII case.
#[must_use]
pub fn equal_rune(a: char, b: char, fold: bool) -> bool {
    a == b || (fold && a.is_ascii() && b.is_ascii() && a.eq_ignore_ascii_case(&b))
}

/// Case-folded (ASCII) slice equality.
#[must_use]
pub fn equal_fold(a: &[char], b: &[char]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| equal_rune(x, y, true))
}

/// True if `s` starts with `prefix`.
#[must_use]
pub fn has_prefix(s: &[char], prefix: &[char]) -> bool {
    s.starts_with(prefix)
}

/// True if `s` starts with `prefix`, ignoring ASCII case.
#[must_use]
pub fn has_prefix_fold(s: &[char], prefix: &[char]) -> bool {
    s.len() >= prefix.len() && equal_fold(&s[..prefix.len()], prefix)
}

/// First index of `sub` in `s`, searching front to back.
#[must_use]
pub fn index_all(s: &[char], sub: &[char]) -> Option<usize> {
    find(s, sub, false, false)
}

/// Like [`index_all`], ignoring ASCII case.
#[must_use]
pub fn index_all_fold(s: &[char], sub: &[char]) -> Option<usize> {
    find(s, sub, true, false)
}

/// Last index of `sub` in `s`, searching back to front.
#[must_use]
pub fn index_all_bck(s: &[char], sub: &[char]) -> Option<usize> {
    find(s, sub, false, true)
}

/// Like [`index_all_bck`], ignoring ASCII case.
#[must_use]
pub fn index_all_bck_fold(s: &[char], sub: &[char]) -> Option<usize> {
    find(s, sub, true, true)
}

fn find(s: &[char], sub: &[char], fold: bool, reverse: bool) -> Option<usize> {
    if sub.len() > s.len() {
        return None;
    }
    let matches_at = |i: usize| {
        s[i..i + sub.len()]
            .iter()
            .zip(sub)
            .all(|(&a, &b)| equal_rune(a, b, fold))
    };
    let last = s.len() - sub.len();
    if reverse {
        (0..=last).rev().find(|&i| matches_at(i))
    } else {
        (0..=last).find(|&i| matches_at(i))
    }
}

/// Drop leading whitespace.
#[must_use]
pub fn trim_space_left(s: &[char]) -> &[char] {
    let first = s.iter().position(|c| !c.is_whitespace()).unwrap_or(s.len());
    &s[first..]
}

/// Split off the prefix shared by every candidate.
///
/// Returns the common prefix and rewrites each candidate to its remaining
/// suffix. An empty candidate list has an empty prefix.
pub fn aggregate(candidates: &mut [Vec<char>]) -> Vec<char> {
    let Some((first, rest)) = candidates.split_first() else {
        return Vec::new();
    };
    let size = first
        .iter()
        .enumerate()
        .take_while(|&(i, c)| rest.iter().all(|other| other.get(i) == Some(c)))
        .count();
    let same = first[..size].to_vec();
    if size > 0 {
        for candidate in candidates.iter_mut() {
            candidate.drain(..size);
        }
    }
    same
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runes(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_equal_rune_fold() {
        assert!(equal_rune('a', 'a', false));
        assert!(!equal_rune('a', 'A', false));
        assert!(equal_rune('a', 'A', true));
        assert!(!equal_rune('é', 'É', true));
    }

    #[test]
    fn test_equal_fold() {
        assert!(equal_fold(&runes("Hello"), &runes("hELLO")));
        assert!(!equal_fold(&runes("Hello"), &runes("Hell")));
    }

    #[test]
    fn test_prefix() {
        assert!(has_prefix(&runes("cargo build"), &runes("cargo")));
        assert!(!has_prefix(&runes("cargo build"), &runes("Cargo")));
        assert!(has_prefix_fold(&runes("cargo build"), &runes("CARGO")));
        assert!(!has_prefix_fold(&runes("ca"), &runes("cargo")));
    }

    #[test]
    fn test_index_all_both_directions() {
        let s = runes("abcabc");
        assert_eq!(index_all(&s, &runes("bc")), Some(1));
        assert_eq!(index_all_bck(&s, &runes("bc")), Some(4));
        assert_eq!(index_all(&s, &runes("BC")), None);
        assert_eq!(index_all_fold(&s, &runes("BC")), Some(1));
        assert_eq!(index_all_bck_fold(&s, &runes("BC")), Some(4));
        assert_eq!(index_all(&s, &runes("abcabcd")), None);
        assert_eq!(index_all(&s, &[]), Some(0));
    }

    #[test]
    fn test_trim_space_left() {
        assert_eq!(trim_space_left(&runes("  \tls")), runes("ls").as_slice());
        assert!(trim_space_left(&runes("   ")).is_empty());
    }

    #[test]
    fn test_aggregate() {
        let mut candidates = vec![runes("status"), runes("stash"), runes("start")];
        let same = aggregate(&mut candidates);
        assert_eq!(same, runes("sta"));
        assert_eq!(candidates, vec![runes("tus"), runes("sh"), runes("rt")]);
    }

    #[test]
    fn test_aggregate_no_common_prefix() {
        let mut candidates = vec![runes("add"), runes("commit")];
        assert!(aggregate(&mut candidates).is_empty());
        assert_eq!(candidates[0], runes("add"));
        assert!(aggregate(&mut []).is_empty());
    }
}
