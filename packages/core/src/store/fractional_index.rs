//! Fractional Indexing
//!
//! Sibling positions are base-62 strings ordered lexicographically. A new key
//! is generated strictly between its two neighbors, so arbitrarily many
//! insertions can land in the same slot without renumbering existing
//! siblings.
//!
//! The empty string is "no lower bound", never a valid key. Generated keys
//! never end in the minimum digit `'0'`; that guarantees a key can always be
//! generated below any existing key.

/// Base-62 charset (0-9, A-Z, a-z), lexicographically ordered:
/// `'0' < '9' < 'A' < 'Z' < 'a' < 'z'`.
pub const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Digit value of `key[i]`, or 0 past the end (keys are left-aligned
/// fractions: "V" == "V0" == "V00").
fn digit(key: &[u8], i: usize) -> usize {
    if i < key.len() {
        BASE62.iter().position(|&b| b == key[i]).unwrap_or(0)
    } else {
        0
    }
}

/// Generate a key strictly between `low` and `high`.
///
/// `None` for `low` means unbounded below (start of the sibling list);
/// `None` for `high` means unbounded above (end of the list). When both
/// bounds are given they must satisfy `low < high` lexicographically; a
/// violation is an internal-consistency defect, logged and asserted.
///
/// # Examples
///
/// ```
/// use outline_core::store::fractional_index::key_between;
///
/// let first = key_between(None, None);
/// let before = key_between(None, Some(&first));
/// let after = key_between(Some(&first), None);
/// assert!(before < first && first < after);
/// ```
pub fn key_between(low: Option<&str>, high: Option<&str>) -> String {
    let a = low.unwrap_or("").as_bytes();

    let b = match high {
        None => return key_above(a, 0, String::new()),
        Some(h) => h.as_bytes(),
    };

    if low.unwrap_or("") >= high.unwrap_or("") {
        tracing::error!(low = ?low, high = ?high, "fractional index bounds out of order");
    }
    assert!(
        low.unwrap_or("") < std::str::from_utf8(b).unwrap_or(""),
        "key_between requires low < high"
    );

    let mut out = String::new();
    let mut i = 0;
    loop {
        // b cannot exhaust while digits are equal: that would make b a
        // prefix of a, contradicting low < high.
        assert!(i < b.len(), "upper bound exhausted while prefixes equal");
        let ad = digit(a, i);
        let bd = digit(b, i);

        if ad == bd {
            out.push(BASE62[ad] as char);
            i += 1;
            continue;
        }

        debug_assert!(ad < bd);
        if ad + 1 < bd {
            out.push(BASE62[(ad + bd) / 2] as char);
            return finish(out);
        }

        // Adjacent digits: keep a's digit, then go strictly above a's tail.
        out.push(BASE62[ad] as char);
        return key_above(a, i + 1, out);
    }
}

/// Extend `out` with a suffix strictly greater than `a[from..]` (and less
/// than the unbounded top).
fn key_above(a: &[u8], from: usize, mut out: String) -> String {
    let mut i = from;
    loop {
        let d = digit(a, i);
        if d >= 61 {
            // 'z' leaves no headroom at this position; copy and go deeper.
            out.push('z');
            i += 1;
        } else {
            out.push(BASE62[(d + 62) / 2] as char);
            return finish(out);
        }
    }
}

fn finish(out: String) -> String {
    debug_assert!(!out.ends_with('0'), "generated key ends in '0'");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_key() {
        assert_eq!(key_between(None, None), "V");
    }

    #[test]
    fn test_between_neighbors() {
        let k = key_between(Some("A"), Some("C"));
        assert!("A" < k.as_str() && k.as_str() < "C");
        assert_eq!(k, "B");
    }

    #[test]
    fn test_adjacent_digits() {
        let k = key_between(Some("A"), Some("B"));
        assert!("A" < k.as_str() && k.as_str() < "B");
    }

    #[test]
    fn test_no_lower_bound() {
        let k = key_between(None, Some("V"));
        assert!(k.as_str() < "V");
        assert!(!k.is_empty());
    }

    #[test]
    fn test_no_upper_bound() {
        let k = key_between(Some("V"), None);
        assert!(k.as_str() > "V");
    }

    #[test]
    fn test_repeated_insertion_before() {
        // Prepending forever must keep producing strictly smaller keys.
        let mut high = key_between(None, None);
        for _ in 0..200 {
            let k = key_between(None, Some(&high));
            assert!(k < high, "{k} >= {high}");
            assert!(!k.is_empty());
            high = k;
        }
    }

    #[test]
    fn test_repeated_insertion_after() {
        let mut low = key_between(None, None);
        for _ in 0..200 {
            let k = key_between(Some(&low), None);
            assert!(k > low, "{k} <= {low}");
            low = k;
        }
    }

    #[test]
    fn test_repeated_insertion_same_slot() {
        // Dense insertion between two fixed neighbors: every new key lands
        // strictly between the previous key and the upper neighbor.
        let low = key_between(None, None);
        let high = key_between(Some(&low), None);
        let mut a = low.clone();
        for _ in 0..200 {
            let k = key_between(Some(&a), Some(&high));
            assert!(a < k && k < high, "{a} < {k} < {high} violated");
            a = k;
        }
    }

    #[test]
    fn test_keys_never_end_in_zero() {
        let mut high = key_between(None, None);
        for _ in 0..100 {
            let k = key_between(None, Some(&high));
            assert!(!k.ends_with('0'), "key {k} ends in '0'");
            high = k;
        }
    }

    #[test]
    fn test_z_tail() {
        let k = key_between(Some("Vz"), Some("W"));
        assert!("Vz" < k.as_str() && k.as_str() < "W", "got {k}");
    }
}
