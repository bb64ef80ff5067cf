//! Text normalization shared by ids, alias keys and user input.

/// Normalize a drug name for lookup.
///
/// Lowercases, turns every character that is not an ASCII letter or digit
/// into a separator, collapses separator runs to one space and trims. The
/// result is always ASCII, so byte offsets are character offsets.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Iterate `(byte_offset, token)` over a normalized string.
pub(crate) fn tokens(normalized: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    normalized
        .split(' ')
        .map(move |token| {
            let start = offset;
            offset += token.len() + 1;
            (start, token)
        })
        .filter(|(_, token)| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Tab. Dolo-650"), "tab dolo 650");
        assert_eq!(normalize("  Amoxicillin  +  Clavulanic Acid "), "amoxicillin clavulanic acid");
        assert_eq!(normalize("St. John's Wort"), "st john s wort");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("---"), "");
        assert_eq!(normalize("Café"), "caf");
    }

    #[test]
    fn test_tokens_with_offsets() {
        let s = normalize("Augmentin 625 Duo");
        let toks: Vec<_> = tokens(&s).collect();
        assert_eq!(toks, vec![(0, "augmentin"), (10, "625"), (14, "duo")]);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in "\\PC{0,32}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b' '));
            prop_assert!(!once.contains("  "));
            prop_assert_eq!(once.trim(), once.as_str());
        }
    }
}
