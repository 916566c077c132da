//! Player name helpers

const GENERATIONAL_SUFFIXES: [&str; 8] = ["jr", "jr.", "sr", "sr.", "ii", "iii", "iv", "v"];

/// Split a display name into (first, last)
///
/// The last name skips generational suffixes, so "Kenneth Walker III"
/// sorts under "Walker". Single-token names (e.g. team defenses) use the
/// token for both halves.
pub fn split_name(full_name: &str) -> (String, String) {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    match tokens.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (only.to_string(), only.to_string()),
        [first, rest @ ..] => {
            let last = rest
                .iter()
                .rev()
                .find(|token| !is_suffix(token))
                .copied()
                .unwrap_or(rest[rest.len() - 1]);
            (first.to_string(), last.to_string())
        }
    }
}

/// Extract the sort key used by the name ordering
pub fn last_name_key(full_name: &str) -> String {
    split_name(full_name).1.to_lowercase()
}

/// Generational suffix such as "Jr." or "III"
pub fn is_suffix(token: &str) -> bool {
    GENERATIONAL_SUFFIXES.contains(&token.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_regular_name() {
        assert_eq!(split_name("Josh Allen"), ("Josh".to_string(), "Allen".to_string()));
    }

    #[test]
    fn test_split_skips_suffix() {
        assert_eq!(split_name("Kenneth Walker III").1, "Walker");
        assert_eq!(split_name("Marvin Harrison Jr.").1, "Harrison");
    }

    #[test]
    fn test_split_degenerate_names() {
        assert_eq!(split_name(""), (String::new(), String::new()));
        assert_eq!(split_name("Ravens"), ("Ravens".to_string(), "Ravens".to_string()));
        assert_eq!(last_name_key("  Amon-Ra   St. Brown "), "brown");
    }
}
