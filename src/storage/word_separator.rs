//! Splits identifiers into the suffixes a user may start typing.
//!
//! `getUserName` is indexed under `getUserName`, `UserName` and `Name`, so
//! typing `name` or `user` finds it. Two passes contribute suffixes:
//!
//! 1. underscore pass: the identifier itself, then every suffix that starts
//!    right after a run of underscores;
//! 2. casing pass: within each underscore-delimited token, every case
//!    boundary starts a suffix running to the end of that token.

/// Tokens for `name`, without duplicates, in discovery order.
pub fn tokenize(name: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut emit = |token: &str| {
        if !token.is_empty() && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    };

    emit(name);

    // Underscore pass
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            while i < bytes.len() && bytes[i] == b'_' {
                i += 1;
            }
            if i < bytes.len() {
                emit(&name[i..]);
            }
        } else {
            i += 1;
        }
    }

    // Casing pass
    for segment in name.split('_').filter(|s| !s.is_empty()) {
        let chars: Vec<(usize, char)> = segment.char_indices().collect();
        for idx in 1..chars.len() {
            if is_case_boundary(&chars, idx) {
                emit(&segment[chars[idx].0..]);
            }
        }
    }

    tokens
}

fn is_case_boundary(chars: &[(usize, char)], idx: usize) -> bool {
    let current = chars[idx].1;
    if !current.is_uppercase() {
        return false;
    }
    let prev = chars[idx - 1].1;
    if prev.is_lowercase() || prev.is_ascii_digit() {
        return true;
    }
    // End of an acronym: `TESTFunction` breaks before `F`
    let next_is_lower = chars.get(idx + 1).is_some_and(|(_, c)| c.is_lowercase());
    prev.is_uppercase() && next_is_lower
}

/// Lower-cased tokens, the form stored in the completion index.
pub fn index_tokens(name: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in tokenize(name) {
        let lower = token.to_lowercase();
        if !tokens.contains(&lower) {
            tokens.push(lower);
        }
    }
    tokens
}
