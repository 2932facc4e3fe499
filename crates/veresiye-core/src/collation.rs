//! Turkish-aware case folding and collation.
//!
//! Host locale functions cannot be trusted here: `str::to_lowercase` maps
//! `I` to `i` and `İ` to `i̇` (two code points), which breaks both search and
//! ordering for Turkish names. This module carries its own table.
//!
//! Ordering follows the Turkish alphabet:
//!
//! ```text
//! a b c ç d e f g ğ h ı i j k l m n o ö p (q) r s ş t u ü v (w) (x) y z
//! ```
//!
//! Digits, whitespace and punctuation sort before letters; letters outside
//! the table sort after them by code point.

use std::cmp::Ordering;

/// Letters in collation order. `q`, `w` and `x` are not Turkish letters but
/// appear in foreign names, so they sit in their Latin positions.
const ALPHABET: [char; 32] = [
    'a', 'b', 'c', 'ç', 'd', 'e', 'f', 'g', 'ğ', 'h', 'ı', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'ö',
    'p', 'q', 'r', 's', 'ş', 't', 'u', 'ü', 'v', 'w', 'x', 'y', 'z',
];

/// Fold one character the Turkish way.
fn fold_char(c: char, out: &mut String) {
    match c {
        'I' => out.push('ı'),
        'İ' => out.push('i'),
        _ => out.extend(c.to_lowercase()),
    }
}

/// Lowercase a string with Turkish rules (`I → ı`, `İ → i`).
pub fn fold(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        fold_char(c, &mut out);
    }
    out
}

/// Sort weight of a folded character: (class, position).
fn weight(c: char) -> (u8, u32) {
    if let Some(pos) = ALPHABET.iter().position(|&letter| letter == c) {
        return (1, pos as u32);
    }
    if c.is_alphabetic() {
        (2, c as u32)
    } else {
        (0, c as u32)
    }
}

/// Collation key for `sort_by_cached_key`; keys compare like [`compare`].
pub fn sort_key(value: &str) -> Vec<(u8, u32)> {
    fold(value).chars().map(weight).collect()
}

/// Compare two strings case-insensitively in Turkish alphabetical order.
///
/// Returns `Equal` exactly when both strings fold to the same text.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = fold(a);
    let b = fold(b);
    a.chars().map(weight).cmp(b.chars().map(weight))
}

/// Case-insensitive equality under the Turkish fold.
pub fn eq(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

/// Case-insensitive substring test under the Turkish fold.
///
/// An empty needle matches everything.
pub fn contains(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    fold(haystack).contains(&fold(needle))
}
