//! Percent-escapes for characters that are significant to the grammar.
//! Queries are decoded once, before tokenizing.

/// (literal, escaped) pairs. No escaped form contains another, so the
/// replacement order does not matter.
const ESCAPES: [(&str, &str); 6] = [
    (",", "%5C%2C"),
    (";", "%5C%3B"),
    ("=", "%5C%3D"),
    ("\"", "%22"),
    ("'", "%27"),
    (" ", "%20"),
];

pub fn decode(query: &str) -> String {
    ESCAPES
        .iter()
        .fold(query.to_string(), |acc, (literal, escaped)| {
            acc.replace(escaped, literal)
        })
}

/// Inverse of [`decode`], for callers embedding raw values into a query
pub fn encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for ch in value.chars() {
        match ESCAPES
            .iter()
            .find(|(literal, _)| literal.starts_with(ch))
        {
            Some((_, escaped)) => encoded.push_str(escaped),
            None => encoded.push(ch),
        }
    }
    encoded
}
