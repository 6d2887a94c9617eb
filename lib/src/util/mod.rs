use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Turns `string` into a lowercase ASCII slug. Non-ASCII text is
/// transliterated first, so `杭州景点` becomes `hang-zhou-jing-dian`. Runs of
/// characters that aren't alphanumerics or `_` collapse into a single `-`, and
/// leading or trailing separators are dropped.
pub fn slugify(string: &str) -> String {
    let mut slug = String::with_capacity(string.len());
    let mut pending_dash = false;

    let transliterated = string.chars()
        .flat_map(|ch| deunicode::deunicode_char(ch).unwrap_or("-").chars());

    for ch in transliterated {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }

            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Returns the distinct items of `iter` in the order they first appear.
///
/// ```rust
/// use guidebook::util::first_appearance;
///
/// let cats = first_appearance(["苏州园林", "杭州景点", "苏州园林"]);
/// assert_eq!(cats, ["苏州园林", "杭州景点"]);
/// ```
pub fn first_appearance<T, I>(iter: I) -> Vec<T>
    where I: IntoIterator<Item = T>, T: Eq + Hash + Clone
{
    let mut seen = FxHashSet::default();
    iter.into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Escapes `&`, `<`, `>`, `"` and `'` for use in HTML text or attributes.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }

    escaped
}
