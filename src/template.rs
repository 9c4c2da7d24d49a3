//! `{marker}` expansion for location templates and greetings.
//!
//! Markers are looked up through a caller-provided function. Values may
//! themselves contain markers (`basename` is usually `"{appname}.log"`), so
//! expansion recurses up to [`MAX_DEPTH`] levels.

/// Maximum nesting of markers inside marker values.
pub const MAX_DEPTH: usize = 3;

/// Expand every `{name}` marker in `text`.
///
/// In strict mode `None` is returned as soon as one marker cannot be
/// resolved. Otherwise unresolved markers are left untouched.
pub fn formatted<F>(text: &str, lookup: F, strict: bool) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    expand(text, &lookup, strict, MAX_DEPTH)
}

fn expand<F>(text: &str, lookup: &F, strict: bool, depth: usize) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !text.contains('{') {
        return Some(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Some(out);
        };
        let key = &after[..end];
        match lookup(key) {
            Some(value) if depth > 0 => out.push_str(&expand(&value, lookup, strict, depth - 1)?),
            Some(value) => out.push_str(&value),
            None if strict => return None,
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Some(out)
}
