use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::constants::{DESCRIPTION_EXCERPT_CHARS, EXCERPT_ELLIPSIS};

static MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>|&(?:amp;)*(amp|lt|gt);").expect("static regex")
});
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Plain-text excerpt of an HTML-ish description.
///
/// Tags are replaced by a space and only `&amp;`, `&lt;` and `&gt;` are
/// unescaped. A chain such as `&amp;amp;lt;` resolves in one step. Passes
/// repeat while the text keeps shrinking, so escaped markup such as
/// `&lt;b&gt;` is removed as well. Whitespace runs collapse to one space, the
/// ends are trimmed and the result is cut to 300 characters followed by
/// `...`. Applying it to its own output changes nothing.
pub fn clean_description(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = MARKUP.replace_all(&current, |caps: &Captures<'_>| match caps.get(1) {
            Some(entity) => unescape(entity.as_str()),
            None => " ",
        });
        if next.len() >= current.len() {
            break;
        }
        current = next.into_owned();
    }

    let collapsed = WHITESPACE.replace_all(&current, " ");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() > DESCRIPTION_EXCERPT_CHARS {
        let mut excerpt: String = trimmed.chars().take(DESCRIPTION_EXCERPT_CHARS).collect();
        excerpt.push_str(EXCERPT_ELLIPSIS);
        excerpt
    } else {
        trimmed.to_string()
    }
}

fn unescape(entity: &str) -> &'static str {
    match entity {
        "lt" => "<",
        "gt" => ">",
        _ => "&",
    }
}
