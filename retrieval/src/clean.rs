//! Markup cleanup for arXiv abstracts.
//!
//! Abstracts often carry LaTeX: `\textbf{...}`, inline math, citations.
//! Everything that is embedded or placed in a prompt passes through
//! [`clean_text`] first.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Rewrite rules applied in order. Text-formatting commands keep their
/// argument; math spans and other commands are dropped with theirs.
static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\\{1,2}text[a-z]+\{([^{}]*)\}", "$1"),
        (r"\$\$[^$]*\$\$|\$[^$]*\$", ""),
        (r"\\{1,2}[a-zA-Z]+\{[^{}]*\}", ""),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| {
        Regex::new(pattern)
            .ok()
            .map(|regex| (regex, replacement))
    })
    .collect()
});

/// Strip LaTeX-style markup and collapse whitespace.
///
/// `clean_text(clean_text(x)) == clean_text(x)` for every input: the output
/// has no backslashes left and at most one unpaired `$`.
pub fn clean_text(text: &str) -> String {
    let mut text = text.to_string();
    for (regex, replacement) in RULES.iter() {
        text = regex.replace_all(&text, *replacement).into_owned();
    }
    let text = text.replace('\\', "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
