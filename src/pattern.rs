//! Pattern language ⇄ regular expression translation
//!
//! Schema rules describe titles and bodies in a compact pattern syntax that
//! compiles down to plain regular expressions:
//!
//! | token         | regex      |
//! |---------------|------------|
//! | `.`           | `\.`       |
//! | `<text>`      | `.*`       |
//! | `<imagefile>` | `.*\.jpg`  |
//! | `<#>`         | `(\d)*`    |
//! | `$`           | `\$`       |
//! | `[X]`         | `(X)?`     |
//!
//! Both directions are total: anything that is not a token passes through
//! unchanged and no error is ever raised. The language cannot escape its own
//! meta-tokens. [`to_pattern`] is a best-effort inverse, reliable only for
//! regexes that [`to_regex`] produced; its substitution order matters (the
//! digit-run rewrite must run before the generic group rewrite, the image
//! file rewrite before the period unescape, and that before the wildcard
//! rewrite) so fragments are not re-translated.

use regex::Regex;

/// Compile a pattern string to the equivalent regex text.
///
/// Substitutions are applied in the fixed table order; see the module docs.
pub fn to_regex(pattern: &str) -> String {
    let mut out = substitute(pattern.to_string(), ".", r"\.");
    out = substitute(out, "<text>", ".*");
    out = substitute(out, "<imagefile>", r".*\.jpg");
    out = substitute(out, "<#>", r"(\d)*");
    out = substitute(out, "$", r"\$");
    rewrite_brackets(out)
}

/// Translate regex text produced by [`to_regex`] back to a pattern string.
pub fn to_pattern(regex: &str) -> String {
    let mut out = substitute(regex.to_string(), r"(\d)*", "<#>");
    out = rewrite_groups(out);
    out = substitute(out, r"\$", "$");
    out = substitute(out, r".*\.jpg", "<imagefile>");
    out = substitute(out, r"\.", ".");
    substitute(out, ".*", "<text>")
}

/// Compile regex text into a whole-string matcher.
///
/// Rule matching tests the entire title or body, so the stored regex text is
/// anchored here rather than searched: `(\d)*\.jpg` must reject `abc.jpg`
/// even though a substring search would accept it.
pub fn compile(regex_text: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", regex_text))
}

fn substitute(input: String, from: &str, to: &str) -> String {
    let output = input.replace(from, to);
    if output != input {
        tracing::trace!("pattern substitution {:?} -> {:?}: {:?} => {:?}", from, to, input, output);
    }
    output
}

/// `[X]` → `(X)?`; bracket pairs cannot nest
fn rewrite_brackets(input: String) -> String {
    let bracket = Regex::new(r"\[([^\[\]]*)\]").unwrap();
    let output = bracket.replace_all(&input, "(${1})?").into_owned();
    if output != input {
        tracing::trace!("pattern substitution [X] -> (X)?: {:?} => {:?}", input, output);
    }
    output
}

/// `(X)?` → `[X]`; runs after the digit-run rewrite so `((\d)*)?` resolves
/// to `[<#>]` rather than mangling the inner group
fn rewrite_groups(input: String) -> String {
    let group = Regex::new(r"\(([^()]*)\)\?").unwrap();
    let output = group.replace_all(&input, "[${1}]").into_owned();
    if output != input {
        tracing::trace!("pattern substitution (X)? -> [X]: {:?} => {:?}", input, output);
    }
    output
}
