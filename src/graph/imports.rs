//! Import directive parsing.
//!
//! Extracts the targets of `@import`, `@use` and `@forward` from stylesheet
//! source. Only enough of the language is understood to find those
//! directives: comments are skipped, string literals are honoured, and
//! imports that Sass passes through as plain CSS are dropped.

use super::filter::Syntax;

/// Directives that create a dependency edge.
const DIRECTIVES: &[&str] = &["@import", "@use", "@forward"];

/// Extract import targets from `source`, in source order.
#[must_use]
pub fn parse_imports(source: &str, syntax: Syntax) -> Vec<String> {
    let stripped = strip_comments(source);
    let mut targets = Vec::new();

    let mut rest = stripped.as_str();
    while let Some((directive, after)) = next_directive(rest) {
        let (args, remaining) = directive_args(after, syntax);
        if directive == "@import" {
            targets.extend(split_import_list(args).into_iter().filter_map(import_target));
        } else if let Some(target) = module_target(args) {
            targets.push(target);
        }
        rest = remaining;
    }

    targets
}

/// Replace comments with whitespace, keeping newlines so the indented
/// syntax still sees line ends.
///
/// The body of an unquoted `url(...)` is copied verbatim, so protocol-relative
/// URLs such as `url(//host/font.css)` are not mistaken for comments.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;
    let mut in_url = false;
    let mut prev = '\0';

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q || c == '\n' {
                quote = None;
            }
            prev = c;
            continue;
        }

        if in_url {
            out.push(c);
            if c == ')' {
                in_url = false;
            }
            prev = c;
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"' | '\'', _) => {
                quote = Some(c);
                out.push(c);
            }
            ('(', _) => {
                in_url = opens_url(&out);
                out.push(c);
            }
            // `http://` keeps its scheme separator.
            ('/', Some('/')) if prev != ':' => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut last = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if last == '*' && skipped == '/' {
                        break;
                    }
                    last = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
        prev = c;
    }

    out
}

/// Check if the text before a `(` names the `url` function.
fn opens_url(before: &str) -> bool {
    let Some(head) = before.len().checked_sub(3).and_then(|i| before.get(i..)) else {
        return false;
    };
    head.eq_ignore_ascii_case("url")
}

/// Find the next import-like directive, returning it and the text after it.
fn next_directive(text: &str) -> Option<(&'static str, &str)> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('@') {
        let at = search_from + offset;
        let tail = &text[at..];
        for directive in DIRECTIVES {
            if let Some(after) = tail.strip_prefix(directive) {
                let boundary = after
                    .chars()
                    .next()
                    .map_or(true, |c| c.is_whitespace() || c == '"' || c == '\'');
                if boundary {
                    return Some((*directive, after));
                }
            }
        }
        search_from = at + 1;
    }
    None
}

/// Split the directive argument text from the rest of the source.
///
/// SCSS arguments run to the next `;` outside a string; indented Sass
/// arguments run to the end of the line.
fn directive_args(text: &str, syntax: Syntax) -> (&str, &str) {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                ';' => return (&text[..i], &text[i + 1..]),
                '\n' if syntax == Syntax::Sass => return (&text[..i], &text[i + 1..]),
                _ => {}
            },
        }
    }
    (text, "")
}

/// Split `@import a, "b", 'c'` into its comma-separated items.
fn split_import_list(args: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in args.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    items.push(args[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    items.push(args[start..].trim());
    items.retain(|item| !item.is_empty());
    items
}

/// Target of one `@import` item, or `None` for plain-CSS imports.
fn import_target(item: &str) -> Option<String> {
    let (target, trailing) = match split_quoted(item) {
        Some((target, trailing)) => (target, trailing),
        None => {
            // Unquoted targets only exist in the indented syntax.
            let mut parts = item.splitn(2, char::is_whitespace);
            (parts.next()?, parts.next().unwrap_or("").trim())
        }
    };

    // Media queries or supports() after the URL make it a CSS import.
    if !trailing.is_empty() || is_plain_css(target) {
        return None;
    }
    Some(target.to_string())
}

/// Target of a `@use` or `@forward` rule; built-in `sass:` modules have none.
fn module_target(args: &str) -> Option<String> {
    let (target, _) = split_quoted(args.trim())?;
    if target.starts_with("sass:") || target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

/// Split a leading string literal from whatever follows it.
fn split_quoted(text: &str) -> Option<(&str, &str)> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &text[1..];
    let end = body.find(quote)?;
    Some((&body[..end], body[end + 1..].trim()))
}

fn is_plain_css(target: &str) -> bool {
    let lower = target.to_lowercase();
    lower.is_empty()
        || lower.starts_with("url(")
        || lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.ends_with(".css")
}
