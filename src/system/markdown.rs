//! HTML to markdown conversion for rendered post bodies.
//!
//! Discourse serves post bodies as "cooked" HTML. The converter walks the
//! parsed fragment and emits CommonMark for the elements forums actually use:
//! paragraphs, headings, emphasis, links, images, lists, quotes and code.

use scraper::{ElementRef, Html, Node};
use thiserror::Error;

/// Nesting depth beyond which a fragment is rejected.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("markup nested deeper than {MAX_DEPTH} elements")]
    TooDeep,
}

/// Convert an HTML fragment to markdown.
///
/// # Errors
///
/// Returns an error if the fragment is nested too deeply to walk.
pub fn html_to_markdown(html: &str) -> Result<String, ConversionError> {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    render_children(fragment.root_element(), &mut out, 0)?;
    Ok(tidy(&out))
}

fn render_children(el: ElementRef<'_>, out: &mut String, depth: usize) -> Result<(), ConversionError> {
    if depth > MAX_DEPTH {
        return Err(ConversionError::TooDeep);
    }
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render_element(child_el, out, depth + 1)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn render_inner(el: ElementRef<'_>, depth: usize) -> Result<String, ConversionError> {
    let mut inner = String::new();
    render_children(el, &mut inner, depth)?;
    Ok(inner)
}

fn render_element(el: ElementRef<'_>, out: &mut String, depth: usize) -> Result<(), ConversionError> {
    let name = el.value().name();
    match name {
        "script" | "style" | "head" | "noscript" => {}
        "br" => out.push('\n'),
        "hr" => push_block(out, "* * *"),
        "p" | "div" | "section" | "article" | "header" | "footer" | "aside" | "figure"
        | "details" | "summary" | "table" | "thead" | "tbody" => {
            let inner = render_inner(el, depth)?;
            push_block(out, inner.trim());
        }
        "tr" => {
            let inner = render_inner(el, depth)?;
            push_block(out, inner.trim());
        }
        "td" | "th" => {
            let inner = render_inner(el, depth)?;
            out.push_str(inner.trim());
            out.push(' ');
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = usize::from(name.as_bytes()[1] - b'0');
            let inner = render_inner(el, depth)?;
            push_block(out, &format!("{} {}", "#".repeat(level), inner.trim()));
        }
        "strong" | "b" => push_wrapped(out, &render_inner(el, depth)?, "**"),
        "em" | "i" => push_wrapped(out, &render_inner(el, depth)?, "_"),
        "del" | "s" | "strike" => push_wrapped(out, &render_inner(el, depth)?, "~~"),
        "code" => push_inline_code(out, &el.text().collect::<String>()),
        "pre" => push_code_block(out, el),
        "a" => {
            let inner = render_inner(el, depth)?;
            let text = inner.trim();
            match el.value().attr("href") {
                Some(href) if !href.is_empty() => {
                    if text.is_empty() {
                        out.push_str(href);
                    } else {
                        out.push_str(&format!("[{text}]({href})"));
                    }
                }
                _ => out.push_str(text),
            }
        }
        "img" => {
            let alt = el.value().attr("alt").unwrap_or_default();
            // Emoji images carry their shortcode in alt.
            if el.value().classes().any(|c| c == "emoji") {
                out.push_str(alt);
            } else if let Some(src) = el.value().attr("src") {
                out.push_str(&format!("![{alt}]({src})"));
            }
        }
        "blockquote" => {
            let inner = render_inner(el, depth)?;
            let quoted = inner
                .trim()
                .lines()
                .map(|line| {
                    if line.trim().is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            push_block(out, &quoted);
        }
        "ul" | "ol" => {
            let list = render_list(el, name == "ol", depth)?;
            push_block(out, &list);
        }
        _ => render_children(el, out, depth)?,
    }
    Ok(())
}

fn render_list(el: ElementRef<'_>, ordered: bool, depth: usize) -> Result<String, ConversionError> {
    let start: usize = el
        .value()
        .attr("start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    let mut items = Vec::new();
    for (idx, item) in el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "li")
        .enumerate()
    {
        let marker = if ordered {
            format!("{}. ", start + idx)
        } else {
            "- ".to_string()
        };
        let indent = " ".repeat(marker.len());
        let inner = render_inner(item, depth + 1)?;

        let mut rendered = String::new();
        for (line_no, line) in inner.trim().lines().enumerate() {
            if line_no == 0 {
                rendered.push_str(&marker);
            } else {
                rendered.push('\n');
                if !line.trim().is_empty() {
                    rendered.push_str(&indent);
                }
            }
            rendered.push_str(line);
        }
        if rendered.is_empty() {
            rendered.push_str(marker.trim_end());
        }
        items.push(rendered);
    }
    Ok(items.join("\n"))
}

fn push_text(out: &mut String, text: &str) {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                collapsed.push(' ');
            }
            in_space = true;
        } else {
            collapsed.push(ch);
            in_space = false;
        }
    }

    let collapsed = if out.ends_with('\n') || out.ends_with(' ') {
        collapsed.trim_start()
    } else {
        collapsed.as_str()
    };
    if collapsed.is_empty() {
        return;
    }

    let escaped = escape_inline(collapsed);
    if out.is_empty() || out.ends_with('\n') {
        out.push_str(&escape_line_start(&escaped));
    } else {
        out.push_str(&escaped);
    }
}

/// Backslash-escape characters that would otherwise open inline markup.
fn escape_inline(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '`' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Escape a leading heading, quote, bullet or ordered-list marker.
fn escape_line_start(line: &str) -> String {
    let indent = line.len() - line.trim_start().len();
    let (lead, rest) = line.split_at(indent);
    let mut chars = rest.chars();

    match chars.next() {
        Some('#' | '>') => format!("{lead}\\{rest}"),
        Some('+' | '-') if matches!(chars.next(), None | Some(' ')) => format!("{lead}\\{rest}"),
        Some(c) if c.is_ascii_digit() => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            let (number, after) = rest.split_at(digits);
            let is_marker = matches!(after, "." | ")")
                || after.starts_with(". ")
                || after.starts_with(") ");
            if is_marker {
                format!("{lead}{number}\\{after}")
            } else {
                line.to_string()
            }
        }
        _ => line.to_string(),
    }
}

fn push_block(out: &mut String, content: &str) {
    if content.is_empty() {
        return;
    }
    out.push_str("\n\n");
    out.push_str(content);
    out.push_str("\n\n");
}

fn push_wrapped(out: &mut String, inner: &str, marker: &str) {
    let content = inner.trim();
    if content.is_empty() {
        out.push_str(inner);
        return;
    }
    if inner.starts_with(' ') && !out.ends_with(' ') {
        out.push(' ');
    }
    out.push_str(marker);
    out.push_str(content);
    out.push_str(marker);
    if inner.ends_with(' ') {
        out.push(' ');
    }
}

fn push_inline_code(out: &mut String, code: &str) {
    let fence = "`".repeat(longest_backtick_run(code) + 1);
    // A leading or trailing backtick would merge with the fence, and a single
    // surrounding space on both sides is stripped by renderers.
    let pad = code.starts_with('`')
        || code.ends_with('`')
        || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
    out.push_str(&fence);
    if pad {
        out.push(' ');
    }
    out.push_str(code);
    if pad {
        out.push(' ');
    }
    out.push_str(&fence);
}

fn push_code_block(out: &mut String, el: ElementRef<'_>) {
    let code = el.text().collect::<String>();
    let language = el
        .children()
        .filter_map(ElementRef::wrap)
        .find(|c| c.value().name() == "code")
        .and_then(|c| {
            c.value()
                .classes()
                .find_map(|class| class.strip_prefix("lang-").map(str::to_string))
        })
        .filter(|lang| lang != "auto" && lang != "plaintext")
        .unwrap_or_default();
    let fence = "`".repeat((longest_backtick_run(&code) + 1).max(3));

    out.push_str("\n\n");
    out.push_str(&fence);
    out.push_str(&language);
    out.push('\n');
    out.push_str(code.trim_end_matches('\n'));
    out.push('\n');
    out.push_str(&fence);
    out.push_str("\n\n");
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

/// The fence of a line that opens a code block: three or more backticks and
/// an info string without backticks.
fn opening_fence(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let run = trimmed.len() - trimmed.trim_start_matches('`').len();
    if run >= 3 && !trimmed[run..].contains('`') {
        Some(&trimmed[..run])
    } else {
        None
    }
}

/// Strip trailing blanks and collapse blank runs, leaving fenced code intact.
fn tidy(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut fence: Option<&str> = None;
    let mut blank_run = 0;

    for line in raw.lines() {
        if let Some(open) = fence {
            if line.trim() == open {
                fence = None;
                lines.push(line.trim_end());
            } else {
                lines.push(line);
            }
            continue;
        }
        if let Some(open) = opening_fence(line) {
            fence = Some(open);
            blank_run = 0;
            lines.push(line.trim_end());
            continue;
        }

        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            lines.push("");
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }

    lines.join("\n").trim().to_string()
}
