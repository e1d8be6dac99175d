//! Small helpers for the HTML-like markup documents are stored in.

/// Escape text so it renders literally inside markup.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Plain text as markup: escaped, with line breaks kept as `<br>`.
pub fn text_to_markup(text: &str) -> String {
    escape_text(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// Visible text of a markup fragment. Tags are dropped, `<br>` and the end of
/// block elements become newlines, and common entities are decoded.
pub fn markup_to_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut chars = markup.chars();

    while let Some(ch) = chars.next() {
        if ch != '<' {
            out.push(ch);
            continue;
        }

        let mut tag = String::new();
        for c in chars.by_ref() {
            if c == '>' {
                break;
            }
            tag.push(c);
        }

        let closing = tag.starts_with('/');
        let name = tag_name(&tag);

        let breaks = match name.as_str() {
            "br" => true,
            "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => closing,
            _ => false,
        };
        if breaks {
            out.push('\n');
        }
    }

    decode_entities(&out)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        let decoded = rest.find(';').filter(|&end| end <= 8).and_then(|end| {
            let ch = match &rest[1..end] {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "#39" | "apos" => '\'',
                "nbsp" => '\u{a0}',
                _ => return None,
            };
            Some((ch, end + 1))
        });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Lower-cased element name of a tag, with or without its angle brackets.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "wbr"];

/// The tags of `fragment` whose element reaches outside it, in order.
///
/// Elements opened and closed inside the fragment are dropped along with
/// void elements. What is left is the closing tags of elements that began
/// before the fragment followed by the opening tags of elements that end
/// after it. Putting these back in place of a deleted fragment keeps the
/// surrounding markup balanced.
pub fn boundary_tags(fragment: &str) -> String {
    let mut tags: Vec<Option<&str>> = Vec::new();
    let mut open: Vec<(usize, String)> = Vec::new();
    let mut rest = fragment;

    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start..start + len + 1];
        rest = &rest[start + len + 1..];

        let name = tag_name(tag);
        if name.is_empty() || VOID_ELEMENTS.contains(&name.as_str()) || tag.ends_with("/>") {
            continue;
        }

        if tag.starts_with("</") {
            match open.last() {
                Some((idx, top)) if *top == name => {
                    tags[*idx] = None;
                    open.pop();
                }
                _ => tags.push(Some(tag)),
            }
        } else {
            open.push((tags.len(), name));
            tags.push(Some(tag));
        }
    }

    tags.into_iter().flatten().collect()
}

/// True if `offset` falls between a `<` and its closing `>`.
pub fn is_inside_tag(markup: &str, offset: usize) -> bool {
    let head = &markup[..offset.min(markup.len())];
    match (head.rfind('<'), head.rfind('>')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
