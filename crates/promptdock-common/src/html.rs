//! Plain text to HTML conversions used by paste emulation and direct
//! markup writes.

const EMPTY_PARAGRAPH: &str = "<p><br></p>";

/// Escape `&`, `<` and `>`. Quotes are left alone; output only ever lands
/// in element content.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// One `<p>` per maximal run of non-empty lines (lines joined by `<br>`),
/// plus one empty paragraph per blank line.
pub fn blank_line_paragraphs(text: &str) -> String {
    let mut html = String::new();
    let mut run: Vec<String> = Vec::new();

    fn flush(run: &mut Vec<String>, html: &mut String) {
        if run.is_empty() {
            return;
        }
        html.push_str("<p>");
        html.push_str(&run.join("<br>"));
        html.push_str("</p>");
        run.clear();
    }

    for line in text.split('\n') {
        if line.is_empty() {
            flush(&mut run, &mut html);
            html.push_str(EMPTY_PARAGRAPH);
        } else {
            run.push(escape_html(line));
        }
    }
    flush(&mut run, &mut html);

    if html.is_empty() {
        html.push_str(EMPTY_PARAGRAPH);
    }
    html
}

/// Exactly one `<p>` per input line. Editors that keep one paragraph node
/// per line need this form.
pub fn strict_paragraphs(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                EMPTY_PARAGRAPH.to_string()
            } else {
                format!("<p>{}</p>", escape_html(line))
            }
        })
        .collect()
}

/// Escaped text with every newline turned into `<br>`.
pub fn line_break_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

/// Number of lines as the serializers count them (`"".split('\n')` is one).
pub fn count_lines(text: &str) -> usize {
    text.split('\n').count()
}
