/// Split a CSS selector list at its top-level commas.
///
/// Commas inside quoted attribute values, `[...]` or `(...)` stay part of
/// their selector. Empty entries are dropped and each entry is trimmed.
pub fn split_selector_list(list: &str) -> Vec<String> {
    let mut selectors = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut escaped = false;

    for ch in list.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                current.push(ch);
            }
            '"' | '\'' => {
                match quote {
                    Some(q) if q == ch => quote = None,
                    None => quote = Some(ch),
                    _ => {}
                }
                current.push(ch);
            }
            '[' | '(' if quote.is_none() => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' if quote.is_none() => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if quote.is_none() && depth == 0 => {
                push_trimmed(&mut selectors, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_trimmed(&mut selectors, &current);
    selectors
}

fn push_trimmed(selectors: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        selectors.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_list() {
        assert_eq!(
            split_selector_list("textarea, div[contenteditable=\"true\"] ,[role=\"textbox\"]"),
            vec![
                "textarea",
                "div[contenteditable=\"true\"]",
                "[role=\"textbox\"]"
            ]
        );
    }

    #[test]
    fn test_split_keeps_quoted_commas() {
        assert_eq!(
            split_selector_list("textarea[placeholder*=\"Ask, anything\"], #chat-input"),
            vec!["textarea[placeholder*=\"Ask, anything\"]", "#chat-input"]
        );
        assert_eq!(
            split_selector_list("div:not(.a, .b), p"),
            vec!["div:not(.a, .b)", "p"]
        );
    }

    #[test]
    fn test_split_drops_empty_entries() {
        assert_eq!(split_selector_list(" , a,, "), vec!["a"]);
        assert!(split_selector_list("").is_empty());
    }
}
