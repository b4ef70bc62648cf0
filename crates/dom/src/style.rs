//! Inline `style` attribute declarations.

/// Parse an inline style attribute into ordered `(property, value)` pairs.
///
/// Property names are lowercased. Semicolons nested inside parentheses or
/// quotes do not split declarations. Declarations without a colon or with an
/// empty name are dropped, matching how browsers ignore malformed entries.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for chunk in split_top_level(style) {
        let Some((name, value)) = chunk.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        if let Some(existing) = out.iter_mut().find(|(prop, _)| *prop == name) {
            existing.1 = value.to_owned();
        } else {
            out.push((name, value.to_owned()));
        }
    }
    out
}

/// Serialize declarations back into attribute form (`a: b; c: d;`).
pub fn serialize_declarations(decls: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in decls {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push(';');
    }
    out
}

fn split_top_level(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (idx, ch) in style.char_indices() {
        match (quote, ch) {
            (Some(open), _) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&style[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < style.len() {
        parts.push(&style[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_parenthesised_values_whole() {
        let decls = parse_declarations("background: url(\"a;b.png\"); Width: 85%;;color:rgba(0, 0, 0, 0.1)");
        assert_eq!(
            decls,
            vec![
                ("background".to_owned(), "url(\"a;b.png\")".to_owned()),
                ("width".to_owned(), "85%".to_owned()),
                ("color".to_owned(), "rgba(0, 0, 0, 0.1)".to_owned()),
            ]
        );
    }

    #[test]
    fn later_declaration_wins_in_place() {
        let decls = parse_declarations("opacity: 0; width: 1px; opacity: 1");
        assert_eq!(serialize_declarations(&decls), "opacity: 1; width: 1px;");
    }
}
