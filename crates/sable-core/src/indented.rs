//! Indented-syntax translation.
//!
//! Rewrites indentation-structured source into the braced syntax before
//! lexing. The translation is line-preserving: braces are appended to
//! existing lines, never emitted on lines of their own, so positions in
//! compile errors still point at the author's source.

/// Translate indented source into braced source.
pub(crate) fn to_braced(source: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut open_levels: Vec<usize> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push(String::new());
            continue;
        }
        let indent = indent_of(line);
        let next_indent = lines[i + 1..]
            .iter()
            .find(|l| !l.trim().is_empty())
            .map(|l| indent_of(l))
            .unwrap_or(0);

        let mut rendered = line.trim_end().to_string();
        if next_indent > indent {
            rendered.push_str(" {");
            open_levels.push(indent);
        } else {
            if !trimmed.ends_with(';') && !trimmed.starts_with("//") {
                rendered.push(';');
            }
            while let Some(&level) = open_levels.last() {
                if next_indent <= level {
                    open_levels.pop();
                    rendered.push_str(" }");
                } else {
                    break;
                }
            }
        }
        out.push(rendered);
    }
    out.join("\n")
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}
