/// One non-blank source line split into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub line: usize, // 1-based
    pub tokens: Vec<&'a str>,
}

pub const COMMENT: char = '#';

/// Cut `line` at the first comment marker that is not inside a quoted
/// literal such as `c'#'`.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if quoted => escaped = true,
            '\'' => quoted = !quoted,
            COMMENT if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

fn split_field(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Split a line into at most three fields. The third field is whatever
/// remains after the first two, so it may contain whitespace.
pub fn tokenize_line(line: &str) -> Vec<&str> {
    let rest = strip_comment(line).trim();
    let mut tokens = Vec::with_capacity(3);
    let (first, rest) = split_field(rest);
    if first.is_empty() {
        return tokens;
    }
    tokens.push(first);
    let (second, rest) = split_field(rest);
    if second.is_empty() {
        return tokens;
    }
    tokens.push(second);
    if !rest.is_empty() {
        tokens.push(rest);
    }
    tokens
}

/// Tokenize a whole source text, skipping blank and comment-only lines.
pub fn tokenize(src: &str) -> impl Iterator<Item = SourceLine<'_>> {
    src.lines().enumerate().filter_map(|(i, line)| {
        let tokens = tokenize_line(line);
        (!tokens.is_empty()).then(|| SourceLine { line: i + 1, tokens })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_and_comments() {
        assert_eq!(tokenize_line("FIRST  LDCH  C1   # load"), ["FIRST", "LDCH", "C1"]);
        assert_eq!(tokenize_line("   WD"), ["WD"]);
        assert_eq!(tokenize_line("# whole line"), Vec::<&str>::new());
        assert_eq!(tokenize_line("   \t  "), Vec::<&str>::new());
        assert_eq!(tokenize_line("MSG BYTE c'a b'"), ["MSG", "BYTE", "c'a b'"]);
        assert_eq!(tokenize_line("H BYTE c'#' # tail"), ["H", "BYTE", "c'#'"]);
    }

    #[test]
    fn line_numbers_count_skipped_lines() {
        let src = "# header\n\nTEST START 1000\n  RSUB\n";
        let lines: Vec<_> = tokenize(src).map(|l| l.line).collect();
        assert_eq!(lines, [3, 4]);
    }
}
