// ============================================================
// CSV GRID DECODER
// ============================================================
// Decode comma-separated text bytes into a cell grid, with
// encoding fallback and a best-effort line tokenizer.

use crate::domain::table::CellGrid;

/// Split one line of comma-separated text into fields.
///
/// A field may be wrapped in double quotes, in which case commas inside
/// are literal and `""` escapes one literal quote. Whitespace around
/// fields is trimmed. Malformed quoting never fails: the tokenizer
/// produces a best-effort split, and the row materializer discards CSV
/// rows whose field count does not match the header row's.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Decode raw CSV bytes into a cell grid.
///
/// Tries UTF-8 first, falls back to Windows-1252 for legacy exports,
/// and finally to lossy UTF-8 so a stray byte never aborts the file.
pub fn decode_csv_grid(bytes: &[u8]) -> CellGrid {
    let text = decode_text(bytes);
    text.lines().map(tokenize_line).collect()
}

fn decode_text(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
            if had_errors {
                String::from_utf8_lossy(bytes).into_owned()
            } else {
                decoded.into_owned()
            }
        }
    };

    // A UTF-8 BOM would otherwise end up glued to the first header cell.
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_fields() {
        assert_eq!(tokenize_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize_line(" a , b "), vec!["a", "b"]);
    }

    #[test]
    fn test_tokenize_quoted_comma() {
        assert_eq!(tokenize_line(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_tokenize_escaped_quote() {
        assert_eq!(tokenize_line(r#"a,"b""c",d"#), vec!["a", r#"b"c"#, "d"]);
    }

    #[test]
    fn test_tokenize_empty_and_trailing_fields() {
        assert_eq!(tokenize_line("a,,c,"), vec!["a", "", "c", ""]);
        assert_eq!(tokenize_line(""), vec![""]);
    }

    #[test]
    fn test_tokenize_unclosed_quote_is_best_effort() {
        // Malformed quoting swallows the rest of the line instead of failing.
        assert_eq!(tokenize_line(r#"a,"b,c"#), vec!["a", "b,c"]);
    }

    #[test]
    fn test_decode_utf8_grid() {
        let grid = decode_csv_grid(b"x,y\n1,2\n3,4");
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1], vec!["1", "2"]);
    }

    #[test]
    fn test_decode_strips_bom() {
        let grid = decode_csv_grid(b"\xef\xbb\xbfx,y\n1,2");
        assert_eq!(grid[0][0], "x");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // 0xE9 is "é" in Windows-1252 and invalid as a standalone UTF-8 byte.
        let grid = decode_csv_grid(b"caf\xe9,x\n1,2");
        assert_eq!(grid[0][0], "caf\u{e9}");
    }
}
