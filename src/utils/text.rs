use std::convert::Infallible;
use std::str::FromStr;

/// Cosmetic transform applied after wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Unknown names fall back to [`Theme::Light`], so parsing never fails.
impl FromStr for Theme {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        })
    }
}

/// Wrap `text` to `max_width` characters and apply `theme`.
///
/// A width of zero or less disables wrapping and returns the input untouched.
pub fn wrap_text(text: &str, max_width: i64, theme: Theme) -> String {
    if max_width <= 0 {
        return text.to_string();
    }
    let lines = wrap_lines(text, max_width as usize);
    match theme {
        Theme::Light => lines.join("\n"),
        Theme::Dark => format!("**{}**", lines.join("**<br>**")),
    }
}

/// Greedy word wrap, one input line at a time. A trailing newline yields a
/// trailing empty line.
pub fn wrap_lines(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let start = lines.len();
        wrap_paragraph(paragraph, max_width, &mut lines);
        if lines.len() == start {
            lines.push(String::new());
        }
    }
    lines
}

fn wrap_paragraph(paragraph: &str, max_width: usize, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0;

    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if current_len == 0 {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed <= max_width {
            if current_len > 0 {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
            continue;
        }

        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if word_len > max_width {
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(max_width).peekable();
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() || chunk.len() == max_width {
                    lines.push(chunk.iter().collect());
                } else {
                    current = chunk.iter().collect();
                    current_len = chunk.len();
                }
            }
        } else {
            current.push_str(word);
            current_len = word_len;
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
}

/// First `limit` characters of `text`, with `...` appended when cut.
pub fn truncate_preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOREM: &str = "The quick brown fox jumps over the lazy dog while a \
        supercalifragilisticexpialidocious parrot recites unreasonably long words";

    #[test]
    fn zero_or_negative_width_returns_input_unchanged() {
        let text = "  keep   all\tthe\n\nspacing  ";
        assert_eq!(wrap_text(text, 0, Theme::Light), text);
        assert_eq!(wrap_text(text, -3, Theme::Dark), text);
    }

    #[test]
    fn no_line_exceeds_width_unless_a_word_does() {
        for width in 1..40usize {
            for line in wrap_lines(LOREM, width) {
                assert!(
                    line.chars().count() <= width,
                    "width {} produced {:?}",
                    width,
                    line
                );
            }
        }
    }

    #[test]
    fn long_word_is_chunked_with_remainder() {
        let lines = wrap_lines("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn remainder_of_long_word_takes_following_words() {
        let lines = wrap_lines("abcdefghij k", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij k"]);
    }

    #[test]
    fn exact_fit_stays_on_one_line() {
        assert_eq!(wrap_lines("ab cd", 5), vec!["ab cd"]);
        assert_eq!(wrap_lines("ab cd ef", 5), vec!["ab cd", "ef"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(wrap_lines("héllo wörld", 5), vec!["héllo", "wörld"]);
    }

    #[test]
    fn line_breaks_are_kept() {
        let wrapped = wrap_text("first line\n\nsecond", 20, Theme::Light);
        assert_eq!(wrapped, "first line\n\nsecond");
    }

    #[test]
    fn trailing_newline_survives_wrapping() {
        assert_eq!(wrap_text("a b\n", 10, Theme::Light), "a b\n");
        assert_eq!(wrap_text("a b\r\nc\n\n", 10, Theme::Light), "a b\nc\n\n");
        assert_eq!(wrap_lines("", 10), vec![""]);
    }

    #[test]
    fn dark_theme_bolds_each_line() {
        let wrapped = wrap_text("one two three", 7, Theme::Dark);
        assert_eq!(wrapped, "**one two**<br>**three**");
    }

    #[test]
    fn theme_parsing_defaults_to_light() {
        assert_eq!("Dark".parse(), Ok(Theme::Dark));
        assert_eq!("light".parse(), Ok(Theme::Light));
        assert_eq!("solarized".parse(), Ok(Theme::Light));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(truncate_preview("short", 10), "short");
        assert_eq!(truncate_preview("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_preview("ééééé", 3), "ééé...");
    }
}
