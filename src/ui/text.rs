//! Width-aware text wrapping for panel rendering.

use unicode_width::UnicodeWidthStr;

/// Greedy word wrap to `width` columns. A word wider than the line is split
/// hard so no output line ever overflows.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![];
    }
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        if raw_line.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let sep = if current.is_empty() { 0 } else { 1 };
            if current.width() + sep + word.width() <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
            } else {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if word.width() <= width {
                    current.push_str(word);
                } else {
                    // Hard-split the oversized word
                    let mut piece = String::new();
                    for c in word.chars() {
                        if piece.width() + unicode_width::UnicodeWidthChar::width(c).unwrap_or(1) > width {
                            lines.push(std::mem::take(&mut piece));
                        }
                        piece.push(c);
                    }
                    current = piece;
                }
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = wrap("smoke on the second floor", 12);
        assert_eq!(lines, vec!["smoke on the", "second floor"]);
    }

    #[test]
    fn preserves_blank_lines() {
        let lines = wrap("a\n\nb", 10);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn hard_splits_oversized_words() {
        let lines = wrap("P0000GL41OMEP0000GL41OME", 10);
        assert!(lines.iter().all(|l| l.width() <= 10));
        assert_eq!(lines.concat(), "P0000GL41OMEP0000GL41OME");
    }
}
