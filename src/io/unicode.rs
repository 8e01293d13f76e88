//! Unicode utilities for display text.
//!
//! Transcripts are full of multi-byte characters (`₹`, `’`), so anything
//! shortened for display is cut at grapheme boundaries, never at bytes.

use unicode_segmentation::UnicodeSegmentation;

/// Truncates a string at a grapheme cluster boundary.
///
/// Returns a slice containing at most `max_graphemes` grapheme clusters.
#[must_use]
pub fn truncate_graphemes(s: &str, max_graphemes: usize) -> &str {
    let mut end_byte = 0;

    for (count, grapheme) in s.graphemes(true).enumerate() {
        if count >= max_graphemes {
            break;
        }
        end_byte += grapheme.len();
    }

    &s[..end_byte]
}

/// Single-line preview of `s`, at most `max_graphemes` long plus an
/// ellipsis when cut.
///
/// Newlines and runs of whitespace collapse to single spaces.
///
/// # Examples
///
/// ```
/// use transcript_qa::io::preview;
///
/// assert_eq!(preview("FY23 revenue:\n₹70,000 Cr", 100), "FY23 revenue: ₹70,000 Cr");
/// assert_eq!(preview("₹₹₹₹", 2), "₹₹...");
/// ```
#[must_use]
pub fn preview(s: &str, max_graphemes: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = truncate_graphemes(&flat, max_graphemes);
    if cut.len() < flat.len() {
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_combining_marks() {
        // "e" + combining acute accent is one grapheme
        assert_eq!(truncate_graphemes("e\u{0301}x", 1), "e\u{0301}");
    }

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate_graphemes("Hello", 3), "Hel");
        assert_eq!(truncate_graphemes("₹70,000", 2), "₹7");
        assert_eq!(truncate_graphemes("Hi", 10), "Hi");
        assert_eq!(truncate_graphemes("", 5), "");
    }

    #[test]
    fn test_preview_flattens_whitespace() {
        assert_eq!(preview("  a\n\n b\tc  ", 10), "a b c");
    }

    #[test]
    fn test_preview_truncates_multibyte() {
        let text = "Revenue of ₹70,000 Cr, up 18%";
        let p = preview(text, 12);
        assert_eq!(p, "Revenue of ₹...");
    }

    #[test]
    fn test_preview_zero() {
        assert_eq!(preview("abc", 0), "...");
        assert_eq!(preview("", 0), "");
    }
}
