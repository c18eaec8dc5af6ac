//! Amount-in-words line splitting

use crate::TextMeasure;

/// Split an amount-in-words string into at most two lines
///
/// Uses the default [`TextMeasure`]. See [`TextMeasure::split_amount_in_words`].
///
/// # Examples
/// ```
/// use check_text::split_amount_in_words;
///
/// let (line1, line2) = split_amount_in_words(
///     "cinquante mille trois cent quarante-deux dinars algériens",
///     500,
///     12,
/// );
/// assert_eq!(line1, "cinquante mille trois cent quarante-deux dinars");
/// assert_eq!(line2, "algériens");
/// ```
pub fn split_amount_in_words(text: &str, available_width: u32, font_size: u32) -> (String, String) {
    TextMeasure::default().split_amount_in_words(text, available_width, font_size)
}

impl TextMeasure {
    /// Split an amount-in-words string into at most two lines
    ///
    /// If the whole text fits into `available_width`, it is returned unchanged
    /// as the first line. Otherwise words are taken greedily for the first line
    /// while it still fits and every remaining word goes to the second line.
    /// The first word always lands on line 1, even when it overflows on its own.
    /// The second line is never wrapped again and may overflow.
    ///
    /// # Arguments
    /// * `text` - Amount in words
    /// * `available_width` - Box width in pixels
    /// * `font_size` - Font size in pixels
    ///
    /// # Returns
    /// `(line1, line2)`, where `line2` is empty when no split was needed
    pub fn split_amount_in_words(
        &self,
        text: &str,
        available_width: u32,
        font_size: u32,
    ) -> (String, String) {
        if self.fits(text, available_width, font_size) {
            return (text.to_string(), String::new());
        }

        let mut words = text.split_whitespace();
        let Some(first) = words.next() else {
            return (String::new(), String::new());
        };

        let limit = available_width as f64;
        let mut line1 = first.to_string();
        let mut line1_chars = first.chars().count();
        let mut overflow = Vec::new();

        for word in words.by_ref() {
            let candidate = line1_chars + 1 + word.chars().count();
            if self.char_run_width(candidate, font_size) <= limit {
                line1.push(' ');
                line1.push_str(word);
                line1_chars = candidate;
            } else {
                overflow.push(word);
                break;
            }
        }

        overflow.extend(words);
        (line1, overflow.join(" "))
    }
}
