//! Summary statistics over recognized text.

/// Average silent reading speed
pub const WORDS_PER_MINUTE: f32 = 200.0;

/// Number of non-empty whitespace separated tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated reading time in seconds at [`WORDS_PER_MINUTE`].
pub fn reading_seconds(text: &str) -> f32 {
    (word_count(text) as f32 / WORDS_PER_MINUTE) * 60.0
}

/// Arithmetic mean of confidences, each clamped into `[0, 1]` (NaN counts
/// as 0). An empty input yields 0.0.
pub fn mean_confidence<I>(values: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for value in values {
        sum += clamp_confidence(value) as f64;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    ((sum / count as f64) as f32).clamp(0.0, 1.0)
}

#[inline]
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_ignores_whitespace_runs() {
        assert_eq!(word_count("  a  b \n c "), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count(" \n\t "), 0);
    }

    #[test]
    fn test_reading_seconds() {
        let text = vec!["word"; 200].join(" ");
        assert_eq!(reading_seconds(&text), 60.0);
        assert_eq!(reading_seconds(""), 0.0);
        assert!((reading_seconds("one two three four five") - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_mean_confidence() {
        assert_eq!(mean_confidence(Vec::new()), 0.0);
        assert!((mean_confidence(vec![0.5, 1.0]) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_mean_confidence_clamps_invalid_members() {
        let mean = mean_confidence(vec![1.5, -1.0, f32::NAN, 0.9]);
        assert!((mean - 0.475).abs() < 1e-6, "got {}", mean);
    }
}
