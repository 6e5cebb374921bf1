//! Counts how many texts match a regular expression.

use geotweets_tweets_models::{Frequency, PostFrame};
use regex::RegexBuilder;

use crate::TweetsError;

/// How [`find_frequencies`] matches and reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrequencyOptions {
    /// Match case exactly. Off by default.
    pub case_sensitive: bool,
    /// Report `matches / total` instead of the raw pair.
    pub ratio: bool,
}

/// Counts the texts containing a match for `pattern`.
///
/// Missing texts (`None`) count toward the total but never match.
///
/// # Errors
///
/// * [`TweetsError::InvalidPattern`] if `pattern` is not a valid regex
/// * [`TweetsError::DivisionByZero`] if a ratio is requested over no texts
pub fn find_frequencies<'a, I, T>(
    texts: I,
    pattern: &str,
    options: FrequencyOptions,
) -> Result<Frequency, TweetsError>
where
    I: IntoIterator<Item = T>,
    T: Into<Option<&'a str>>,
{
    let re = RegexBuilder::new(pattern)
        .case_insensitive(!options.case_sensitive)
        .build()?;

    let mut matches = 0usize;
    let mut total = 0usize;
    for text in texts {
        total += 1;
        if text.into().is_some_and(|t| re.is_match(t)) {
            matches += 1;
        }
    }

    log::debug!("Pattern '{pattern}' matched {matches} of {total} texts");

    if !options.ratio {
        return Ok(Frequency::Counts { matches, total });
    }

    if total == 0 {
        return Err(TweetsError::DivisionByZero);
    }

    #[allow(clippy::cast_precision_loss)]
    let value = matches as f64 / total as f64;

    Ok(Frequency::Ratio { value })
}

/// [`find_frequencies`] over a frame's text column.
///
/// # Errors
///
/// [`TweetsError::MissingColumn`] if the frame has no text column, plus the
/// errors of [`find_frequencies`].
pub fn find_text_frequencies(
    frame: &PostFrame,
    pattern: &str,
    options: FrequencyOptions,
) -> Result<Frequency, TweetsError> {
    find_frequencies(frame.texts()?, pattern, options)
}

#[cfg(test)]
mod tests {
    use geotweets_tweets_models::{Column, Post};

    use super::*;

    const TEXTS: &[&str] = &[
        "Sunset over Sydney Harbour",
        "sydney traffic again",
        "Flat white in Melbourne",
        "SYDNEY!!!",
        "nothing to see here",
    ];

    #[test]
    fn counts_case_insensitively_by_default() {
        let freq = find_frequencies(TEXTS.iter().copied(), "sydney", FrequencyOptions::default())
            .unwrap();
        assert_eq!(
            freq,
            Frequency::Counts {
                matches: 3,
                total: 5
            }
        );
    }

    #[test]
    fn case_sensitive_matching() {
        let options = FrequencyOptions {
            case_sensitive: true,
            ratio: false,
        };
        let freq = find_frequencies(TEXTS.iter().copied(), "sydney", options).unwrap();
        assert_eq!(
            freq,
            Frequency::Counts {
                matches: 1,
                total: 5
            }
        );
    }

    #[test]
    fn ratio_mode() {
        let options = FrequencyOptions {
            case_sensitive: false,
            ratio: true,
        };
        let Frequency::Ratio { value } =
            find_frequencies(TEXTS.iter().copied(), r"syd\w+", options).unwrap()
        else {
            panic!("ratio mode returns a ratio");
        };
        assert!((value - 0.6).abs() < 1e-12, "ratio was {value}");
    }

    #[test]
    fn empty_input() {
        let empty: [&str; 0] = [];
        assert_eq!(
            find_frequencies(empty, "x", FrequencyOptions::default()).unwrap(),
            Frequency::Counts {
                matches: 0,
                total: 0
            }
        );

        let ratio = FrequencyOptions {
            case_sensitive: false,
            ratio: true,
        };
        assert!(matches!(
            find_frequencies(empty, "x", ratio),
            Err(TweetsError::DivisionByZero)
        ));
    }

    #[test]
    fn missing_texts_count_toward_total() {
        let texts = [Some("beach day"), None, Some("Beach!")];
        assert_eq!(
            find_frequencies(texts, "beach", FrequencyOptions::default()).unwrap(),
            Frequency::Counts {
                matches: 2,
                total: 3
            }
        );
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(matches!(
            find_frequencies(TEXTS.iter().copied(), "(unclosed", FrequencyOptions::default()),
            Err(TweetsError::InvalidPattern(_))
        ));
    }

    #[test]
    fn frame_text_column() {
        let frame = PostFrame::new(vec![
            Post::new("a", 0.0, 0.0, 0).with_text("Bondi"),
            Post::new("b", 0.0, 0.0, 0),
        ]);
        assert_eq!(
            find_text_frequencies(&frame, "bondi", FrequencyOptions::default()).unwrap(),
            Frequency::Counts {
                matches: 1,
                total: 2
            }
        );

        let no_text = PostFrame::with_columns([Column::UId], vec![]);
        assert!(matches!(
            find_text_frequencies(&no_text, "bondi", FrequencyOptions::default()),
            Err(TweetsError::MissingColumn(_))
        ));
    }
}
