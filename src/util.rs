/// Asserts that a numerical value is in the provided interval `[a,b]` and panics
/// with a helpful message if not
///
/// ### Example
/// ```
/// # use gpt_text_gym::assert_interval;
/// let value = 0.5;
/// assert_interval!(value, 0.0, 1.0);
/// ```
/// A value outside the interval panics with the message "Invalid value for \`value\`. Must be in the interval \[0.0, 1.0\]."
#[macro_export]
macro_rules! assert_interval {
    ($var:expr, $a:expr, $b:expr) => {
        assert!(
            $var >= $a && $var <= $b,
            "Invalid value for `{}`. Must be in the interval [{}, {}].",
            stringify!($var),
            $a,
            $b,
        );
    };
}

/// Strip leading whitespace from every line of `string`
///
/// With `max_remove = None` all leading whitespace goes, otherwise at most
/// `max_remove` whitespace characters are removed per line.
pub fn remove_leading_whitespace(string: &str, max_remove: Option<usize>) -> String {
    string
        .split('\n')
        .map(|line| {
            let trimmed = line.trim_start();
            match max_remove {
                None => trimmed,
                Some(max) => {
                    let leading = line[..line.len() - trimmed.len()].chars();
                    let cut: usize = leading.take(max).map(char::len_utf8).sum();
                    &line[cut..]
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_all_leading_whitespace() {
        let s = "    a\n\t b\nc  ";
        assert_eq!(remove_leading_whitespace(s, None), "a\nb\nc  ");
    }

    #[test]
    fn removes_bounded_leading_whitespace() {
        let s = "        deep\n  shallow\nnone";
        assert_eq!(
            remove_leading_whitespace(s, Some(4)),
            "    deep\nshallow\nnone",
            "At most 4 characters are removed per line"
        );
    }

    #[test]
    #[should_panic(expected = "Must be in the interval")]
    fn assert_interval_panics_outside() {
        let temperature = 3.0;
        assert_interval!(temperature, 0.0, 2.0);
    }
}
