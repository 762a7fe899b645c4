//! Interactive bucket selection.

use std::io::{BufRead, Write};

use crate::error::{PolicyManagerError, PolicyManagerResult};

/// Result of parsing one line of operator input against a menu of `count` buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelection {
    /// Zero-based indices, in the order given, without duplicates.
    pub indices: Vec<usize>,
    /// One-based numbers that fell outside the menu.
    pub out_of_range: Vec<i64>,
}

/// Parse `all` or a comma-separated list of one-based bucket numbers.
///
/// Returns `None` when any element is not a number.
pub fn parse_selection(input: &str, count: usize) -> Option<ParsedSelection> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Some(ParsedSelection {
            indices: (0..count).collect(),
            out_of_range: Vec::new(),
        });
    }

    let mut selection = ParsedSelection {
        indices: Vec::new(),
        out_of_range: Vec::new(),
    };
    for part in input.split(',') {
        let number: i64 = part.trim().parse().ok()?;
        match usize::try_from(number) {
            Ok(n) if (1..=count).contains(&n) => {
                if !selection.indices.contains(&(n - 1)) {
                    selection.indices.push(n - 1);
                }
            }
            _ => selection.out_of_range.push(number),
        }
    }
    Some(selection)
}

fn read_line<R: BufRead>(input: &mut R) -> PolicyManagerResult<String> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| PolicyManagerError::Selection(format!("Failed to read input: {e}")))?;
    if read == 0 {
        return Err(PolicyManagerError::Selection(
            "input closed before a selection was confirmed".to_string(),
        ));
    }
    Ok(line)
}

/// Show a numbered menu of `buckets` and loop until the operator confirms a
/// non-empty selection.
pub fn select_buckets<R: BufRead, W: Write>(
    buckets: &[String],
    input: &mut R,
    output: &mut W,
) -> PolicyManagerResult<Vec<String>> {
    if buckets.is_empty() {
        return Err(PolicyManagerError::NoBuckets);
    }

    let io_err = |e: std::io::Error| PolicyManagerError::Selection(format!("Failed to write prompt: {e}"));

    writeln!(output, "\nAvailable buckets:").map_err(io_err)?;
    for (i, bucket) in buckets.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, bucket).map_err(io_err)?;
    }

    loop {
        write!(output, "\nEnter bucket numbers (comma-separated) or 'all': ").map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let line = read_line(input)?;
        let Some(parsed) = parse_selection(&line, buckets.len()) else {
            writeln!(
                output,
                "Invalid input. Please enter comma-separated numbers or 'all'."
            )
            .map_err(io_err)?;
            continue;
        };

        for number in &parsed.out_of_range {
            writeln!(output, "Invalid bucket number: {number}").map_err(io_err)?;
        }

        if parsed.indices.is_empty() {
            writeln!(output, "No valid buckets selected. Please try again.").map_err(io_err)?;
            continue;
        }

        let selected: Vec<String> = parsed
            .indices
            .iter()
            .map(|&i| buckets[i].clone())
            .collect();

        writeln!(output, "\nSelected buckets:").map_err(io_err)?;
        for bucket in &selected {
            writeln!(output, "- {bucket}").map_err(io_err)?;
        }
        write!(output, "\nProceed with these buckets? (y/n): ").map_err(io_err)?;
        output.flush().map_err(io_err)?;

        if read_line(input)?.trim().eq_ignore_ascii_case("y") {
            return Ok(selected);
        }
        writeln!(output, "Please select buckets again.").map_err(io_err)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn buckets() -> Vec<String> {
        vec!["alpha".into(), "beta".into(), "gamma".into()]
    }

    fn run(script: &str) -> (PolicyManagerResult<Vec<String>>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = select_buckets(&buckets(), &mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_parse_all_is_case_insensitive() {
        let parsed = parse_selection(" ALL \n", 3).unwrap();
        assert_eq!(parsed.indices, vec![0, 1, 2]);
        assert!(parsed.out_of_range.is_empty());
    }

    #[test]
    fn test_parse_numbers_with_spaces_and_duplicates() {
        let parsed = parse_selection("3, 1 ,3", 3).unwrap();
        assert_eq!(parsed.indices, vec![2, 0]);
    }

    #[test]
    fn test_parse_reports_out_of_range() {
        let parsed = parse_selection("0,2,4,-1", 3).unwrap();
        assert_eq!(parsed.indices, vec![1]);
        assert_eq!(parsed.out_of_range, vec![0, 4, -1]);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(parse_selection("1,two", 3).is_none());
        assert!(parse_selection("", 3).is_none());
    }

    #[test]
    fn test_select_confirmed_selection() {
        let (result, output) = run("1,3\ny\n");
        assert_eq!(result.unwrap(), vec!["alpha", "gamma"]);
        assert!(output.contains("1. alpha"));
        assert!(output.contains("3. gamma"));
        assert!(output.contains("- gamma"));
    }

    #[test]
    fn test_select_retries_until_valid() {
        let (result, output) = run("abc\n7\n2\nn\nall\nY\n");
        assert_eq!(result.unwrap(), vec!["alpha", "beta", "gamma"]);
        assert!(output.contains("Invalid input."));
        assert!(output.contains("Invalid bucket number: 7"));
        assert!(output.contains("No valid buckets selected."));
        assert!(output.contains("Please select buckets again."));
    }

    #[test]
    fn test_select_fails_on_eof() {
        let (result, _) = run("1\n");
        assert!(matches!(result, Err(PolicyManagerError::Selection(_))));
    }

    #[test]
    fn test_select_fails_without_buckets() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let result = select_buckets(&[], &mut input, &mut output);
        assert!(matches!(result, Err(PolicyManagerError::NoBuckets)));
    }
}
