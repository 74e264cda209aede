// src/scan.rs

//! Line scanning over in-memory text.
//!
//! Everything here is a pure function over `&[&str]`: find the first line
//! matching a predicate, split around it, and collect ranges of lines with an
//! optional per-line transform and junk filter. Reaching end-of-input is a
//! `None` match, never an error.

use regex::Regex;

/// Result of advancing to the first matching line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'l, 'a> {
    /// Index of the matching line, or `None` at end-of-input.
    pub index: Option<usize>,
    /// Lines skipped before the match (all lines if nothing matched).
    pub before: &'l [&'a str],
    /// Lines after the match (empty if nothing matched).
    pub after: &'l [&'a str],
}

impl<'l, 'a> Split<'l, 'a> {
    pub fn matched(&self) -> bool {
        self.index.is_some()
    }
}

/// Split `text` into lines without their terminators.
pub fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Index of the first line at or after `start` satisfying `pred`.
pub fn find_from<P>(lines: &[&str], start: usize, pred: P) -> Option<usize>
where
    P: Fn(&str) -> bool,
{
    lines
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, line)| pred(**line))
        .map(|(i, _)| i)
}

/// Advance to the first line satisfying `pred`.
pub fn split_at_match<'l, 'a, P>(lines: &'l [&'a str], pred: P) -> Split<'l, 'a>
where
    P: Fn(&str) -> bool,
{
    match find_from(lines, 0, pred) {
        Some(i) => Split {
            index: Some(i),
            before: &lines[..i],
            after: &lines[i + 1..],
        },
        None => Split {
            index: None,
            before: lines,
            after: &[],
        },
    }
}

/// Lines from `start` up to (not including) the next line satisfying `stop`,
/// or to end-of-input.
pub fn take_until<'l, 'a, P>(lines: &'l [&'a str], start: usize, stop: P) -> &'l [&'a str]
where
    P: Fn(&str) -> bool,
{
    if start >= lines.len() {
        return &[];
    }
    let end = find_from(lines, start, stop).unwrap_or(lines.len());
    &lines[start..end]
}

/// Apply `transform` to every line not matching any `junk` pattern.
pub fn collect<T, F>(lines: &[&str], junk: &[Regex], mut transform: F) -> Vec<T>
where
    F: FnMut(&str) -> T,
{
    lines
        .iter()
        .filter(|line| !junk.iter().any(|re| re.is_match(line)))
        .map(|line| transform(*line))
        .collect()
}

pub fn contains(needle: &str) -> impl Fn(&str) -> bool + '_ {
    move |line: &str| line.contains(needle)
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "header\nCommand line:\n  gmx mdrun\n\nbody\n";

    #[test]
    fn split_reports_before_and_after() {
        let lines = lines(LOG);
        let split = split_at_match(&lines, contains("Command line:"));
        assert_eq!(split.index, Some(1));
        assert_eq!(split.before, &["header"]);
        assert_eq!(split.after[0], "  gmx mdrun");
    }

    #[test]
    fn end_of_input_is_not_a_match() {
        let lines = lines(LOG);
        let split = split_at_match(&lines, contains("Finished"));
        assert!(!split.matched());
        assert_eq!(split.before.len(), lines.len());
        assert!(split.after.is_empty());
    }

    #[test]
    fn take_until_stops_before_blank_line() {
        let lines = lines(LOG);
        assert_eq!(take_until(&lines, 1, is_blank), &["Command line:", "  gmx mdrun"]);
        assert_eq!(take_until(&lines, 4, is_blank), &["body"]);
        assert!(take_until(&lines, 99, is_blank).is_empty());
    }

    #[test]
    fn collect_drops_junk_and_transforms() {
        let lines = vec!["a.mdp", " indented", "", "b.mdp"];
        let junk = vec![Regex::new(r"^ ").unwrap(), Regex::new(r"^$").unwrap()];
        let out = collect(&lines, &junk, |l| l.to_uppercase());
        assert_eq!(out, vec!["A.MDP", "B.MDP"]);
    }
}
