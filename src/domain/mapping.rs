// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Row Mapping Logic
//!
//! This module turns a database `Row` into one output `Line`.
//!
//! The output format is positional: fields are joined by the separator and
//! rows are delimited by `\n`, with no quoting or escaping. Two things would
//! corrupt that layout, so each field is cleaned first:
//! 1. **Separator collisions**: every occurrence of the separator is removed.
//! 2. **Embedded newlines**: every `\n` becomes a single space.
//!
//! `NULL` fields are written as empty text.

use crate::domain::entities::{Line, Row};

/// Maps a row to its delimited, newline-terminated line.
pub fn row_to_line(row: &Row, separator: &str) -> Line {
    let cleaned: Vec<String> = row
        .fields
        .iter()
        .map(|field| clean_field(field.as_deref().unwrap_or_default(), separator))
        .collect();
    Line::terminated(cleaned.join(separator))
}

/// Removes the separator and newlines from a single field value.
pub fn clean_field(value: &str, separator: &str) -> String {
    let stripped = strip_separator(value, separator);
    if !stripped.contains('\n') {
        return stripped;
    }
    // A separator containing a space can reappear once newlines become spaces.
    strip_separator(&stripped.replace('\n', " "), separator)
}

/// Removes `separator` until it no longer occurs.
///
/// A single pass is not enough: removing `ab` from `aabb` leaves `ab`.
fn strip_separator(value: &str, separator: &str) -> String {
    if separator.is_empty() {
        return value.to_string();
    }
    let mut out = value.to_string();
    while out.contains(separator) {
        out = out.replace(separator, "");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[Option<&str>]) -> Row {
        Row::new(fields.iter().map(|f| f.map(str::to_string)).collect())
    }

    #[test]
    fn test_basic_join() {
        let line = row_to_line(&row(&[Some("a"), Some("b"), Some("c")]), "~~");
        assert_eq!(line.as_str(), "a~~b~~c\n");
    }

    #[test]
    fn test_separator_collision_and_null() {
        let sep = ",";
        let lines: Vec<String> = [
            row(&[Some("a"), Some("b")]),
            row(&[Some("c,d"), Some("e")]),
            row(&[None, Some("f")]),
        ]
        .iter()
        .map(|r| row_to_line(r, sep).to_string())
        .collect();

        assert_eq!(lines, vec!["a,b\n", "cd,e\n", ",f\n"]);
    }

    #[test]
    fn test_null_is_not_the_string_null() {
        let line = row_to_line(&row(&[None, None]), "|");
        assert_eq!(line.as_str(), "|\n");
    }

    #[test]
    fn test_newlines_become_spaces() {
        let value = "first\nsecond\n\nthird";
        let cleaned = clean_field(value, "~~");
        assert_eq!(cleaned, "first second  third");
        assert!(!cleaned.contains('\n'));
        assert_eq!(cleaned.len(), value.len());
    }

    #[test]
    fn test_separator_never_survives_stripping() {
        let cases = [
            ("aabb", "ab"),
            ("~~~~~", "~~"),
            ("x~~y~~z", "~~"),
            ("a\nb", "\n"),
            ("a\n|b", " |"),
            ("||||", "|"),
        ];
        for (value, sep) in cases {
            let cleaned = clean_field(value, sep);
            assert!(
                !cleaned.contains(sep),
                "{:?} still contains {:?} after cleaning {:?}",
                cleaned,
                sep,
                value
            );
            assert!(!cleaned.contains('\n'));
        }
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let once = clean_field("ab~~c~~~d", "~~");
        assert_eq!(clean_field(&once, "~~"), once);
    }

    #[test]
    fn test_separator_count_in_line() {
        let sep = "~~";
        let r = row(&[Some("1"), Some("x~~y"), None, Some("multi\nline"), Some("")]);
        let line = row_to_line(&r, sep);

        assert_eq!(line.as_str().matches(sep).count(), r.field_count() - 1);
        assert!(line.as_str().ends_with('\n'));
        assert_eq!(line.as_str().matches('\n').count(), 1);
    }

    #[test]
    fn test_empty_separator() {
        let line = row_to_line(&row(&[Some("ab"), Some("c\nd")]), "");
        assert_eq!(line.as_str(), "abc d\n");
    }

    #[test]
    fn test_empty_row() {
        let line = row_to_line(&Row::new(vec![]), "~~");
        assert_eq!(line.as_str(), "\n");
    }

    #[test]
    fn test_deterministic() {
        let r = row(&[Some("a~~b"), None, Some("c\n")]);
        assert_eq!(row_to_line(&r, "~~"), row_to_line(&r, "~~"));
    }

    #[test]
    fn test_utf8_bytes() {
        let line = row_to_line(&row(&[Some("café"), Some("naïve")]), "~~");
        assert_eq!(line.as_bytes(), "café~~naïve\n".as_bytes());
    }
}
