use regex::Regex;
use std::collections::BTreeMap;

/// Extract the added lines from a unified-diff patch, keyed by their line
/// number in the new file.
///
/// Hunk headers (`@@ -a,b +c,d @@`) reset the new-file cursor to `c - 1`.
/// Added lines (`+`, but not the `+++` file marker) advance the cursor and
/// are recorded with their text trimmed; context lines advance the cursor;
/// removed lines do not.
pub fn extract_changed_lines(patch: &str) -> (BTreeMap<u64, String>, Vec<u64>) {
    let mut changed_lines = BTreeMap::new();
    let mut line_numbers = Vec::new();
    let mut current_line: u64 = 0;

    let hunk_re = Regex::new(r"\+(\d+)").expect("hunk header regex");

    for line in patch.split('\n') {
        if line.starts_with("@@") {
            if let Some(caps) = hunk_re.captures(line) {
                if let Ok(start) = caps[1].parse::<u64>() {
                    current_line = start.saturating_sub(1);
                }
            }
            continue;
        }

        if line.starts_with('+') && !line.starts_with("+++") {
            current_line += 1;
            changed_lines.insert(current_line, line[1..].trim().to_string());
            line_numbers.push(current_line);
        } else if !line.starts_with('-') {
            current_line += 1;
        }
    }

    (changed_lines, line_numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_hunk_addition() {
        let patch = "\
@@ -1,3 +1,4 @@
 fn main() {
+    println!(\"hello\");
     let x = 1;
 }";
        let (changed, numbers) = extract_changed_lines(patch);

        assert_eq!(numbers, vec![2]);
        assert_eq!(changed.get(&2).unwrap(), "println!(\"hello\");");
    }

    #[test]
    fn test_multiple_hunks_reset_cursor() {
        let patch = "\
@@ -1,2 +1,3 @@
 line one
+inserted early
 line two
@@ -10,2 +11,3 @@
 line ten
+inserted late
 line eleven";
        let (changed, numbers) = extract_changed_lines(patch);

        assert_eq!(numbers, vec![2, 12]);
        assert_eq!(changed.get(&2).unwrap(), "inserted early");
        assert_eq!(changed.get(&12).unwrap(), "inserted late");
    }

    #[test]
    fn test_removed_lines_do_not_advance_cursor() {
        let patch = "\
@@ -1,3 +1,3 @@
 keep
-old value
+new value
 tail";
        let (changed, numbers) = extract_changed_lines(patch);

        assert_eq!(numbers, vec![2]);
        assert_eq!(changed.get(&2).unwrap(), "new value");
    }

    #[test]
    fn test_file_markers_are_not_changes() {
        let patch = "\
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,1 +1,2 @@
 existing
+added";
        let (changed, numbers) = extract_changed_lines(patch);

        assert_eq!(numbers, vec![2]);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed.get(&2).unwrap(), "added");
    }

    #[test]
    fn test_added_line_text_is_trimmed() {
        let patch = "@@ -0,0 +1,1 @@\n+    indented   ";
        let (changed, _) = extract_changed_lines(patch);
        assert_eq!(changed.get(&1).unwrap(), "indented");
    }

    #[test]
    fn test_empty_patch() {
        let (changed, numbers) = extract_changed_lines("");
        assert!(changed.is_empty());
        assert!(numbers.is_empty());
    }

    #[test]
    fn test_malformed_hunk_header_leaves_cursor_untouched() {
        let patch = "\
@@ malformed @@
+orphan line";
        let (changed, numbers) = extract_changed_lines(patch);

        // Cursor stays at 0, the added line lands at 1.
        assert_eq!(numbers, vec![1]);
        assert_eq!(changed.get(&1).unwrap(), "orphan line");
    }

    #[test]
    fn test_consecutive_additions_number_sequentially() {
        let patch = "\
@@ -5,2 +5,5 @@
 context
+first
+second
+third
 tail";
        let (changed, numbers) = extract_changed_lines(patch);

        assert_eq!(numbers, vec![6, 7, 8]);
        assert_eq!(changed.get(&6).unwrap(), "first");
        assert_eq!(changed.get(&7).unwrap(), "second");
        assert_eq!(changed.get(&8).unwrap(), "third");
    }
}
