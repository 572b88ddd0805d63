use crate::error::{GitError, GitResult};
use crate::git::model::{Action, File};

/// Split output into lines, dropping empty ones
pub fn split_non_empty_lines(output: &str) -> Vec<&str> {
    output
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parse git log --pretty=%H output
///
/// git prints newest first, the result is oldest first.
pub fn parse_commit_ids(output: &str) -> Vec<String> {
    split_non_empty_lines(output)
        .into_iter()
        .rev()
        .map(str::to_string)
        .collect()
}

/// Map a status code to its action
pub fn parse_change_action(code: &str) -> GitResult<Action> {
    code.parse()
}

/// Parse git diff-tree --no-commit-id --name-status -r output
///
/// Format: `<code>\t<path>`, or `<code><score>\t<src>\t<dst>` for detected
/// renames and copies.
pub fn parse_committed_file_list(output: &str, commit_id: &str) -> GitResult<Vec<File>> {
    split_non_empty_lines(output)
        .into_iter()
        .map(|line| parse_committed_file(line, commit_id))
        .collect::<GitResult<Vec<_>>>()
        .map_err(|e| GitError::ParseContext {
            commit_id: commit_id.to_string(),
            source: Box::new(e),
        })
}

fn parse_committed_file(line: &str, commit_id: &str) -> GitResult<File> {
    let parts: Vec<&str> = line.split('\t').map(str::trim).collect();
    if parts.len() < 2 || parts[1].is_empty() {
        return Err(GitError::ParseError(format!(
            "Expected '<code>\\t<path>', got: {}",
            line
        )));
    }

    // R100 / C075 carry a similarity score
    let code = parts[0].trim_end_matches(|c: char| c.is_ascii_digit());
    let action = parse_change_action(code)?;

    let filename = match action {
        Action::Rename | Action::Copy if parts.len() >= 3 => parts[2],
        _ => parts[1],
    };

    Ok(File {
        filename: filename.to_string(),
        action,
        commit_id: Some(commit_id.to_string()),
    })
}

/// Parse git status --short output
pub fn parse_working_tree_status(output: &str) -> GitResult<Vec<File>> {
    let mut files = Vec::new();

    for line in split_non_empty_lines(output) {
        // "M  file.txt" (staged) -> "M file.txt"
        let line = collapse_first_double_space(line);
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            return Err(GitError::ParseError(format!(
                "Malformed status line: {}",
                line
            )));
        }

        let action = parse_change_action(parts[0])?;

        // Format: R  old.txt -> new.txt
        let filename = if action == Action::Rename {
            parts.get(3).copied().ok_or_else(|| {
                GitError::ParseError(format!("Rename without destination: {}", line))
            })?
        } else {
            parts[1]
        };

        files.push(File::new(filename, action));
    }

    Ok(files)
}

fn collapse_first_double_space(line: &str) -> String {
    let bytes = line.as_bytes();
    match bytes
        .windows(2)
        .position(|w| w[0].is_ascii_whitespace() && w[1].is_ascii_whitespace())
    {
        Some(i) => format!("{} {}", &line[..i], &line[i + 2..]),
        None => line.to_string(),
    }
}

/// Parse branch or tag listings, dropping the first `strip_prefix_len`
/// characters of every line
pub fn parse_name_list(output: &str, strip_prefix_len: usize) -> GitResult<Vec<String>> {
    split_non_empty_lines(output)
        .into_iter()
        .map(|line| {
            let name: String = line.chars().skip(strip_prefix_len).collect();
            if name.is_empty() {
                Err(GitError::ParseError(format!("Empty name in listing: {:?}", line)))
            } else {
                Ok(name)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_non_empty_lines() {
        let lines = split_non_empty_lines("a\r\n\nb\n\nc\n");
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_commit_ids_chronological() {
        let ids = parse_commit_ids("c3\nc2\nc1\n");
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_parse_change_action_known_codes() {
        let cases = [
            ("A", Action::Add),
            ("D", Action::Delete),
            ("R", Action::Rename),
            ("RM", Action::Rename),
            ("M", Action::Modify),
            ("C", Action::Copy),
            ("AM", Action::Copy),
            ("??", Action::Add),
        ];
        for (code, expected) in cases {
            assert_eq!(parse_change_action(code).unwrap(), expected, "code {}", code);
        }
    }

    #[test]
    fn test_parse_change_action_unknown() {
        for code in ["MM", "U", "", "X"] {
            let err = parse_change_action(code).unwrap_err();
            assert!(matches!(err, GitError::UnknownAction(ref c) if c == code));
        }
    }

    #[test]
    fn test_parse_committed_file_list() {
        let output = "M\tsrc/main.rs\nA\tREADME.md\nD\told.txt\n";
        let files = parse_committed_file_list(output, "abc123").unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files[0].filename, "src/main.rs");
        assert_eq!(files[0].action, Action::Modify);
        assert_eq!(files[1].action, Action::Add);
        assert_eq!(files[2].action, Action::Delete);
        assert!(files.iter().all(|f| f.commit_id.as_deref() == Some("abc123")));
    }

    #[test]
    fn test_parse_committed_file_list_rename_with_score() {
        let output = "R100\told.txt\tnew.txt";
        let files = parse_committed_file_list(output, "abc123").unwrap();

        assert_eq!(files[0].action, Action::Rename);
        assert_eq!(files[0].filename, "new.txt");
    }

    #[test]
    fn test_parse_committed_file_list_unknown_code_names_commit() {
        let output = "M\ta.txt\nT\tlink";
        let err = parse_committed_file_list(output, "deadbeef").unwrap_err();

        match &err {
            GitError::ParseContext { commit_id, source } => {
                assert_eq!(commit_id, "deadbeef");
                assert!(matches!(**source, GitError::UnknownAction(ref c) if c == "T"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("deadbeef"));
    }

    #[test]
    fn test_parse_committed_file_list_malformed_line() {
        let err = parse_committed_file_list("M", "abc").unwrap_err();
        assert!(matches!(err, GitError::ParseContext { .. }));
    }

    #[test]
    fn test_parse_status_staged_modification() {
        let files = parse_working_tree_status("M  file.txt").unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].action, Action::Modify);
        assert_eq!(files[0].filename, "file.txt");
        assert!(files[0].commit_id.is_none());
    }

    #[test]
    fn test_parse_status_unstaged_modification() {
        let files = parse_working_tree_status(" M src/lib.rs").unwrap();
        assert_eq!(files[0].action, Action::Modify);
        assert_eq!(files[0].filename, "src/lib.rs");
    }

    #[test]
    fn test_parse_status_rename() {
        let files = parse_working_tree_status("R  old.txt -> new.txt").unwrap();
        assert_eq!(files[0].action, Action::Rename);
        assert_eq!(files[0].filename, "new.txt");

        let files = parse_working_tree_status("RM old.txt -> new.txt").unwrap();
        assert_eq!(files[0].action, Action::Rename);
        assert_eq!(files[0].filename, "new.txt");
    }

    #[test]
    fn test_parse_status_mixed() {
        let output = "A  added.rs\n?? untracked.txt\nD  gone.txt\nAM copied.rs\n";
        let files = parse_working_tree_status(output).unwrap();

        let actions: Vec<Action> = files.iter().map(|f| f.action).collect();
        assert_eq!(
            actions,
            vec![Action::Add, Action::Add, Action::Delete, Action::Copy]
        );
        assert_eq!(files[1].filename, "untracked.txt");
    }

    #[test]
    fn test_parse_status_rename_missing_destination() {
        assert!(matches!(
            parse_working_tree_status("R  old.txt"),
            Err(GitError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_status_unknown_code() {
        assert!(matches!(
            parse_working_tree_status("UU conflicted.txt"),
            Err(GitError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_parse_branch_names() {
        let names = parse_name_list("* master\n  feature-x\n", 2).unwrap();
        assert_eq!(names, vec!["master", "feature-x"]);
    }

    #[test]
    fn test_parse_tag_names() {
        let names = parse_name_list("v1.0\nv1.1\n", 0).unwrap();
        assert_eq!(names, vec!["v1.0", "v1.1"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(split_non_empty_lines("").is_empty());
        assert!(parse_commit_ids("").is_empty());
        assert!(parse_committed_file_list("", "abc").unwrap().is_empty());
        assert!(parse_working_tree_status("").unwrap().is_empty());
        assert!(parse_name_list("", 2).unwrap().is_empty());
    }
}
