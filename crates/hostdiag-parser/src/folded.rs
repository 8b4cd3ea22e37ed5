//! Folded-stack parser: `frame1;frame2;...;frameN count`, the canonical
//! flamegraph input format.

use hostdiag_model::{sort_by_count_desc, StackKind, StackTrace};

use crate::ansi::strip_ansi;

/// Parse folded-stack lines. Each line splits on its final whitespace
/// run: the left side is the semicolon-joined frame path, the right
/// side must parse as an integer count or the line is skipped. Blank
/// and `#`-prefixed lines are skipped. Results sort descending by
/// count, ties broken by string comparison of the frame path for
/// determinism.
pub fn parse_folded_stacks(raw: &str, kind: StackKind) -> Vec<StackTrace> {
    let cleaned = strip_ansi(raw);
    let mut stacks = Vec::new();

    for line in cleaned.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(split_at) = trimmed.rfind(char::is_whitespace) else {
            continue;
        };
        let (frames, count_str) = trimmed.split_at(split_at);
        let count_str = count_str.trim();
        let Ok(count) = count_str.parse::<u64>() else {
            continue;
        };
        stacks.push(StackTrace::new(frames.trim_end(), count, kind));
    }

    stacks.sort_by(|a, b| a.frames.cmp(&b.frames));
    sort_by_count_desc(&mut stacks);
    stacks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts_descending_by_count() {
        let raw = "main;foo 5\nmain;bar 50\nmain;baz 10\n";
        let stacks = parse_folded_stacks(raw, StackKind::OnCpu);
        let counts: Vec<u64> = stacks.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![50, 10, 5]);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let raw = "# comment\n\nmain;foo 1\n";
        let stacks = parse_folded_stacks(raw, StackKind::OnCpu);
        assert_eq!(stacks.len(), 1);
    }

    #[test]
    fn skips_lines_without_a_trailing_integer() {
        let raw = "main;foo notanumber\nmain;bar 3\n";
        let stacks = parse_folded_stacks(raw, StackKind::OnCpu);
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].frames, "main;bar");
    }

    #[test]
    fn ties_break_by_string_compare() {
        let raw = "zframe 5\naframe 5\n";
        let stacks = parse_folded_stacks(raw, StackKind::OnCpu);
        assert_eq!(stacks[0].frames, "aframe");
        assert_eq!(stacks[1].frames, "zframe");
    }
}
