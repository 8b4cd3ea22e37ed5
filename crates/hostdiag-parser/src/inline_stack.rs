//! Inline-stack extraction: groups consecutive frame-shaped lines
//! interleaved with event lines into kernel [`StackTrace`] records.

use hostdiag_model::{StackKind, StackTrace};

use crate::ansi::strip_ansi;

/// A line is frame-shaped if it looks like a raw hex address
/// (`0xffffffff81abcdef`) or a `symbol+0xoff` pair.
fn is_frame_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if let Some(hex) = trimmed.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    trimmed.contains("+0x")
}

/// Scan `raw` line by line, grouping consecutive frame-shaped lines
/// into a single [`StackTrace`] (kind [`StackKind::Kernel`]) each time a
/// non-frame line closes an open group. Frames within a group are
/// joined root-first (encounter order), matching folded-stack
/// convention (leaf last is assumed from how the tool emits them).
pub fn extract_inline_stacks(raw: &str) -> Vec<StackTrace> {
    let cleaned = strip_ansi(raw);
    let mut stacks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let flush = |current: &mut Vec<&str>, stacks: &mut Vec<StackTrace>| {
        if !current.is_empty() {
            let frames = current.join(";");
            stacks.push(StackTrace::new(frames, 1, StackKind::Kernel));
            current.clear();
        }
    };

    for line in cleaned.lines() {
        if is_frame_line(line) {
            current.push(line.trim());
        } else {
            flush(&mut current, &mut stacks);
        }
    }
    flush(&mut current, &mut stacks);

    stacks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_consecutive_frame_lines() {
        let raw = "\
some event line
0xffffffff81abcdef
do_syscall_64+0x3a
entry_SYSCALL_64+0x7c
another event line
";
        let stacks = extract_inline_stacks(raw);
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].frames, "0xffffffff81abcdef;do_syscall_64+0x3a;entry_SYSCALL_64+0x7c");
    }

    #[test]
    fn separate_groups_close_on_non_frame_lines() {
        let raw = "a+0x1\nevent\nb+0x2\nc+0x3\n";
        let stacks = extract_inline_stacks(raw);
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0].frames, "a+0x1");
        assert_eq!(stacks[1].frames, "b+0x2;c+0x3");
    }

    #[test]
    fn no_frame_lines_yields_no_stacks() {
        let stacks = extract_inline_stacks("just text\nmore text\n");
        assert!(stacks.is_empty());
    }
}
