//! Folded stack traces, the canonical flamegraph input shape.

/// What kind of sample a [`StackTrace`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum StackKind {
    /// Time spent running on a CPU.
    OnCpu,
    /// Time spent blocked off-CPU.
    OffCpu,
    /// A scheduler wakeup chain.
    Wakeup,
    /// Time blocked on block-device I/O.
    BlockIo,
    /// A pure in-kernel stack (see inline-stack extraction).
    Kernel,
    /// A userspace function-entry/exit trace.
    Function,
    /// A memory allocation call stack.
    Alloc,
}

/// One folded stack record: `frame1;frame2;...;frameN count`, leaf last.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StackTrace {
    /// Semicolon-joined frame path, root first, leaf last.
    pub frames: String,
    /// Number of samples this exact frame path was seen.
    pub count: u64,
    /// Sample category.
    pub kind: StackKind,
}

impl StackTrace {
    /// Build a stack trace from already-joined frame text.
    pub fn new(frames: impl Into<String>, count: u64, kind: StackKind) -> Self {
        Self { frames: frames.into(), count, kind }
    }

    /// The leaf (innermost) frame, or the whole path if unjoined.
    pub fn leaf(&self) -> &str {
        self.frames.rsplit(';').next().unwrap_or(&self.frames)
    }
}

/// Sort stacks descending by sample count (report ordering rule).
pub fn sort_by_count_desc(stacks: &mut [StackTrace]) {
    stacks.sort_by(|a, b| b.count.cmp(&a.count));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_is_last_frame() {
        let s = StackTrace::new("main;foo;bar", 3, StackKind::OnCpu);
        assert_eq!(s.leaf(), "bar");
    }

    #[test]
    fn single_frame_leaf_is_itself() {
        let s = StackTrace::new("main", 1, StackKind::OnCpu);
        assert_eq!(s.leaf(), "main");
    }

    #[test]
    fn sort_orders_descending_by_count() {
        let mut stacks = vec![
            StackTrace::new("a", 1, StackKind::OnCpu),
            StackTrace::new("b", 50, StackKind::OnCpu),
            StackTrace::new("c", 10, StackKind::OnCpu),
        ];
        sort_by_count_desc(&mut stacks);
        let counts: Vec<u64> = stacks.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![50, 10, 1]);
    }
}
