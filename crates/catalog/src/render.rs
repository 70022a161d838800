use std::sync::Mutex;

/// Last-write-wins gate for catalog renders.
///
/// Each delivery carries the snapshot revision it was built from. A render started from an
/// older revision that completes after a newer one has been committed is discarded, so the
/// screen never regresses to a stale catalog.
#[derive(Debug, Default)]
pub struct RenderSequencer {
    committed: Mutex<u64>,
}

impl RenderSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `render` unless a newer revision was already committed.
    ///
    /// Re-rendering the committed revision is allowed (search refinements).
    pub fn commit<F: FnOnce()>(&self, revision: u64, render: F) -> bool {
        let mut committed = match self.committed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if revision < *committed {
            tracing::debug!(revision, committed = *committed, "discarding stale catalog render");
            return false;
        }
        *committed = revision;
        render();
        true
    }

    pub fn committed(&self) -> u64 {
        self.committed.lock().map(|c| *c).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_render_of_older_snapshot_is_discarded() {
        let seq = RenderSequencer::new();
        let mut screen = Vec::new();

        assert!(seq.commit(2, || screen.push("S2")));
        assert!(!seq.commit(1, || screen.push("S1")));
        assert!(seq.commit(2, || screen.push("S2 filtered")));

        assert_eq!(screen, vec!["S2", "S2 filtered"]);
        assert_eq!(seq.committed(), 2);
    }
}
