/// Identifies one issued lookup for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic request counter for a single field.
///
/// Only the most recently issued token is current; responses carrying any
/// other token are stale and must not update state.
#[derive(Debug, Default, Clone)]
pub struct RequestSequence {
    issued: u64,
    outstanding: Option<u64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, superseding any outstanding one.
    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        self.outstanding = Some(self.issued);
        RequestToken(self.issued)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.outstanding == Some(token.0)
    }

    /// Settle `token`. Returns `true` only for the current token, which is then no longer outstanding.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        if self.is_current(token) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    /// Forget the outstanding request so its response is treated as stale.
    pub fn invalidate(&mut self) {
        self.outstanding = None;
    }

    pub fn in_flight(&self) -> bool {
        self.outstanding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_token_supersedes_earlier() {
        let mut sequence = RequestSequence::new();
        let first = sequence.issue();
        let second = sequence.issue();
        assert!(!sequence.complete(first));
        assert!(sequence.in_flight());
        assert!(sequence.complete(second));
        assert!(!sequence.in_flight());
    }

    #[test]
    fn token_completes_only_once() {
        let mut sequence = RequestSequence::new();
        let token = sequence.issue();
        assert!(sequence.complete(token));
        assert!(!sequence.complete(token));
    }

    #[test]
    fn invalidate_makes_outstanding_stale() {
        let mut sequence = RequestSequence::new();
        let token = sequence.issue();
        sequence.invalidate();
        assert!(!sequence.complete(token));
    }
}
