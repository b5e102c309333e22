//! Stale-result guard for overlapping requests.
//!
//! The client never cancels in-flight requests. A caller that fires a new
//! request before the previous one resolved (rapid filter changes, say)
//! issues a token per request and drops any result whose token is no longer
//! current.

/// Token identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic token source owned by the caller.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token that supersedes every earlier one.
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    pub fn latest(&self) -> Option<RequestToken> {
        (self.latest > 0).then_some(RequestToken(self.latest))
    }
}

/// A result paired with the token it was requested under.
#[derive(Debug)]
pub struct Tracked<T> {
    pub token: RequestToken,
    pub value: T,
}

impl<T> Tracked<T> {
    /// The value, if no newer request has been issued since.
    pub fn into_current(self, sequence: &RequestSequence) -> Option<T> {
        sequence.is_current(self.token).then_some(self.value)
    }
}
