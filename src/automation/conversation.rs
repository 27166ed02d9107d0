/// Conversational context shared by manual chat messages and automated
/// analysis exchanges. One conversation per active chat session; switching
/// sessions resets the token so the remote AI starts a fresh context.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    last_response_id: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to attach to the next exchange, or `None` for a fresh context.
    pub fn token(&self) -> Option<&str> {
        self.last_response_id.as_deref()
    }

    /// Records the token returned by a successful exchange. A reply without
    /// a token leaves the previous context in place.
    pub fn advance(&mut self, new_token: Option<String>) {
        if let Some(token) = new_token {
            self.last_response_id = Some(token);
        }
    }

    pub fn reset(&mut self) {
        self.last_response_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_carries_token_to_next_exchange() {
        let mut conv = Conversation::new();
        assert_eq!(conv.token(), None);

        conv.advance(Some("resp-1".into()));
        assert_eq!(conv.token(), Some("resp-1"));

        conv.advance(Some("resp-2".into()));
        assert_eq!(conv.token(), Some("resp-2"));
    }

    #[test]
    fn tokenless_reply_keeps_existing_context() {
        let mut conv = Conversation::new();
        conv.advance(Some("resp-1".into()));
        conv.advance(None);
        assert_eq!(conv.token(), Some("resp-1"));
    }

    #[test]
    fn reset_starts_a_fresh_context() {
        let mut conv = Conversation::new();
        conv.advance(Some("resp-1".into()));
        conv.reset();
        assert_eq!(conv.token(), None);
    }
}
