//! On-screen message timeline
//!
//! Messages queue FIFO and show one at a time: each is shown at the cursor of
//! the underlying timeline and hidden once its duration has elapsed, at which
//! point the next queued message (if any) takes over.

use super::timeline::Timeline;

#[derive(Debug, Clone, PartialEq)]
enum MessageAction {
    Show(String),
    Hide,
}

#[derive(Debug, Clone, Default)]
pub struct MessageTimeline {
    timeline: Timeline<MessageAction>,
    visible: Option<String>,
}

impl MessageTimeline {
    /// Queue a message behind any already queued ones
    pub fn add(&mut self, text: impl Into<String>, duration: f32) {
        self.timeline.append(MessageAction::Show(text.into()));
        self.timeline.wait(duration);
        self.timeline.append(MessageAction::Hide);
    }

    /// Advance; returns the messages that became visible during this step
    pub fn advance(&mut self, dt: f32) -> Vec<String> {
        let mut shown = Vec::new();
        for action in self.timeline.advance(dt) {
            match action {
                MessageAction::Show(text) => {
                    shown.push(text.clone());
                    self.visible = Some(text);
                }
                MessageAction::Hide => self.visible = None,
            }
        }
        shown
    }

    /// The message currently on screen
    pub fn visible(&self) -> Option<&str> {
        self.visible.as_deref()
    }

    /// Number of queued show/hide actions still pending
    pub fn pending(&self) -> usize {
        self.timeline.len()
    }

    pub fn clock(&self) -> f32 {
        self.timeline.clock()
    }

    /// Hide the current message and drop the queue
    pub fn clear(&mut self) {
        self.timeline.clear();
        self.visible = None;
    }

    pub fn reset(&mut self) {
        self.timeline.reset();
        self.visible = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_expires_and_next_takes_over() {
        let mut messages = MessageTimeline::default();
        messages.add("first", 2.0);
        messages.add("second", 2.0);

        assert_eq!(messages.advance(0.0), vec!["first".to_string()]);
        messages.advance(1.9);
        assert_eq!(messages.visible(), Some("first"));

        let shown = messages.advance(0.2);
        assert_eq!(shown, vec!["second".to_string()]);
        assert_eq!(messages.visible(), Some("second"));

        messages.advance(2.0);
        assert_eq!(messages.visible(), None);
    }

    #[test]
    fn test_single_message_expires() {
        let mut messages = MessageTimeline::default();
        messages.add("only", 2.0);
        messages.advance(1.9);
        assert_eq!(messages.visible(), Some("only"));
        messages.advance(0.2);
        assert_eq!(messages.visible(), None);
    }

    #[test]
    fn test_message_added_later_starts_at_clock() {
        let mut messages = MessageTimeline::default();
        messages.advance(10.0);
        messages.add("late", 1.0);
        messages.advance(0.0);
        assert_eq!(messages.visible(), Some("late"));
        messages.advance(1.01);
        assert_eq!(messages.visible(), None);
    }

    #[test]
    fn test_clear_hides_everything() {
        let mut messages = MessageTimeline::default();
        messages.add("a", 5.0);
        messages.add("b", 5.0);
        messages.advance(0.1);
        messages.clear();
        assert_eq!(messages.visible(), None);
        assert_eq!(messages.pending(), 0);
        messages.advance(20.0);
        assert_eq!(messages.visible(), None);
    }
}
