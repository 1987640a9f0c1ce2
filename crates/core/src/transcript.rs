//! Transcript types — the conversation proposals are extracted from.

use serde::{Deserialize, Serialize};

/// One utterance in a transcript. Speaker `0` is the system marker that
/// carries "Attention" flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub content: String,
    pub speaker: i64,
}

/// An ordered transcript for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: String,
    pub messages: Vec<TranscriptMessage>,
}

impl Transcript {
    pub fn new(session_id: impl Into<String>, messages: Vec<TranscriptMessage>) -> Self {
        Self {
            session_id: session_id.into(),
            messages,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TranscriptMessage> {
        self.messages.get(index)
    }

    /// Numbered `[i] Speaker N: content` lines.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .enumerate()
            .map(|(i, m)| format!("[{i}] Speaker {}: {}", m.speaker, m.content.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_numbers_each_line() {
        let transcript = Transcript::new(
            "s1",
            vec![
                TranscriptMessage { content: " Hi there".into(), speaker: 1 },
                TranscriptMessage { content: "Attention".into(), speaker: 0 },
            ],
        );
        assert_eq!(transcript.render(), "[0] Speaker 1: Hi there\n[1] Speaker 0: Attention");
        assert_eq!(transcript.len(), 2);
        assert!(transcript.get(2).is_none());
    }
}
