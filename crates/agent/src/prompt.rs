//! Prompt construction for one attention index.

use actionstage_core::transcript::Transcript;
use chrono::{DateTime, Utc};

pub const SYSTEM_PROMPT: &str = "\
You are a meeting assistant that turns a conversation into staged actions.

Rules:
- Use the read tools (list_calendar_events, read_emails, get_contacts) to resolve facts such as event ids and email addresses.
- Use a propose tool for every side effect: create_calendar_event, update_calendar_event, delete_calendar_event, send_email, create_issue, send_chat_message.
- Proposals are only staged for a human to review. Never claim or assume that anything was sent, created or changed.
- If a value cannot be resolved, propose anyway with a placeholder such as <unknown email for John Doe>.
- If a tool returns an error, retry with corrected arguments, use a placeholder, or continue without that data.
- Only propose actions the conversation actually calls for. When you are done, reply with a short summary and stop calling tools.";

/// The user turn: date context, the numbered transcript, and the message
/// at `attention_index`.
///
/// Returns `None` when the index is outside the transcript.
pub fn user_prompt(
    transcript: &Transcript,
    attention_index: usize,
    now: DateTime<Utc>,
    time_zone: &str,
) -> Option<String> {
    let attention = transcript.get(attention_index)?;

    Some(format!(
        "Today is {date} (current time {time} UTC). Unless the conversation says otherwise, times are in the {time_zone} time zone.\n\
         \n\
         Transcript:\n\
         {transcript}\n\
         \n\
         Attention point: message [{attention_index}] (Speaker {speaker}): {content}\n\
         \n\
         Propose the actions warranted by the conversation leading up to this point.",
        date = now.format("%A, %B %-d, %Y"),
        time = now.format("%H:%M"),
        transcript = transcript.render(),
        speaker = attention.speaker,
        content = attention.content.trim(),
    ))
}
