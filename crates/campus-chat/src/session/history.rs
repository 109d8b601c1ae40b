pub use crate::api_client::HistoryPair;
use crate::session::{
    Role,
    Turn,
};

/// Pairs each user turn with the assistant turn that directly follows it.
///
/// `transcript` must not contain the question about to be sent. Junctions that are not
/// user-then-assistant are skipped.
pub fn build_chat_history(transcript: &[Turn]) -> Vec<HistoryPair> {
    transcript
        .windows(2)
        .filter_map(|pair| match (pair[0].role, pair[1].role) {
            (Role::User, Role::Assistant) => Some(HistoryPair(pair[0].text.clone(), pair[1].text.clone())),
            _ => None,
        })
        .collect()
}
