//! Detection of messages aimed at the assistant.

use parley_rs_protocol::BotIdentity;

/// How an inbound message relates to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addressing {
    /// Neither mentions the assistant nor starts with its prefix.
    Unaddressed,
    /// Addressed, but nothing is left once the prefix and mentions are removed.
    Empty,
    /// Addressed; carries the cleaned text.
    Addressed(String),
}

/// Cleaned text when `raw` is addressed to the assistant and non-empty.
pub fn address(raw: &str, bot: &BotIdentity) -> Option<String> {
    match classify(raw, bot) {
        Addressing::Addressed(text) => Some(text),
        Addressing::Unaddressed | Addressing::Empty => None,
    }
}

/// Classify `raw` and strip the prefix marker and every mention of the assistant.
///
/// A message is addressed when it contains `<@ID>` or `<@!ID>` for the
/// assistant's id, or when it starts (after leading whitespace) with the prefix,
/// matched case-insensitively and followed by whitespace or the end of text.
/// A prefix that leads the text once mentions are removed is stripped as well.
pub fn classify(raw: &str, bot: &BotIdentity) -> Addressing {
    let mentions = mention_tokens(&bot.user_id);
    let mentioned = mentions.iter().any(|token| raw.contains(token.as_str()));
    let after_prefix = strip_prefix(raw, &bot.prefix);
    if !mentioned && after_prefix.is_none() {
        return Addressing::Unaddressed;
    }

    let mut text = after_prefix.unwrap_or(raw).to_string();
    for token in &mentions {
        text = text.replace(token.as_str(), " ");
    }
    // A prefix hidden behind a mention only surfaces once mentions are gone.
    let text = strip_prefix(&text, &bot.prefix).unwrap_or(text.as_str());
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        Addressing::Empty
    } else {
        Addressing::Addressed(cleaned)
    }
}

fn mention_tokens(user_id: &str) -> Vec<String> {
    if user_id.is_empty() {
        return Vec::new();
    }
    vec![format!("<@{user_id}>"), format!("<@!{user_id}>")]
}

fn strip_prefix<'a>(raw: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let text = raw.trim_start();
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &text[prefix.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(next) if next.is_whitespace() => Some(rest),
        Some(_) => None,
    }
}
