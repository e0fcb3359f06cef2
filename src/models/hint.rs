//! Partially redacted answers.
use super::Flashcard;
use crate::error::{CoreError, CoreResult};

/// Reveals the first `letters_to_reveal` non-space characters of the card's back
/// and replaces the rest with `_`. Spaces are kept and never counted.
pub fn reveal_hint(card: Option<&Flashcard>, letters_to_reveal: i64) -> CoreResult<String> {
    let card =
        card.ok_or_else(|| CoreError::InvalidArgument("invalid flashcard input".to_string()))?;
    let budget = usize::try_from(letters_to_reveal).map_err(|_| {
        CoreError::InvalidArgument(format!(
            "letters to reveal cannot be negative: {letters_to_reveal}"
        ))
    })?;

    Ok(redact(card.back(), budget))
}

/// Redaction over raw text. An empty string stays empty whatever the budget.
pub fn redact(text: &str, budget: usize) -> String {
    let mut revealed = 0;
    text.chars()
        .map(|ch| {
            if ch == ' ' {
                ' '
            } else if revealed < budget {
                revealed += 1;
                ch
            } else {
                '_'
            }
        })
        .collect()
}
