//! Message rendering.
//!
//! A composed message like `系统：扫描完成` is split at its role separator,
//! the prefix is classified against the known role labels, and the result is
//! appended to the tail of the [`Transcript`]: prefix in the bold role style,
//! then the body unstyled, then a blank line.

pub mod style;
pub mod transcript;

pub use style::{Rgb, StyleProfile, TextStyle};
pub use transcript::{Span, Transcript};

use std::ops::Range;

use tracing::trace;

use crate::message::{FULL_WIDTH_COLON, Role};

/// Separator between consecutive rendered messages.
const ENTRY_TERMINATOR: &str = "\n\n";

/// Split `text` after its role separator.
///
/// The first full-width colon wins; the first ASCII colon is the fallback.
/// Returns the trimmed prefix (separator included) and the trimmed body, or
/// `None` when the text has no separator at all.
pub fn split_prefix(text: &str) -> Option<(&str, &str)> {
    let idx = text.find(FULL_WIDTH_COLON).or_else(|| text.find(':'))?;
    let sep_len = text[idx..].chars().next().map_or(1, char::len_utf8);
    let (prefix, body) = text.split_at(idx + sep_len);
    Some((prefix.trim(), body.trim()))
}

/// Match a prefix against the role labels in priority order.
pub fn classify(prefix: &str) -> Option<Role> {
    Role::ALL
        .into_iter()
        .find(|role| prefix.starts_with(role.label()))
}

/// Appends styled messages to a transcript.
#[derive(Debug, Clone, Default)]
pub struct MessageRenderer {
    profile: StyleProfile,
}

impl MessageRenderer {
    pub fn new(profile: StyleProfile) -> Self {
        Self { profile }
    }

    /// Render `text` at the tail of `transcript`. Returns the range of spans
    /// that were appended. Never drops content.
    pub fn render(&self, transcript: &mut Transcript, text: &str) -> Range<usize> {
        let Some((prefix, body)) = split_prefix(text) else {
            trace!("No role separator; rendering verbatim");
            return transcript.append_entry([Span {
                text: format!("{text}{ENTRY_TERMINATOR}"),
                style: TextStyle::default(),
            }]);
        };

        let prefix_style = match classify(prefix) {
            Some(role) => self.profile.for_role(role).bolded(),
            None => {
                trace!(prefix, "Unrecognized role prefix; rendering unstyled");
                TextStyle::default()
            }
        };

        transcript.append_entry([
            Span {
                text: prefix.to_string(),
                style: prefix_style,
            },
            Span {
                text: format!("\n{body}{ENTRY_TERMINATOR}"),
                style: TextStyle::default(),
            },
        ])
    }
}
