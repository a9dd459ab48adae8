//! Correlation metadata: the line-based markers embedded in operator-facing
//! text, and the pure resolution logic that reads them back out.
//!
//! The external channel has no structured side-channel, so routing data
//! travels as parseable lines inside free chat text. This module is the
//! only place that writes or parses those markers.

use uuid::Uuid;

use opchat_types::chat::ChatSession;

/// Identifiers extracted from an operator reply's available context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyTarget {
    pub session_id: Option<Uuid>,
    pub user_id: Option<String>,
}

impl ReplyTarget {
    pub fn is_empty(&self) -> bool {
        self.session_id.is_none() && self.user_id.is_none()
    }

    /// Per-field fallback: fields already set win over `other`'s.
    fn or(self, other: ReplyTarget) -> ReplyTarget {
        ReplyTarget {
            session_id: self.session_id.or(other.session_id),
            user_id: self.user_id.or(other.user_id),
        }
    }
}

/// Scan text for marker lines.
///
/// Recognized markers, one per line: `session:<uuid>`, `user_id:<id>`, and
/// the deprecated `user:<id>` spelling. The first occurrence of each wins.
/// A `session:` line whose value is not a valid UUID is ignored.
pub fn extract_target(text: &str) -> ReplyTarget {
    let mut target = ReplyTarget::default();

    for line in text.lines() {
        let line = line.trim();
        if target.session_id.is_none()
            && let Some(value) = line.strip_prefix("session:")
        {
            target.session_id = Uuid::parse_str(value.trim()).ok();
        } else if target.user_id.is_none() {
            // `user_id:` must be checked before `user:` -- the deprecated
            // prefix is a prefix of the current one.
            let value = line
                .strip_prefix("user_id:")
                .or_else(|| line.strip_prefix("user:"));
            if let Some(value) = value {
                let value = value.trim();
                if !value.is_empty() {
                    target.user_id = Some(value.to_string());
                }
            }
        }
    }

    target
}

/// Resolve a reply's target from its available text context.
///
/// Markers in the replied-to message's text take priority over markers in
/// the reply's own text, per field.
pub fn resolve_target(own_text: &str, replied_to_text: Option<&str>) -> ReplyTarget {
    let from_reference = replied_to_text.map(extract_target).unwrap_or_default();
    from_reference.or(extract_target(own_text))
}

/// Format the operator notification for a web visitor's message.
///
/// The marker block addresses the session (and the user, when known) so a
/// reply referencing this text can be routed back.
pub fn format_web_notification(session: &ChatSession, content: &str) -> String {
    match &session.user_id {
        Some(user_id) => format!(
            "#web\nuser_id:{user_id}\nsession:{}\n{content}",
            session.id
        ),
        None => format!("#web\nsession:{}\n{content}", session.id),
    }
}

/// Format the operator notification for a message sent by a channel user
/// directly (no web session involved).
pub fn format_visitor_notification(sender: &str, content: &str) -> String {
    format!("#user\nuser_id:{sender}\n\n{content}")
}

/// Diagnostic prompt sent back to the operator when a reply cannot be
/// correlated.
pub fn unresolved_prompt() -> &'static str {
    "session:{uuid} topilmadi. Reply qiling yoki matnda session qo'ying."
}
