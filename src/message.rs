//! Chat messages and sender roles.

/// Full-width colon, the preferred role separator.
pub const FULL_WIDTH_COLON: char = '：';

/// Logical sender of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The developer.
    User,
    /// Backend-generated content.
    Assistant,
    /// Status notices and errors.
    System,
}

impl Role {
    /// Roles in prefix-matching priority order.
    pub const ALL: [Role; 3] = [Role::User, Role::Assistant, Role::System];

    /// Label shown in front of the message body.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "用户",
            Self::Assistant => "SmartTA",
            Self::System => "系统",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An immutable chat message. Built at the trigger site and moved into the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    body: String,
}

impl Message {
    pub fn new(role: Role, body: impl Into<String>) -> Self {
        Self {
            role,
            body: body.into(),
        }
    }

    pub fn user(body: impl Into<String>) -> Self {
        Self::new(Role::User, body)
    }

    pub fn assistant(body: impl Into<String>) -> Self {
        Self::new(Role::Assistant, body)
    }

    pub fn system(body: impl Into<String>) -> Self {
        Self::new(Role::System, body)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Wire form parsed by the renderer: `label：body`.
    pub fn compose(&self) -> String {
        format!("{}{}{}", self.role.label(), FULL_WIDTH_COLON, self.body)
    }
}
