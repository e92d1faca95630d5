pub mod bootstrap;
pub mod mailer;
pub mod notifications;
pub mod passwords;
pub mod rbac;
pub mod slug;
pub mod tokens;
