//! Role-based access control for the admin API.

use crate::db::models::Role;
use crate::error::CmsError;

/// Fine-grained permissions checked by admin handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    DashboardRead,

    // Blog and marketing content
    ContentRead,
    ContentWrite,
    CommentModerate,

    // Prospects
    LeadRead,
    LeadManage,
    LeadDelete,
    SubscriberRead,
    SubscriberDelete,

    // Support chat
    ChatManage,

    // Site administration
    SettingsManage,
    UserManage,
}

impl Role {
    /// Check if role has a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::Admin => true,
            Role::Editor => matches!(
                permission,
                DashboardRead
                    | ContentRead
                    | ContentWrite
                    | CommentModerate
                    | LeadRead
                    | LeadManage
                    | SubscriberRead
                    | ChatManage
            ),
            Role::User => false,
        }
    }

    pub fn require(&self, permission: Permission) -> Result<(), CmsError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(CmsError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_permissions() {
        let role = Role::Admin;
        assert!(role.has_permission(Permission::UserManage));
        assert!(role.has_permission(Permission::SettingsManage));
        assert!(role.has_permission(Permission::LeadDelete));
    }

    #[test]
    fn editor_manages_content_not_site() {
        let role = Role::Editor;
        assert!(role.has_permission(Permission::ContentWrite));
        assert!(role.has_permission(Permission::LeadRead));
        assert!(!role.has_permission(Permission::LeadDelete));
        assert!(!role.has_permission(Permission::SettingsManage));
        assert!(!role.has_permission(Permission::UserManage));
    }

    #[test]
    fn plain_user_is_forbidden_everywhere() {
        assert!(matches!(
            Role::User.require(Permission::DashboardRead),
            Err(CmsError::Forbidden)
        ));
    }
}
