//! Ownership and visibility rules for uploads.
//!
//! Superusers see and change everything. Everybody else only sees and changes
//! the uploads they own. Creating is always allowed.

use crate::types::{NewUploadedFile, UploadedFile, User};

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
}

impl From<User> for Principal {
    fn from(u: User) -> Self {
        Self { user_id: u.id, username: u.username, is_superuser: u.is_superuser }
    }
}

impl Principal {
    /// The owner filter to apply to listing queries, `None` meaning unrestricted.
    pub fn owner_scope(&self) -> Option<i64> {
        if self.is_superuser {
            None
        } else {
            Some(self.user_id)
        }
    }

    pub fn can_view(&self, record: &UploadedFile) -> bool {
        self.is_superuser || record.owner_id == self.user_id
    }

    /// `None` stands for a record that does not exist yet.
    pub fn can_change(&self, record: Option<&UploadedFile>) -> bool {
        if self.is_superuser {
            return true;
        }
        record.map_or(true, |r| r.owner_id == self.user_id)
    }

    pub fn can_delete(&self, record: Option<&UploadedFile>) -> bool {
        self.can_change(record)
    }
}

/// Keeps only the records `principal` may see.
pub fn visible_to(principal: &Principal, records: Vec<UploadedFile>) -> Vec<UploadedFile> {
    if principal.is_superuser {
        return records;
    }
    records.into_iter().filter(|r| principal.can_view(r)).collect()
}

/// Attaches the acting principal as owner unless an owner is already set.
pub fn assign_owner(draft: &mut NewUploadedFile, principal: &Principal) {
    if draft.owner_id.is_none() {
        draft.owner_id = Some(principal.user_id);
    }
}
