use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Random version-4 UUID. Backends use this to assign entity ids; the
/// session layer never mints ids itself.
pub fn new_uuid() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    // set version 4 and variant bits
    bytes[6] = (bytes[6] & 0x0F) | 0x40;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}{}{}{}-{}{}-{}{}-{}{}-{}{}{}{}{}{}",
        hex[0], hex[1], hex[2], hex[3], hex[4], hex[5], hex[6], hex[7], hex[8], hex[9], hex[10],
        hex[11], hex[12], hex[13], hex[14], hex[15]
    )
}

/// One stored secret record. `id`, `created_at`, and `updated_at` are
/// assigned by the backend; `updated_at` is refreshed on every
/// successful edit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: String,
    pub title: String,
    pub username: String,
    pub secret: String,
    pub url: String,
    pub notes: String,
    /// References a [`Category`] by name, not id.
    pub category: String,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Creation payload: everything but the backend-assigned fields.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewCredential {
    pub title: String,
    pub username: String,
    pub secret: String,
    pub url: String,
    pub notes: String,
    pub category: String,
}

/// Field-wise partial edit. Merged into the full cached entity before
/// an update call, so the backend always receives the complete record.
#[derive(Debug, Clone, Default)]
pub struct CredentialPatch {
    pub title: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
}

impl CredentialPatch {
    pub fn apply(self, mut current: Credential) -> Credential {
        if let Some(title) = self.title {
            current.title = title;
        }
        if let Some(username) = self.username {
            current.username = username;
        }
        if let Some(secret) = self.secret {
            current.secret = secret;
        }
        if let Some(url) = self.url {
            current.url = url;
        }
        if let Some(notes) = self.notes {
            current.notes = notes;
        }
        if let Some(category) = self.category {
            current.category = category;
        }
        current
    }
}

/// Named grouping label for credentials. Names are unique among all
/// categories, case-sensitive, compared after trimming.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
}

/// Category payload before the backend assigns an id.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CategoryDraft {
    pub name: String,
    pub icon: String,
}
