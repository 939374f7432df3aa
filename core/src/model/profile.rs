// kirana/src/model/profile.rs

use crate::session::{AccountMode, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub user_id: Uuid,
  pub display_name: String,
  pub phone: Option<String>,
  pub role: Role,
  pub mode: AccountMode,
  pub created_at: DateTime<Utc>,
}

impl Profile {
  /// The row written when a signed-in user has none yet.
  pub fn minimal(user_id: Uuid, role: Role, mode: AccountMode) -> Self {
    Profile {
      user_id,
      display_name: String::new(),
      phone: None,
      role,
      mode,
      created_at: Utc::now(),
    }
  }
}
