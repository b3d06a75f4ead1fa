//! Onboarding permission grants, kept under their own key next to the
//! call archive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::archive::store::{SharedStore, StoreError};

pub const PERMISSIONS_KEY: &str = "eldershield_permissions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    RecordAudio,
    ReadPhoneState,
    ReadSms,
    ReceiveSms,
    SystemAlertWindow,
    PostNotifications,
}

impl Permission {
    /// Onboarding order.
    pub const ALL: [Permission; 6] = [
        Permission::RecordAudio,
        Permission::ReadPhoneState,
        Permission::ReadSms,
        Permission::ReceiveSms,
        Permission::SystemAlertWindow,
        Permission::PostNotifications,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Permission::RecordAudio => "Ghi âm",
            Permission::ReadPhoneState => "Đọc trạng thái điện thoại",
            Permission::ReadSms => "Đọc tin nhắn SMS",
            Permission::ReceiveSms => "Nhận tin nhắn SMS",
            Permission::SystemAlertWindow => "Hiển thị cảnh báo trên màn hình",
            Permission::PostNotifications => "Gửi thông báo",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Permission::RecordAudio => "Để ghi lại nội dung cuộc gọi lừa đảo làm bằng chứng",
            Permission::ReadPhoneState => {
                "Để phát hiện cuộc gọi đến và kiểm tra số điện thoại lừa đảo"
            }
            Permission::ReadSms => "Để quét và phát hiện tin nhắn lừa đảo",
            Permission::ReceiveSms => "Để kiểm tra tin nhắn đến có phải lừa đảo hay không",
            Permission::SystemAlertWindow => {
                "Để hiển thị cảnh báo ngay khi có cuộc gọi hoặc tin nhắn lừa đảo"
            }
            Permission::PostNotifications => {
                "Để thông báo cho bạn và người thân về các mối đe dọa lừa đảo"
            }
        }
    }
}

pub type PermissionMap = BTreeMap<Permission, bool>;

#[derive(Clone)]
pub struct PermissionStore {
    store: SharedStore,
}

impl PermissionStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Every known permission, defaulting to not granted. Unknown ids in the
    /// stored map are ignored and a corrupt value reads as all-denied.
    pub fn load(&self) -> PermissionMap {
        let mut map: PermissionMap = Permission::ALL.iter().map(|p| (*p, false)).collect();

        let raw = match self.store.get(PERMISSIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return map,
            Err(e) => {
                warn!("permission record unreadable: {}", e);
                return map;
            }
        };

        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
            Ok(stored) => {
                for (id, granted) in stored {
                    let Ok(permission) = serde_json::from_value::<Permission>(serde_json::Value::String(id)) else {
                        continue;
                    };
                    map.insert(permission, granted.as_bool().unwrap_or(false));
                }
            }
            Err(e) => warn!("permission record corrupt, using defaults: {}", e),
        }
        map
    }

    pub fn save(&self, grants: &PermissionMap) -> Result<(), StoreError> {
        let json = serde_json::to_string(grants)?;
        self.store.set(PERMISSIONS_KEY, &json)?;
        info!(granted = grants.values().filter(|g| **g).count(), "permissions saved");
        Ok(())
    }

    pub fn set(&self, permission: Permission, granted: bool) -> Result<(), StoreError> {
        let mut grants = self.load();
        grants.insert(permission, granted);
        self.save(&grants)
    }

    pub fn is_granted(&self, permission: Permission) -> bool {
        self.load().get(&permission).copied().unwrap_or(false)
    }

    /// Whether onboarding has written the record at least once.
    pub fn has_requested(&self) -> bool {
        matches!(self.store.get(PERMISSIONS_KEY), Ok(Some(_)))
    }
}
