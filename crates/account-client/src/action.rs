use bytes::Bytes;
use serde::Serialize;
use std::path::Path;

/// Image payload for an avatar change.
#[derive(Debug, Clone)]
pub struct AvatarAsset {
    /// File name presented to the service in the upload form.
    pub name: String,
    /// MIME type of the payload.
    pub content_type: String,
    pub data: Bytes,
}

impl AvatarAsset {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// MIME type for an image path by extension. Unknown extensions fall
    /// back to `image/jpeg`, which the upload endpoint sniffs anyway.
    pub fn content_type_for(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("bmp") => "image/bmp",
            _ => "image/jpeg",
        }
    }
}

/// Profile fields to update. Unset fields are left untouched on the
/// service; at least one must be set for the request to mean anything.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub display_name: Option<String>,
    pub real_name: Option<String>,
    pub summary: Option<String>,
}

impl ProfileFields {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.real_name.is_none() && self.summary.is_none()
    }

    /// Names of the set fields, for receipts and logs.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.display_name.is_some() {
            names.push("display_name");
        }
        if self.real_name.is_some() {
            names.push("real_name");
        }
        if self.summary.is_some() {
            names.push("summary");
        }
        names
    }
}

/// One maintenance action to apply through an authenticated session.
#[derive(Debug, Clone)]
pub enum ActionRequest {
    ChangeAvatar(AvatarAsset),
    UpdateProfile(ProfileFields),
    SendGift { recipient: String },
}

impl ActionRequest {
    /// Short label for logs and progress lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionRequest::ChangeAvatar(_) => "avatar",
            ActionRequest::UpdateProfile(_) => "profile",
            ActionRequest::SendGift { .. } => "gift",
        }
    }
}

/// What the service applied, as reported back to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionReceipt {
    AvatarChanged { image: String },
    ProfileUpdated { fields: Vec<String> },
    GiftSent { item: String, cost: u64 },
}

/// Result of one action against an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    /// The service confirmed the change.
    Applied(ActionReceipt),
    /// The service accepted the request but returned a confirmation the
    /// client could not read. The change may or may not have landed;
    /// consumers must keep this distinct from both success and failure.
    AppliedUnconfirmed(ActionReceipt),
}

impl ActionResult {
    pub fn receipt(&self) -> &ActionReceipt {
        match self {
            ActionResult::Applied(receipt) | ActionResult::AppliedUnconfirmed(receipt) => receipt,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, ActionResult::Applied(_))
    }
}
