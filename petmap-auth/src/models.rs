use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Credentials posted to the sign-in endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Fields posted to the registration endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Preset avatar picked by the user
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Avatar {
    #[default]
    Dog,
    Cat,
    Bone,
    Yarn,
}

impl Avatar {
    pub fn as_str(&self) -> &str {
        match self {
            Avatar::Dog => "dog",
            Avatar::Cat => "cat",
            Avatar::Bone => "bone",
            Avatar::Yarn => "yarn",
        }
    }

    /// Parse a stored key, unknown keys fall back to the default avatar
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "cat" => Avatar::Cat,
            "bone" => Avatar::Bone,
            "yarn" => Avatar::Yarn,
            _ => Avatar::Dog,
        }
    }

    pub fn all() -> &'static [Avatar] {
        static ALL: [Avatar; 4] = [Avatar::Dog, Avatar::Cat, Avatar::Bone, Avatar::Yarn];
        &ALL
    }
}

impl<'de> Deserialize<'de> for Avatar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = Option::<String>::deserialize(deserializer)?;
        Ok(key.map(|k| Avatar::from_key(&k)).unwrap_or_default())
    }
}

/// Profile of the signed-in user as returned by `GET /auth/me`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    /// Read-only on the client
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "description", deserialize_with = "null_as_empty")]
    pub bio: String,
    #[serde(default)]
    pub avatar: Avatar,
}

impl UserProfile {
    /// Email with the local part hidden except its first character
    pub fn masked_email(&self) -> String {
        match self.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() => {
                let first: String = local.chars().take(1).collect();
                format!("{}***@{}", first, domain)
            }
            _ => self.email.clone(),
        }
    }

    /// The editable part of this profile
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            name: self.name.clone(),
            bio: self.bio.clone(),
            avatar: self.avatar,
        }
    }
}

/// Wholesale profile update sent to `PUT /auth/me`; email is never sent
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileUpdate {
    pub name: String,
    pub bio: String,
    pub avatar: Avatar,
}

/// Image file attached to a submission
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoAttachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, guessing the MIME type from its extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo".to_string());
        let mime_type = mime_for_extension(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default(),
        );
        Ok(Self::new(file_name, mime_type, bytes))
    }

    /// Build the binary multipart part for this attachment
    pub fn to_part(&self) -> Result<reqwest::multipart::Part, reqwest::Error> {
        reqwest::multipart::Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime_type)
    }
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Build a `application/json` multipart part holding `value`
pub fn json_part<T: Serialize>(value: &T) -> Result<reqwest::multipart::Part, String> {
    let json = serde_json::to_vec(value).map_err(|e| format!("Failed to encode JSON: {}", e))?;
    reqwest::multipart::Part::bytes(json)
        .mime_str("application/json")
        .map_err(|e| format!("Invalid MIME type: {}", e))
}
