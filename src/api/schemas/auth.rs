use crate::domain::user::SignInEvent;
use serde::Deserialize;

/// Identity and profile forwarded by the authentication provider's state-change callback.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", alias = "photoUrl")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl From<SignInRequest> for SignInEvent {
    fn from(request: SignInRequest) -> Self {
        Self {
            uid: request.uid.unwrap_or_default(),
            email: request.email,
            display_name: request.display_name,
            photo_url: request.photo_url,
            provider: request.provider,
        }
    }
}
