use serde::Deserialize;
use serde::Serialize;

/// Most flash messages a session holds. The oldest is dropped first.
pub const MAX_FLASH_MESSAGES: usize = 8;

/// Contents of a server-side session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Serialized identity of the logged-in user.
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub flash: Vec<FlashMessage>,

    /// OAuth handshake waiting for its callback.
    #[serde(default)]
    pub pending_oauth: Option<PendingOAuth>,
}

impl SessionData {
    /// Queue a message for `kind`'s page. A message already waiting there is
    /// not queued twice.
    pub fn push_flash(&mut self, kind: FlashKind, message: impl Into<String>) {
        let message = message.into();
        if self
            .flash
            .iter()
            .any(|flash| flash.kind == kind && flash.message == message)
        {
            return;
        }

        if self.flash.len() >= MAX_FLASH_MESSAGES {
            self.flash.remove(0);
        }
        self.flash.push(FlashMessage { kind, message });
    }

    /// Remove and return every message of one kind, oldest first.
    pub fn take_flash(&mut self, kind: FlashKind) -> Vec<String> {
        let (taken, kept): (Vec<_>, Vec<_>) =
            self.flash.drain(..).partition(|flash| flash.kind == kind);
        self.flash = kept;
        taken.into_iter().map(|flash| flash.message).collect()
    }
}

/// Page a flash message is displayed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Signup,
    Login,
    Profile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

/// CSRF state and PKCE verifier kept between the provider redirect and the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOAuth {
    pub state: String,
    pub code_verifier: String,
}
