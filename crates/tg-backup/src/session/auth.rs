//! The multi-round login handshake.
//!
//! Every authorization-state event bumps the authentication epoch before the
//! new state is acted on. Continuations for authentication requests are
//! pinned to the epoch they were created under and discard themselves if the
//! handshake has moved on by the time their response arrives, so a stale
//! reply can never corrupt a newer round.

use std::io;

use tracing::debug;
use tracing::info;
use tracing::warn;

use tg_backup_backend::AuthorizationState;
use tg_backup_backend::EmailAddressAuthentication;
use tg_backup_backend::Object;
use tg_backup_backend::Request;

use crate::prompt::Credential;
use crate::prompt::CredentialKind;
use crate::prompt::CredentialSource;

use super::QueryHandler;
use super::Session;

impl Session {
    /// Entry point for authorization-state events from the update router.
    pub(super) fn on_authorization_update(&mut self, state: AuthorizationState) {
        self.auth_state = Some(state);
        self.advance_authorization();
    }

    /// Acts on the current authorization state.
    fn advance_authorization(&mut self) {
        self.auth_epoch += 1;
        let Some(state) = self.auth_state.clone() else {
            return;
        };
        match state {
            AuthorizationState::WaitTdlibParameters => self.configure_backend(),
            AuthorizationState::WaitPhoneNumber => {
                self.request_credential(CredentialKind::PhoneNumber);
            }
            AuthorizationState::WaitEmailAddress => {
                self.request_credential(CredentialKind::EmailAddress);
            }
            AuthorizationState::WaitEmailCode => {
                self.request_credential(CredentialKind::EmailCode);
            }
            AuthorizationState::WaitCode => self.request_credential(CredentialKind::LoginCode),
            AuthorizationState::WaitRegistration => {
                self.request_credential(CredentialKind::Profile);
            }
            AuthorizationState::WaitPassword => self.request_credential(CredentialKind::Password),
            AuthorizationState::WaitOtherDeviceConfirmation { link } => {
                match self.credentials.as_mut() {
                    Some(source) => source.device_link(&link),
                    None => self.input_needed = Some(CredentialKind::DeviceConfirmation),
                }
            }
            AuthorizationState::WaitPremiumPurchase => {
                warn!("a premium subscription is required to complete authorization");
            }
            AuthorizationState::Ready => {
                self.authorized = true;
                info!("authorization completed");
                if !self.chat_load_started {
                    self.chat_load_started = true;
                    self.load_chats();
                }
            }
            AuthorizationState::LoggingOut => {
                self.authorized = false;
                info!("logging out");
            }
            AuthorizationState::Closing => {
                self.authorized = false;
                info!("closing");
            }
            AuthorizationState::Closed => {
                self.authorized = false;
                self.needs_rebuild = true;
                info!("session terminated by the backend");
            }
            AuthorizationState::Unknown { kind } => {
                // Newer backends may introduce states; ignoring them keeps
                // the handshake forward compatible.
                debug!(kind = %kind, "unrecognized authorization state");
            }
        }
    }

    fn configure_backend(&mut self) {
        let request = Request::SetTdlibParameters {
            database_directory: self.config.session_dir.to_string_lossy().into_owned(),
            use_chat_info_database: true,
            use_secret_chats: true,
            api_id: self.config.api_id,
            api_hash: self.config.api_hash.clone(),
            system_language_code: self.config.system_language_code.clone(),
            device_model: self.config.device_model.clone(),
            application_version: self.config.application_version.clone(),
        };
        let handler = self.authentication_handler();
        self.send_query(request, Some(handler));
    }

    /// Solicits a credential right away when a source is attached; otherwise
    /// parks the handshake until the caller supplies one.
    fn request_credential(&mut self, kind: CredentialKind) {
        let collected = match self.credentials.as_mut() {
            None => {
                self.input_needed = Some(kind);
                return;
            }
            Some(source) => collect_credential(source.as_mut(), kind),
        };
        match collected {
            Ok(credential) => self.submit_credential(credential),
            Err(err) => {
                warn!(%err, input = kind.describe(), "failed to collect credential");
                self.input_needed = Some(kind);
            }
        }
    }

    /// Sends the verification request matching an operator-supplied
    /// credential and clears the pending-input flag.
    pub fn submit_credential(&mut self, credential: Credential) {
        self.input_needed = None;
        let handler = self.authentication_handler();
        self.send_query(verification_request(credential), Some(handler));
    }

    /// A continuation pinned to the current epoch: it evaporates if another
    /// authorization state arrives before the response does.
    fn authentication_handler(&self) -> QueryHandler {
        let epoch = self.auth_epoch;
        Box::new(move |session, object| {
            if epoch != session.auth_epoch {
                return;
            }
            session.check_authentication_error(object);
        })
    }

    /// An error reply to an authentication step re-evaluates the current
    /// state, which re-emits whatever that state requires.
    fn check_authentication_error(&mut self, object: Object) {
        if let Object::Error(error) = object {
            warn!(code = error.code, message = %error.message, "authentication step failed");
            self.advance_authorization();
        }
    }
}

fn collect_credential(
    source: &mut dyn CredentialSource,
    kind: CredentialKind,
) -> io::Result<Credential> {
    match kind {
        CredentialKind::PhoneNumber => source.phone_number().map(Credential::PhoneNumber),
        CredentialKind::EmailAddress => source.email_address().map(Credential::EmailAddress),
        CredentialKind::EmailCode => source.email_code().map(Credential::EmailCode),
        CredentialKind::LoginCode => source.login_code().map(Credential::LoginCode),
        CredentialKind::Password => source.password().map(Credential::Password),
        CredentialKind::Profile => source.profile().map(|(first_name, last_name)| {
            Credential::Profile {
                first_name,
                last_name,
            }
        }),
        CredentialKind::DeviceConfirmation => {
            Err(io::Error::other("confirmation happens on another device"))
        }
    }
}

fn verification_request(credential: Credential) -> Request {
    match credential {
        Credential::PhoneNumber(phone_number) => {
            Request::SetAuthenticationPhoneNumber { phone_number }
        }
        Credential::EmailAddress(email_address) => {
            Request::SetAuthenticationEmailAddress { email_address }
        }
        Credential::EmailCode(code) => Request::CheckAuthenticationEmailCode {
            code: EmailAddressAuthentication::EmailAddressAuthenticationCode { code },
        },
        Credential::LoginCode(code) => Request::CheckAuthenticationCode { code },
        Credential::Password(password) => Request::CheckAuthenticationPassword { password },
        Credential::Profile {
            first_name,
            last_name,
        } => Request::RegisterUser {
            first_name,
            last_name,
            disable_notification: false,
        },
    }
}
