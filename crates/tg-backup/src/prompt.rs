//! Operator input for the login handshake.
//!
//! The session core only ever announces *which* input it needs; collecting it
//! is the caller's concern. The interactive CLI attaches [`TerminalPrompter`],
//! unattended runs attach nothing and get parked instead.

use std::io;

use dialoguer::Input;
use dialoguer::Password;

/// Input the login handshake may require from the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    PhoneNumber,
    EmailAddress,
    EmailCode,
    LoginCode,
    Password,
    Profile,
    DeviceConfirmation,
}

impl CredentialKind {
    pub fn describe(&self) -> &'static str {
        match self {
            CredentialKind::PhoneNumber => "phone number",
            CredentialKind::EmailAddress => "email address",
            CredentialKind::EmailCode => "email authentication code",
            CredentialKind::LoginCode => "authentication code",
            CredentialKind::Password => "authentication password",
            CredentialKind::Profile => "first and last name",
            CredentialKind::DeviceConfirmation => "confirmation on another device",
        }
    }
}

/// One operator-supplied credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    PhoneNumber(String),
    EmailAddress(String),
    EmailCode(String),
    LoginCode(String),
    Password(String),
    Profile {
        first_name: String,
        last_name: String,
    },
}

/// Supplies credentials when the handshake asks for them.
pub trait CredentialSource {
    fn phone_number(&mut self) -> io::Result<String>;
    fn email_address(&mut self) -> io::Result<String>;
    fn email_code(&mut self) -> io::Result<String>;
    fn login_code(&mut self) -> io::Result<String>;
    fn password(&mut self) -> io::Result<String>;
    /// First and last name for a new account registration.
    fn profile(&mut self) -> io::Result<(String, String)>;
    /// Surfaces a login link that must be confirmed on another device.
    fn device_link(&mut self, link: &str);
}

/// Prompts on the controlling terminal.
pub struct TerminalPrompter;

impl CredentialSource for TerminalPrompter {
    fn phone_number(&mut self) -> io::Result<String> {
        Input::new().with_prompt("Phone number").interact_text()
    }

    fn email_address(&mut self) -> io::Result<String> {
        Input::new().with_prompt("Email address").interact_text()
    }

    fn email_code(&mut self) -> io::Result<String> {
        Input::new()
            .with_prompt("Email authentication code")
            .interact_text()
    }

    fn login_code(&mut self) -> io::Result<String> {
        Input::new()
            .with_prompt("Authentication code")
            .interact_text()
    }

    fn password(&mut self) -> io::Result<String> {
        Password::new()
            .with_prompt("Authentication password")
            .interact()
    }

    fn profile(&mut self) -> io::Result<(String, String)> {
        let first_name = Input::new().with_prompt("First name").interact_text()?;
        let last_name = Input::new().with_prompt("Last name").interact_text()?;
        Ok((first_name, last_name))
    }

    fn device_link(&mut self, link: &str) {
        println!("Confirm this login link on another device: {link}");
    }
}
