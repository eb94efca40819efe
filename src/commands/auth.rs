//! Session command handlers:
//! - `fintrack login` - remember the user and their API token
//! - `fintrack logout` - forget them
//! - `fintrack whoami` - show who is signed in

use crate::api::{FileSession, IdentityProvider, SessionState, User};
use crate::args::LoginArgs;
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::ensure;

/// Handles `fintrack login`. The user and token are stored in the session file, which is readable
/// only by its owner.
pub async fn login(config: Config, args: LoginArgs) -> Result<Out<User>> {
    ensure!(!args.uid().trim().is_empty(), "The user id cannot be empty");
    ensure!(!args.token().trim().is_empty(), "The token cannot be empty");
    let mut user = User::new(args.uid());
    if let Some(name) = args.name() {
        user = user.with_display_name(name);
    }
    if let Some(email) = args.email() {
        user = user.with_email(email);
    }
    let mut session = FileSession::load(config.session_path()).await;
    session.sign_in(user.clone(), args.token().to_string()).await?;
    let who = user.display_name().unwrap_or(user.uid()).to_string();
    Ok(Out::new(format!("Signed in as {who}"), user))
}

/// Handles `fintrack logout`. Signing out when nobody is signed in is not an error.
pub async fn logout(config: Config) -> Result<Out<()>> {
    let mut session = FileSession::load(config.session_path()).await;
    let was = session.state().user().map(|u| u.uid().to_string());
    session.sign_out().await?;
    Ok(match was {
        Some(uid) => format!("Signed out {uid}").into(),
        None => "Nobody was signed in".into(),
    })
}

/// Handles `fintrack whoami`.
pub async fn whoami(config: Config) -> Result<Out<SessionState>> {
    let session = FileSession::load(config.session_path()).await;
    let state = session.state().clone();
    let user = state.require_user()?;
    let mut message = format!("Signed in as {}", user.uid());
    if let Some(name) = user.display_name() {
        message.push_str(&format!(" ({name})"));
    }
    if let Some(email) = user.email() {
        message.push_str(&format!(" <{email}>"));
    }
    Ok(Out::new(message, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_type, ErrorType};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_login_whoami_logout() {
        let env = TestEnv::new().await;
        env.sign_out().await;

        let args = LoginArgs::new("u42", "secret-token");
        let out = login(env.config(), args).await.unwrap();
        assert_eq!(out.message(), "Signed in as u42");
        assert_eq!(out.structure().unwrap().uid(), "u42");

        let out = whoami(env.config()).await.unwrap();
        assert_eq!(out.message(), "Signed in as u42");
        let session = FileSession::load(env.config().session_path()).await;
        assert_eq!(session.token().as_deref(), Some("secret-token"));

        let out = logout(env.config()).await.unwrap();
        assert_eq!(out.message(), "Signed out u42");
        let err = whoami(env.config()).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Unauthenticated));

        let out = logout(env.config()).await.unwrap();
        assert_eq!(out.message(), "Nobody was signed in");
    }

    #[tokio::test]
    async fn test_login_rejects_blank_token() {
        let env = TestEnv::new().await;
        assert!(login(env.config(), LoginArgs::new("u1", " ")).await.is_err());
    }
}
