//! Registration and login flows.

mod support;

use listings::application::accounts::{AccountError, LoginCommand, RegisterCommand};
use listings::application::auth::{AccessControl, Gate};
use listings::domain::types::Role;
use uuid::Uuid;

use support::Harness;

fn register(email: &str, password: &str, role: Role) -> RegisterCommand {
    RegisterCommand {
        email: email.to_string(),
        password: password.to_string(),
        role,
    }
}

#[tokio::test]
async fn registered_user_can_log_in_with_their_role() {
    let harness = Harness::new();
    let id = harness
        .accounts
        .register(register("mod@example.com", "pa55word", Role::Moderator))
        .await
        .expect("register");

    let issued = harness
        .accounts
        .login(LoginCommand {
            id,
            password: "pa55word".to_string(),
        })
        .await
        .expect("login");

    let header = format!("Bearer {}", issued.token);
    let token = harness
        .access
        .authorize(Some(&header), Gate::Moderator)
        .expect("moderator token");
    assert_eq!(AccessControl::role_of(&token), Role::Moderator);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let harness = Harness::new();
    let id = harness
        .accounts
        .register(register("client@example.com", "right", Role::Client))
        .await
        .expect("register");

    let wrong = harness
        .accounts
        .login(LoginCommand {
            id,
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    let unknown = harness
        .accounts
        .login(LoginCommand {
            id: Uuid::new_v4(),
            password: "right".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(wrong, AccountError::InvalidCredentials));
    assert!(matches!(unknown, AccountError::InvalidCredentials));
}

#[tokio::test]
async fn email_is_unique_case_insensitively() {
    let harness = Harness::new();
    harness
        .accounts
        .register(register("Owner@Example.com", "one", Role::Client))
        .await
        .expect("first");

    let err = harness
        .accounts
        .register(register("owner@example.com", "two", Role::Client))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::EmailTaken));
}

#[tokio::test]
async fn registration_validates_input() {
    let harness = Harness::new();

    let bad_email = harness
        .accounts
        .register(register("not-an-email", "pw", Role::Client))
        .await
        .unwrap_err();
    let empty_password = harness
        .accounts
        .register(register("a@b.io", "", Role::Client))
        .await
        .unwrap_err();

    assert!(matches!(bad_email, AccountError::Domain(_)));
    assert!(matches!(empty_password, AccountError::Domain(_)));
}

#[tokio::test]
async fn dummy_login_issues_token_for_requested_role() {
    let harness = Harness::new();
    let issued = harness.accounts.dummy_login(Role::Client).expect("token");

    let header = format!("Bearer {}", issued.token);
    let token = harness
        .access
        .authorize(Some(&header), Gate::Authenticated)
        .expect("authenticated");
    assert_eq!(AccessControl::role_of(&token), Role::Client);
    assert!(harness.access.authorize(Some(&header), Gate::Moderator).is_err());
}
