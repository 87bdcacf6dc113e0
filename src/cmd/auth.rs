//! Anonymous-side menu: login, signup, and the dismissible login
//! interstitial raised by the session's grace-period timer.

use anyhow::Result;
use console::style;
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};

use taskmaster::api::{Credentials, SignupProfile};
use taskmaster::session::Session;

use super::spinner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Continue,
    Quit,
}

/// Render the anonymous menu once and handle the chosen action.
pub async fn auth_menu(session: &Session) -> Result<AuthOutcome> {
    let snap = session.snapshot();
    if let Some(message) = &snap.error {
        println!("{}", style(message).red());
    }

    let prompting = snap.show_login_prompt();
    if prompting {
        println!(
            "{}",
            style("You are not signed in. Sign in to sync your tasks.").yellow()
        );
    }

    let mut items = vec!["Log in", "Sign up"];
    if prompting {
        items.push("Not now");
    }
    items.push("Quit");

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("TaskMaster")
        .items(&items)
        .default(0)
        .interact()?;

    match items[selection] {
        "Log in" => login_flow(session).await?,
        "Sign up" => signup_flow(session).await?,
        "Not now" => session.dismiss_login_prompt(),
        "Quit" => return Ok(AuthOutcome::Quit),
        _ => unreachable!(),
    }
    Ok(AuthOutcome::Continue)
}

async fn login_flow(session: &Session) -> Result<()> {
    let email: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Email")
        .interact_text()?;
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()?;

    let spinner = spinner("Signing in...");
    let outcome = session.login(&Credentials { email, password }).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(()) => {
            let snap = session.snapshot();
            if let Some(user) = snap.user() {
                println!("{} {}", style("Signed in as").green(), style(&user.name).bold());
            } else {
                // Login was accepted but the identity probe came back empty
                println!(
                    "{}",
                    style("Signed in, but your profile could not be confirmed yet.").yellow()
                );
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "login rejected");
            if let Some(message) = session.snapshot().error {
                println!("{}", style(message).red());
            }
        }
    }
    Ok(())
}

async fn signup_flow(session: &Session) -> Result<()> {
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Name")
        .interact_text()?;
    let email: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Email")
        .interact_text()?;
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let spinner = spinner("Creating account...");
    let outcome = session
        .signup(&SignupProfile {
            name,
            email,
            password,
        })
        .await;
    spinner.finish_and_clear();

    match outcome {
        Ok(()) => println!(
            "{}",
            style("Account created. You can log in now.").green()
        ),
        Err(err) => {
            tracing::debug!(error = %err, "signup rejected");
            if let Some(message) = session.snapshot().error {
                println!("{}", style(message).red());
            }
        }
    }
    Ok(())
}
