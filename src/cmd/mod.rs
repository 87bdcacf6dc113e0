//! Interactive terminal front-end.
//!
//! One process is one session: the HTTP client's cookie store lives as long
//! as the REPL, so logging in and then working with tasks behaves like a
//! browser tab. Each submodule owns one surface:
//!
//! | Module  | Surface                                      |
//! |---------|----------------------------------------------|
//! | `auth`  | login/signup menu and the login interstitial |
//! | `tasks` | the signed-in dashboard loop                 |

pub mod auth;
pub mod tasks;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use taskmaster::api::{ApiClient, AuthGateway, TaskGateway};
use taskmaster::config::ClientConfig;
use taskmaster::dashboard::Dashboard;
use taskmaster::session::{Route, Session};

/// Spin up the client stack and run the REPL until the user quits.
pub async fn run(config: &ClientConfig) -> Result<()> {
    let client = Arc::new(ApiClient::new(config)?);
    let session = Session::new(Arc::new(AuthGateway::new(client.clone())), config);
    let mut dashboard = Dashboard::new(Arc::new(TaskGateway::new(client.clone())));

    println!("{}", style("TaskMaster").bold().cyan());
    println!("  {}", style(client.base_url()).dim());
    println!();

    let spinner = spinner("Checking for an existing session...");
    session.initialize(Route::Dashboard).await;
    spinner.finish_and_clear();

    let mut graced = false;
    loop {
        if session.snapshot().is_authenticated() {
            graced = false;
            match tasks::dashboard_loop(&session, &mut dashboard).await? {
                tasks::Exit::LoggedOut => continue,
                tasks::Exit::Quit => break,
            }
        } else {
            if !graced {
                // Give the grace-period timer a chance to raise the
                // interstitial before the menu renders
                tokio::time::sleep(config.login_prompt_delay + Duration::from_millis(50)).await;
                graced = true;
            }
            match auth::auth_menu(&session).await? {
                auth::AuthOutcome::Continue => {}
                auth::AuthOutcome::Quit => break,
            }
        }
    }

    println!("{}", style("Bye.").dim());
    Ok(())
}

/// A transient spinner for a single in-flight request.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("progress bar template is a valid static string"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
