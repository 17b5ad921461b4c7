//! Sign-in, sign-up, sign-out and whoami

use anyhow::{anyhow, Result};
use colored::Colorize;
use dialoguer::{Input, Password};

use finboard_core::services::{visible_entries, PrivilegeSource, Route, SignUpOutcome};
use finboard_core::{EventKind, LogEvent, OperationResult, PrivilegeKey, PrivilegeSet};

use super::{get_context, get_logger, log_event};
use crate::output;

/// Prompt for whatever the caller did not pass on the command line
fn credentials(email: Option<String>, password: Option<String>, confirm: bool) -> Result<(String, String)> {
    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None if confirm => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
        None => Password::new().with_prompt("Password").interact()?,
    };
    Ok((email, password))
}

pub async fn run_login(email: Option<String>, password: Option<String>) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context().await?;
    let (email, password) = credentials(email, password, false)?;

    match ctx.auth.sign_in(&email, &password).await {
        Ok(identity) => {
            log_event(
                &logger,
                LogEvent::new(EventKind::SignIn).with_backend(ctx.auth.backend_name()),
            );
            output::success(&format!("Signed in as {}", identity.email));
            Ok(())
        }
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new(EventKind::SignInFailed)
                    .with_backend(ctx.auth.backend_name())
                    .with_error(e.kind()),
            );
            Err(anyhow!(e.page_message()))
        }
    }
}

pub async fn run_signup(email: Option<String>, password: Option<String>) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context().await?;
    let (email, password) = credentials(email, password, true)?;

    let outcome = ctx
        .auth
        .sign_up(&email, &password)
        .await
        .map_err(|e| anyhow!(e.page_message()))?;
    log_event(
        &logger,
        LogEvent::new(EventKind::SignUp).with_backend(ctx.auth.backend_name()),
    );

    match outcome {
        SignUpOutcome::SignedIn(identity) => {
            output::success(&format!("Account created. Signed in as {}", identity.email));
        }
        SignUpOutcome::ConfirmationPending => {
            output::info("Account created. Check your email to confirm it, then run 'fb login'.");
        }
    }
    Ok(())
}

pub async fn run_logout() -> Result<()> {
    let logger = get_logger();
    let ctx = get_context().await?;

    if !ctx.auth.state().is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }

    ctx.auth.sign_out().await;
    log_event(
        &logger,
        LogEvent::new(EventKind::SignOut).with_backend(ctx.auth.backend_name()),
    );
    output::success("Signed out");
    Ok(())
}

pub async fn run_whoami(json: bool) -> Result<()> {
    let ctx = get_context().await?;
    let state = ctx.auth.state();

    let Some(identity) = state.identity.clone() else {
        if json {
            let result: OperationResult<()> = OperationResult::fail("Not signed in");
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("Not signed in. Run 'fb login'.");
        }
        return Ok(());
    };

    let privileges = state.privileges.unwrap_or_else(PrivilegeSet::all_denied);

    if json {
        let data = serde_json::json!({
            "identity": identity,
            "backend": ctx.auth.backend_name(),
            "privileges": privileges,
            "privilegeSource": state.privilege_source,
            "menu": visible_entries(Route::Dashboard.path(), Some(&privileges)),
        });
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(data))?);
        return Ok(());
    }

    println!("{}", identity.email.bold());
    println!("  Id:       {}", identity.id);
    println!("  Backend:  {}", ctx.auth.backend_name());
    if state.privilege_source == Some(PrivilegeSource::PolicyDefault) {
        println!(
            "  {}",
            "No stored privileges; using the configured default".dimmed()
        );
    }
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Privilege", "Granted"]);
    for key in PrivilegeKey::ALL {
        let granted = if privileges.allows(key) {
            "yes".green().to_string()
        } else {
            "no".red().to_string()
        };
        table.add_row(vec![key.as_str().to_string(), granted]);
    }
    println!("{}", table);
    Ok(())
}
