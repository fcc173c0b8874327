//! Account commands: `pt login`, `pt signup`, `pt logout`, `pt whoami`.

use chrono::{DateTime, Utc};
use clap::Args;
use patrimonio_remote::AuthSession;
use patrimonio_remote::auth::{self, SignupOutcome};
use serde::Serialize;
use std::io::Write;
use tracing::info;

use crate::context;
use crate::output::{OutputMode, pretty_kv, pretty_section, render, render_mode};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email.
    #[arg(long)]
    pub email: String,

    /// Account password.
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    /// Email for the new account.
    #[arg(long)]
    pub email: String,

    /// Password for the new account (at least 6 characters).
    #[arg(long)]
    pub password: String,

    /// Administrator code that authorizes account creation.
    #[arg(long = "admin-code")]
    pub admin_code: String,
}

#[derive(Debug, Serialize)]
struct Identity {
    user_id: String,
    email: Option<String>,
    expires_at: String,
}

impl From<&AuthSession> for Identity {
    fn from(session: &AuthSession) -> Self {
        let expires_at = DateTime::<Utc>::from_timestamp(session.expires_at, 0)
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default();
        Self {
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
            expires_at,
        }
    }
}

fn label(identity: &Identity) -> &str {
    identity.email.as_deref().unwrap_or(&identity.user_id)
}

pub fn run_login(args: &LoginArgs, output: OutputMode) -> anyhow::Result<()> {
    let config = context::load_config(output)?;
    let remote = context::remote(&config, output)?;
    let client = context::auth_client(&config, &remote);

    let session = client
        .login(&args.email, &args.password)
        .map_err(|err| context::auth_failure(output, &err))?;
    auth::save_session(&config.session_path(), &session)
        .map_err(|err| context::auth_failure(output, &err))?;

    let identity = Identity::from(&session);
    render(output, &identity, |id, w| {
        writeln!(w, "✓ signed in as {}", label(id))
    })
}

#[derive(Debug, Serialize)]
struct SignupReport {
    email: String,
    signed_in: bool,
    confirmation_required: bool,
}

pub fn run_signup(args: &SignupArgs, output: OutputMode) -> anyhow::Result<()> {
    let config = context::load_config(output)?;
    let remote = context::remote(&config, output)?;
    let client = context::auth_client(&config, &remote);

    let outcome = client
        .signup(&args.email, &args.password, &args.admin_code)
        .map_err(|err| context::auth_failure(output, &err))?;

    let report = match outcome {
        SignupOutcome::SignedIn(session) => {
            auth::save_session(&config.session_path(), &session)
                .map_err(|err| context::auth_failure(output, &err))?;
            SignupReport {
                email: session.user.email.unwrap_or_else(|| args.email.trim().to_string()),
                signed_in: true,
                confirmation_required: false,
            }
        }
        SignupOutcome::ConfirmationRequired { email } => SignupReport {
            email,
            signed_in: false,
            confirmation_required: true,
        },
    };

    render(output, &report, |r, w| {
        if r.signed_in {
            writeln!(w, "✓ account created; signed in as {}", r.email)
        } else {
            writeln!(w, "✓ account created; check {} for a confirmation link", r.email)
        }
    })
}

#[derive(Debug, Serialize)]
struct LogoutReport {
    signed_out: bool,
}

pub fn run_logout(output: OutputMode) -> anyhow::Result<()> {
    let config = context::load_config(output)?;
    let path = config.session_path();
    let existing = auth::load_session(&path).map_err(|err| context::auth_failure(output, &err))?;

    if let (Some(session), Ok(remote)) = (&existing, config.remote()) {
        context::auth_client(&config, &remote).logout(session);
    }
    let removed = auth::clear_session(&path).map_err(|err| context::auth_failure(output, &err))?;
    if removed {
        info!("session cleared");
    }

    let report = LogoutReport {
        signed_out: removed,
    };
    render(output, &report, |r, w| {
        if r.signed_out {
            writeln!(w, "✓ signed out")
        } else {
            writeln!(w, "not signed in")
        }
    })
}

pub fn run_whoami(output: OutputMode) -> anyhow::Result<()> {
    let config = context::load_config(output)?;
    let remote = context::remote(&config, output)?;
    let session = context::signed_in(&config, &remote, output)?;

    let identity = Identity::from(&session);
    render_mode(
        output,
        &identity,
        |id, w| writeln!(w, "{}\t{}\t{}", id.user_id, label(id), id.expires_at),
        |id, w| {
            pretty_section(w, "Signed in")?;
            pretty_kv(w, "User", &id.user_id)?;
            pretty_kv(w, "Email", id.email.as_deref().unwrap_or("-"))?;
            pretty_kv(w, "Expires", &id.expires_at)
        },
    )
}
