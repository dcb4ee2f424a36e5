//! Evaluate a session against a role guard.

use anyhow::{bail, Result};
use medibook_auth::{AccessGuard, CapabilitySet, Decision, Guarded, Session};

use super::AuthorizeArgs;
use crate::context::Context;
use crate::output::status_badge;

/// Run the authorize command.
pub async fn run(args: AuthorizeArgs, ctx: &Context) -> Result<()> {
    let required = CapabilitySet::parse(&args.allow)?;
    let mut guard = AccessGuard::from_config(&ctx.config.guard, required);
    if let Some(to) = args.redirect_to {
        guard = guard.with_redirect(to);
    }

    let session = Session::new(args.role, args.token);
    let guarded = guard.guard(&session, ());
    let decision = match guarded {
        Guarded::Render(()) => Decision::Allow,
        Guarded::Redirect { reason, .. } => Decision::Deny(reason),
    };

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "required": guard.required().iter().collect::<Vec<_>>(),
            "role": session.role,
            "authenticated": session.is_authenticated(),
            "result": decision,
            "redirect_to": guarded.redirect_target(),
        }));
    } else {
        ctx.output.kv("required", &guard.required().to_string());
        ctx.output.kv("role", &session.role);
        ctx.output
            .kv("authenticated", &session.is_authenticated().to_string());
    }

    match guarded {
        Guarded::Render(()) => {
            ctx.output.success(&format!("{}: render", status_badge("allow")));
            Ok(())
        }
        Guarded::Redirect { to, reason } => {
            ctx.output.info(&format!(
                "{}: redirect to {} ({})",
                status_badge("deny"),
                to,
                reason
            ));
            bail!("access denied: {}", reason)
        }
    }
}
