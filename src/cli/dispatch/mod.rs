use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument: --{name}"))
}

/// Turn parsed matches into global args plus the action to run.
///
/// # Errors
/// Returns an error when required arguments are absent or the subcommand is
/// unknown.
pub fn handler(matches: &clap::ArgMatches) -> Result<(GlobalArgs, Action)> {
    let mut globals = GlobalArgs::new(
        required(matches, "api-url").context("set --api-url or KURIER_API_URL")?,
        matches.get_one::<u64>("timeout").copied().unwrap_or(10),
    );
    globals.email = matches.get_one::<String>("email").cloned();
    globals.password = matches
        .get_one::<String>("password")
        .cloned()
        .map(SecretString::from);
    globals.totp_code = matches.get_one::<String>("code").cloned();

    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("missing subcommand"))?;

    let action = match name {
        "register" => Action::Register {
            username: required(sub, "username")?,
        },
        "login" => Action::Login,
        "logout" => Action::Logout,
        "whoami" => Action::Whoami,
        "2fa" => match sub.subcommand() {
            Some(("status", _)) => Action::TwoFaStatus,
            Some(("setup", _)) => Action::TwoFaSetup,
            Some(("enable", sub)) => Action::TwoFaEnable {
                code: required(sub, "enable-code")?,
            },
            Some(("disable", sub)) => Action::TwoFaDisable {
                code: required(sub, "disable-code")?,
            },
            _ => return Err(anyhow!("unknown 2fa subcommand")),
        },
        "inbox" => Action::Inbox,
        "sent" => Action::Sent,
        "show" => Action::Show {
            id: required(sub, "id")?,
        },
        "delete" => Action::Delete {
            id: required(sub, "id")?,
        },
        "send" => Action::Send {
            to: required(sub, "to")?,
            subject: required(sub, "subject")?,
            body: required(sub, "body")?,
            attachments: sub
                .get_many::<String>("attach")
                .map(|paths| paths.map(PathBuf::from).collect())
                .unwrap_or_default(),
        },
        "attachment" => Action::Attachment {
            message_id: required(sub, "id")?,
            attachment_id: required(sub, "attachment-id")?,
            output: sub.get_one::<String>("output").cloned().map(PathBuf::from),
        },
        _ => return Err(anyhow!("unknown subcommand: {name}")),
    };

    Ok((globals, action))
}
