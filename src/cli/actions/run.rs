//! Action handlers. Each invocation builds one gateway (the cookie store
//! lives for the process), signs in when the action needs a session, runs the
//! operation, and prints a human-readable result.

use crate::{
    api::{types::User, Gateway},
    cli::{actions::Action, globals::GlobalArgs},
    messages::{parse_recipients, AttachmentUpload, MessageExchange},
    session::{LoginOutcome, SessionManager, SessionState},
    twofa::TwoFactorController,
};
use anyhow::{anyhow, Context, Result};
use std::{fs, path::Path, sync::Arc, time::Duration};

/// Handle the parsed action.
///
/// # Errors
/// Returns an error when the gateway cannot be built, credentials are missing
/// for an authenticated action, or the server rejects the operation.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let gateway = Arc::new(Gateway::with_timeout(
        &globals.api_url,
        Duration::from_secs(globals.timeout_seconds),
    )?);
    let mut session = SessionManager::new(Arc::clone(&gateway));

    match action {
        Action::Register { username } => {
            let (email, password) = credentials(globals)?;
            let envelope = gateway.register(email, &username, password).await?;
            println!(
                "registered {} <{}> (id {})",
                envelope.user.username, envelope.user.email, envelope.user.id
            );
        }
        Action::Login => {
            let user = sign_in(&mut session, globals).await?;
            println!("logged in as {} <{}>", user.username, user.email);
        }
        Action::Logout => {
            sign_in(&mut session, globals).await?;
            session.logout().await;
            println!("logged out");
        }
        Action::Whoami => {
            if globals.email.is_some() && globals.password.is_some() {
                sign_in(&mut session, globals).await?;
            } else {
                session.bootstrap().await;
            }
            match session.current().state {
                SessionState::Authenticated(user) => {
                    println!("{} <{}> (id {})", user.username, user.email, user.id);
                }
                _ => println!("not logged in"),
            }
        }
        Action::TwoFaStatus => {
            sign_in(&mut session, globals).await?;
            let controller = TwoFactorController::new(Arc::clone(&gateway));
            let status = controller.status().await?;
            println!("2fa: {}", if status.enabled { "enabled" } else { "disabled" });
        }
        Action::TwoFaSetup => {
            sign_in(&mut session, globals).await?;
            let mut controller = TwoFactorController::new(Arc::clone(&gateway));
            let material = controller.setup().await?;
            // The URI embeds the secret; it is printed once for authenticator
            // import and held nowhere else.
            println!("{}", material.provisioning_uri);
            println!("scan or import the URI, then run: kurier 2fa enable --enable-code <code>");
        }
        Action::TwoFaEnable { code } => {
            sign_in(&mut session, globals).await?;
            let mut controller = TwoFactorController::new(Arc::clone(&gateway));
            controller.enable(&code).await?;
            println!("2fa enabled");
        }
        Action::TwoFaDisable { code } => {
            sign_in(&mut session, globals).await?;
            let mut controller = TwoFactorController::new(Arc::clone(&gateway));
            controller.disable(&code).await?;
            println!("2fa disabled");
        }
        Action::Inbox => {
            sign_in(&mut session, globals).await?;
            let exchange = MessageExchange::new(Arc::clone(&gateway));
            let entries = exchange.list_inbox().await?;
            if entries.is_empty() {
                println!("inbox is empty");
            }
            for entry in entries {
                println!(
                    "{} {} from {} at {}{}{}",
                    entry.id,
                    if entry.read { " " } else { "*" },
                    entry.sender_username,
                    entry.created_at,
                    if entry.has_attachments { " [attachments]" } else { "" },
                    if entry.authenticity_verified { "" } else { " [UNVERIFIED]" },
                );
            }
        }
        Action::Sent => {
            sign_in(&mut session, globals).await?;
            let exchange = MessageExchange::new(Arc::clone(&gateway));
            for entry in exchange.list_sent().await? {
                println!(
                    "{} at {} to {} recipient(s){}",
                    entry.id,
                    entry.created_at,
                    entry.recipients_count,
                    if entry.has_attachments { " [attachments]" } else { "" },
                );
            }
        }
        Action::Show { id } => {
            sign_in(&mut session, globals).await?;
            let exchange = MessageExchange::new(Arc::clone(&gateway));
            let detail = exchange.detail(&id).await?;
            println!("from: {}", detail.sender_username);
            println!("date: {}", detail.created_at);
            println!("subject: {}", detail.subject);
            println!(
                "authenticity: {}",
                if detail.authenticity_verified { "verified" } else { "NOT VERIFIED" }
            );
            println!();
            println!("{}", detail.body);
            for attachment in &detail.attachments {
                println!(
                    "attachment {}: {} ({}, {} bytes)",
                    attachment.id, attachment.filename, attachment.content_type, attachment.size_bytes
                );
            }
        }
        Action::Delete { id } => {
            sign_in(&mut session, globals).await?;
            let exchange = MessageExchange::new(Arc::clone(&gateway));
            exchange.delete(&id).await?;
            println!("deleted {id}");
        }
        Action::Send {
            to,
            subject,
            body,
            attachments,
        } => {
            sign_in(&mut session, globals).await?;
            let exchange = MessageExchange::new(Arc::clone(&gateway));
            let recipients = parse_recipients(&to);
            let uploads = attachments
                .iter()
                .map(|path| read_attachment(path))
                .collect::<Result<Vec<_>>>()?;
            let id = exchange.send(&recipients, &subject, &body, &uploads).await?;
            println!("sent {id}");
        }
        Action::Attachment {
            message_id,
            attachment_id,
            output,
        } => {
            sign_in(&mut session, globals).await?;
            let exchange = MessageExchange::new(Arc::clone(&gateway));
            let download = exchange.download_attachment(&message_id, &attachment_id).await?;
            let path = output.unwrap_or_else(|| {
                download
                    .filename
                    .clone()
                    .unwrap_or_else(|| attachment_id.clone())
                    .into()
            });
            fs::write(&path, &download.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "wrote {} ({}, {} bytes)",
                path.display(),
                download.content_type,
                download.bytes.len()
            );
        }
    }

    Ok(())
}

fn credentials(globals: &GlobalArgs) -> Result<(&str, &secrecy::SecretString)> {
    let email = globals
        .email
        .as_deref()
        .ok_or_else(|| anyhow!("missing credentials: set --email or KURIER_EMAIL"))?;
    let password = globals
        .password
        .as_ref()
        .ok_or_else(|| anyhow!("missing credentials: set --password or KURIER_PASSWORD"))?;
    Ok((email, password))
}

/// Establish a session for this process, completing the TOTP step-up when the
/// server asks for it and a code was provided.
async fn sign_in(session: &mut SessionManager, globals: &GlobalArgs) -> Result<User> {
    let (email, password) = credentials(globals)?;

    match session.login(email, password).await? {
        LoginOutcome::Authenticated(user) => Ok(user),
        LoginOutcome::TotpRequired => {
            let code = globals
                .totp_code
                .as_deref()
                .ok_or_else(|| anyhow!("this account requires a TOTP code: pass --code"))?;
            Ok(session.complete_step_up(email, password, code).await?)
        }
    }
}

fn read_attachment(path: &Path) -> Result<AttachmentUpload> {
    let data =
        fs::read(path).with_context(|| format!("failed to read attachment {}", path.display()))?;
    let filename = path
        .file_name()
        .map_or_else(|| "attachment".to_string(), |name| name.to_string_lossy().into_owned());
    Ok(AttachmentUpload {
        filename,
        // The server stores the declared type verbatim; the CLI does not
        // guess beyond the safe default.
        content_type: "application/octet-stream".to_string(),
        data,
    })
}
