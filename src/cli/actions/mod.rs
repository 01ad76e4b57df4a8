pub mod run;

use std::path::PathBuf;

/// What the invocation asks for, decoupled from clap matches. Credentials
/// travel in `GlobalArgs`, never in the action itself.
#[derive(Debug)]
pub enum Action {
    Register {
        username: String,
    },
    Login,
    Logout,
    Whoami,
    TwoFaStatus,
    TwoFaSetup,
    TwoFaEnable {
        code: String,
    },
    TwoFaDisable {
        code: String,
    },
    Inbox,
    Sent,
    Show {
        id: String,
    },
    Delete {
        id: String,
    },
    Send {
        to: String,
        subject: String,
        body: String,
        attachments: Vec<PathBuf>,
    },
    Attachment {
        message_id: String,
        attachment_id: String,
        output: Option<PathBuf>,
    },
}
