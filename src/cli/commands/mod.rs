use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("kurier")
        .about("Secure messaging client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .short('u')
                .long("api-url")
                .help("Base URL of the messaging API, example: https://kurier.tld")
                .env("KURIER_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("email")
                .short('e')
                .long("email")
                .help("Account email, used to sign in before authenticated commands")
                .env("KURIER_EMAIL")
                .global(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Account password, prefer passing via environment")
                .env("KURIER_PASSWORD")
                .global(true),
        )
        .arg(
            Arg::new("code")
                .short('c')
                .long("code")
                .help("6-8 digit TOTP code for accounts with 2FA enabled")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .help("Request timeout in seconds")
                .default_value("10")
                .env("KURIER_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("KURIER_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("register").about("Create a new account").arg(
                Arg::new("username")
                    .long("username")
                    .help("Public username")
                    .required(true),
            ),
        )
        .subcommand(
            Command::new("login")
                .about("Check credentials; pass --code when 2FA is enabled on the account"),
        )
        .subcommand(Command::new("logout").about("Clear the server-side session"))
        .subcommand(Command::new("whoami").about("Show the current session"))
        .subcommand(
            Command::new("2fa")
                .about("Two-factor authentication lifecycle")
                .subcommand_required(true)
                .subcommand(Command::new("status").about("Show whether 2FA is enabled"))
                .subcommand(
                    Command::new("setup")
                        .about("Generate a fresh TOTP secret and provisioning URI"),
                )
                .subcommand(
                    Command::new("enable")
                        .about("Confirm enrollment with a code from the authenticator")
                        .arg(
                            Arg::new("enable-code")
                                .long("enable-code")
                                .help("Code from the newly provisioned authenticator entry")
                                .required(true),
                        ),
                )
                .subcommand(
                    Command::new("disable")
                        .about("Disable 2FA, a valid code is required")
                        .arg(
                            Arg::new("disable-code")
                                .long("disable-code")
                                .help("Current authenticator code")
                                .required(true),
                        ),
                ),
        )
        .subcommand(Command::new("inbox").about("List received messages"))
        .subcommand(Command::new("sent").about("List sent messages"))
        .subcommand(
            Command::new("show")
                .about("Show a message")
                .arg(Arg::new("id").help("Message id").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a message")
                .arg(Arg::new("id").help("Message id").required(true)),
        )
        .subcommand(
            Command::new("send")
                .about("Send a message with optional attachments")
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Recipients (username or email), separated by commas or newlines")
                        .required(true),
                )
                .arg(
                    Arg::new("subject")
                        .short('s')
                        .long("subject")
                        .help("Subject, 1-200 characters")
                        .required(true),
                )
                .arg(
                    Arg::new("body")
                        .short('b')
                        .long("body")
                        .help("Body, 1-20000 characters")
                        .required(true),
                )
                .arg(
                    Arg::new("attach")
                        .short('a')
                        .long("attach")
                        .help("Path to a file to attach, may be repeated")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("attachment")
                .about("Download an attachment")
                .arg(Arg::new("id").help("Message id").required(true))
                .arg(
                    Arg::new("attachment-id")
                        .help("Attachment id")
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Write to this path instead of the server-provided filename"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "kurier");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Secure messaging client".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_login_args() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "kurier",
            "--api-url",
            "http://localhost:8080",
            "--email",
            "alice@example.com",
            "--password",
            "hunter2!",
            "--code",
            "123456",
            "login",
        ]);

        assert_eq!(
            matches.get_one::<String>("api-url").cloned(),
            Some("http://localhost:8080".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("email").cloned(),
            Some("alice@example.com".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("code").cloned(),
            Some("123456".to_string())
        );
        assert_eq!(matches.subcommand_name(), Some("login"));
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("KURIER_API_URL", Some("https://kurier.tld")),
                ("KURIER_EMAIL", Some("alice@example.com")),
                ("KURIER_TIMEOUT", Some("30")),
                ("KURIER_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["kurier", "inbox"]);
                assert_eq!(
                    matches.get_one::<String>("api-url").cloned(),
                    Some("https://kurier.tld".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("email").cloned(),
                    Some("alice@example.com".to_string())
                );
                assert_eq!(matches.get_one::<u64>("timeout").copied(), Some(30));
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("KURIER_LOG_LEVEL", Some(level)),
                    ("KURIER_API_URL", Some("https://kurier.tld")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["kurier", "inbox"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").copied(),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_send_repeated_attachments() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "kurier",
            "--api-url",
            "http://localhost:8080",
            "send",
            "--to",
            "bob",
            "--subject",
            "Hi",
            "--body",
            "Hello",
            "--attach",
            "a.txt",
            "--attach",
            "b.bin",
        ]);

        let (_, sub) = matches.subcommand().expect("subcommand");
        let attachments: Vec<String> = sub
            .get_many::<String>("attach")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        assert_eq!(attachments, vec!["a.txt", "b.bin"]);
    }
}
