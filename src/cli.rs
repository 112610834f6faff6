pub fn ask<'a, 'b>() -> clap::App<'a, 'b> {
    clap::App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(clap::AppSettings::SubcommandRequiredElseHelp)
        .arg(
            clap::Arg::with_name("secret")
                .short("s")
                .long("secret")
                .help("Secret to generate and authenticate tokens. Can also be provided in the .joblyrc file")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("config")
                .short("c")
                .long("config")
                .help("Path to .joblyrc file")
                .default_value(".joblyrc")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Makes Jobly verbose. Useful for debugging and seeing what's going on \"under the hood\"")
        )
        .subcommand(
            clap::App::new("serve")
                .about("Start the jobs API")
                .arg(
                    clap::Arg::with_name("port")
                        .short("p")
                        .long("port")
                        .help("Custom server port [default: 8787]")
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::with_name("database")
                        .short("d")
                        .long("database")
                        .help("Database directory [default: ~/.jobly]")
                        .takes_value(true),
                ),
        )
        .subcommand(
            clap::App::new("token")
                .about("Create a token based on the secret to authorize API calls")
                .arg(
                    clap::Arg::with_name("permissions")
                        .short("p")
                        .long("permissions")
                        .help("Comma separated token permissions, e.g. job:write")
                        .default_value("")
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::with_name("duration")
                        .short("d")
                        .long("duration")
                        .help("Token duration until expires in minutes")
                        .default_value("43800")
                        .takes_value(true),
                )
        )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_serve_arguments() {
        let matches = ask()
            .get_matches_from_safe(vec!["jobly", "-s", "secret", "serve", "-p", "9000"])
            .unwrap();

        assert_eq!(matches.value_of("secret"), Some("secret"));
        assert_eq!(matches.value_of("config"), Some(".joblyrc"));

        let serve = matches.subcommand_matches("serve").unwrap();
        assert_eq!(serve.value_of("port"), Some("9000"));
        assert_eq!(serve.value_of("database"), None);
    }

    #[test]
    fn test_token_defaults() {
        let matches = ask().get_matches_from_safe(vec!["jobly", "token"]).unwrap();

        let token = matches.subcommand_matches("token").unwrap();
        assert_eq!(token.value_of("permissions"), Some(""));
        assert_eq!(token.value_of("duration"), Some("43800"));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(ask().get_matches_from_safe(vec!["jobly"]).is_err());
    }
}
