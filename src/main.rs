use std::path::PathBuf;
use std::process::ExitCode;
use clap::{Parser, Subcommand};
use log::{error, LevelFilter};
use commands::evaluate::evaluate_once;
use commands::repl::run_repl;
use commands::serve::{serve, ServeOverrides};

mod commands;
mod config;

const EXIT_FAILURE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "calculator")]
#[command(about = "Evaluates arithmetic expressions in the terminal or in the browser.")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(short, global = true)]
    verbose: bool,

    /// Also write a timestamped log file into this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Expression to evaluate once. Without it an interactive prompt starts.
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    expression: Vec<String>,

    #[command(subcommand)]
    subcommand: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the browser front-end and the evaluation API.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// TOML file with [server] and [tls] sections.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, requires = "tls_key")]
        tls_cert: Option<String>,

        #[arg(long, requires = "tls_cert")]
        tls_key: Option<String>,

        /// Do not log every request.
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.subcommand {
        Some(Commands::Serve { .. }) => LevelFilter::Info,
        None => LevelFilter::Warn,
    };
    let console_level = if cli.verbose { LevelFilter::Debug } else { default_level };

    if let Err(e) = calculator_logger::init(cli.log_dir.as_ref(), console_level, LevelFilter::Trace) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    match cli.subcommand {
        Some(Commands::Serve { host, port, config, tls_cert, tls_key, quiet }) => {
            let overrides = ServeOverrides { host, port, config, tls_cert, tls_key, quiet };
            match serve(overrides).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("{}", e);
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
        None if cli.expression.is_empty() => {
            let stdin = std::io::stdin();
            match run_repl(stdin.lock(), &mut std::io::stdout()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Interactive session failed: {}", e);
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
        None => {
            let expression = cli.expression.join(" ");
            match evaluate_once(&expression, &mut std::io::stdout(), &mut std::io::stderr()) {
                Ok(code) => ExitCode::from(code),
                Err(e) => {
                    error!("Failed to write the result: {}", e);
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn words_form_one_expression() {
        let cli = Cli::parse_from(["calculator", "2", "+", "3"]);
        assert_eq!(cli.expression.join(" "), "2 + 3");
        assert!(cli.subcommand.is_none());
    }

    #[test]
    fn leading_minus_is_part_of_the_expression() {
        let cli = Cli::parse_from(["calculator", "-2**2"]);
        assert_eq!(cli.expression, vec!["-2**2".to_string()]);
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::parse_from(["calculator", "serve", "--port", "9000", "--quiet"]);
        match cli.subcommand {
            Some(Commands::Serve { port, quiet, host, .. }) => {
                assert_eq!(port, Some(9000));
                assert!(quiet);
                assert_eq!(host, None);
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn tls_flags_come_in_pairs() {
        let result = Cli::try_parse_from(["calculator", "serve", "--tls-cert", "cert.pem"]);
        assert!(result.is_err());
    }
}
