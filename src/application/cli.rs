use std::io;
use std::path;
use std::path::Path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatTurn;
use crate::domain::models::UploadedDocument;
use crate::infrastructure::api::auth::Auth;
use crate::infrastructure::api::chatbot::Chatbot;
use crate::infrastructure::api::datasets::Datasets;
use crate::infrastructure::gateway::Gateway;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn build_gateway() -> Gateway {
    return Gateway::default().with_session_expired(|| {
        eprintln!(
            "{}",
            Paint::yellow("Your session has expired. Run `mediq login` to sign in again.")
        );
    });
}

fn format_turn(turn: &ChatTurn) -> String {
    let timestamp = turn.timestamp.format("%Y-%m-%d %H:%M").to_string();
    return format!(
        "[{timestamp}] You: {message}\n[{timestamp}] Mediq: {response}",
        message = turn.message,
        response = turn.response,
    );
}

fn format_document(document: &UploadedDocument) -> String {
    return format!(
        "- (ID: {id}) {filename}, uploaded {uploaded_at}",
        id = document.id,
        filename = document.original_filename,
        uploaded_at = document.uploaded_at.format("%Y-%m-%d %H:%M"),
    );
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if !config_file_path.parent().unwrap().exists() {
        fs::create_dir_all(config_file_path.parent().unwrap()).await?;
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    let config_path_display = config_file_path.as_os_str().to_str().unwrap();
    println!("Created default config file at {config_path_display}");
    return Ok(());
}

async fn run_login() -> Result<()> {
    let username = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Username")
        .default(Config::get(ConfigKey::Username))
        .interact_text()?;

    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()?;

    Auth::default().login(&username, &password).await?;
    println!("Signed in as {username}");

    return Ok(());
}

async fn run_chat(message: &str) -> Result<()> {
    let chatbot = Chatbot::new(build_gateway());
    let turn = chatbot.send_message(message).await?;
    println!("{}", turn.response);

    return Ok(());
}

async fn run_history() -> Result<()> {
    let chatbot = Chatbot::new(build_gateway());
    let turns = chatbot.history().await?;

    if turns.is_empty() {
        println!("There is no chat history yet. Ask your first question!");
        return Ok(());
    }

    let lines = turns
        .iter()
        .map(|turn| {
            return format_turn(turn);
        })
        .collect::<Vec<String>>();
    println!("{}", lines.join("\n"));

    return Ok(());
}

async fn run_kb(kb_matches: &ArgMatches) -> Result<()> {
    match kb_matches.subcommand() {
        Some(("upload", upload_matches)) => {
            let file = upload_matches.get_one::<String>("file").unwrap();
            let chatbot = Chatbot::new(build_gateway());
            let receipt = chatbot.upload_pdf(Path::new(file)).await?;
            println!(
                "{message} ({chunk_count} chunks)",
                message = receipt.message,
                chunk_count = receipt.chunk_count
            );
        }
        Some(("list", _)) => {
            let chatbot = Chatbot::new(build_gateway());
            let documents = chatbot.uploaded_pdfs().await?;
            if documents.is_empty() {
                println!("No PDFs have been uploaded yet.");
                return Ok(());
            }

            let lines = documents
                .iter()
                .map(|document| {
                    return format_document(document);
                })
                .collect::<Vec<String>>();
            println!("{}", lines.join("\n"));
        }
        _ => {
            subcommand_kb().print_long_help()?;
        }
    }

    return Ok(());
}

async fn run_datasets(datasets_matches: &ArgMatches) -> Result<()> {
    let datasets = Datasets::new(build_gateway());

    match datasets_matches.subcommand() {
        Some(("list", _)) => {
            let payload = datasets.list().await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Some(("set", set_matches)) => {
            let file_name = set_matches.get_one::<String>("file-name").unwrap();
            let payload = datasets.set(file_name).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Some(("upload", upload_matches)) => {
            let file = upload_matches.get_one::<String>("file").unwrap();
            let payload = datasets.upload_file(Path::new(file)).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Some(("query", query_matches)) => {
            let query = query_matches.get_one::<String>("query").unwrap();
            let payload = datasets.process_query(query).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        _ => {
            subcommand_datasets().print_long_help()?;
        }
    }

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_login() -> Command {
    return Command::new("login")
        .about("Sign in to the backend and store the session tokens. Prompts for the password.");
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Send a message to the chatbot and print its answer.")
        .arg(
            clap::Arg::new("message")
                .help("The question to ask.")
                .required(true)
                .num_args(1),
        );
}

fn subcommand_kb() -> Command {
    return Command::new("kb")
        .about("Manage the PDF knowledge base.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("upload")
                .about("Upload a PDF to be chunked into the knowledge base.")
                .arg(
                    clap::Arg::new("file")
                        .help("Path to the PDF file.")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(Command::new("list").about("List all PDFs already in the knowledge base."));
}

fn subcommand_datasets() -> Command {
    return Command::new("datasets")
        .about("Auxiliary dataset endpoints, passed through as raw JSON.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List available datasets."))
        .subcommand(
            Command::new("set")
                .about("Select the active dataset by file name.")
                .arg(
                    clap::Arg::new("file-name")
                        .help("Dataset file name as returned by list.")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a dataset file.")
                .arg(
                    clap::Arg::new("file")
                        .help("Path to the dataset file.")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("query")
                .about("Run a test query against the dataset endpoints.")
                .arg(
                    clap::Arg::new("query")
                        .help("The query to process.")
                        .required(true)
                        .num_args(1),
                ),
        );
}

fn arg_backend_url() -> Arg {
    return Arg::new(ConfigKey::BackendURL.to_string())
        .short('b')
        .long(ConfigKey::BackendURL.to_string())
        .env("MEDIQ_BACKEND_URL")
        .num_args(1)
        .help(format!(
            "Base URL of the chatbot backend. [default: {}]",
            Config::default(ConfigKey::BackendURL)
        ))
        .global(true);
}

fn arg_login_path() -> Arg {
    return Arg::new(ConfigKey::LoginPath.to_string())
        .long(ConfigKey::LoginPath.to_string())
        .env("MEDIQ_LOGIN_PATH")
        .num_args(1)
        .help(format!(
            "Path of the login endpoint on the backend. [default: {}]",
            Config::default(ConfigKey::LoginPath)
        ))
        .global(true);
}

fn arg_refresh_path() -> Arg {
    return Arg::new(ConfigKey::RefreshPath.to_string())
        .long(ConfigKey::RefreshPath.to_string())
        .env("MEDIQ_REFRESH_PATH")
        .num_args(1)
        .help(format!(
            "Path of the token refresh endpoint on the backend. [default: {}]",
            Config::default(ConfigKey::RefreshPath)
        ))
        .global(true);
}

fn arg_request_timeout() -> Arg {
    return Arg::new(ConfigKey::RequestTimeout.to_string())
        .long(ConfigKey::RequestTimeout.to_string())
        .env("MEDIQ_REQUEST_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in milliseconds before giving up on a request. [default: {}]",
            Config::default(ConfigKey::RequestTimeout)
        ))
        .global(true);
}

fn arg_credentials_file() -> Arg {
    return Arg::new(ConfigKey::CredentialsFile.to_string())
        .long(ConfigKey::CredentialsFile.to_string())
        .env("MEDIQ_CREDENTIALS_FILE")
        .num_args(1)
        .help(format!(
            "Path to the file holding the session tokens. [default: {}]",
            Config::default(ConfigKey::CredentialsFile)
        ))
        .global(true);
}

fn arg_username() -> Arg {
    return Arg::new(ConfigKey::Username.to_string())
        .long(ConfigKey::Username.to_string())
        .env("MEDIQ_USERNAME")
        .num_args(1)
        .help("Account name suggested when signing in.")
        .global(true);
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("mediq")
        .about(about)
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_login())
        .subcommand(Command::new("logout").about("Sign out and clear the stored session tokens."))
        .subcommand(subcommand_chat())
        .subcommand(Command::new("history").about("Print past chat turns, oldest first."))
        .subcommand(subcommand_kb())
        .subcommand(subcommand_datasets())
        .subcommand(subcommand_config())
        .subcommand(subcommand_completions())
        .arg(arg_backend_url())
        .arg(arg_login_path())
        .arg(arg_refresh_path())
        .arg(arg_request_timeout())
        .arg(arg_credentials_file())
        .arg(arg_username())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("MEDIQ_CONFIG_FILE")
                .num_args(1)
                .help(format!(
                    "Path to configuration file [default: {}]",
                    Config::default(ConfigKey::ConfigFile)
                ))
                .global(true),
        );
}

pub async fn parse() -> Result<()> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("login", login_matches)) => {
            Config::load(vec![&matches, login_matches]).await?;
            run_login().await?;
        }
        Some(("logout", logout_matches)) => {
            Config::load(vec![&matches, logout_matches]).await?;
            Auth::default().logout()?;
            println!("Signed out.");
        }
        Some(("chat", chat_matches)) => {
            Config::load(vec![&matches, chat_matches]).await?;
            let message = chat_matches.get_one::<String>("message").unwrap();
            run_chat(message).await?;
        }
        Some(("history", history_matches)) => {
            Config::load(vec![&matches, history_matches]).await?;
            run_history().await?;
        }
        Some(("kb", kb_matches)) => {
            Config::load(vec![&matches, kb_matches]).await?;
            run_kb(kb_matches).await?;
        }
        Some(("datasets", datasets_matches)) => {
            Config::load(vec![&matches, datasets_matches]).await?;
            run_datasets(datasets_matches).await?;
        }
        Some(("config", config_matches)) => match config_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                subcommand_config().print_long_help()?;
            }
        },
        Some(("completions", completions_matches)) => {
            if let Some(completions) = completions_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        _ => {
            build().print_long_help()?;
        }
    }

    return Ok(());
}
