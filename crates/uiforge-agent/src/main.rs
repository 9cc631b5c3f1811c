use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use uiforge_agent::{Agent, AgentConfig, AgentRequest, Mode};
use uiforge_plan::{apply_change_plan, ChangePlan, Plan};
use uiforge_policy::Policy;

/// Environment variable holding the log filter
const LOG_ENV: &str = "UIFORGE_LOG";

fn cli() -> Command {
    Command::new("uiforge")
        .version(uiforge_agent::VERSION)
        .about("Plan, validate and generate constrained component UIs")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("run")
                .about("Run one request through the pipeline")
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .default_value("generate")
                        .value_parser(["generate", "modify", "regenerate"])
                        .help("Run mode"),
                )
                .arg(
                    Arg::new("intent")
                        .long("intent")
                        .help("Description of the desired UI or change"),
                )
                .arg(
                    Arg::new("code-file")
                        .long("code-file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("File holding the currently displayed source"),
                )
                .arg(
                    Arg::new("last-plan")
                        .long("last-plan")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("JSON file holding the last accepted plan"),
                )
                .arg(
                    Arg::new("request")
                        .long("request")
                        .value_parser(clap::value_parser!(PathBuf))
                        .conflicts_with_all(["intent", "code-file", "last-plan"])
                        .help("JSON request document; replaces the other run flags"),
                ),
        )
        .subcommand(
            Command::new("validate-plan")
                .about("Validate a plan document")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("validate-code")
                .about("Validate generated source")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("apply")
                .about("Apply a change plan to a plan")
                .arg(
                    Arg::new("plan")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("change-plan")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let log_json = matches
        .subcommand()
        .is_some_and(|(_, args)| args.get_flag("log-json"));
    init_tracing(log_json);

    std::process::exit(exit_code(dispatch(&matches).await));
}

/// Process status for a dispatch outcome: 0 only when the check or run passed
fn exit_code(outcome: Result<bool>) -> i32 {
    match outcome {
        Ok(passed) => i32::from(!passed),
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Run the selected subcommand; `Ok(false)` reports a failed check or run
async fn dispatch(matches: &ArgMatches) -> Result<bool> {
    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("no subcommand given");
    };
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AgentConfig::default(),
    };

    match name {
        "run" => run(config, args).await,
        "validate-plan" => {
            let policy = Policy::new(config.policy)?;
            let document: serde_json::Value = read_json(required_path(args, "file")?)?;
            let report = policy.plans().validate_value(&document);
            print_json(&report)?;
            Ok(report.ok())
        }
        "validate-code" => {
            let policy = Policy::new(config.policy)?;
            let path = required_path(args, "file")?;
            let code = read_text(path)?;
            let report = policy.code().validate(&code);
            print_json(&report)?;
            Ok(report.ok())
        }
        "apply" => {
            let plan: Plan = read_json(required_path(args, "plan")?)?;
            let change: ChangePlan = read_json(required_path(args, "change-plan")?)?;
            match apply_change_plan(&plan, &change).into_result() {
                Ok(plan) => {
                    print_json(&plan)?;
                    Ok(true)
                }
                Err(errors) => {
                    for err in &errors {
                        eprintln!("{err}");
                    }
                    Ok(false)
                }
            }
        }
        other => anyhow::bail!("unknown subcommand {other}"),
    }
}

async fn run(config: AgentConfig, args: &ArgMatches) -> Result<bool> {
    let request = match args.get_one::<PathBuf>("request") {
        Some(path) => read_json(path)?,
        None => {
            let mode = args
                .get_one::<String>("mode")
                .map_or(Mode::Generate, |name| Mode::from_name(name));
            let intent = args.get_one::<String>("intent").cloned().unwrap_or_default();
            let mut request = AgentRequest::new(mode, intent);
            if let Some(path) = args.get_one::<PathBuf>("code-file") {
                request = request.with_current_code(read_text(path)?);
            }
            if let Some(path) = args.get_one::<PathBuf>("last-plan") {
                request = request.with_last_plan(read_json(path)?);
            }
            request
        }
    };

    let agent = Agent::new(config)?;
    info!(mode = %request.mode, "running request");
    let response = agent.respond(&request).await;
    print_json(&response)?;
    Ok(response.is_success())
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing <{name}> argument"))
}

fn read_text(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading input");
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use uiforge_plan::{Node, Operation, Position};

    fn write(dir: &TempDir, name: &str, text: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    async fn status(args: &[&str]) -> i32 {
        let matches = cli()
            .try_get_matches_from(std::iter::once("uiforge").chain(args.iter().copied()))
            .unwrap();
        exit_code(dispatch(&matches).await)
    }

    fn card_plan(card_type: &str) -> String {
        let tree = Node::element("root", "div").with_child(Node::element("node-1", card_type));
        serde_json::to_string(&Plan::new("One card", vec![], tree)).unwrap()
    }

    #[test]
    fn exit_code_reflects_outcome() {
        assert_eq!(exit_code(Ok(true)), 0);
        assert_eq!(exit_code(Ok(false)), 1);
        assert_eq!(exit_code(Err(anyhow::anyhow!("broken"))), 1);
    }

    #[tokio::test]
    async fn validate_plan_status() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.json", &card_plan("Card"));
        let bad = write(&dir, "bad.json", &card_plan("Grid"));
        let text_child = write(
            &dir,
            "text.json",
            r#"{"tree": {"id": "root", "type": "div", "children": [{"id": "t", "kind": "text", "text": "hi"}]}}"#,
        );
        assert_eq!(status(&["validate-plan", &good]).await, 0);
        assert_eq!(status(&["validate-plan", &text_child]).await, 0);
        assert_eq!(status(&["validate-plan", &bad]).await, 1);

        let broken = write(&dir, "broken.json", "{ not json");
        assert_eq!(status(&["validate-plan", &broken]).await, 1);
    }

    #[tokio::test]
    async fn validate_code_status() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.jsx", "import { Card } from \"./ui-kit\";\n<Card></Card>\n");
        let styled = write(&dir, "styled.jsx", "import { Card } from \"./ui-kit\";\n<Card className=\"x\"></Card>\n");
        let empty = write(&dir, "empty.jsx", "");
        assert_eq!(status(&["validate-code", &good]).await, 0);
        assert_eq!(status(&["validate-code", &styled]).await, 1);
        assert_eq!(status(&["validate-code", &empty]).await, 1);

        let absent = dir.path().join("absent.jsx").to_string_lossy().into_owned();
        assert_eq!(status(&["validate-code", &absent]).await, 1);
    }

    #[tokio::test]
    async fn apply_status() {
        let dir = TempDir::new().unwrap();
        let plan = write(&dir, "plan.json", &card_plan("Card"));
        let add = ChangePlan::new(
            "Added a button.",
            vec![Operation::add("root", Position::End, Node::element("", "Button"))],
        );
        let add = write(&dir, "add.json", &serde_json::to_string(&add).unwrap());
        let remove_root = ChangePlan::new("Removed everything.", vec![Operation::remove("root")]);
        let remove_root = write(&dir, "remove.json", &serde_json::to_string(&remove_root).unwrap());

        assert_eq!(status(&["apply", &plan, &add]).await, 0);
        assert_eq!(status(&["apply", &plan, &remove_root]).await, 1);
    }

    #[tokio::test]
    async fn run_status() {
        assert_eq!(status(&["run", "--intent", "a table"]).await, 0);
        assert_eq!(status(&["run", "--mode", "modify", "--intent", "add a button"]).await, 1);
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn request_flag_conflicts_with_intent() {
        let result = cli().try_get_matches_from([
            "uiforge", "run", "--request", "r.json", "--intent", "a card",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_flag_reaches_subcommands() {
        let matches = cli()
            .try_get_matches_from(["uiforge", "--config", "c.toml", "validate-code", "ui.jsx"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<PathBuf>("config"), Some(&PathBuf::from("c.toml")));
    }
}
