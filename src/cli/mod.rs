use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use tracing::Level;

use crate::config::resolve::{load_settings, Overrides};
use crate::config::RegistryConfig;
use crate::core::manifest::NodeId;
use crate::error::{DepgraphError, Result};
use crate::graph::builder::{build_graph, BuiltGraph};
use crate::graph::ops::load_order;
use crate::graph::viz;
use crate::source::http::{HttpFetcher, JsonFetcher};
use crate::source::locator::{fetch_package_json, RepoLocator};
use crate::source::registry::{extract_dependencies, RegistrySource};
use crate::source::static_repo::StaticRepo;
use crate::util::output;

const EXIT_FAILURE: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "depgraph")]
#[command(version, about = "Dependency graph tool", long_about = None)]
pub struct Cli {
    /// Name of the package to analyze.
    #[arg(long)]
    pub package: String,
    /// Repository URL or package name; the description file path with --test.
    #[arg(long)]
    pub repo: String,
    /// Read the graph from a description file instead of the registry.
    #[arg(long)]
    pub test: bool,
    /// Skip packages whose name contains this substring.
    #[arg(long, default_value = "")]
    pub filter: String,
    /// Print the bottom-up load order.
    #[arg(long)]
    pub load_order: bool,
    /// Print the dependency tree.
    #[arg(long)]
    pub ascii_tree: bool,
    /// Print the load order as a JSON array.
    #[arg(long)]
    pub json: bool,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub registry: Option<String>,
    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[arg(short, long)]
    pub quiet: bool,
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Serialize)]
struct RunParameters<'a> {
    package: &'a str,
    repo: &'a str,
    test: bool,
    filter: &'a str,
    load_order: bool,
    ascii_tree: bool,
}

pub fn run() {
    let cli = Cli::parse();
    if cli.no_color {
        output::set_color(false);
    }
    init_tracing(cli.verbose, cli.quiet);
    if let Err(err) = dispatch(cli) {
        output::error(&format!("error: {err}"));
        std::process::exit(EXIT_FAILURE);
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(cli: Cli) -> Result<()> {
    print_parameters(&cli);

    if cli.package.trim().is_empty() {
        return Err(DepgraphError::Other(anyhow::anyhow!(
            "--package must not be empty"
        )));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.test {
        handle_test_mode(&cli, &mut out)
    } else {
        let settings = load_settings(
            std::env::current_dir()?,
            cli.config.clone(),
            &Overrides {
                registry: cli.registry.clone(),
                timeout_secs: cli.timeout,
            },
        )?;
        let registry = &settings.registry;
        let fetcher = HttpFetcher::new(registry.timeout(), &registry.user_agent)?;
        handle_registry_mode(&cli, registry, &fetcher, &mut out)
    }
}

fn print_parameters(cli: &Cli) {
    let params = RunParameters {
        package: &cli.package,
        repo: &cli.repo,
        test: cli.test,
        filter: &cli.filter,
        load_order: cli.load_order,
        ascii_tree: cli.ascii_tree,
    };
    println!("Parameters:");
    for line in parameter_lines(&params) {
        println!("{line}");
    }
}

fn parameter_lines(params: &RunParameters<'_>) -> Vec<String> {
    let value = serde_json::to_value(params).unwrap_or_default();
    let Some(fields) = value.as_object() else {
        return Vec::new();
    };
    fields
        .iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(text) => format!("{key}={text}"),
            other => format!("{key}={other}"),
        })
        .collect()
}

fn handle_test_mode(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let path = Path::new(&cli.repo);
    if !path.is_file() {
        return Err(DepgraphError::Other(anyhow::anyhow!(
            "in test mode --repo must point to an existing file, not found: {}",
            cli.repo
        )));
    }
    let repo = StaticRepo::load(path)?;
    if !cli.quiet {
        output::info(&format!(
            "loaded {} packages from {}",
            repo.len(),
            path.display()
        ));
    }

    let built = build_graph(&cli.package, None, &repo, &cli.filter)?;
    render(cli, &built, out)
}

fn handle_registry_mode(
    cli: &Cli,
    registry: &RegistryConfig,
    fetcher: &dyn JsonFetcher,
    out: &mut dyn Write,
) -> Result<()> {
    let locator = RepoLocator::parse(&cli.repo, &registry.url)?;
    let package_json = fetch_package_json(&locator, fetcher, &registry.url)?;
    let mut direct = extract_dependencies(&package_json);
    direct.sort();
    if direct.is_empty() {
        writeln!(out, "No direct dependencies found.")?;
    } else {
        writeln!(out, "Direct dependencies:")?;
        for (name, spec) in direct {
            writeln!(out, "{name}@{spec}")?;
        }
    }

    if !(cli.ascii_tree || cli.load_order) {
        if !cli.filter.trim().is_empty() {
            output::warn("--filter only applies with --ascii-tree or --load-order");
        }
        return Ok(());
    }

    let source = RegistrySource::new(fetcher, registry.url.clone());
    let built = build_graph(&cli.package, None, &source, &cli.filter)?;
    render(cli, &built, out)
}

fn render(cli: &Cli, built: &BuiltGraph, out: &mut dyn Write) -> Result<()> {
    output::section(out, "Graphviz DOT:")?;
    write!(out, "{}", viz::render_dot(&built.graph))?;

    if cli.ascii_tree {
        output::section(out, "ASCII dependency tree:")?;
        write!(out, "{}", viz::render_tree(&built.graph, &built.root))?;
    }

    if cli.load_order {
        let order = load_order(&built.graph, &built.root);
        output::section(out, "Load order (bottom-up):")?;
        print_order(&order, cli.json, out)?;
    }
    Ok(())
}

fn print_order(order: &[NodeId], json: bool, out: &mut dyn Write) -> Result<()> {
    if json {
        let names: Vec<&str> = order.iter().map(NodeId::as_str).collect();
        writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&names)
                .map_err(|err| DepgraphError::Other(anyhow::Error::new(err)))?
        )?;
    } else {
        for node in order {
            writeln!(out, "{node}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use serde_json::json;

    use crate::cli::{handle_registry_mode, parameter_lines, Cli, RunParameters};
    use crate::config::RegistryConfig;
    use crate::source::registry::tests::{package, MemoryFetcher};

    const REGISTRY: &str = "https://registry.test";

    fn registry_cli(name: &str, extra: &[&str]) -> Cli {
        let mut args = vec!["depgraph", "--package", name, "--repo", name];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).expect("parse cli")
    }

    fn registry_config() -> RegistryConfig {
        RegistryConfig {
            url: REGISTRY.to_string(),
            ..RegistryConfig::default()
        }
    }

    fn app_registry() -> MemoryFetcher {
        let app_deps = json!({ "util": "1.0.0", "lib": "^2" });
        MemoryFetcher::default()
            .with(
                "https://registry.test/app/latest",
                json!({ "name": "app", "version": "1.0.0", "dependencies": app_deps.clone() }),
            )
            .with(
                "https://registry.test/app",
                package("app", "1.0.0", &[("1.0.0", app_deps)]),
            )
            .with(
                "https://registry.test/util",
                package("util", "1.0.0", &[("1.0.0", json!({}))]),
            )
            .with(
                "https://registry.test/lib",
                package(
                    "lib",
                    "2.1.0",
                    &[("2.0.0", json!({})), ("2.1.0", json!({}))],
                ),
            )
    }

    fn run_registry(cli: &Cli, fetcher: &MemoryFetcher) -> String {
        let mut out = Vec::new();
        handle_registry_mode(cli, &registry_config(), fetcher, &mut out)
            .expect("registry mode succeeds");
        String::from_utf8(out).expect("utf-8 output")
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "depgraph",
            "--package",
            "A",
            "--repo",
            "repo.txt",
            "--test",
            "--filter",
            "C",
            "--load-order",
            "--ascii-tree",
            "-vv",
        ])
        .expect("parse cli");
        assert!(cli.test && cli.load_order && cli.ascii_tree);
        assert_eq!(cli.filter, "C");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn package_and_repo_are_required() {
        assert!(Cli::try_parse_from(["depgraph", "--repo", "x"]).is_err());
        assert!(Cli::try_parse_from(["depgraph", "--package", "x"]).is_err());
    }

    #[test]
    fn parameters_print_as_key_value_in_declaration_order() {
        let lines = parameter_lines(&RunParameters {
            package: "A",
            repo: "repo.txt",
            test: true,
            filter: "",
            load_order: false,
            ascii_tree: true,
        });
        assert_eq!(
            lines,
            vec![
                "package=A",
                "repo=repo.txt",
                "test=true",
                "filter=",
                "load_order=false",
                "ascii_tree=true",
            ]
        );
    }

    #[test]
    fn registry_mode_lists_sorted_direct_dependencies_and_renders_tree() {
        let fetcher = app_registry();
        let cli = registry_cli("app", &["--ascii-tree", "--load-order"]);
        let stdout = run_registry(&cli, &fetcher);

        assert!(
            stdout.starts_with("Direct dependencies:\nlib@^2\nutil@1.0.0\n"),
            "stdout: {stdout}"
        );
        let lines: Vec<&str> = stdout.lines().collect();
        let tree_root = lines
            .iter()
            .position(|line| line.starts_with("└── "))
            .expect("tree in output");
        assert_eq!(
            &lines[tree_root..tree_root + 3],
            &["└── app@1.0.0", "    ├── util@1.0.0", "    └── lib@2.1.0"]
        );
        assert!(stdout.ends_with("util@1.0.0\nlib@2.1.0\napp@1.0.0\n"));
        assert!(stdout.contains("    \"app@1.0.0\" -> \"lib@2.1.0\";\n"));
    }

    #[test]
    fn registry_mode_without_tree_or_order_stops_after_listing() {
        let fetcher = app_registry();
        let cli = registry_cli("app", &[]);
        let stdout = run_registry(&cli, &fetcher);

        assert_eq!(stdout, "Direct dependencies:\nlib@^2\nutil@1.0.0\n");
        assert_eq!(
            *fetcher.requests.borrow(),
            vec!["https://registry.test/app/latest".to_string()]
        );
    }

    #[test]
    fn registry_mode_reports_missing_direct_dependencies() {
        let fetcher = MemoryFetcher::default().with(
            "https://registry.test/solo/latest",
            json!({ "name": "solo", "version": "0.1.0" }),
        );
        let cli = registry_cli("solo", &[]);
        assert_eq!(
            run_registry(&cli, &fetcher),
            "No direct dependencies found.\n"
        );
    }
}
