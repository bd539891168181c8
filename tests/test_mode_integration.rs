use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const SAMPLE_REPO: &str = "# sample\nA: B C\nB: D\nC: D E\nD:\nE:\n";

struct TestRepo {
    root: PathBuf,
    file: PathBuf,
}

impl TestRepo {
    fn new(content: &str) -> Self {
        let root = unique_temp_dir("test-mode");
        fs::create_dir_all(&root).expect("create temp root");
        let file = root.join("repo.txt");
        fs::write(&file, content).expect("write test repository");
        Self { root, file }
    }

    fn run(&self, package: &str, extra: &[&str]) -> Output {
        Command::new(depgraph_bin())
            .current_dir(&self.root)
            .arg("--package")
            .arg(package)
            .arg("--repo")
            .arg(&self.file)
            .arg("--test")
            .args(extra)
            .output()
            .expect("run depgraph")
    }

    fn stdout(&self, package: &str, extra: &[&str]) -> String {
        let output = self.run(package, extra);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        assert!(
            output.status.success(),
            "depgraph failed\nstdout:\n{stdout}\nstderr:\n{stderr}"
        );
        stdout
    }
}

impl Drop for TestRepo {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn depgraph_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_depgraph"))
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos();
    let pid = std::process::id();
    std::env::temp_dir().join(format!("depgraph-{prefix}-{pid}-{nanos}"))
}

/// Lines following `title` up to the next blank line.
fn section<'a>(stdout: &'a str, title: &str) -> Vec<&'a str> {
    stdout
        .lines()
        .skip_while(|line| *line != title)
        .skip(1)
        .take_while(|line| !line.is_empty())
        .collect()
}

#[test]
fn prints_parameters_and_dot() {
    let repo = TestRepo::new(SAMPLE_REPO);
    let stdout = repo.stdout("A", &[]);
    assert!(stdout.starts_with("Parameters:\npackage=A\n"));
    assert!(stdout.contains("test=true\nfilter=\nload_order=false\nascii_tree=false\n"));
    assert_eq!(
        section(&stdout, "Graphviz DOT:"),
        vec![
            "digraph dependencies {",
            "    \"A\" -> \"B\";",
            "    \"A\" -> \"C\";",
            "    \"B\" -> \"D\";",
            "    \"C\" -> \"D\";",
            "    \"C\" -> \"E\";",
            "}",
        ]
    );
    assert!(!stdout.contains("ASCII dependency tree:"));
    assert!(!stdout.contains("Load order"));
}

#[test]
fn prints_tree_and_load_order() {
    let repo = TestRepo::new(SAMPLE_REPO);
    let stdout = repo.stdout("A", &["--ascii-tree", "--load-order"]);
    assert_eq!(
        section(&stdout, "ASCII dependency tree:"),
        vec![
            "└── A",
            "    ├── B",
            "    │   └── D",
            "    └── C",
            "        ├── D [repeat]",
            "        └── E",
        ]
    );
    assert_eq!(
        section(&stdout, "Load order (bottom-up):"),
        vec!["D", "B", "E", "C", "A"]
    );
}

#[test]
fn filter_drops_matching_dependencies() {
    let repo = TestRepo::new(SAMPLE_REPO);
    let stdout = repo.stdout("A", &["--filter", "C", "--load-order"]);
    assert_eq!(
        section(&stdout, "Load order (bottom-up):"),
        vec!["D", "B", "A"]
    );
    assert!(!stdout.contains("\"C\""));
}

#[test]
fn reports_loaded_package_count_on_stderr() {
    let repo = TestRepo::new(SAMPLE_REPO);
    let output = repo.run("A", &[]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loaded 5 packages from "), "stderr: {stderr}");

    let quiet = repo.run("A", &["--quiet"]);
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("loaded 5 packages"));
}

#[test]
fn load_order_as_json() {
    let repo = TestRepo::new("app: lib\nlib: core\ncore:\n");
    let stdout = repo.stdout("app", &["--load-order", "--json"]);
    let json_start = stdout.find('[').expect("json array in output");
    let order: Vec<String> =
        serde_json::from_str(stdout[json_start..].trim()).expect("parse load order json");
    assert_eq!(order, vec!["core", "lib", "app"]);
}

#[test]
fn cyclic_repository_terminates() {
    let repo = TestRepo::new("A: B\nB: A\n");
    let stdout = repo.stdout("A", &["--ascii-tree", "--load-order"]);
    assert!(stdout.contains("        └── A [repeat]"));
    assert_eq!(section(&stdout, "Load order (bottom-up):"), vec!["B", "A"]);
}

#[test]
fn missing_root_fails_with_status_two() {
    let repo = TestRepo::new(SAMPLE_REPO);
    let output = repo.run("Z", &[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("package not found: Z"), "stderr: {stderr}");
}

#[test]
fn root_without_its_own_line_fails_with_status_two() {
    let repo = TestRepo::new("A: B\n");
    let output = repo.run("B", &[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("package not found: B"), "stderr: {stderr}");
}

#[test]
fn missing_repository_file_fails() {
    let repo = TestRepo::new(SAMPLE_REPO);
    let output = Command::new(depgraph_bin())
        .args(["--package", "A", "--repo"])
        .arg(repo.root.join("absent.txt"))
        .arg("--test")
        .output()
        .expect("run depgraph");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn blank_package_is_rejected() {
    let repo = TestRepo::new(SAMPLE_REPO);
    let output = repo.run("  ", &[]);
    assert_eq!(output.status.code(), Some(2));
}
