use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ngrag_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ngrag");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("carol.txt"),
        "Marley was dead to begin with and there is no doubt whatever about that.\n\n\
         Scrooge kept his counting house cold and paid his clerk Bob Cratchit very little.\n\n\
         The Ghost of Christmas Past carried a bright clear jet of light.",
    )
    .unwrap();
    fs::write(
        files_dir.join("edges.txt"),
        "# characters\nScrooge Marley partners\nScrooge Cratchit employs\nFezziwig\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[storage]
working_dir = "{}/cache"

[chunking]
chunk_token_size = 8
chunk_overlap_token_size = 2
tokenizer = "simple"

[embedding]
provider = "hash"
dims = 4096

[llm]
provider = "disabled"

[query]
mode = "naive"
top_k = 5
"#,
        root.display()
    );

    let config_path = config_dir.join("ngrag.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_ngrag(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ngrag_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("NANO_GRAPHRAG_DEBUG")
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ngrag binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn file(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("files")
        .join(name)
        .display()
        .to_string()
}

#[test]
fn test_chunk_prints_windows() {
    let (_tmp, config_path) = setup_test_env();
    let doc = file(&config_path, "carol.txt");

    let (stdout, stderr, success) = run_ngrag(&config_path, &["chunk", &doc]);
    assert!(success, "chunk failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("tokens=8"));
    assert!(stdout.contains("chunk-"));
    assert!(stdout.contains("chunks: "));
}

#[test]
fn test_chunk_json_output() {
    let (_tmp, config_path) = setup_test_env();
    let doc = file(&config_path, "carol.txt");

    let (stdout, stderr, success) = run_ngrag(&config_path, &["chunk", &doc, "--json"]);
    assert!(success, "chunk --json failed: stderr={}", stderr);

    let chunks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let chunks = chunks.as_array().unwrap();
    assert!(chunks.len() > 1);
    assert_eq!(chunks[0]["index"], 0);
    assert_eq!(chunks[0]["tokens"], 8);
    assert!(chunks[0]["id"].as_str().unwrap().starts_with("chunk-"));
    assert!(chunks[0]["snippet"].as_str().unwrap().starts_with("Marley"));
}

#[test]
fn test_query_only_context() {
    let (_tmp, config_path) = setup_test_env();
    let doc = file(&config_path, "carol.txt");

    let (stdout, stderr, success) = run_ngrag(
        &config_path,
        &[
            "query",
            "Scrooge counting house clerk",
            "--doc",
            &doc,
            "--only-context",
        ],
    );
    assert!(success, "query failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Scrooge"), "stdout={}", stdout);
}

#[test]
fn test_query_without_llm_prints_context() {
    let (_tmp, config_path) = setup_test_env();
    let doc = file(&config_path, "carol.txt");

    let (stdout, _, success) =
        run_ngrag(&config_path, &["query", "Ghost of Christmas Past", "--doc", &doc]);
    assert!(success);
    assert!(stdout.contains("Ghost"));
}

#[test]
fn test_query_unrelated_prints_fail_sentinel() {
    let (_tmp, config_path) = setup_test_env();
    let doc = file(&config_path, "carol.txt");

    let (stdout, _, success) = run_ngrag(&config_path, &["query", "zeppelin", "--doc", &doc]);
    assert!(success);
    assert!(stdout.contains("Sorry, I'm not able to provide an answer to that question."));
}

#[test]
fn test_query_global_mode_prints_unsupported() {
    let (_tmp, config_path) = setup_test_env();
    let doc = file(&config_path, "carol.txt");

    let (stdout, _, success) = run_ngrag(
        &config_path,
        &["query", "Scrooge", "--doc", &doc, "--mode", "global"],
    );
    assert!(success);
    assert!(stdout.contains("not available yet"));
    assert!(!stdout.contains("Sorry"));
}

#[test]
fn test_query_missing_doc_fails() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) =
        run_ngrag(&config_path, &["query", "q", "--doc", "/nonexistent/file.txt"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read"));
}

#[test]
fn test_openai_without_key_fails() {
    let (_tmp, config_path) = setup_test_env();
    let content = fs::read_to_string(&config_path)
        .unwrap()
        .replace("provider = \"disabled\"", "provider = \"openai\"");
    fs::write(&config_path, content).unwrap();
    let doc = file(&config_path, "carol.txt");

    let (_, stderr, success) = run_ngrag(&config_path, &["query", "q", "--doc", &doc]);
    assert!(!success);
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr={}", stderr);
}

#[test]
fn test_graph_prints_communities() {
    let (_tmp, config_path) = setup_test_env();
    let edges = file(&config_path, "edges.txt");

    let (stdout, stderr, success) = run_ngrag(&config_path, &["graph", &edges]);
    assert!(success, "graph failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("nodes: 4  edges: 2"));
    assert!(stdout.contains("Cluster 0 (level 0): 3 nodes, 2 edges"));
    assert!(stdout.contains("Cluster 1 (level 0): 1 nodes, 0 edges"));
}

#[test]
fn test_invalid_config_rejected() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(
        &config_path,
        "[chunking]\nchunk_token_size = 10\nchunk_overlap_token_size = 10\n",
    )
    .unwrap();
    let edges = file(&config_path, "edges.txt");

    let (_, stderr, success) = run_ngrag(&config_path, &["graph", &edges]);
    assert!(!success);
    assert!(stderr.contains("chunk_overlap_token_size"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let edges = tmp.path().join("edges.txt");
    fs::write(&edges, "a b\n").unwrap();

    let (stdout, stderr, success) = run_ngrag(
        &tmp.path().join("absent.toml"),
        &["graph", edges.to_str().unwrap()],
    );
    assert!(success, "stderr={}", stderr);
    assert!(stdout.contains("Cluster 0"));
}
