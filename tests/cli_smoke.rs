use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn bin_path() -> String {
    std::env::var("CARGO_BIN_EXE_webpages").unwrap_or_else(|_| "target/debug/webpages".to_string())
}

fn run(root: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(bin_path())
        .arg("--root")
        .arg(root)
        .arg("--log-level")
        .arg("warn")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn webpages");

    {
        let mut pipe = child.stdin.take().expect("Child stdin should be available");
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes())
                .expect("Failed to write stdin");
        }
    }

    child.wait_with_output().expect("Failed to wait for webpages")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

#[test]
fn cli_smoke() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = dir.path();

    let created = stdout(&run(root, &["new", "about"], None));
    assert_eq!(created.trim(), "about.html");
    assert!(root.join("pages/about.html").is_file());

    let saved = stdout(&run(root, &["write", "about.html"], Some("<p>42</p>")));
    assert!(saved.contains("saved"));

    let listing: Value =
        serde_json::from_str(&stdout(&run(root, &["list", "--json"], None)))
            .expect("listing is JSON");
    let files = listing.as_array().expect("listing is an array");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["path"], "about.html");
    assert_eq!(files[0]["size"], 9);

    let markup = stdout(&run(root, &["highlight", "about.html"], None));
    assert!(markup.contains("<span class=\"tok-tag\">p</span>"));
    assert!(markup.contains("<span class=\"tok-number\">42</span>"));

    stdout(&run(root, &["rm", "about.html"], None));
    assert!(!root.join("pages/about.html").exists());

    let failed = run(root, &["rm", "about.html"], None);
    assert!(!failed.status.success());
}
