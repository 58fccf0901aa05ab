use libtest_mimic::{Arguments, Failed, Trial};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::{env, fs, io};
use walkdir::WalkDir;

/// The backends that every IR document is compiled with.
const BACKENDS: &[&str] = &["cpp", "java"];

fn main() {
    let args = Arguments::from_args();

    std::env::set_current_dir("..").unwrap();

    let tests = find_ir_files("tests/ir")
        .flat_map(|path| {
            BACKENDS
                .iter()
                .map(move |backend| extract_compile_test(path.clone(), *backend))
        })
        .collect();

    libtest_mimic::run(&args, tests).exit();
}

struct TestFailure {
    name: &'static str,
    details: Vec<(&'static str, String)>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "kebab-case")]
struct SnapshotData {
    stdout: String,
    stderr: String,
}

#[derive(Debug)]
struct Snapshot {
    path: PathBuf,
    expected: Option<SnapshotData>,
    actual: SnapshotData,
}

#[derive(Eq, PartialEq, Debug)]
enum SnapshotOutcome {
    Equal,
    Different,
    Missing,
}

/// Recursively walk over IR documents under a file path.
fn find_ir_files(root: impl AsRef<Path>) -> impl Iterator<Item = PathBuf> {
    let mut paths = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| matches!(entry.path().extension(), Some(ext) if ext == "json"))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    paths.sort();
    paths.into_iter()
}

fn extract_compile_test(input_file: PathBuf, backend: &'static str) -> Trial {
    let name = format!("{} [{backend}]", input_file.display());
    Trial::test(name, move || run_test(&input_file, backend))
}

fn run_test(input_file: &Path, backend: &str) -> Result<(), Failed> {
    let update_snapshots = env::var_os("DAFFODIL_CODEGEN_UPDATE_SNAP").is_some();

    let failures = match run_compile(input_file, backend, update_snapshots) {
        Ok(failures) => failures,
        Err(error) => vec![TestFailure {
            name: "unexpected test command error",
            details: vec![("std::io::Error", error.to_string())],
        }],
    };

    failures_to_result(&failures)
}

fn failures_to_result(failures: &[TestFailure]) -> Result<(), Failed> {
    if failures.is_empty() {
        return Ok(());
    }

    let mut msg = String::new();

    writeln!(msg).unwrap();
    for failure in failures {
        writeln!(msg, "    {}:", failure.name).unwrap();
        for (name, data) in &failure.details {
            writeln!(msg, "        ---- {name} ----").unwrap();
            for line in data.lines() {
                writeln!(msg, "        {line}").unwrap();
            }
        }
        writeln!(msg).unwrap();
    }
    writeln!(msg).unwrap();
    writeln!(msg, "    failures:").unwrap();
    for failure in failures {
        writeln!(msg, "        {}", failure.name).unwrap();
    }

    Err(Failed::from(msg))
}

fn run_compile(
    input_file: &Path,
    backend: &str,
    update_snapshots: bool,
) -> Result<Vec<TestFailure>, io::Error> {
    let mut failures = Vec::new();

    let mut exe = process::Command::new(env!("CARGO_BIN_EXE_daffodil-codegen"));
    exe.args(["compile", "--backend", backend]);
    exe.arg(input_file);

    let output = exe.output()?;
    let mut snapshot = Snapshot::new(backend, input_file, &output)?;

    // Update if requested
    if update_snapshots && snapshot.outcome() != SnapshotOutcome::Equal {
        snapshot.update()?;
    }

    match snapshot.outcome() {
        SnapshotOutcome::Equal => {}
        SnapshotOutcome::Different => {
            let mut details = vec![("path", snapshot.path.to_string_lossy().into_owned())];
            if let Some(diff) = snapshot.stdout_diff() {
                details.push(("stdout diff", diff));
            }
            if let Some(diff) = snapshot.stderr_diff() {
                details.push(("stderr diff", diff));
            }

            failures.push(TestFailure {
                name: "snapshot mismatch",
                details,
            });
        }
        SnapshotOutcome::Missing => {
            let mut details = vec![("path", snapshot.path.to_string_lossy().into_owned())];
            if !snapshot.stdout().is_empty() {
                details.push(("stdout", snapshot.stdout().to_owned()));
            }
            if !snapshot.stderr().is_empty() {
                details.push(("stderr", snapshot.stderr().to_owned()));
            }

            failures.push(TestFailure {
                name: "snapshot missing",
                details,
            });
        }
    }

    if !output.status.success() {
        let mut details = vec![
            ("command", format!("{exe:?}")),
            ("status", output.status.to_string()),
        ];
        if !snapshot.stderr().is_empty() {
            details.push(("stderr", snapshot.stderr().to_owned()));
        }
        failures.push(TestFailure {
            name: "unexpected command output",
            details,
        });
    }

    Ok(failures)
}

impl Snapshot {
    fn new(backend: &str, input_file: &Path, output: &process::Output) -> io::Result<Snapshot> {
        let stem = input_file.file_stem().unwrap_or_default();
        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(backend);
        file_name.push(".snap");

        let path = input_file.with_file_name(file_name);
        let actual = SnapshotData {
            stdout: String::from_utf8_lossy(&output.stdout).into(),
            stderr: String::from_utf8_lossy(&output.stderr).into(),
        };
        let expected = match fs::read_to_string(&path) {
            Ok(snap) => toml::from_str(&snap)
                .map(Some)
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?,
            // Snapshot is missing and needs to be generated
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };

        Ok(Snapshot {
            path,
            expected,
            actual,
        })
    }

    fn stdout(&self) -> &str {
        &self.actual.stdout
    }

    fn stderr(&self) -> &str {
        &self.actual.stderr
    }

    fn update(&mut self) -> io::Result<()> {
        let serialised = toml::to_string_pretty(&self.actual)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        fs::write(&self.path, serialised)?;
        self.expected = Some(self.actual.clone());
        Ok(())
    }

    fn outcome(&self) -> SnapshotOutcome {
        match &self.expected {
            Some(expected) if expected == &self.actual => SnapshotOutcome::Equal,
            Some(_) => SnapshotOutcome::Different,
            None => SnapshotOutcome::Missing,
        }
    }

    fn stdout_diff(&self) -> Option<String> {
        let expected = self.expected.as_ref()?;
        make_diff(&self.actual.stdout, &expected.stdout)
    }

    fn stderr_diff(&self) -> Option<String> {
        let expected = self.expected.as_ref()?;
        make_diff(&self.actual.stderr, &expected.stderr)
    }
}

fn make_diff(actual: &str, expected: &str) -> Option<String> {
    let mut diff = String::new();
    let mut left_line_number = 0;
    let mut right_line_number = 0;
    let line_width = (actual.lines().count().max(expected.lines().count()) as f32)
        .log10()
        .ceil() as usize;
    for result in diff::lines(expected, actual) {
        match result {
            diff::Result::Left(l) => {
                left_line_number += 1;
                diff.push_str(&diff_line('-', left_line_number, line_width, l));
            }
            diff::Result::Both(_, _) => {
                left_line_number += 1;
                right_line_number += 1;
            }
            diff::Result::Right(r) => {
                right_line_number += 1;
                diff.push_str(&diff_line('+', right_line_number, line_width, r));
            }
        }
    }
    match diff.is_empty() {
        true => None,
        false => Some(diff),
    }
}

fn diff_line(sign: char, line_number: usize, line_width: usize, line: &str) -> String {
    format!("{line_number:>line_width$}| {sign} {line}\n")
}
