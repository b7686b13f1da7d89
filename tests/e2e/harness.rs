use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Environment variable the stub scripts append their invocations to.
pub const TRACE_VAR: &str = "COCO_ITEST_TRACE";

#[derive(Clone)]
pub struct TestContext {
    pub bin_path: PathBuf,
    pub tmp_root: PathBuf,
}

/// A throwaway directory that may or may not look like a Coco checkout.
pub struct TestEnv {
    pub root: PathBuf,
    pub trace: PathBuf,
    pub service_log: PathBuf,
}

pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Options for one invocation of the binary.
#[derive(Default)]
pub struct RunOptions<'a> {
    pub env: Vec<(&'a str, &'a str)>,
    pub env_remove: Vec<&'a str>,
}

impl TestContext {
    pub fn new() -> Result<Self, String> {
        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_coco-itest"));
        if !bin_path.exists() {
            return Err(format!("binary not found at {}", bin_path.display()));
        }

        let tmp_root = std::env::temp_dir().join("coco-itest-e2e");
        fs::create_dir_all(&tmp_root).map_err(|e| format!("Failed to create temp root: {}", e))?;

        Ok(Self { bin_path, tmp_root })
    }

    /// An empty directory; not a project root.
    pub fn create_env(&self, name: &str) -> Result<TestEnv, String> {
        let dir = self.unique_temp_dir(name)?;
        let root = dir.join("coco");
        ensure_dir(&root)?;
        Ok(TestEnv {
            root,
            trace: dir.join("trace.log"),
            service_log: dir.join("easysearch.log"),
        })
    }

    /// A project root with stub service scripts, a stub loadgen and the
    /// given scenario files.
    pub fn create_project(&self, name: &str, scenarios: &[&str]) -> Result<TestEnv, String> {
        let env = self.create_env(name)?;
        let root = &env.root;

        for file in ["README.md", "LICENSE", "main.go", "coco.yml", "tests/loadgen.yml"] {
            write_file(&root.join(file), "")?;
        }
        ensure_dir(&root.join("tests/assets"))?;

        write_file(&root.join("tests/assets/stop_coco.sh"), &trace_script("stop"))?;
        write_file(
            &root.join("tests/assets/reset_coco_indices.sh"),
            &trace_script("reset"),
        )?;
        write_file(&root.join("tests/assets/start_coco.sh"), &trace_script("start"))?;
        write_file(
            &root.join("tests/assets/fake_loadgen.sh"),
            &format!(
                "echo \"loadgen $*\" >> \"${}\"\ncase \"$4\" in\n  *fail*) echo \"scenario $4 failed\" >&2; exit 3 ;;\nesac\n",
                TRACE_VAR
            ),
        )?;

        let config = serde_json::json!({
            "loadgen": ["sh", "./tests/assets/fake_loadgen.sh"],
            "stop": ["sh", "./tests/assets/stop_coco.sh"],
            "reset": ["sh", "./tests/assets/reset_coco_indices.sh"],
            "start": ["sh", "./tests/assets/start_coco.sh"],
            "service_log": env.service_log,
        });
        write_file(&root.join("tests/itest.json"), &config.to_string())?;

        for scenario in scenarios {
            write_file(&root.join(scenario), "GET /\n")?;
        }

        Ok(env)
    }

    fn unique_temp_dir(&self, name: &str) -> Result<PathBuf, String> {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| e.to_string())?
            .as_nanos();
        let dir = self
            .tmp_root
            .join(format!("{}-{}-{}", name, nanos, counter));
        fs::create_dir_all(&dir).map_err(|e| format!("Failed to create temp dir: {}", e))?;
        Ok(dir)
    }

    pub fn run_itest(
        &self,
        env: &TestEnv,
        args: &[&str],
        options: &RunOptions<'_>,
    ) -> Result<CommandOutput, String> {
        if std::env::var("COCO_ITEST_E2E_LOG").is_ok() {
            eprintln!("command: {:?} {:?} (cwd: {})", self.bin_path, args, env.root.display());
        }

        let mut command = Command::new(&self.bin_path);
        command
            .args(args)
            .current_dir(&env.root)
            .env(TRACE_VAR, &env.trace)
            .env_remove("GITHUB_ACTIONS")
            .env_remove("RUST_LOG");
        for key in &options.env_remove {
            command.env_remove(key);
        }
        for (key, value) in &options.env {
            command.env(key, value);
        }

        let output = command
            .output()
            .map_err(|e| format!("Failed to run command: {}", e))?;
        Ok(CommandOutput::from_output(output))
    }
}

impl TestEnv {
    /// Lines the stub scripts recorded, empty if nothing ran.
    pub fn trace_lines(&self) -> Result<Vec<String>, String> {
        if !self.trace.exists() {
            return Ok(Vec::new());
        }
        Ok(read_file(&self.trace)?
            .lines()
            .map(str::to_string)
            .collect())
    }
}

fn trace_script(name: &str) -> String {
    format!("echo {} >> \"${}\"\n", name, TRACE_VAR)
}

impl CommandOutput {
    pub fn from_output(output: Output) -> Self {
        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Self {
            status,
            stdout,
            stderr,
        }
    }

    /// Only the tagged orchestration lines.
    pub fn tagged_lines(&self) -> Vec<&str> {
        self.stdout
            .lines()
            .filter(|line| line.starts_with("COCO_TEST_INFO: "))
            .collect()
    }

    pub fn assert_status(&self, expected: i32) -> Result<(), String> {
        if self.status == expected {
            Ok(())
        } else {
            Err(format!(
                "Expected exit {}, got {}.\nstdout: {}\nstderr: {}",
                expected, self.status, self.stdout, self.stderr
            ))
        }
    }

    pub fn assert_stdout_contains(&self, needle: &str) -> Result<(), String> {
        if self.stdout.contains(needle) {
            Ok(())
        } else {
            Err(format!(
                "Expected stdout to contain '{}'.\nstdout: {}",
                needle, self.stdout
            ))
        }
    }

    pub fn assert_stdout_not_contains(&self, needle: &str) -> Result<(), String> {
        if !self.stdout.contains(needle) {
            Ok(())
        } else {
            Err(format!(
                "Expected stdout to not contain '{}'.\nstdout: {}",
                needle, self.stdout
            ))
        }
    }
}

pub fn write_file(path: &Path, content: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create parent dirs: {}", e))?;
    }
    fs::write(path, content).map_err(|e| format!("Failed to write file: {}", e))
}

pub fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path).map_err(|e| format!("Failed to create dir: {}", e))
}

/// Compare two line lists, reporting both on mismatch.
pub fn expect_lines<A: AsRef<str>, B: AsRef<str>>(
    what: &str,
    actual: &[A],
    expected: &[B],
) -> Result<(), String> {
    let actual: Vec<&str> = actual.iter().map(AsRef::as_ref).collect();
    let expected: Vec<&str> = expected.iter().map(AsRef::as_ref).collect();
    if actual == expected {
        Ok(())
    } else {
        Err(format!(
            "{} mismatch.\nexpected: {:#?}\nactual: {:#?}",
            what, expected, actual
        ))
    }
}
