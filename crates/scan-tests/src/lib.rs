#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};


/// Reference configuration for a Postgres data source named `sales`.
pub const SALES_CONFIGURATION: &str = r#"data_source sales:
  type: postgres
  host: localhost
  port: "5432"
  username: ${POSTGRES_USER}
  password: ${POSTGRES_PASSWORD}
  database: sales
"#;

/// Checks with a variable reference, resolved through `-v env=...`.
pub const ORDERS_CHECKS: &str = r#"checks for orders_${env}:
  - row_count > 0
  - missing_count(customer_id) = 0
"#;

/// How the fake `soda` executable should behave.
pub struct FakeSoda {
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Option<String>,
    /// JSON written to the path given after `-srf`.
    pub scan_result: Option<String>,
    /// Environment variables echoed to stdout as `NAME=value`.
    pub echo_env: Vec<String>,
}

impl FakeSoda {
    pub fn exiting(exit_code: i32) -> Self {
        Self {
            exit_code,
            stdout: Vec::new(),
            stderr: None,
            scan_result: None,
            echo_env: Vec::new(),
        }
    }

    pub fn stdout(mut self, line: &str) -> Self {
        self.stdout.push(line.to_string());
        self
    }

    pub fn stderr(mut self, text: &str) -> Self {
        self.stderr = Some(text.to_string());
        self
    }

    pub fn scan_result(mut self, json: &str) -> Self {
        self.scan_result = Some(json.to_string());
        self
    }

    pub fn echo_env(mut self, name: &str) -> Self {
        self.echo_env.push(name.to_string());
        self
    }

    /// Writes the script into `dir` and returns its path.
    ///
    /// Every argument is recorded one per line in `args.txt` next to the script.
    #[cfg(unix)]
    pub fn install(&self, dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script_path = dir.join("soda");
        let args_path = args_file(dir);

        let mut script = String::from("#!/bin/sh\n");
        script.push_str(&format!("printf '%s\\n' \"$@\" > '{}'\n", args_path.display()));

        if let Some(json) = &self.scan_result {
            script.push_str("srf=''\nprev=''\nfor arg in \"$@\"; do\n");
            script.push_str("  if [ \"$prev\" = '-srf' ]; then srf=\"$arg\"; fi\n");
            script.push_str("  prev=\"$arg\"\ndone\n");
            script.push_str(&format!(
                "if [ -n \"$srf\" ]; then printf '%s' '{json}' > \"$srf\"; fi\n"
            ));
        }

        for line in &self.stdout {
            script.push_str(&format!("echo '{line}'\n"));
        }
        for name in &self.echo_env {
            script.push_str(&format!("echo \"{name}=${name}\"\n"));
        }
        if let Some(text) = &self.stderr {
            script.push_str(&format!("echo '{text}' >&2\n"));
        }
        script.push_str(&format!("exit {}\n", self.exit_code));

        fs::write(&script_path, script).expect("write fake soda");
        fs::set_permissions(&script_path, fs::Permissions::from_mode(0o755))
            .expect("make fake soda executable");
        script_path
    }
}

pub fn args_file(dir: &Path) -> PathBuf {
    dir.join("args.txt")
}

/// Arguments the fake `soda` received on its last run.
pub fn recorded_args(dir: &Path) -> Vec<String> {
    fs::read_to_string(args_file(dir))
        .expect("read recorded args")
        .lines()
        .map(str::to_string)
        .collect()
}
