use clap::{Args, Subcommand};
use scan_config::source::Precedence;
use scan_core::engine::DEFAULT_SODA_PROGRAM;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a Soda scan against a data source
    Run {
        #[command(flatten)]
        scan: ScanArgs,

        #[arg(
            long,
            help = "If specified, writes the JSON outcome to this file instead of stdout"
        )]
        output: Option<PathBuf>,
    },
    /// Resolve sources and print the scan invocation without running it
    Validate {
        #[command(flatten)]
        scan: ScanArgs,

        #[arg(
            long,
            help = "If specified, writes the JSON report to this file instead of stdout"
        )]
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub fn scan_args(&self) -> &ScanArgs {
        match self {
            Commands::Run { scan, .. } | Commands::Validate { scan, .. } => scan,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[arg(long, help = "Data source name, as declared in the configuration")]
    pub data_source: String,

    #[arg(long, help = "Configuration YAML file; inline configuration is written here")]
    pub config_file: Option<PathBuf>,

    #[arg(long, help = "Directory of configuration YAML files")]
    pub config_dir: Option<PathBuf>,

    #[arg(long, help = "Configuration YAML text")]
    pub config_inline: Option<String>,

    #[arg(long, help = "Checks YAML file; inline checks are written here")]
    pub checks_file: Option<PathBuf>,

    #[arg(long, help = "Directory of checks YAML files")]
    pub checks_dir: Option<PathBuf>,

    #[arg(long, help = "Checks YAML text")]
    pub checks_inline: Option<String>,

    #[arg(
        long = "var",
        value_name = "NAME=VALUE",
        value_parser = parse_key_value,
        help = "Variable for the checks; may be repeated"
    )]
    pub vars: Vec<(String, String)>,

    #[arg(long, help = "Verbose engine output and debug logging")]
    pub verbose: bool,

    #[arg(long, help = "Path the engine writes its JSON scan result to")]
    pub result_file: Option<PathBuf>,

    #[arg(
        long,
        requires = "result_file",
        help = "Include the parsed scan result in the outcome"
    )]
    pub parse_result: bool,

    #[arg(
        long = "env",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        help = "Extra environment variable for the engine; may be repeated"
    )]
    pub env: Vec<(String, String)>,

    #[arg(long, help = "Load extra engine environment from a .env file")]
    pub env_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_SODA_PROGRAM, help = "Soda executable")]
    pub soda_bin: PathBuf,

    #[arg(long, help = "Leave the engine's OpenTelemetry reporting enabled")]
    pub keep_telemetry: bool,

    #[arg(
        long,
        default_value = "file,directory,inline",
        help = "Order in which file, directory and inline options win when several are set"
    )]
    pub precedence: Precedence,

    #[command(flatten)]
    pub cloud: CloudArgs,
}

#[derive(Args, Debug)]
pub struct CloudArgs {
    #[arg(long, env = "SODA_CLOUD_HOST", help = "Soda Cloud host")]
    pub soda_cloud_host: Option<String>,

    #[arg(
        long,
        env = "SODA_CLOUD_API_KEY_ID",
        hide_env_values = true,
        help = "Soda Cloud API key id"
    )]
    pub soda_cloud_api_key_id: Option<String>,

    #[arg(
        long,
        env = "SODA_CLOUD_API_KEY_SECRET",
        hide_env_values = true,
        help = "Soda Cloud API key secret"
    )]
    pub soda_cloud_api_key_secret: Option<String>,
}

fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{arg}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing name in '{arg}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
