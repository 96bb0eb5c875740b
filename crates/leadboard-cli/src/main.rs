// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::{BACKEND_URL_ENV, Config};
use leadboard_app::DashboardState;
use leadboard_client::Client;
use logging::LogTarget;
use runtime::{ClientRuntime, DemoRuntime, SystemOpener};
use std::env;
use std::path::{Path, PathBuf};
use time::UtcOffset;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Must happen while the process is still single-threaded.
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `leadboard --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let filter = logging::build_filter(
        config.log_level(),
        logging::filter_override_from_env().as_deref(),
    )?;
    let log_file = config.log_file();
    logging::init(options.log_target(log_file.as_deref()), filter)?;
    info!(
        config = %options.config_path.display(),
        demo = options.demo,
        sort = config.sort_order().as_str(),
        "starting leadboard"
    );

    let mut state = DashboardState::with_sort_order(config.sort_order());

    if options.demo {
        if options.check_only {
            info!("demo configuration ok");
            return Ok(());
        }
        let mut runtime = DemoRuntime::new(SystemOpener);
        return leadboard_tui::run_app(&mut state, &mut runtime, local_offset);
    }

    let env_base_url = config::backend_url_from_env();
    let client = config
        .client_config(env_base_url.as_deref())
        .and_then(|client_config| Client::new(&client_config))
        .with_context(|| {
            format!(
                "invalid [backend] config in {}; fix base_url/timeout or {BACKEND_URL_ENV}",
                options.config_path.display()
            )
        })?;
    if options.check_only {
        info!(
            base_url = client.base_url(),
            timeout_secs = client.timeout().as_secs_f32(),
            "configuration ok"
        );
        return Ok(());
    }

    let mut runtime = ClientRuntime::new(client, SystemOpener);
    leadboard_tui::run_app(&mut state, &mut runtime, local_offset)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

impl CliOptions {
    fn with_config_path(config_path: PathBuf) -> Self {
        Self {
            config_path,
            print_config_path: false,
            demo: false,
            print_example: false,
            check_only: false,
            show_help: false,
        }
    }

    /// `--check` logs to stderr; the dashboard only logs when a file is set.
    fn log_target<'a>(&self, log_file: Option<&'a Path>) -> LogTarget<'a> {
        match log_file {
            _ if self.check_only => LogTarget::Stderr,
            Some(path) => LogTarget::File(path),
            None => LogTarget::Disabled,
        }
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions::with_config_path(default_config_path);
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let flag = match arg.as_ref() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(path.as_ref());
                continue;
            }
            "--print-config-path" => &mut options.print_config_path,
            "--print-example-config" => &mut options.print_example,
            "--demo" => &mut options.demo,
            "--check" => &mut options.check_only,
            "--help" | "-h" => &mut options.show_help,
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options")
            }
        };
        *flag = true;
    }
    Ok(options)
}

fn print_help() {
    println!("leadboard: lead scoring dashboard");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Browse built-in demo leads without a backend");
    println!("  --check                  Validate config and backend settings, then exit");
    println!("  --help                   Show this help");
    println!();
    println!("environment:");
    println!("  {BACKEND_URL_ENV}    Backend URL when [backend].base_url is unset");
    println!("  {}    Config file path", config::CONFIG_PATH_ENV);
    println!("  {}             Log filter, overrides [log].level", logging::LOG_ENV);
}
