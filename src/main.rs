//! `speech-recognizer` command-line tool.
//!
//! ```text
//! speech-recognizer check [MODEL_DIR]   validate a model and print the decoder configuration
//! speech-recognizer devices             list capture devices
//! speech-recognizer settings [--write]  print the settings (optionally write them out)
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use speech_recognizer::audio::CpalBackend;
use speech_recognizer::config::{AppPaths, RecognizerSettings};
use speech_recognizer::session::ConfigurationBuilder;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a model directory and print the resolved decoder options
    Check {
        /// Model directory (defaults to `model_dir` from the settings)
        model_dir: Option<PathBuf>,

        /// Capture device name written to `-adcdev`
        #[arg(short, long)]
        device: Option<String>,

        /// Do not configure a decoder log file
        #[arg(long)]
        no_log: bool,
    },

    /// List available capture devices
    Devices,

    /// Print the settings path and current values
    Settings {
        /// Write the effective values back, creating the file if needed
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings_path = cli
        .settings
        .unwrap_or_else(|| AppPaths::new().settings_file);
    let settings = RecognizerSettings::load_from(&settings_path)
        .with_context(|| format!("loading {}", settings_path.display()))?;

    match cli.command {
        Commands::Check {
            model_dir,
            device,
            no_log,
        } => {
            let model_dir = model_dir.unwrap_or_else(|| settings.model_dir.clone());
            let device = device.unwrap_or_else(|| settings.input_device.clone());
            let logging = settings.log_to_file && !no_log;

            let config = ConfigurationBuilder::default()
                .build(&model_dir, &device, logging)
                .with_context(|| format!("checking {}", model_dir.display()))?;

            log::info!("model {} is usable", model_dir.display());
            for (name, value) in config.iter() {
                println!("{name:<16} {value}");
            }
        }

        Commands::Devices => {
            let names = CpalBackend::new().input_device_names()?;
            if names.is_empty() {
                log::warn!("no capture devices found");
            }
            for name in names {
                println!("{name}");
            }
        }

        Commands::Settings { write } => {
            if write {
                settings
                    .save_to(&settings_path)
                    .with_context(|| format!("writing {}", settings_path.display()))?;
                log::info!("settings written to {}", settings_path.display());
            }
            println!("# {}", settings_path.display());
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
