#[macro_use]
extern crate log;

use std::{path::PathBuf, str::FromStr};

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use openimu::{
    MomentSettings, list_windows, read_recording, rolling_median_rows, summarize,
    algos::Moment,
    types::{Stream, WindowConfig},
};
use serde::Serialize;

#[derive(Parser)]
pub struct OpenImuCli {
    /// JSON recording with `time`, `accel` and optional `gyro`/`temperature`
    #[arg(env = "OPENIMU_INPUT", long)]
    pub input: PathBuf,
    #[clap(subcommand)]
    pub subcommand: OpenImuCommand,
}

#[derive(Args)]
pub struct WindowArgs {
    /// Hours of the day at which windows start, comma separated
    #[arg(long = "base", env = "OPENIMU_BASES", value_delimiter = ',')]
    pub bases: Option<Vec<u32>>,
    /// Window length in hours for each base, comma separated
    #[arg(long = "period", env = "OPENIMU_PERIODS", value_delimiter = ',')]
    pub periods: Option<Vec<u32>>,
}

impl WindowArgs {
    fn config(&self) -> anyhow::Result<WindowConfig> {
        Ok(WindowConfig::new(
            self.bases.as_deref(),
            self.periods.as_deref(),
        )?)
    }
}

#[derive(Subcommand)]
pub enum OpenImuCommand {
    ///
    /// List the day windows of the recording for every base/period pair
    ///
    Windows {
        #[command(flatten)]
        window: WindowArgs,
    },
    ///
    /// Rolling moments of a stream, per day window when windowing is set
    ///
    Moments {
        #[command(flatten)]
        window: WindowArgs,
        /// Samples per rolling window
        #[arg(long, env = "OPENIMU_W_LEN")]
        w_len: usize,
        /// Samples between the starts of consecutive windows
        #[arg(long, env = "OPENIMU_SKIP", default_value_t = 1)]
        skip: usize,
        /// Highest moment to compute, lower ones are included
        #[arg(long, env = "OPENIMU_MOMENT", default_value = "kurtosis")]
        moment: MomentArg,
        #[arg(long, env = "OPENIMU_STREAM", default_value = "accel")]
        stream: StreamArg,
    },
    ///
    /// Centered rolling median of a stream
    ///
    Median {
        #[arg(long, env = "OPENIMU_W_LEN")]
        w_len: usize,
        #[arg(long, env = "OPENIMU_STREAM", default_value = "accel")]
        stream: StreamArg,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(error) = dotenv() {
        eprintln!("{}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = OpenImuCli::parse();
    let recording = read_recording(&cli.input)?;

    match cli.subcommand {
        OpenImuCommand::Windows { window } => {
            let config = window.config()?;
            if !config.is_windowed() {
                warn!("No base/period pairs given, nothing to list");
            }
            print_json(&list_windows(&recording, &config)?)
        }
        OpenImuCommand::Moments {
            window,
            w_len,
            skip,
            moment,
            stream,
        } => {
            let settings = MomentSettings {
                stream: stream.0,
                w_len,
                skip,
                moment: moment.0,
            };
            let summaries = summarize(&recording, &window.config()?, settings)?;
            info!("Computed moments for {} windows", summaries.len());
            print_json(&summaries)
        }
        OpenImuCommand::Median { w_len, stream } => {
            print_json(&rolling_median_rows(&recording, stream.0, w_len)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Clone, Copy)]
pub struct MomentArg(Moment);

impl FromStr for MomentArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Self(Moment::Mean)),
            "sd" | "std" | "stdev" => Ok(Self(Moment::StdDev)),
            "skew" | "skewness" => Ok(Self(Moment::Skewness)),
            "kurt" | "kurtosis" => Ok(Self(Moment::Kurtosis)),
            _ => Err(anyhow!("Invalid moment `{}`", s)),
        }
    }
}

#[derive(Clone, Copy)]
pub struct StreamArg(Stream);

impl FromStr for StreamArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accel" | "acc" => Ok(Self(Stream::Accel)),
            "gyro" | "gyr" => Ok(Self(Stream::Gyro)),
            "temperature" | "temp" => Ok(Self(Stream::Temperature)),
            _ => Err(anyhow!("Invalid stream `{}`", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;
    use clap::CommandFactory;

    #[test]
    fn every_option_reads_the_environment() {
        let cli = OpenImuCli::command();
        for sub in cli.get_subcommands() {
            for arg in sub.get_arguments().filter(|a| a.get_id() != "help") {
                assert!(
                    arg.get_env().is_some(),
                    "{} --{} has no env",
                    sub.get_name(),
                    arg.get_id()
                );
            }
        }

        let moments = cli.find_subcommand("moments").unwrap();
        let env = |id: &str| {
            moments
                .get_arguments()
                .find(|a| a.get_id() == id)
                .and_then(|a| a.get_env())
        };
        assert_eq!(env("moment"), Some(OsStr::new("OPENIMU_MOMENT")));
        assert_eq!(env("stream"), Some(OsStr::new("OPENIMU_STREAM")));
    }

    #[test]
    fn parses_moment_and_stream_names() {
        let cli = OpenImuCli::try_parse_from([
            "openimu", "--input", "rec.json", "moments", "--w-len", "10", "--moment", "sd",
            "--stream", "temp",
        ])
        .unwrap();
        let OpenImuCommand::Moments {
            moment, stream, skip, ..
        } = cli.subcommand
        else {
            panic!("expected the moments subcommand");
        };
        assert_eq!(moment.0, Moment::StdDev);
        assert_eq!(stream.0, Stream::Temperature);
        assert_eq!(skip, 1);

        assert!("median".parse::<MomentArg>().is_err());
    }
}
