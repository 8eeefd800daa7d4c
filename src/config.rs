use std::path::PathBuf;

use clap::Args;

use crate::delivery::DirectoryDelivery;

/// Settings shared by every command. Flags win over the environment.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Directory that receives extracted and renamed files
    #[arg(
        short,
        long,
        global = true,
        env = "PAGEPICK_OUTPUT_DIR",
        default_value = "extracted"
    )]
    pub output_dir: PathBuf,

    /// Default log filter; RUST_LOG takes precedence
    #[arg(long, global = true, env = "PAGEPICK_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn init_logging(&self) {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .init();
    }

    /// Delivery into `dir` if given, else into the configured output directory.
    pub fn delivery(&self, dir: Option<&str>) -> DirectoryDelivery {
        match dir {
            Some(dir) => DirectoryDelivery::new(dir),
            None => DirectoryDelivery::new(&self.output_dir),
        }
    }
}
