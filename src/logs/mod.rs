use tracing::Level;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub verbose: bool,
}

impl LogConfig {
    pub fn level(self) -> Level {
        if self.verbose { Level::INFO } else { Level::WARN }
    }
}

pub fn init(cfg: LogConfig) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(cfg.level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
