use std::path::PathBuf;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_ACCESS_MODE: &str = "user skill";
const DEFAULT_SIM_COURSE: &str = "demo-course";
const DEFAULT_SIM_USER: &str = "learner-1";
const DEFAULT_SIM_ACCURACY: f64 = 0.8;
const DEFAULT_SIM_MAX_STEPS: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Scopes refining per-course parameters, e.g. "user skill"
    pub access_mode: String,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "danci_adapt=debug"
    pub level: String,
    /// Daily rotated log files are written here when set
    pub file_dir: Option<PathBuf>,
}

impl LoggingConfig {
    fn from_env() -> Self {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        let file_logs = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let file_dir = file_logs.then(|| {
            std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
        });

        Self { level, file_dir }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub course_id: String,
    pub user_id: String,
    /// Probability that the simulated learner answers correctly
    pub accuracy: f64,
    pub max_steps: usize,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            course_id: DEFAULT_SIM_COURSE.to_string(),
            user_id: DEFAULT_SIM_USER.to_string(),
            accuracy: DEFAULT_SIM_ACCURACY,
            max_steps: DEFAULT_SIM_MAX_STEPS,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let access_mode = std::env::var("ADAPT_PARAMETER_ACCESS_MODE")
            .unwrap_or_else(|_| DEFAULT_ACCESS_MODE.to_string());

        let mut simulation = SimulationConfig::default();
        if let Ok(val) = std::env::var("ADAPT_SIM_COURSE") {
            if !val.trim().is_empty() {
                simulation.course_id = val;
            }
        }
        if let Ok(val) = std::env::var("ADAPT_SIM_USER") {
            if !val.trim().is_empty() {
                simulation.user_id = val;
            }
        }
        if let Some(accuracy) = std::env::var("ADAPT_SIM_ACCURACY")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| (0.0..=1.0).contains(value))
        {
            simulation.accuracy = accuracy;
        }
        simulation.max_steps = std::env::var("ADAPT_SIM_MAX_STEPS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(DEFAULT_SIM_MAX_STEPS);
        simulation.seed = std::env::var("ADAPT_SIM_SEED")
            .ok()
            .and_then(|value| value.parse::<u64>().ok());

        Self {
            logging: LoggingConfig::from_env(),
            access_mode,
            simulation,
        }
    }
}
