use serde::{Deserialize, Serialize};

/// Application configuration from `Banana Grid.yaml`.
///
/// Every field has a default so a missing or partial file still yields a usable config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub solver: SolverSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
}

/// How to launch the external computation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Executable speaking the line protocol on stdin/stdout.
    pub command: String,

    /// Extra arguments passed to the executable.
    pub args: Vec<String>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            command: "banana-solver".to_string(),
            args: Vec::new(),
        }
    }
}

/// Grid layout and frame pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub cell_size: f32,
    pub offset_x: f32,
    pub offset_y: f32,

    /// Frames per second while a job is in flight.
    pub running_fps: u32,

    /// Frames per second once the job has ended.
    pub idle_fps: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            cell_size: 50.0,
            offset_x: 30.0,
            offset_y: 60.0,
            running_fps: 60,
            idle_fps: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub debug: bool,
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            debug: false,
            console: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_defaults() {
        let display = DisplaySettings::default();
        assert_eq!(display.cell_size, 50.0);
        assert_eq!(display.offset_x, 30.0);
        assert_eq!(display.offset_y, 60.0);
        assert_eq!(display.running_fps, 60);
        assert_eq!(display.idle_fps, 5);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "solver:\n  command: /opt/solver\n";
        let config: AppConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(config.solver.command, "/opt/solver");
        assert!(config.solver.args.is_empty());
        assert_eq!(config.display, DisplaySettings::default());
        assert_eq!(config.logging.directory, "logs");
    }
}
