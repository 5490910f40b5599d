use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub steiner: SteinerConfig,
    #[serde(default)]
    pub input: InputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steiner: SteinerConfig::default(),
            input: InputConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SteinerConfig {
    /// Weight in [0, 1] trading total wirelength (0) against
    /// source-to-sink path length (1).
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_flip_move_limit")]
    pub flip_move_limit: usize,
}

impl Default for SteinerConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            flip_move_limit: default_flip_move_limit(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_pins_file")]
    pub pins_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    /// Directory for per-net SVG dumps; empty disables them.
    #[serde(default = "default_svg_dir")]
    pub svg_dir: String,
    #[serde(default = "default_grid_width")]
    pub grid_width: i16,
    #[serde(default = "default_grid_height")]
    pub grid_height: i16,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pins_file: default_pins_file(),
            output_file: default_output_file(),
            svg_dir: default_svg_dir(),
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
        }
    }
}

fn default_alpha() -> f32 {
    0.5
}

fn default_flip_move_limit() -> usize {
    10_000
}

fn default_pins_file() -> String {
    "inputs/nets.pins".to_string()
}

fn default_output_file() -> String {
    "output/trees.txt".to_string()
}

fn default_svg_dir() -> String {
    String::new()
}

fn default_grid_width() -> i16 {
    128
}

fn default_grid_height() -> i16 {
    128
}
