//! `parameter_config.txt` parsing.
//!
//! The format is a flat `key = value` file: `#` starts a comment, list options
//! may repeat their key or list several values separated by whitespace or
//! commas on one line. Folder lists take one path per line, so paths may
//! contain spaces.

use pcbench_codec::ColorCodingType;
use pcbench_eval::{DEFAULT_EXPAND_FACTOR, SweepGrid};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: expected 'key = value'")]
    Syntax { path: PathBuf, line: usize },

    #[error("{path}:{line}: unknown option '{key}'")]
    UnknownKey {
        path: PathBuf,
        line: usize,
        key: String,
    },

    #[error("{path}:{line}: invalid value '{value}' for '{key}'")]
    InvalidValue {
        path: PathBuf,
        line: usize,
        key: &'static str,
        value: String,
    },

    #[error("{path}: option '{key}' takes exactly one value")]
    NotScalar { path: PathBuf, key: &'static str },

    #[error("{path}: missing required option '{key}'")]
    Missing { path: PathBuf, key: &'static str },
}

const LIST_KEYS: [&str; 4] = [
    "mesh_file_folders",
    "octree_bit_settings",
    "color_bit_settings",
    "color_coding_types",
];

/// List options whose values are paths: one value per line, never split.
const PATH_LIST_KEYS: [&str; 1] = ["mesh_file_folders"];

const SCALAR_KEYS: [&str; 7] = [
    "enh_bit_settings",
    "keep_centroid",
    "bb_expand_factor",
    "output_csv_file",
    "artifact_dir",
    "bounding_box_log",
    "workers",
];

/// Settings of one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub mesh_file_folders: Vec<PathBuf>,
    pub octree_bit_settings: Vec<u8>,
    pub color_bit_settings: Vec<u8>,
    pub enh_bit_settings: u8,
    pub color_coding_types: Vec<ColorCodingType>,
    pub keep_centroid: bool,
    pub bb_expand_factor: f32,
    pub output_csv_file: PathBuf,
    pub artifact_dir: PathBuf,
    pub bounding_box_log: PathBuf,
    pub workers: usize,
}

/// Raw values with the line each came from.
struct RawValues<'a> {
    path: &'a Path,
    values: HashMap<&'static str, Vec<(usize, String)>>,
}

impl RawValues<'_> {
    fn list<T: FromStr>(&self, key: &'static str) -> Result<Option<Vec<T>>, ConfigError> {
        let Some(entries) = self.values.get(key) else {
            return Ok(None);
        };
        entries
            .iter()
            .map(|(line, value)| {
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    path: self.path.to_path_buf(),
                    line: *line,
                    key,
                    value: value.clone(),
                })
            })
            .collect::<Result<Vec<T>, _>>()
            .map(Some)
    }

    fn required_list<T: FromStr>(&self, key: &'static str) -> Result<Vec<T>, ConfigError> {
        self.list(key)?.ok_or_else(|| ConfigError::Missing {
            path: self.path.to_path_buf(),
            key,
        })
    }

    fn scalar<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.list(key)? {
            None => Ok(None),
            Some(values) if values.len() == 1 => Ok(values.into_iter().next()),
            Some(_) => Err(ConfigError::NotScalar {
                path: self.path.to_path_buf(),
                key,
            }),
        }
    }

    fn line_of(&self, key: &'static str) -> usize {
        self.values
            .get(key)
            .and_then(|entries| entries.first())
            .map(|(line, _)| *line)
            .unwrap_or(0)
    }
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse config text; `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut values: HashMap<&'static str, Vec<(usize, String)>> = HashMap::new();

        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let Some((key, value)) = content.split_once('=') else {
                return Err(ConfigError::Syntax {
                    path: path.to_path_buf(),
                    line,
                });
            };
            let key = key.trim();
            let Some(known) = LIST_KEYS
                .iter()
                .chain(SCALAR_KEYS.iter())
                .find(|k| **k == key)
            else {
                return Err(ConfigError::UnknownKey {
                    path: path.to_path_buf(),
                    line,
                    key: key.to_string(),
                });
            };

            let entries = values.entry(*known).or_default();
            let value = value.trim();
            if !LIST_KEYS.contains(known) {
                entries.push((line, value.to_string()));
            } else if PATH_LIST_KEYS.contains(known) {
                if !value.is_empty() {
                    entries.push((line, value.to_string()));
                }
            } else {
                entries.extend(
                    value
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|v| !v.is_empty())
                        .map(|v| (line, v.to_string())),
                );
            }
        }

        let raw = RawValues { path, values };

        let octree_bit_settings = raw.required_list("octree_bit_settings")?;
        let color_bit_settings = raw.required_list("color_bit_settings")?;
        let coding_codes: Vec<i64> = raw.required_list("color_coding_types")?;
        let color_coding_types = coding_codes
            .into_iter()
            .map(|code| {
                ColorCodingType::try_from(code).map_err(|_| ConfigError::InvalidValue {
                    path: path.to_path_buf(),
                    line: raw.line_of("color_coding_types"),
                    key: "color_coding_types",
                    value: code.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let enh_bit_settings = raw
            .scalar("enh_bit_settings")?
            .ok_or_else(|| ConfigError::Missing {
                path: path.to_path_buf(),
                key: "enh_bit_settings",
            })?;

        let bb_expand_factor: f32 = raw
            .scalar("bb_expand_factor")?
            .unwrap_or(DEFAULT_EXPAND_FACTOR);
        if !bb_expand_factor.is_finite() || bb_expand_factor < 0.0 {
            return Err(ConfigError::InvalidValue {
                path: path.to_path_buf(),
                line: raw.line_of("bb_expand_factor"),
                key: "bb_expand_factor",
                value: bb_expand_factor.to_string(),
            });
        }

        Ok(Self {
            mesh_file_folders: raw.list("mesh_file_folders")?.unwrap_or_default(),
            octree_bit_settings,
            color_bit_settings,
            enh_bit_settings,
            color_coding_types,
            keep_centroid: raw.scalar::<i64>("keep_centroid")?.unwrap_or(1) != 0,
            bb_expand_factor,
            output_csv_file: raw
                .scalar("output_csv_file")?
                .unwrap_or_else(|| PathBuf::from("bench_out.csv")),
            artifact_dir: raw.scalar("artifact_dir")?.unwrap_or_else(|| PathBuf::from(".")),
            bounding_box_log: raw
                .scalar("bounding_box_log")?
                .unwrap_or_else(|| PathBuf::from("bounding_box_pre_mesh.txt")),
            workers: raw.scalar("workers")?.unwrap_or(1),
        })
    }

    pub fn grid(&self) -> SweepGrid {
        SweepGrid {
            color_coding_types: self.color_coding_types.clone(),
            octree_bits: self.octree_bit_settings.clone(),
            color_bits: self.color_bit_settings.clone(),
            enh_bits: self.enh_bit_settings,
            keep_centroid: self.keep_centroid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "parameter_config.txt";

    fn parse(text: &str) -> Result<BenchConfig, ConfigError> {
        BenchConfig::parse(text, Path::new(PATH))
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            "# sweep settings\n\
             mesh_file_folders = /data/view0\n\
             mesh_file_folders = /data/view1\n\
             octree_bit_settings = 7 9, 11\n\
             color_bit_settings = 4\n\
             color_bit_settings = 8\n\
             enh_bit_settings = 2\n\
             color_coding_types = 0 1\n\
             keep_centroid = 0\n\
             bb_expand_factor = 0.1  # tighter box\n\
             output_csv_file = results.csv\n",
        )
        .unwrap();

        assert_eq!(
            config.mesh_file_folders,
            vec![PathBuf::from("/data/view0"), PathBuf::from("/data/view1")]
        );
        assert_eq!(config.octree_bit_settings, vec![7, 9, 11]);
        assert_eq!(config.color_bit_settings, vec![4, 8]);
        assert_eq!(config.enh_bit_settings, 2);
        assert_eq!(
            config.color_coding_types,
            vec![ColorCodingType::Native, ColorCodingType::ImageBased]
        );
        assert!(!config.keep_centroid);
        assert_eq!(config.bb_expand_factor, 0.1);
        assert_eq!(config.output_csv_file, PathBuf::from("results.csv"));
        assert_eq!(config.grid().len(), 3 * 2 * 2);
    }

    #[test]
    fn test_folder_paths_keep_spaces() {
        let config = parse(
            "mesh_file_folders = /data/view 0\n\
             mesh_file_folders =   /data/view,1  \n\
             octree_bit_settings = 8\n\
             color_bit_settings = 4\n\
             enh_bit_settings = 0\n\
             color_coding_types = 0\n",
        )
        .unwrap();
        assert_eq!(
            config.mesh_file_folders,
            vec![PathBuf::from("/data/view 0"), PathBuf::from("/data/view,1")]
        );
    }

    #[test]
    fn test_defaults() {
        let config = parse(
            "octree_bit_settings=8\ncolor_bit_settings=4\nenh_bit_settings=0\ncolor_coding_types=0\n",
        )
        .unwrap();
        assert!(config.keep_centroid);
        assert_eq!(config.bb_expand_factor, 0.15);
        assert_eq!(config.output_csv_file, PathBuf::from("bench_out.csv"));
        assert_eq!(config.artifact_dir, PathBuf::from("."));
        assert_eq!(
            config.bounding_box_log,
            PathBuf::from("bounding_box_pre_mesh.txt")
        );
        assert_eq!(config.workers, 1);
        assert!(config.mesh_file_folders.is_empty());
    }

    #[test]
    fn test_missing_required_option() {
        let err = parse("octree_bit_settings=8\ncolor_bit_settings=4\ncolor_coding_types=0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                key: "enh_bit_settings",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(matches!(
            parse("octree_bit_settings 8\n"),
            Err(ConfigError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            parse("\nfoo = 1\n"),
            Err(ConfigError::UnknownKey { line: 2, .. })
        ));
        assert!(matches!(
            parse("octree_bit_settings = eight\n"),
            Err(ConfigError::InvalidValue {
                key: "octree_bit_settings",
                ..
            })
        ));
        assert!(matches!(
            parse(
                "octree_bit_settings=8\ncolor_bit_settings=4\nenh_bit_settings=1\nenh_bit_settings=2\ncolor_coding_types=0\n"
            ),
            Err(ConfigError::NotScalar { .. })
        ));
        assert!(matches!(
            parse(
                "octree_bit_settings=8\ncolor_bit_settings=4\nenh_bit_settings=1\ncolor_coding_types=0 5\n"
            ),
            Err(ConfigError::InvalidValue {
                key: "color_coding_types",
                ..
            })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            BenchConfig::load(Path::new("/nonexistent/parameter_config.txt")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
