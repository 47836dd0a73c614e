use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "OutfitPlaylistConfig.json";
pub const OUTFIT_DIR_NAME: &str = "OutfitPlaylist";
/// Script class the bridge functions are registered on.
pub const SCRIPT_CLASS_NAME: &str = "oplQuestScript";

const PLUGIN_DATA_DIR: [&str; 2] = ["SKSE", "Plugins"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// JSON file holding the ignored-item list.
    pub config_file: PathBuf,
    /// Directory of group files, one `<Group>.json` per group.
    pub outfit_dir: PathBuf,
}

impl PluginConfig {
    /// Default locations under the game's `Data` directory.
    pub fn from_data_dir(data_dir: &Path) -> Self {
        let plugins = PLUGIN_DATA_DIR
            .iter()
            .fold(data_dir.to_path_buf(), |path, part| path.join(part));
        Self {
            config_file: plugins.join(CONFIG_FILE_NAME),
            outfit_dir: plugins.join(OUTFIT_DIR_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::PluginConfig;

    #[test]
    fn data_dir_defaults_match_plugin_layout() {
        let config = PluginConfig::from_data_dir(Path::new("Data"));
        assert_eq!(
            config.config_file,
            Path::new("Data/SKSE/Plugins/OutfitPlaylistConfig.json")
        );
        assert_eq!(
            config.outfit_dir,
            Path::new("Data/SKSE/Plugins/OutfitPlaylist")
        );
    }
}
