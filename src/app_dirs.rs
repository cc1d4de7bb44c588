use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("quizr"),
            )
        } else {
            ProjectDirs::from("", "", "quizr").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn selections_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("selections.json"))
    }

    pub fn wrong_answers_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("wrong_answers.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("quizr.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "quizr").map(|pd| pd.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_paths_share_a_directory() {
        // Both stores and the log live side by side so a learner can wipe
        // state in one place.
        if let (Some(sel), Some(wrong), Some(log)) = (
            AppDirs::selections_path(),
            AppDirs::wrong_answers_path(),
            AppDirs::log_path(),
        ) {
            assert_eq!(sel.parent(), wrong.parent());
            assert_eq!(sel.parent(), log.parent());
            assert_eq!(sel.file_name().unwrap(), "selections.json");
            assert_eq!(wrong.file_name().unwrap(), "wrong_answers.json");
        }
    }
}
