use std::{env, io, path::PathBuf};

use anyhow::Result;

const APPLICATION_NAME: &str = "timelog";

/// Directory for state of the application (default records, logs). It's created if missing.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path =
                PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
            path.push(APPLICATION_NAME);
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .map_err(|_| anyhow::anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?;
            path.push(APPLICATION_NAME);
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

/// Directory where the per user configuration of `tl` lives. Not created.
pub fn user_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        env::var("APPDATA").ok().map(|v| PathBuf::from(v).join("tl"))
    }
    #[cfg(not(windows))]
    {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
            .ok()
            .map(|v| v.join("tl"))
    }
}

/// Expands a leading `~/` into the home directory. Other paths are returned as is.
pub fn expand_home(path: PathBuf) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path;
    };
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(rest),
        Err(_) => path,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::expand_home;

    #[test]
    fn test_expand_home_ignores_plain_paths() {
        assert_eq!(
            expand_home(PathBuf::from("/var/lib/tl")),
            PathBuf::from("/var/lib/tl")
        );
        assert_eq!(expand_home(PathBuf::from("records")), PathBuf::from("records"));
    }

    #[test]
    fn test_expand_home_replaces_tilde() {
        let Ok(home) = std::env::var("HOME") else {
            return;
        };
        assert_eq!(
            expand_home(PathBuf::from("~/timelog")),
            PathBuf::from(home).join("timelog")
        );
    }
}
