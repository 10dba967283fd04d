use dirs::home_dir;
use std::path::PathBuf;

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "MUXY_FORMULA_HOME";

/// Returns the home directory, or None if the user's home cannot be resolved.
pub fn try_formula_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(HOME_ENV) {
        if !val.is_empty() {
            return Some(PathBuf::from(val));
        }
    }
    home_dir().map(|h| h.join(".muxy-formula"))
}

/// Returns the home directory (`~/.muxy-formula`).
///
/// # Errors
///
/// Fails if neither `MUXY_FORMULA_HOME` is set nor the user's home
/// directory can be resolved.
pub fn formula_home() -> anyhow::Result<PathBuf> {
    try_formula_home().ok_or_else(|| {
        anyhow::anyhow!("Could not determine home directory. Set {HOME_ENV} to override.")
    })
}

/// Binary installation target: ~/.muxy-formula/bin
pub fn bin_path() -> anyhow::Result<PathBuf> {
    Ok(formula_home()?.join("bin"))
}

/// Verified artifact cache: ~/.muxy-formula/cache
pub fn cache_path() -> anyhow::Result<PathBuf> {
    Ok(formula_home()?.join("cache"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_and_cache_share_the_home() {
        let home = formula_home().unwrap();
        assert_eq!(bin_path().unwrap(), home.join("bin"));
        assert_eq!(cache_path().unwrap(), home.join("cache"));
    }
}
