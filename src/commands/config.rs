use std::path::PathBuf;

use anyhow::Result;
use jip_calendar_core::config::AppConfig;
use owo_colors::OwoColorize;

/// Print where things live and the effective settings; with any option given,
/// write the changed values back to the config file first.
pub fn run(
    config: &AppConfig,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
    settings_path: Option<PathBuf>,
) -> Result<()> {
    let config_path = AppConfig::config_path()?;

    let config = match apply(config, api_base_url, timeout_secs, settings_path)? {
        Some(next) => {
            next.save(&config_path)?;
            println!("{}", "Config saved".green());
            next
        }
        None => config.clone(),
    };

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Settings:   {}", config.settings_path().display());
    println!("{}", "Backend".bold());
    println!("  API:        {}", config.api_base_url);
    println!("  Timeout:    {}s", config.request_timeout_secs);

    Ok(())
}

/// The updated config, or None when nothing was given.
fn apply(
    config: &AppConfig,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
    settings_path: Option<PathBuf>,
) -> Result<Option<AppConfig>> {
    if api_base_url.is_none() && timeout_secs.is_none() && settings_path.is_none() {
        return Ok(None);
    }

    let mut next = config.clone();
    if let Some(url) = api_base_url {
        next.api_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = timeout_secs {
        if secs == 0 {
            anyhow::bail!("Timeout must be at least 1 second");
        }
        next.request_timeout_secs = secs;
    }
    if let Some(path) = settings_path {
        next.settings_path = path;
    }
    Ok(Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_given_leaves_config_alone() {
        assert!(apply(&AppConfig::default(), None, None, None).unwrap().is_none());
    }

    #[test]
    fn given_values_replace_current_ones() {
        let next = apply(
            &AppConfig::default(),
            Some("https://jip.example.go.id/api/".into()),
            Some(30),
            None,
        )
        .unwrap()
        .unwrap();

        assert_eq!(next.api_base_url, "https://jip.example.go.id/api");
        assert_eq!(next.request_timeout_secs, 30);
        assert_eq!(next.settings_path, AppConfig::default().settings_path);
    }

    #[test]
    fn zero_timeout_is_refused() {
        assert!(apply(&AppConfig::default(), None, Some(0), None).is_err());
    }
}
