//! Allow-list for instance-wide general settings exposed to tools.

use thiserror::Error;

/// General settings keys that may be read or written through the tools.
pub const ALLOWED_GENERAL_SETTINGS_KEYS: &[&str] = &[
    "sparkSettings",
    "containerSettings",
    "defaultK8sClusterId",
    "security",
    "cgroupSettings",
    "maxRunningActivitiesPerJob",
    "maxRunningActivities",
    "maxRunningActivitiesPerKey",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid settings keys: {invalid:?}. Allowed keys are: {allowed:?}", allowed = ALLOWED_GENERAL_SETTINGS_KEYS)]
pub struct InvalidSettingsKeys {
    pub invalid: Vec<String>,
}

/// Reject any key outside [`ALLOWED_GENERAL_SETTINGS_KEYS`], reporting all offenders at once.
pub fn check_settings_keys<'a, I>(keys: I) -> Result<(), InvalidSettingsKeys>
where
    I: IntoIterator<Item = &'a str>,
{
    let invalid: Vec<String> = keys
        .into_iter()
        .filter(|key| !ALLOWED_GENERAL_SETTINGS_KEYS.contains(key))
        .map(str::to_string)
        .collect();
    if invalid.is_empty() { Ok(()) } else { Err(InvalidSettingsKeys { invalid }) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_keys() {
        assert!(check_settings_keys(["security", "maxRunningActivities"]).is_ok());
        assert!(check_settings_keys(std::iter::empty()).is_ok());
    }

    #[test]
    fn reports_every_invalid_key() {
        let error = check_settings_keys(["security", "ldapSettings", "udr"]).expect_err("invalid");
        assert_eq!(error.invalid, vec!["ldapSettings".to_string(), "udr".to_string()]);
        assert!(error.to_string().contains("\"ldapSettings\""));
        assert!(error.to_string().contains("sparkSettings"));
    }
}
