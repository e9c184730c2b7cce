//! Console-wide settings derived from the settings store.
//!
//! Built once at startup and shared by reference. Values are re-derived only
//! through [`ConsoleContext::refresh`].

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::application::i18n::{DEFAULT_LANGUAGE, LanguagePack};
use crate::application::repos::{RepoError, SettingsRepo};
use crate::domain::abbrlink::AbbrlinkSettings;
use crate::domain::front_matter::ParseOptions;

pub const LANGUAGE_SETTING: &str = "LANGUAGE";
pub const ABBRLINK_ALG_SETTING: &str = "ABBRLINK_ALG";
pub const ABBRLINK_REP_SETTING: &str = "ABBRLINK_REP";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    language: LanguagePack,
    abbrlink: AbbrlinkSettings,
}

pub struct ConsoleContext {
    settings: Arc<dyn SettingsRepo>,
    defaults: AbbrlinkSettings,
    snapshot: RwLock<Snapshot>,
}

impl ConsoleContext {
    /// Load the context. `defaults` apply when abbrlink settings are unset.
    pub async fn load(
        settings: Arc<dyn SettingsRepo>,
        defaults: AbbrlinkSettings,
    ) -> Result<Self, RepoError> {
        let snapshot = derive_snapshot(settings.as_ref(), &defaults).await?;
        Ok(Self {
            settings,
            defaults,
            snapshot: RwLock::new(snapshot),
        })
    }

    /// Re-read every derived value from the settings store.
    pub async fn refresh(&self) -> Result<(), RepoError> {
        let snapshot = derive_snapshot(self.settings.as_ref(), &self.defaults).await?;
        info!(
            language = snapshot.language.code(),
            abbrlink_algorithm = %snapshot.abbrlink.algorithm,
            "console context refreshed"
        );
        *self.write() = snapshot;
        Ok(())
    }

    pub fn language(&self) -> LanguagePack {
        self.read().language
    }

    pub fn abbrlink(&self) -> AbbrlinkSettings {
        self.read().abbrlink.clone()
    }

    pub fn parse_options(&self, safe: bool) -> ParseOptions {
        ParseOptions {
            safe,
            abbrlink: self.abbrlink(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(|poisoned| {
            warn!("recovered poisoned console context lock");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(|poisoned| {
            warn!("recovered poisoned console context lock");
            poisoned.into_inner()
        })
    }
}

async fn derive_snapshot(
    settings: &dyn SettingsRepo,
    defaults: &AbbrlinkSettings,
) -> Result<Snapshot, RepoError> {
    let language = match non_empty(settings.get_setting(LANGUAGE_SETTING).await?) {
        Some(code) => code,
        None => {
            settings
                .save_setting(LANGUAGE_SETTING, DEFAULT_LANGUAGE)
                .await?;
            DEFAULT_LANGUAGE.to_string()
        }
    };

    let algorithm = non_empty(settings.get_setting(ABBRLINK_ALG_SETTING).await?)
        .unwrap_or_else(|| defaults.algorithm.clone());
    let representation = non_empty(settings.get_setting(ABBRLINK_REP_SETTING).await?)
        .unwrap_or_else(|| defaults.representation.clone());

    Ok(Snapshot {
        language: LanguagePack::resolve(&language),
        abbrlink: AbbrlinkSettings::new(algorithm, representation),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryRepositories;

    #[tokio::test]
    async fn missing_language_is_seeded_with_default() {
        let repos = Arc::new(MemoryRepositories::new());
        let context = ConsoleContext::load(repos.clone(), AbbrlinkSettings::default())
            .await
            .expect("context");

        assert_eq!(context.language().code(), DEFAULT_LANGUAGE);
        assert_eq!(
            repos.get_setting(LANGUAGE_SETTING).await.expect("setting").as_deref(),
            Some(DEFAULT_LANGUAGE)
        );
    }

    #[tokio::test]
    async fn refresh_picks_up_changed_settings() {
        let repos = Arc::new(MemoryRepositories::new());
        let context = ConsoleContext::load(repos.clone(), AbbrlinkSettings::new("crc32", "dec"))
            .await
            .expect("context");
        assert_eq!(context.abbrlink(), AbbrlinkSettings::new("crc32", "dec"));

        repos.save_setting(LANGUAGE_SETTING, "en_US").await.expect("save");
        repos.save_setting(ABBRLINK_ALG_SETTING, "crc16").await.expect("save");
        repos.save_setting(ABBRLINK_REP_SETTING, "hex").await.expect("save");

        assert_eq!(context.language().code(), DEFAULT_LANGUAGE);
        context.refresh().await.expect("refresh");
        assert_eq!(context.language().code(), "en_US");
        assert_eq!(context.abbrlink(), AbbrlinkSettings::new("crc16", "hex"));
        assert!(context.parse_options(true).safe);
    }
}
