use std::sync::Arc;

use quiz_core::model::{AppSettings, Language, Theme};
use storage::repository::AppSettingsRepository;
use tracing::debug;

use crate::error::AppSettingsServiceError;

#[derive(Clone)]
pub struct AppSettingsService {
    repo: Arc<dyn AppSettingsRepository>,
}

impl AppSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn AppSettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<AppSettings, AppSettingsServiceError> {
        Ok(self.repo.get_settings().await?)
    }

    /// Persist new settings.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` if persistence fails.
    pub async fn save(&self, settings: AppSettings) -> Result<AppSettings, AppSettingsServiceError> {
        self.repo.save_settings(&settings).await?;
        debug!(language = %settings.language(), "settings saved");
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` on storage failures.
    pub async fn set_language(
        &self,
        language: Language,
    ) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = self.load().await?.with_language(language);
        self.save(settings).await
    }

    /// Switch between the two interface languages.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` on storage failures.
    pub async fn toggle_language(&self) -> Result<AppSettings, AppSettingsServiceError> {
        let current = self.load().await?;
        self.save(current.with_language(current.language().toggled()))
            .await
    }

    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` on storage failures.
    pub async fn set_theme(&self, theme: Theme) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = self.load().await?.with_theme(theme);
        self.save(settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::Storage;

    #[tokio::test]
    async fn toggles_and_persists_language() {
        let service = AppSettingsService::new(Storage::in_memory().app_settings);
        assert_eq!(service.load().await.unwrap().language(), Language::De);

        service.toggle_language().await.unwrap();
        assert_eq!(service.load().await.unwrap().language(), Language::Es);
        service.toggle_language().await.unwrap();
        assert_eq!(service.load().await.unwrap().language(), Language::De);
    }

    #[tokio::test]
    async fn theme_change_keeps_language() {
        let service = AppSettingsService::new(Storage::in_memory().app_settings);
        service.set_language(Language::Es).await.unwrap();
        let settings = service.set_theme(Theme::Dark).await.unwrap();
        assert_eq!(settings, AppSettings::new(Language::Es, Theme::Dark));
        assert_eq!(service.load().await.unwrap(), settings);
    }
}
