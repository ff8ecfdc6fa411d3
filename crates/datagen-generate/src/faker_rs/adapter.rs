use fake::Fake;
use fake::faker::internet::raw::{DomainSuffix, SafeEmail};
use fake::faker::lorem::raw::Word;
use fake::faker::name::raw::Name;
use fake::locales::{EN, PT_BR};
use rand::RngCore;

use crate::faker_rs::locales::LocaleKey;

/// Draws a localized `fake` value as a `String`.
macro_rules! localized {
    ($locale:expr, $faker:ident, $rng:expr) => {
        match $locale {
            LocaleKey::EnUs => $faker(EN).fake_with_rng::<String, _>($rng),
            LocaleKey::PtBr => $faker(PT_BR).fake_with_rng::<String, _>($rng),
        }
    };
}

/// Thin wrapper over the `fake` providers used by the string generators.
///
/// Every draw goes through the caller's RNG so seeded runs stay reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeRsAdapter {
    locale: LocaleKey,
}

impl FakeRsAdapter {
    pub fn new(locale: LocaleKey) -> Self {
        Self { locale }
    }

    pub fn name(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, Name, rng)
    }

    pub fn word(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, Word, rng)
    }

    pub fn safe_email(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, SafeEmail, rng)
    }

    pub fn domain_suffix(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, DomainSuffix, rng)
    }
}
