//! Hologram text rendering
//!
//! Turns an amount and a category into styled text runs using the configured
//! templates. Templates use the legacy `&` markup: `&0`-`&f` pick one of the
//! sixteen named colors and `&l` turns bold on. Any other `&` sequence is kept
//! as literal text.

mod markup;

pub use markup::{NamedColor, StyledText, TextRun, parse_markup};

use damage_numbers_types::formatting::format_amount;
use damage_numbers_types::{EffectCategory, Formats, Settings};

/// Placeholder replaced by the formatted amount.
pub const AMOUNT_PLACEHOLDER: &str = "%s";

/// Renders amounts with the templates of one configuration snapshot.
#[derive(Debug, Clone)]
pub struct Formatter {
    formats: Formats,
}

impl Formatter {
    pub fn new(settings: &Settings) -> Self {
        Self {
            formats: settings.formats.clone(),
        }
    }

    pub fn render(&self, amount: f64, category: EffectCategory) -> StyledText {
        let text = self
            .formats
            .template(category)
            .replace(AMOUNT_PLACEHOLDER, &format_amount(amount));
        parse_markup(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_scenario() {
        let formatter = Formatter::new(&Settings::default());
        let text = formatter.render(7.0, EffectCategory::Critical);

        assert_eq!(text.plain(), "7 ✧");
        assert_eq!(text.runs.len(), 1);
        assert_eq!(text.runs[0].color, NamedColor::Gold);
        assert!(text.runs[0].bold);
    }

    #[test]
    fn test_normal_uses_absolute_value() {
        let formatter = Formatter::new(&Settings::default());
        let text = formatter.render(-12.5, EffectCategory::Normal);

        assert_eq!(text.plain(), "12.5");
        assert_eq!(text.runs[0].color, NamedColor::Gray);
        assert!(!text.runs[0].bold);
    }

    #[test]
    fn test_healing_template() {
        let formatter = Formatter::new(&Settings::default());
        let text = formatter.render(1_250.0, EffectCategory::Healing);

        assert_eq!(text.plain(), "+1,250 ❤");
        assert_eq!(text.runs[0].color, NamedColor::Green);
    }

    #[test]
    fn test_template_without_markup_is_white() {
        let mut settings = Settings::default();
        settings.formats.normal = "-%s".to_string();
        let text = Formatter::new(&settings).render(3.0, EffectCategory::Normal);

        assert_eq!(text.runs, vec![TextRun::new("-3", NamedColor::White, false)]);
    }
}
