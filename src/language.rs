//! Language codes understood by the front end and their display names.

use crate::types::{AUTO_LANGUAGE, DEFAULT_LANGUAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub rtl: bool,
}

const fn ltr(code: &'static str, name: &'static str) -> Language {
    Language { code, name, rtl: false }
}

const fn rtl(code: &'static str, name: &'static str) -> Language {
    Language { code, name, rtl: true }
}

pub const LANGUAGES: &[Language] = &[
    ltr("af", "Afrikaans"),
    ltr("sq", "Albanian"),
    ltr("am", "Amharic"),
    rtl("ar", "Arabic"),
    ltr("hy", "Armenian"),
    ltr("as", "Assamese"),
    ltr("az", "Azerbaijani"),
    ltr("eu", "Basque"),
    ltr("be", "Belarusian"),
    ltr("bn", "Bengali"),
    ltr("bs", "Bosnian"),
    ltr("bg", "Bulgarian"),
    ltr("my", "Burmese"),
    ltr("ca", "Catalan"),
    ltr("zh", "Chinese (Simplified)"),
    ltr("zh-TW", "Chinese (Traditional)"),
    ltr("hr", "Croatian"),
    ltr("cs", "Czech"),
    ltr("da", "Danish"),
    ltr("nl", "Dutch"),
    ltr("en", "English"),
    ltr("eo", "Esperanto"),
    ltr("et", "Estonian"),
    ltr("fi", "Finnish"),
    ltr("fr", "French"),
    ltr("gl", "Galician"),
    ltr("ka", "Georgian"),
    ltr("de", "German"),
    ltr("el", "Greek"),
    ltr("gu", "Gujarati"),
    ltr("ht", "Haitian Creole"),
    rtl("he", "Hebrew"),
    ltr("hi", "Hindi"),
    ltr("hu", "Hungarian"),
    ltr("is", "Icelandic"),
    ltr("id", "Indonesian"),
    ltr("ga", "Irish"),
    ltr("it", "Italian"),
    ltr("ja", "Japanese"),
    ltr("kn", "Kannada"),
    ltr("kk", "Kazakh"),
    ltr("km", "Khmer"),
    ltr("ko", "Korean"),
    ltr("ky", "Kyrgyz"),
    ltr("lo", "Lao"),
    ltr("la", "Latin"),
    ltr("lv", "Latvian"),
    ltr("lt", "Lithuanian"),
    ltr("mk", "Macedonian"),
    ltr("ms", "Malay"),
    ltr("ml", "Malayalam"),
    ltr("mt", "Maltese"),
    ltr("mr", "Marathi"),
    ltr("ne", "Nepali"),
    ltr("no", "Norwegian"),
    ltr("or", "Odia"),
    rtl("fa", "Persian"),
    ltr("pl", "Polish"),
    ltr("pt", "Portuguese"),
    ltr("pa", "Punjabi"),
    ltr("ro", "Romanian"),
    ltr("ru", "Russian"),
    ltr("sr", "Serbian"),
    ltr("si", "Sinhala"),
    ltr("sk", "Slovak"),
    ltr("sl", "Slovenian"),
    ltr("es", "Spanish"),
    ltr("sw", "Swahili"),
    ltr("sv", "Swedish"),
    ltr("tl", "Tagalog"),
    ltr("tg", "Tajik"),
    ltr("ta", "Tamil"),
    ltr("te", "Telugu"),
    ltr("th", "Thai"),
    ltr("tr", "Turkish"),
    ltr("uk", "Ukrainian"),
    rtl("ur", "Urdu"),
    ltr("uz", "Uzbek"),
    ltr("vi", "Vietnamese"),
    ltr("cy", "Welsh"),
    ltr("yi", "Yiddish"),
    ltr("zu", "Zulu"),
];

pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES
        .iter()
        .find(|language| language.code.eq_ignore_ascii_case(code))
}

/// Display name for prompts. `auto` is treated as English, unknown codes are
/// passed through unchanged.
pub fn display_name(code: &str) -> String {
    let code = if code == AUTO_LANGUAGE { DEFAULT_LANGUAGE } else { code };
    find(code)
        .or_else(|| find(base_language(code)))
        .map(|language| language.name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// `"en-US"` -> `"en"`.
pub fn base_language(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

/// Turn a free-form detector reply (`"ES."`, `"'fr'"`, `"de\n"`) into a code.
pub fn normalize_detected(raw: &str) -> Option<String> {
    let token = raw
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .to_lowercase();

    if token.is_empty() || token.len() > 8 {
        return None;
    }

    match find(&token) {
        Some(language) => Some(language.code.to_string()),
        None => Some(token),
    }
}
