use crate::language::display_name;
use crate::types::{Theme, Tone, TranslationRequest};

pub const DETECTION_PROMPT: &str = "You are a language detection service. Your only task is to detect \
the language of the text. Reply with just the ISO 639-1 language code (like 'en', 'es', 'fr', etc.)";

fn theme_instruction(theme: Theme) -> Option<&'static str> {
    match theme {
        Theme::Auto | Theme::General => None,
        Theme::Technical => Some("The text is technical. Keep technical terms precise and use the standard terminology of the target language."),
        Theme::Medical => Some("The text is medical. Use accurate clinical terminology and do not simplify medical terms."),
        Theme::Legal => Some("The text is legal. Preserve legal meaning exactly and use the formal terminology of legal documents."),
        Theme::Business => Some("The text is business communication. Use clear, professional business language."),
        Theme::Academic => Some("The text is academic. Keep a scholarly register and precise wording."),
        Theme::Literary => Some("The text is literary. Preserve style, imagery and rhythm where possible."),
        Theme::Casual => Some("The text is casual conversation. Use natural, everyday phrasing."),
    }
}

fn tone_instruction(tone: Tone) -> Option<&'static str> {
    match tone {
        Tone::Neutral => None,
        Tone::Formal => Some("Use a formal tone."),
        Tone::Informal => Some("Use an informal tone."),
        Tone::Friendly => Some("Use a warm, friendly tone."),
        Tone::Professional => Some("Use a professional tone."),
    }
}

fn direction(request: &TranslationRequest) -> String {
    let target = display_name(&request.target_lang);
    if request.is_auto_source() {
        format!("FROM the language the text is written in TO {}", target)
    } else {
        format!("FROM {} TO {}", display_name(&request.source_lang), target)
    }
}

fn style_block(request: &TranslationRequest) -> String {
    let mut block = String::new();
    for instruction in [theme_instruction(request.theme), tone_instruction(request.tone)]
        .into_iter()
        .flatten()
    {
        block.push_str(instruction);
        block.push('\n');
    }
    block
}

/// System prompt for a plain (single result) translation.
pub fn plain_prompt(request: &TranslationRequest) -> String {
    format!(
        "You are a translation service. Translate the given text {}. \
         Provide ONLY the direct translation without any explanations, descriptions, or additional content. \
         Do not include phrases like \"this translates to\" or descriptions of the language.\n{}",
        direction(request),
        style_block(request)
    )
}

/// System prompt asking for a JSON payload with alternatives.
pub fn contextual_prompt(request: &TranslationRequest) -> String {
    let mut extra_fields = String::new();
    if request.theme == Theme::Auto {
        let themes: Vec<&str> = Theme::ALL
            .iter()
            .filter(|theme| **theme != Theme::Auto)
            .map(|theme| theme.as_str())
            .collect();
        extra_fields.push_str(&format!(
            ",\n  \"detectedTheme\": \"the domain of the text, one of: {}\"",
            themes.join(", ")
        ));
    }
    if request.is_auto_source() {
        extra_fields.push_str(",\n  \"detectedLanguage\": \"ISO 639-1 code of the source text\"");
    }

    format!(
        "You are an advanced translation service specializing in contextual and cultural nuances.\n\
         Translate the following text {}.\n\
         \n\
         Your response must be in this JSON format:\n\
         {{\n  \"mainTranslation\": \"The direct translation of the text without any explanations\",\n  \
         \"alternatives\": [\n    {{\n      \"text\": \"Alternative translation\",\n      \
         \"explanation\": \"Cultural nuances, idioms, or context considerations for this alternative\",\n      \
         \"context\": \"Short label for where this alternative fits (optional)\",\n      \
         \"style\": \"Short label for the register of this alternative (optional)\"\n    }}\n  ]{}\n}}\n\
         \n\
         Provide ONLY the direct translation in the mainTranslation field, without any descriptions or extra text.\n\
         Focus on idioms, cultural references, and linguistic subtleties when creating alternatives.\n\
         Provide at least 2 alternative translations that preserve different aspects of the original meaning or style.\n{}",
        direction(request),
        extra_fields,
        style_block(request)
    )
}

pub fn system_prompt(request: &TranslationRequest) -> String {
    if request.include_contextual {
        contextual_prompt(request)
    } else {
        plain_prompt(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prompt_names_languages() {
        let prompt = plain_prompt(&TranslationRequest::new("Hello", "en", "es"));
        assert!(prompt.contains("FROM English TO Spanish"));
        assert!(!prompt.contains("mainTranslation"));
    }

    #[test]
    fn test_auto_source_does_not_claim_english() {
        let prompt = plain_prompt(&TranslationRequest::new("Hallo", "auto", "fr"));
        assert!(prompt.contains("FROM the language the text is written in TO French"));
    }

    #[test]
    fn test_theme_detection_only_for_auto() {
        let auto = contextual_prompt(&TranslationRequest::new("Hi", "en", "es").contextual(true));
        let general = contextual_prompt(
            &TranslationRequest::new("Hi", "en", "es")
                .contextual(true)
                .theme(Theme::General),
        );
        assert!(auto.contains("detectedTheme"));
        assert!(!general.contains("detectedTheme"));
    }

    #[test]
    fn test_style_instructions() {
        let request = TranslationRequest::new("Hi", "en", "es")
            .theme(Theme::Legal)
            .tone(Tone::Formal);
        let prompt = system_prompt(&request);
        assert!(prompt.contains("The text is legal."));
        assert!(prompt.contains("Use a formal tone."));
    }
}
