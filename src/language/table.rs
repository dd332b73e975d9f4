/// One known language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1
    pub iso1: &'static str,
    /// ISO 639-2/T; the canonical tag
    pub iso2t: &'static str,
    /// ISO 639-2/B, equal to /T for most languages
    pub iso2b: &'static str,
    pub english: &'static str,
    pub native: &'static str,
}

const fn lang(
    iso1: &'static str,
    iso2t: &'static str,
    iso2b: &'static str,
    english: &'static str,
    native: &'static str,
) -> Language {
    Language {
        iso1,
        iso2t,
        iso2b,
        english,
        native,
    }
}

pub(super) static LANGUAGES: &[Language] = &[
    lang("en", "eng", "eng", "English", "English"),
    lang("de", "deu", "ger", "German", "Deutsch"),
    lang("fr", "fra", "fre", "French", "Français"),
    lang("es", "spa", "spa", "Spanish", "Español"),
    lang("it", "ita", "ita", "Italian", "Italiano"),
    lang("pt", "por", "por", "Portuguese", "Português"),
    lang("nl", "nld", "dut", "Dutch", "Nederlands"),
    lang("sv", "swe", "swe", "Swedish", "Svenska"),
    lang("no", "nor", "nor", "Norwegian", "Norsk"),
    lang("da", "dan", "dan", "Danish", "Dansk"),
    lang("fi", "fin", "fin", "Finnish", "Suomi"),
    lang("is", "isl", "ice", "Icelandic", "Íslenska"),
    lang("pl", "pol", "pol", "Polish", "Polski"),
    lang("cs", "ces", "cze", "Czech", "Čeština"),
    lang("sk", "slk", "slo", "Slovak", "Slovenčina"),
    lang("sl", "slv", "slv", "Slovenian", "Slovenščina"),
    lang("hu", "hun", "hun", "Hungarian", "Magyar"),
    lang("ro", "ron", "rum", "Romanian", "Română"),
    lang("bg", "bul", "bul", "Bulgarian", "Български"),
    lang("hr", "hrv", "hrv", "Croatian", "Hrvatski"),
    lang("sr", "srp", "srp", "Serbian", "Српски"),
    lang("uk", "ukr", "ukr", "Ukrainian", "Українська"),
    lang("ru", "rus", "rus", "Russian", "Русский"),
    lang("el", "ell", "gre", "Greek", "Ελληνικά"),
    lang("tr", "tur", "tur", "Turkish", "Türkçe"),
    lang("he", "heb", "heb", "Hebrew", "עברית"),
    lang("ar", "ara", "ara", "Arabic", "العربية"),
    lang("hi", "hin", "hin", "Hindi", "हिन्दी"),
    lang("th", "tha", "tha", "Thai", "ไทย"),
    lang("vi", "vie", "vie", "Vietnamese", "Tiếng Việt"),
    lang("id", "ind", "ind", "Indonesian", "Bahasa Indonesia"),
    lang("ja", "jpn", "jpn", "Japanese", "日本語"),
    lang("ko", "kor", "kor", "Korean", "한국어"),
    lang("zh", "zho", "chi", "Chinese", "中文"),
    lang("et", "est", "est", "Estonian", "Eesti"),
    lang("lv", "lav", "lav", "Latvian", "Latviešu"),
    lang("lt", "lit", "lit", "Lithuanian", "Lietuvių"),
];
