//! Language packs for strings that end up in stored records or console output.

pub const DEFAULT_LANGUAGE: &str = "zh_CN";

const ZH_CN: &[(&str, &str)] = &[
    ("UNTITLED", "无标题"),
    ("PURGE_ALL_CACHE_SUCCESS", "清除全部缓存成功"),
    ("UPDATE_POST_INDEX", "更新文章索引"),
    ("DEL_POST_INDEX", "删除文章索引"),
    ("CLEAR_POST_INDEX", "清空文章索引"),
];

const EN_US: &[(&str, &str)] = &[
    ("UNTITLED", "Untitled"),
    ("PURGE_ALL_CACHE_SUCCESS", "All caches purged"),
    ("UPDATE_POST_INDEX", "Post index updated"),
    ("DEL_POST_INDEX", "Post index entry removed"),
    ("CLEAR_POST_INDEX", "Post index cleared"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePack {
    code: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

impl LanguagePack {
    /// Resolve a language code, falling back to [`DEFAULT_LANGUAGE`].
    pub fn resolve(code: &str) -> Self {
        match code {
            "en_US" | "en" => Self {
                code: "en_US",
                entries: EN_US,
            },
            _ => Self {
                code: "zh_CN",
                entries: ZH_CN,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Translate `key`, returning the key itself when the pack lacks it.
    pub fn gettext<'a>(&self, key: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, text)| *text)
            .unwrap_or(key)
    }

    pub fn untitled(&self) -> &'static str {
        self.gettext("UNTITLED")
    }
}

impl Default for LanguagePack {
    fn default() -> Self {
        Self::resolve(DEFAULT_LANGUAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_fall_back_to_default() {
        assert_eq!(LanguagePack::resolve("fr_FR").code(), DEFAULT_LANGUAGE);
        assert_eq!(LanguagePack::resolve("en_US").untitled(), "Untitled");
    }

    #[test]
    fn unknown_keys_translate_to_themselves() {
        let pack = LanguagePack::default();
        assert_eq!(pack.gettext("NOT_A_KEY"), "NOT_A_KEY");
        assert_eq!(pack.untitled(), "无标题");
    }

    #[test]
    fn packs_define_the_same_keys() {
        let keys = |entries: &[(&'static str, &'static str)]| {
            entries.iter().map(|(key, _)| *key).collect::<Vec<_>>()
        };
        assert_eq!(keys(ZH_CN), keys(EN_US));
        for key in keys(ZH_CN) {
            assert_ne!(LanguagePack::resolve("en_US").gettext(key), key);
        }
    }
}
