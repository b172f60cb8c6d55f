//! Site targeting table.
//!
//! A profile maps a hostname fragment to the selectors that find the chat
//! input and to the editor flavor that decides how text is written into it.
//! Lookup walks the profiles in order and takes the first key contained in
//! the hostname, so overlapping keys resolve by declaration order.

use crate::error::RegistryError;
use crate::selector::split_selector_list;
use serde::{Deserialize, Deserializer, Serialize};

/// Host editor family. The only site-specific input to strategy selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteFlavor {
    #[default]
    Generic,
    /// React-controlled textarea or contenteditable composer.
    ChatGpt,
    /// Textarea with a debounced internal model.
    Tongyi,
    /// Textarea that reverts writes it did not see through its own setter.
    Grok,
    /// Textarea mirrored into a separate display div.
    DeepSeek,
    /// Lexical editor; only trusts paste payloads.
    Lexical,
    /// ProseMirror editor; one paragraph node per line.
    ProseMirror,
}

impl SiteFlavor {
    /// Editors whose own event model conflicts with extra synthetic events.
    pub fn owns_event_model(self) -> bool {
        matches!(self, SiteFlavor::Lexical | SiteFlavor::ProseMirror)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Hostname fragment, matched as a substring.
    pub key: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Tried in order; the first selector matching anything wins.
    #[serde(deserialize_with = "deserialize_selectors")]
    pub input_selectors: Vec<String>,
    /// Shadow host chain. Each host is looked up inside the previous host's
    /// shadow root; the first one inside the document.
    #[serde(default, deserialize_with = "deserialize_selectors")]
    pub shadow_hosts: Vec<String>,
    #[serde(default)]
    pub flavor: SiteFlavor,
}

/// Accepts either a YAML/JSON list or one comma-joined selector string.
fn deserialize_selectors<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SelectorSpec {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match SelectorSpec::deserialize(deserializer)? {
        SelectorSpec::List(list) => list.iter().flat_map(|s| split_selector_list(s)).collect(),
        SelectorSpec::Joined(joined) => split_selector_list(&joined),
    })
}

impl SiteProfile {
    pub fn new(key: &str, display_name: &str, input_selectors: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            input_selectors: input_selectors.iter().map(|s| s.to_string()).collect(),
            shadow_hosts: Vec::new(),
            flavor: SiteFlavor::Generic,
        }
    }

    pub fn with_shadow_hosts(mut self, hosts: &[&str]) -> Self {
        self.shadow_hosts = hosts.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_flavor(mut self, flavor: SiteFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.key.trim().is_empty() {
            return Err(RegistryError::EmptyKey);
        }
        if self.input_selectors.is_empty() {
            return Err(RegistryError::EmptySelectors {
                key: self.key.clone(),
            });
        }
        Ok(())
    }

    pub fn matches(&self, hostname: &str) -> bool {
        hostname.contains(self.key.as_str())
    }
}

struct BuiltinProfile {
    key: &'static str,
    name: &'static str,
    selectors: &'static [&'static str],
    shadow_hosts: &'static [&'static str],
    flavor: SiteFlavor,
}

const CHATGPT_INPUT: &[&str] = &["#prompt-textarea"];

const CLAUDE_INPUT: &[&str] = &[".ProseMirror[contenteditable=\"true\"]"];

const KIMI_INPUT: &[&str] = &[
    "div.chat-input-editor[data-lexical-editor=\"true\"]",
    "div[contenteditable=\"true\"]",
    "textarea",
    "[role=\"textbox\"]",
    "[data-lexical-editor]",
];

const BUILTIN_PROFILES: &[BuiltinProfile] = &[
    BuiltinProfile {
        key: "openai.com",
        name: "ChatGPT",
        selectors: CHATGPT_INPUT,
        shadow_hosts: &[],
        flavor: SiteFlavor::ChatGpt,
    },
    BuiltinProfile {
        key: "chatgpt.com",
        name: "ChatGPT",
        selectors: CHATGPT_INPUT,
        shadow_hosts: &[],
        flavor: SiteFlavor::ChatGpt,
    },
    BuiltinProfile {
        key: "gemini.google.com",
        name: "Gemini",
        selectors: &[
            "div.initial-input-area textarea",
            "rich-textarea .ql-editor",
            "[contenteditable=\"true\"][role=\"textbox\"]",
        ],
        shadow_hosts: &["chat-app"],
        flavor: SiteFlavor::Generic,
    },
    BuiltinProfile {
        key: "claude.ai",
        name: "Claude",
        selectors: CLAUDE_INPUT,
        shadow_hosts: &[],
        flavor: SiteFlavor::ProseMirror,
    },
    BuiltinProfile {
        key: "fuclaude.com",
        name: "Claude",
        selectors: CLAUDE_INPUT,
        shadow_hosts: &[],
        flavor: SiteFlavor::ProseMirror,
    },
    BuiltinProfile {
        key: "kimi.com",
        name: "Kimi",
        selectors: KIMI_INPUT,
        shadow_hosts: &[],
        flavor: SiteFlavor::Lexical,
    },
    BuiltinProfile {
        key: "kimi.moonshot.cn",
        name: "Kimi",
        selectors: KIMI_INPUT,
        shadow_hosts: &[],
        flavor: SiteFlavor::Lexical,
    },
    BuiltinProfile {
        key: "deepseek.com",
        name: "DeepSeek",
        selectors: &[
            "textarea[placeholder*=\"随便聊点什么\"]",
            "textarea[placeholder*=\"Ask me anything\"]",
            "div[contenteditable=\"true\"]",
            "#chat-input",
            "[role=\"textbox\"]",
        ],
        shadow_hosts: &[],
        flavor: SiteFlavor::DeepSeek,
    },
    BuiltinProfile {
        key: "tongyi.com",
        name: "通义",
        selectors: &[
            "textarea[placeholder*=\"有问题，随时问通义\"]",
            "textarea[placeholder*=\"问题\"]",
            "textarea",
            "div[contenteditable=\"true\"]",
            "[role=\"textbox\"]",
        ],
        shadow_hosts: &[],
        flavor: SiteFlavor::Tongyi,
    },
    BuiltinProfile {
        key: "yuanbao.tencent.com",
        name: "腾讯元宝",
        selectors: &[
            "textarea[placeholder*=\"输入问题\"]",
            "textarea[placeholder*=\"问题\"]",
            "textarea",
            "div[contenteditable=\"true\"]",
            "[role=\"textbox\"]",
        ],
        shadow_hosts: &[],
        flavor: SiteFlavor::Generic,
    },
    BuiltinProfile {
        key: "aistudio.google.com",
        name: "Google AI Studio",
        selectors: &[
            "[contenteditable=\"true\"]",
            "textarea",
            "[role=\"textbox\"]",
            "[aria-label*=\"prompt\"]",
            "[aria-label*=\"Prompt\"]",
            "[placeholder*=\"prompt\"]",
            "[placeholder*=\"Prompt\"]",
            ".prompt-input",
            "#prompt-input",
            "input[type=\"text\"]",
        ],
        shadow_hosts: &["app-root"],
        flavor: SiteFlavor::Generic,
    },
    BuiltinProfile {
        key: "grok.com",
        name: "Grok",
        selectors: &[
            "form .query-bar textarea[aria-label]",
            "textarea[aria-label*=\"Grok\"]",
            "textarea[aria-label*=\"向 Grok\"]",
            "textarea",
        ],
        shadow_hosts: &[],
        flavor: SiteFlavor::Grok,
    },
    BuiltinProfile {
        key: "doubao.com",
        name: "豆包",
        selectors: &[
            "textarea[placeholder*=\"输入\"]",
            "textarea[placeholder*=\"问题\"]",
            "textarea",
            "div[contenteditable=\"true\"]",
            "[role=\"textbox\"]",
            "[aria-label*=\"输入\"]",
            "[aria-label*=\"提问\"]",
            "[data-lexical-editor]",
            ".ProseMirror",
        ],
        shadow_hosts: &[],
        flavor: SiteFlavor::Generic,
    },
];

/// Ordered set of site profiles consulted through [`SiteRegistry::resolve`].
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
}

impl SiteRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in destination table.
    pub fn builtin() -> Self {
        let profiles = BUILTIN_PROFILES
            .iter()
            .map(|b| {
                SiteProfile::new(b.key, b.name, b.selectors)
                    .with_shadow_hosts(b.shadow_hosts)
                    .with_flavor(b.flavor)
            })
            .collect();
        Self { profiles }
    }

    /// Built-ins preceded by `overrides`, so a user profile wins over a
    /// built-in one whose key it shares or overlaps.
    pub fn with_overrides(overrides: Vec<SiteProfile>) -> Result<Self, RegistryError> {
        let mut registry = Self::empty();
        for profile in overrides {
            registry.push(profile)?;
        }
        registry.profiles.extend(Self::builtin().profiles);
        Ok(registry)
    }

    /// Append a profile; it matches only after every earlier one.
    pub fn push(&mut self, profile: SiteProfile) -> Result<(), RegistryError> {
        profile.validate()?;
        self.profiles.push(profile);
        Ok(())
    }

    /// First profile whose key is contained in `hostname`.
    pub fn resolve(&self, hostname: &str) -> Option<&SiteProfile> {
        self.profiles.iter().find(|p| p.matches(hostname))
    }

    pub fn profiles(&self) -> &[SiteProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
