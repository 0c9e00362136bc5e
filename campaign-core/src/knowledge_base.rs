//! Knowledge base for linking prose to campaign entities.
//!
//! Every spell, item, class action, condition and NPC is registered under its
//! name and aliases. [`KnowledgeBase::linkify`] wraps each mention in free
//! text with a link; [`KnowledgeBase::resolve`] turns a clicked or hovered
//! label back into its entry.

use crate::items::Item;
use crate::repository::Repository;
use crate::spells::Spell;
use crate::world::{truncate_chars, ClassAction, Condition, Npc};
use regex::{Regex, RegexBuilder};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::ops::Range;
use tracing::warn;

/// Hover text budget for NPCs.
pub const NPC_HOVER_CHARS: usize = 180;

/// Hover text budget for everything else.
pub const DESCRIPTION_HOVER_CHARS: usize = 400;

/// Floor for the compiled matcher's size limit (the regex crate's default).
const MATCHER_SIZE_FLOOR: usize = 10 * (1 << 20);

/// Compiled program budget per byte of pattern. Case-insensitive Unicode
/// alternations take well under this.
const MATCHER_BYTES_PER_PATTERN_BYTE: usize = 256;

/// Lazy DFA cache budget per byte of pattern.
const DFA_BYTES_PER_PATTERN_BYTE: usize = 64;

/// The entity behind an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum KbContent {
    Spell(Spell),
    Item(Item),
    ClassAction(ClassAction),
    Npc(Npc),
    Condition(Condition),
}

impl KbContent {
    pub fn kind(&self) -> &'static str {
        match self {
            KbContent::Spell(_) => "Spell",
            KbContent::Item(_) => "Item",
            KbContent::ClassAction(_) => "Class Action",
            KbContent::Npc(_) => "NPC",
            KbContent::Condition(_) => "Condition",
        }
    }
}

/// One linkable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct KbEntry {
    pub name: String,
    pub hover_description: String,
    pub content: KbContent,
}

fn description_hover(description: &str) -> String {
    truncate_chars(description.trim(), DESCRIPTION_HOVER_CHARS)
}

impl KbEntry {
    pub fn spell(spell: &Spell) -> Self {
        Self {
            name: spell.name.clone(),
            hover_description: description_hover(&spell.description),
            content: KbContent::Spell(spell.clone()),
        }
    }

    pub fn item(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            hover_description: description_hover(&item.description),
            content: KbContent::Item(item.clone()),
        }
    }

    pub fn class_action(action: &ClassAction) -> Self {
        Self {
            name: action.name.clone(),
            hover_description: description_hover(&action.description),
            content: KbContent::ClassAction(action.clone()),
        }
    }

    pub fn condition(condition: &Condition) -> Self {
        Self {
            name: condition.name.clone(),
            hover_description: description_hover(&condition.description),
            content: KbContent::Condition(condition.clone()),
        }
    }

    pub fn npc(npc: &Npc) -> Self {
        Self {
            name: npc.name.clone(),
            hover_description: npc.hover_text(NPC_HOVER_CHARS),
            content: KbContent::Npc(npc.clone()),
        }
    }
}

/// A match found by [`KnowledgeBase::mentions`].
#[derive(Debug, Clone, PartialEq)]
pub struct Mention<'a> {
    /// Byte range in the scanned text.
    pub range: Range<usize>,
    pub entry: &'a KbEntry,
}

/// Name and alias tables plus a lazily compiled matcher.
///
/// The matcher is rebuilt on the first query after any mutation.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: HashMap<String, KbEntry>,
    /// Lowercased alias to canonical name.
    aliases: HashMap<String, String>,
    /// Lowercased canonical name to canonical name.
    names_folded: HashMap<String, String>,
    matcher: OnceCell<Option<Regex>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything a loaded campaign knows about.
    pub fn from_repository(repo: &Repository) -> Self {
        let mut kb = Self::new();
        kb.ingest(repo.spells(), repo.items(), repo.class_actions());
        kb.ingest_conditions(repo.conditions());
        kb.ingest_npcs(repo.npcs());
        kb
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register an entry; an existing entry with the same name is replaced.
    pub fn add_entry(&mut self, entry: KbEntry) {
        self.names_folded
            .insert(entry.name.to_lowercase(), entry.name.clone());
        self.entries.insert(entry.name.clone(), entry);
        self.matcher.take();
    }

    /// Make `alias` resolve to the entry named `canonical`.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        let alias = alias.trim();
        if alias.is_empty() {
            return;
        }
        self.aliases
            .insert(alias.to_lowercase(), canonical.to_string());
        self.matcher.take();
    }

    fn add_with_aliases(&mut self, entry: KbEntry, aliases: &[String]) {
        let canonical = entry.name.clone();
        self.add_entry(entry);
        for alias in aliases {
            self.add_alias(alias, &canonical);
        }
    }

    /// Register spells, then items, then class actions. Later names win.
    pub fn ingest(&mut self, spells: &[Spell], items: &[Item], actions: &[ClassAction]) {
        for spell in spells {
            self.add_with_aliases(KbEntry::spell(spell), &spell.aliases);
        }
        for item in items {
            self.add_with_aliases(KbEntry::item(item), &item.aliases);
        }
        for action in actions {
            self.add_with_aliases(KbEntry::class_action(action), &action.aliases);
        }
    }

    pub fn ingest_npcs(&mut self, npcs: &[Npc]) {
        for npc in npcs {
            self.add_with_aliases(KbEntry::npc(npc), &npc.aliases);
        }
    }

    pub fn ingest_conditions(&mut self, conditions: &[Condition]) {
        for condition in conditions {
            self.add_with_aliases(KbEntry::condition(condition), &condition.aliases);
        }
    }

    /// Look up a label: exact name, then alias, then name ignoring case.
    pub fn resolve(&self, label: &str) -> Option<&KbEntry> {
        if let Some(entry) = self.entries.get(label) {
            return Some(entry);
        }
        let folded = label.trim().to_lowercase();
        self.aliases
            .get(&folded)
            .and_then(|canonical| self.entries.get(canonical))
            .or_else(|| {
                self.names_folded
                    .get(&folded)
                    .and_then(|canonical| self.entries.get(canonical))
            })
    }

    fn matcher(&self) -> Option<&Regex> {
        self.matcher.get_or_init(|| self.build_matcher()).as_ref()
    }

    /// One alternation of every name and alias, longest first, so "Fire Bolt"
    /// is tried before "Fire". The half boundaries only look outside the
    /// match, which lets labels contain spaces and punctuation.
    fn build_matcher(&self) -> Option<Regex> {
        let mut labels: Vec<&str> = self
            .entries
            .keys()
            .chain(self.aliases.keys())
            .map(|label| label.as_str())
            .filter(|label| !label.trim().is_empty())
            .collect();
        if labels.is_empty() {
            return None;
        }
        labels.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        labels.dedup();

        let alternation = labels
            .iter()
            .map(|label| regex::escape(label))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"\b{{start-half}}(?:{alternation})\b{{end-half}}");

        // The limit grows with the vocabulary so a full compendium still compiles.
        let size_limit = pattern
            .len()
            .saturating_mul(MATCHER_BYTES_PER_PATTERN_BYTE)
            .max(MATCHER_SIZE_FLOOR);
        let dfa_size_limit = pattern
            .len()
            .saturating_mul(DFA_BYTES_PER_PATTERN_BYTE)
            .max(MATCHER_SIZE_FLOOR);

        match RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(size_limit)
            .dfa_size_limit(dfa_size_limit)
            .build()
        {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(error = %e, labels = labels.len(), "failed to compile knowledge base matcher");
                None
            }
        }
    }

    /// Wrap every known mention as `<a href="label">label</a>`.
    pub fn linkify(&self, text: &str) -> String {
        self.linkify_with(text, |label| format!("<a href=\"{label}\">{label}</a>"))
    }

    /// Replace every known mention with `wrap(label)`; the label keeps the
    /// casing it has in `text`.
    pub fn linkify_with<F>(&self, text: &str, mut wrap: F) -> String
    where
        F: FnMut(&str) -> String,
    {
        match self.matcher() {
            Some(matcher) => matcher
                .replace_all(text, |caps: &regex::Captures<'_>| wrap(&caps[0]))
                .into_owned(),
            None => text.to_string(),
        }
    }

    /// Every known mention in `text`, in order.
    pub fn mentions(&self, text: &str) -> Vec<Mention<'_>> {
        let Some(matcher) = self.matcher() else {
            return Vec::new();
        };
        matcher
            .find_iter(text)
            .filter_map(|m| {
                self.resolve(m.as_str()).map(|entry| Mention {
                    range: m.range(),
                    entry,
                })
            })
            .collect()
    }
}
