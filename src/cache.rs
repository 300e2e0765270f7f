//! Decrypted working set for the unlocked session.
//!
//! The cache exclusively owns the in-memory credential and category
//! collections. It performs no I/O: the orchestrator feeds it
//! backend-confirmed values only, which is what makes rollback on a
//! failed operation implicit (nothing was written to undo).

use crate::models::{Category, Credential};

/// Session-local category filter. `All` means "no category filter";
/// it is a sentinel that is never persisted and, being a variant
/// rather than a name, cannot collide with a real category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    fn matches(&self, credential: &Credential) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => credential.category == *name,
        }
    }
}

#[derive(Debug, Default)]
pub struct CredentialCache {
    credentials: Vec<Credential>,
    categories: Vec<Category>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic bulk set, used once per successful unlock. Readers never
    /// observe one collection replaced without the other.
    pub fn replace_all(&mut self, credentials: Vec<Credential>, categories: Vec<Category>) {
        self.credentials = credentials;
        self.categories = categories;
    }

    pub fn clear(&mut self) {
        self.credentials.clear();
        self.categories.clear();
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn credential(&self, id: &str) -> Option<&Credential> {
        self.credentials.iter().find(|c| c.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Inserts when the id is unknown, replaces in place when known.
    /// Timestamps come from the backend's returned object, never from
    /// this layer.
    pub fn upsert_credential(&mut self, credential: Credential) {
        match self.credentials.iter_mut().find(|c| c.id == credential.id) {
            Some(slot) => *slot = credential,
            None => self.credentials.push(credential),
        }
    }

    /// No-op when the id is absent.
    pub fn remove_credential(&mut self, id: &str) {
        self.credentials.retain(|c| c.id != id);
    }

    pub fn upsert_category(&mut self, category: Category) {
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(slot) => *slot = category,
            None => self.categories.push(category),
        }
    }

    /// No-op when the id is absent.
    pub fn remove_category(&mut self, id: &str) {
        self.categories.retain(|c| c.id != id);
    }

    /// Lazy, restartable view over the cached credentials: category
    /// exact match unless `All`, plus a case-insensitive substring
    /// match of `search` against title, username, or url. Preserves
    /// cache order; no re-sorting.
    pub fn filter<'a>(
        &'a self,
        category: &'a CategoryFilter,
        search: &str,
    ) -> impl Iterator<Item = &'a Credential> + 'a {
        let needle = search.to_lowercase();
        self.credentials.iter().filter(move |credential| {
            if !category.matches(credential) {
                return false;
            }
            needle.is_empty()
                || credential.title.to_lowercase().contains(&needle)
                || credential.username.to_lowercase().contains(&needle)
                || credential.url.to_lowercase().contains(&needle)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(id: &str, title: &str, category: &str) -> Credential {
        Credential {
            id: id.into(),
            title: title.into(),
            username: format!("{id}@example.com"),
            secret: "pw".into(),
            url: format!("https://{id}.example"),
            notes: String::new(),
            category: category.into(),
            created_at: 1,
            updated_at: 1,
        }
    }

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.into(),
            name: name.into(),
            icon: "📁".into(),
        }
    }

    fn populated() -> CredentialCache {
        let mut cache = CredentialCache::new();
        cache.replace_all(
            vec![
                credential("a", "Bank", "Finance"),
                credential("b", "Mail", "Personal"),
                credential("c", "Broker", "Finance"),
            ],
            vec![category("1", "Finance"), category("2", "Personal")],
        );
        cache
    }

    #[test]
    fn filter_all_empty_search_is_cache_order() {
        let cache = populated();
        let ids: Vec<&str> = cache
            .filter(&CategoryFilter::All, "")
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn filter_by_category_is_exact() {
        let cache = populated();
        let finance = CategoryFilter::named("Finance");
        let ids: Vec<&str> = cache
            .filter(&finance, "")
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(cache.filter(&CategoryFilter::named("finance"), "").count(), 0);
    }

    #[test]
    fn search_is_case_insensitive_over_title_username_url() {
        let cache = populated();
        assert_eq!(cache.filter(&CategoryFilter::All, "bAnK").count(), 1);
        assert_eq!(cache.filter(&CategoryFilter::All, "B@EXAMPLE").count(), 1);
        assert_eq!(cache.filter(&CategoryFilter::All, "c.example").count(), 1);
        assert_eq!(cache.filter(&CategoryFilter::All, "absent").count(), 0);
    }

    #[test]
    fn filter_is_restartable() {
        let cache = populated();
        let filter = CategoryFilter::named("Finance");
        let first: Vec<&str> = cache.filter(&filter, "").map(|c| c.id.as_str()).collect();
        let second: Vec<&str> = cache.filter(&filter, "").map(|c| c.id.as_str()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn upsert_replaces_in_place_preserving_order() {
        let mut cache = populated();
        let mut replacement = credential("b", "Mailbox", "Personal");
        replacement.updated_at = 9;
        cache.upsert_credential(replacement);
        let ids: Vec<&str> = cache.credentials().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(cache.credential("b").unwrap().title, "Mailbox");
        assert_eq!(cache.credential("b").unwrap().updated_at, 9);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut cache = populated();
        cache.remove_credential("zzz");
        cache.remove_category("zzz");
        assert_eq!(cache.credentials().len(), 3);
        assert_eq!(cache.categories().len(), 2);
    }

    // Replaying a mixed operation sequence must land the cache in the
    // same state as a plain reference model fed the same sequence.
    #[test]
    fn replay_matches_reference_model() {
        enum Op {
            Upsert(Credential),
            Remove(&'static str),
        }
        let ops = vec![
            Op::Upsert(credential("a", "Bank", "Finance")),
            Op::Upsert(credential("b", "Mail", "Personal")),
            Op::Upsert(credential("a", "Bank v2", "Finance")),
            Op::Remove("b"),
            Op::Upsert(credential("c", "Broker", "Finance")),
            Op::Remove("missing"),
            Op::Upsert(credential("b", "Mail again", "Personal")),
        ];

        let mut cache = CredentialCache::new();
        let mut reference: Vec<Credential> = Vec::new();
        for op in ops {
            match op {
                Op::Upsert(c) => {
                    cache.upsert_credential(c.clone());
                    match reference.iter_mut().find(|r| r.id == c.id) {
                        Some(slot) => *slot = c,
                        None => reference.push(c),
                    }
                }
                Op::Remove(id) => {
                    cache.remove_credential(id);
                    reference.retain(|r| r.id != id);
                }
            }
        }

        assert_eq!(cache.credentials(), reference.as_slice());
        let mut ids: Vec<&str> = cache.credentials().iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), cache.credentials().len(), "duplicate ids");
    }
}
