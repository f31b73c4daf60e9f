//! Case-insensitive substring search over loaded records.

use crate::contract::model::{Client, Credential, Transaction};

/// Fields a free-text search looks at.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Searchable for Client {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.slug.as_str()]
    }
}

impl Searchable for Transaction {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.description.as_str()];
        fields.extend(self.client_name.as_deref());
        fields
    }
}

impl Searchable for Credential {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.username.as_str()];
        fields.extend(self.client_name.as_deref());
        fields
    }
}

/// Items matching `term`, in their original order. An empty term keeps everything.
pub fn search<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    items.iter().filter(|item| item.matches(term)).collect()
}
