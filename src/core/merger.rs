//! Flattens loaded resources into the single source-of-truth collection.

use super::loader::LoadedFile;
use super::models::Bookmark;

/// Stamp every item with its resource name and concatenate, keeping
/// resource order first and in-resource order second. Duplicate URLs across
/// resources are all kept.
pub fn merge(loaded: Vec<LoadedFile>) -> Vec<Bookmark> {
    let mut all = Vec::with_capacity(loaded.iter().map(|f| f.file.items.len()).sum());
    for LoadedFile { name, file } in loaded {
        all.extend(file.items.into_iter().map(|mut item| {
            item.source_file = Some(name.clone());
            item
        }));
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::BookmarkFile;

    fn loaded(name: &str, titles: &[&str]) -> LoadedFile {
        LoadedFile {
            name: name.to_string(),
            file: BookmarkFile {
                title: None,
                items: titles
                    .iter()
                    .map(|t| Bookmark::new(*t, "https://dup.example"))
                    .collect(),
            },
        }
    }

    #[test]
    fn test_merge_preserves_order_and_stamps_provenance() {
        let all = merge(vec![loaded("a.json", &["a1", "a2"]), loaded("b.json", &["b1"])]);
        let titles: Vec<_> = all.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2", "b1"]);
        assert_eq!(all[1].source_file.as_deref(), Some("a.json"));
        assert_eq!(all[2].source_file.as_deref(), Some("b.json"));
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let all = merge(vec![loaded("a.json", &["x"]), loaded("b.json", &["x"])]);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].url, all[1].url);
    }

    #[test]
    fn test_merge_overwrites_incoming_provenance() {
        let mut file = loaded("real.json", &["x"]);
        file.file.items[0].source_file = Some("spoofed.json".into());
        let all = merge(vec![file]);
        assert_eq!(all[0].source_file.as_deref(), Some("real.json"));
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge(Vec::new()).is_empty());
    }
}
