//! Fragment input helpers shared by commands.

use crate::config::FragmindConfig;
use crate::models::{Fragment, FragmentId};
use crate::storage::{FilesystemFragmentStore, FragmentStore};
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Loads fragments from `input`, or from the configured fragment store.
///
/// `input` holds a JSON array of fragments; `-` reads standard input.
///
/// # Errors
///
/// Returns an error if the file or store cannot be read or parsed.
pub fn load_fragments(input: Option<&Path>, config: &FragmindConfig) -> Result<Vec<Fragment>> {
    let Some(path) = input else {
        let store = FilesystemFragmentStore::new(config.fragments_path());
        return store
            .get_all()
            .with_context(|| format!("reading {}", store.path().display()));
    };

    let json = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("reading fragments from stdin")?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    parse_fragments(&json).with_context(|| format!("parsing {}", path.display()))
}

/// Parses a JSON array of fragments.
///
/// # Errors
///
/// Returns an error if the text is not a fragment array.
pub fn parse_fragments(json: &str) -> Result<Vec<Fragment>> {
    Ok(serde_json::from_str(json)?)
}

/// Parses a comma-separated id list such as `1, 2,5`.
///
/// # Errors
///
/// Returns an error if an entry is not a non-negative integer.
pub fn parse_ids(ids: &str) -> Result<Vec<FragmentId>> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>()
                .map(FragmentId::new)
                .with_context(|| format!("invalid fragment id '{id}'"))
        })
        .collect()
}

/// Selects fragments by id, in the order the ids were given.
///
/// With no id list every fragment is selected.
///
/// # Errors
///
/// Returns an error if the list is malformed or names an unknown id.
pub fn select_fragments(fragments: Vec<Fragment>, ids: Option<&str>) -> Result<Vec<Fragment>> {
    let Some(ids) = ids else {
        return Ok(fragments);
    };
    parse_ids(ids)?
        .into_iter()
        .map(|id| {
            let Some(fragment) = fragments.iter().find(|f| f.id == Some(id)) else {
                bail!("fragment {id} not found");
            };
            Ok(fragment.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample() -> Vec<Fragment> {
        vec![
            Fragment::new("a", "").with_id(1),
            Fragment::new("b", "").with_id(2),
            Fragment::new("c", "").with_id(3),
        ]
    }

    #[test_case("1,2" => vec![1, 2]; "plain")]
    #[test_case(" 3 , 1 " => vec![3, 1]; "spaces")]
    #[test_case("2,,"  => vec![2]; "trailing commas")]
    fn test_parse_ids(input: &str) -> Vec<u64> {
        parse_ids(input).unwrap().into_iter().map(FragmentId::value).collect()
    }

    #[test]
    fn test_parse_ids_rejects_garbage() {
        assert!(parse_ids("1,x").is_err());
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let selected = select_fragments(sample(), Some("3,1")).unwrap();
        let titles: Vec<&str> = selected.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a"]);
        assert_eq!(select_fragments(sample(), None).unwrap().len(), 3);
        assert!(select_fragments(sample(), Some("9")).is_err());
    }

    #[test]
    fn test_load_from_data_dir_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = FragmindConfig::default().with_data_dir(dir.path());
        assert!(load_fragments(None, &config).unwrap().is_empty());

        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"[{"id": 1, "title": "x", "content": "y", "tags": []}]"#).unwrap();
        assert_eq!(load_fragments(Some(&path), &config).unwrap().len(), 1);
    }
}
