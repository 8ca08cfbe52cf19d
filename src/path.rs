//! Path helpers: item-type inference and target-name encoding

/// Infer the item type of a file from its nearest ancestor item folder.
///
/// Fabric item folders are named `<display name>.<ItemType>`, for example
/// `nb_br_csv_to_delta.Notebook` or `lh_shortcuts.Lakehouse`. The suffix must
/// start with an ASCII letter so that folders like `v1.2` are not mistaken for
/// items. Returns `None` for files outside any item folder.
pub fn item_type_of(path: &str) -> Option<&str> {
    let mut segments: Vec<&str> = path.split('/').collect();
    // The last segment is the file itself.
    segments.pop();

    segments.into_iter().rev().find_map(item_type_suffix)
}

fn item_type_suffix(folder: &str) -> Option<&str> {
    let (name, suffix) = folder.rsplit_once('.')?;
    if name.is_empty() {
        return None;
    }
    let first = suffix.chars().next()?;
    if first.is_ascii_alphabetic() && suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(suffix)
    } else {
        None
    }
}

/// Encode a workspace display name into a filesystem-safe directory name.
///
/// Target names such as `[D] Fabric Blueprint` contain brackets and spaces;
/// those are folded to `_` while letters, digits, dots and dashes are kept.
/// The result is always a single normal path component: names that would
/// encode to nothing or only dots (`.`, `..`) are prefixed with `_`.
pub fn encode_target_name(name: &str) -> String {
    let encoded: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect();

    if encoded.chars().all(|c| c == '.') {
        format!("_{}", encoded)
    } else {
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_of_nearest_ancestor() {
        assert_eq!(
            item_type_of("1_Bronze/transformation/nb_br_csv_to_delta.Notebook/notebook-content.py"),
            Some("Notebook")
        );
        assert_eq!(
            item_type_of("outer.Lakehouse/inner.Notebook/x.py"),
            Some("Notebook")
        );
        assert_eq!(item_type_of("lh.Lakehouse/Files/data.csv"), Some("Lakehouse"));
    }

    #[test]
    fn test_item_type_of_none() {
        assert_eq!(item_type_of("notebook-content.py"), None);
        assert_eq!(item_type_of("v1.2/readme.md"), None);
        assert_eq!(item_type_of(".github/workflow.yml"), None);
        assert_eq!(item_type_of("plain/folder/file.Notebook"), None);
    }

    #[test]
    fn test_encode_target_name() {
        assert_eq!(
            encode_target_name("[D] Fabric Blueprint"),
            "_D__Fabric_Blueprint"
        );
        assert_eq!(encode_target_name("a/b\\c"), "a-b-c");
        assert_eq!(encode_target_name("prod-ws.v2"), "prod-ws.v2");
    }

    #[test]
    fn test_encode_target_name_is_one_normal_component() {
        use std::path::{Component, Path};

        assert_eq!(encode_target_name(".."), "_..");
        assert_eq!(encode_target_name("."), "_.");
        assert_eq!(encode_target_name(""), "_");
        assert_eq!(encode_target_name("  "), "_");
        assert_eq!(encode_target_name("../x"), "..-x");
        assert_eq!(encode_target_name(".hidden"), ".hidden");

        for name in ["..", ".", "", "../..", "/etc", "a/../../b", "..\\.."] {
            let encoded = encode_target_name(name);
            let components: Vec<Component> = Path::new(&encoded).components().collect();
            assert_eq!(components.len(), 1, "{name:?} -> {encoded:?}");
            assert!(matches!(components[0], Component::Normal(_)), "{name:?} -> {encoded:?}");
        }
    }
}
