//! Property-based tests for bookmark store operations.
//!
//! These tests check the store's structural invariants for arbitrary inputs:
//! id allocation across loads, single-level cascade delete, duplicate-free
//! reordering, and protection of user-chosen and remote icons.

use std::collections::{BTreeSet, HashSet};
use std::fs;

use gemmarks::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use gemmarks::storage::bookmark_file::FILE_NAME;
use gemmarks::storage::load_bookmarks;
use gemmarks::types::bookmark::{cmp_title_ascending, BookmarkEdit, REMOTE_TAG, USER_ICON_TAG};
use proptest::prelude::*;
use tempfile::TempDir;

/// Strategy for Gemini URLs with a lowercase host and optional path.
fn arb_url() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9]{2,12}", proptest::option::of("/[a-z0-9]{1,10}"))
        .prop_map(|(host, path)| format!("gemini://{}.org{}", host, path.unwrap_or_default()))
}

fn arb_icon() -> impl Strategy<Value = Option<char>> {
    proptest::option::of(proptest::char::range('\u{21}', '\u{1FAFF}'))
}

// *For any* ids stored in a structured file, adds after loading it allocate
// ids above the largest stored id and never collide.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn ids_after_load_exceed_stored_ids(
        stored in proptest::collection::btree_set(1u32..5000, 1..10),
        adds_before in 0usize..5,
        adds_after in 1usize..10,
    ) {
        let dir = TempDir::new().expect("tempdir");
        let mut text = String::from("recentfolder = 0\n\n");
        for id in &stored {
            text.push_str(&format!("[{}]\nurl = \"gemini://host{}.org/\"\n\n", id, id));
        }
        fs::write(dir.path().join(FILE_NAME), text).expect("write bookmark file");

        let store = BookmarkManager::new();
        for i in 0..adds_before {
            store.add(&format!("gemini://early{}.org/", i), "early", "", None);
        }
        load_bookmarks(&store, dir.path());

        let max = *stored.iter().max().expect("non-empty");
        let mut seen: HashSet<u32> = stored.iter().copied().collect();
        for i in 0..adds_after {
            let id = store.add(&format!("gemini://late{}.org/", i), "late", "", None);
            prop_assert!(id > max, "id {} not above stored max {}", id, max);
            prop_assert!(seen.insert(id), "id {} allocated twice", id);
        }
        prop_assert_eq!(store.count(), stored.len() + adds_after);
    }
}

// *For any* folder with children and grandchildren, removing the folder
// removes exactly the folder and its direct children.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn remove_cascades_exactly_one_level(
        children in proptest::collection::vec((any::<bool>(), 0usize..4), 1..6),
    ) {
        let store = BookmarkManager::new();
        let folder = store.add_folder("root", 0);
        let bystander = store.add("gemini://bystander.org/", "bystander", "", None);

        let mut direct = Vec::new();
        let mut grandchildren = Vec::new();
        for (index, (is_folder, grandchild_count)) in children.iter().enumerate() {
            let child = if *is_folder {
                store.add_folder(&format!("sub{}", index), folder)
            } else {
                let id = store.add(&format!("gemini://child{}.org/", index), "child", "", None);
                store.update(id, &BookmarkEdit { parent_id: Some(folder), ..Default::default() });
                id
            };
            direct.push(child);
            for g in 0..*grandchild_count {
                let id = store.add(&format!("gemini://g{}x{}.org/", index, g), "grandchild", "", None);
                store.update(id, &BookmarkEdit { parent_id: Some(child), ..Default::default() });
                grandchildren.push(id);
            }
        }

        prop_assert!(store.remove(folder));
        prop_assert!(store.get(folder).is_none());
        for id in &direct {
            prop_assert!(store.get(*id).is_none());
        }
        for id in &grandchildren {
            prop_assert!(store.get(*id).is_some());
        }
        prop_assert!(store.get(bystander).is_some());
    }
}

// *For any* sorted sibling list and target position, reordering leaves every
// order value distinct and places the moved bookmark at the target.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn reorder_never_duplicates_orders(
        urls in proptest::collection::btree_set(arb_url(), 2..8),
        pick in any::<prop::sample::Index>(),
        target in 1i32..10,
    ) {
        let store = BookmarkManager::new();
        let ids: Vec<u32> = urls.iter().map(|url| store.add(url, url, "", None)).collect();
        store.sort(0, cmp_title_ascending);

        let moved = ids[pick.index(ids.len())];
        store.reorder(moved, target);

        let orders: Vec<i32> = store.list(None, None).iter().map(|bm| bm.order).collect();
        let distinct: BTreeSet<i32> = orders.iter().copied().collect();
        prop_assert_eq!(distinct.len(), orders.len());
        prop_assert_eq!(store.get(moved).expect("moved bookmark").order, target);
    }
}

// *For any* icon, `update_icon` leaves `usericon` and `remote` bookmarks alone.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn update_icon_respects_protected_tags(
        url in arb_url(),
        original in arb_icon(),
        replacement in arb_icon(),
        protected_tag in prop_oneof![Just(USER_ICON_TAG), Just(REMOTE_TAG)],
        extra_tag in prop_oneof![Just(""), Just("news"), Just("remotesource")],
    ) {
        let store = BookmarkManager::new();
        let tags = format!("{} {}", extra_tag, protected_tag);
        let id = store.add(&url, "protected", tags.trim(), original);

        prop_assert!(!store.update_icon(&url, replacement));
        prop_assert_eq!(store.get(id).expect("bookmark").icon, original);
    }
}
