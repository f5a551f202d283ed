use crate::*;

use std::sync::Arc;

use hierarchy_mapper::{HierarchicalDataProvider, HierarchicalQuery, RowData, RowRange};

type Grid = Controller<u32, ItemFilter<u32>, TreeDataProvider<u32, u32>>;

// 1 ── 11 ── 111
// │    │
// │    └──── 112
// └─── 12
// 2 ── 21
// 3
fn sample() -> TreeData<u32, u32> {
    let mut data = TreeData::new(|x: &u32| *x);
    data.add_items(None, [1, 2, 3]).unwrap();
    data.add_items(Some(&1), [11, 12]).unwrap();
    data.add_items(Some(&11), [111, 112]).unwrap();
    data.add_item(Some(&2), 21).unwrap();
    data
}

fn grid() -> Grid {
    Controller::new(TreeDataProvider::new(sample()))
}

fn items(c: &mut Grid) -> Vec<u32> {
    let size = c.size().unwrap();
    c.rows(RowRange::new(0, size))
        .unwrap()
        .into_iter()
        .map(|row| row.item)
        .collect()
}

#[test]
fn tree_data_tracks_parents_and_children() {
    let mut data = sample();
    assert_eq!(data.len(), 8);
    assert_eq!(data.root_items(), vec![&1, &2, &3]);
    assert_eq!(data.children(Some(&11)), vec![&111, &112]);
    assert_eq!(data.children(Some(&99)), Vec::<&u32>::new());
    assert_eq!(data.parent(&111), Some(&11));
    assert_eq!(data.parent(&1), None);
    assert!(data.contains(&21));

    assert_eq!(data.add_item(None, 21), Err(TreeDataError::DuplicateItem));
    assert_eq!(data.add_item(Some(&99), 5), Err(TreeDataError::UnknownParent));
    assert_eq!(data.len(), 8);

    data.clear();
    assert!(data.is_empty());
    assert!(data.root_items().is_empty());
}

#[test]
fn removing_an_item_removes_its_descendants() {
    let mut data = sample();
    assert_eq!(data.remove_item(&1), Some(1));
    assert_eq!(data.len(), 3);
    assert!(!data.contains(&111));
    assert_eq!(data.root_items(), vec![&2, &3]);
    assert_eq!(data.remove_item(&1), None);
}

#[test]
fn set_parent_moves_subtrees_and_rejects_cycles() {
    let mut data = sample();
    data.set_parent(&11, Some(&2)).unwrap();
    assert_eq!(data.children(Some(&2)), vec![&21, &11]);
    assert_eq!(data.children(Some(&1)), vec![&12]);
    assert_eq!(data.parent(&111), Some(&11));

    assert_eq!(data.set_parent(&2, Some(&111)), Err(TreeDataError::Cycle));
    assert_eq!(data.set_parent(&2, Some(&2)), Err(TreeDataError::Cycle));
    assert_eq!(data.set_parent(&5, None), Err(TreeDataError::UnknownItem));

    data.set_parent(&11, None).unwrap();
    assert_eq!(data.root_items(), vec![&1, &2, &3, &11]);
    assert_eq!(data.parent(&11), None);
}

#[test]
fn move_after_sibling_reorders_within_the_parent() {
    let mut data = sample();
    data.move_after_sibling(&3, None).unwrap();
    assert_eq!(data.root_items(), vec![&3, &1, &2]);
    data.move_after_sibling(&3, Some(&2)).unwrap();
    assert_eq!(data.root_items(), vec![&1, &2, &3]);
    data.move_after_sibling(&1, Some(&2)).unwrap();
    assert_eq!(data.root_items(), vec![&2, &1, &3]);
    data.move_after_sibling(&1, Some(&1)).unwrap();
    assert_eq!(data.root_items(), vec![&2, &1, &3]);

    assert_eq!(
        data.move_after_sibling(&11, Some(&2)),
        Err(TreeDataError::NotASibling)
    );
}

#[test]
fn provider_filter_keeps_ancestors_of_matches() {
    let mut provider = TreeDataProvider::new(sample());
    provider.set_filter(Some(Arc::new(|x: &u32| *x == 112)));

    let roots = provider
        .fetch_children(HierarchicalQuery::children_of(None))
        .unwrap();
    assert_eq!(roots, vec![1]);
    let under_1 = provider
        .fetch_children(HierarchicalQuery::children_of(Some(&1)))
        .unwrap();
    assert_eq!(under_1, vec![11]);
    let under_11 = provider
        .fetch_children(HierarchicalQuery::children_of(Some(&11)))
        .unwrap();
    assert_eq!(under_11, vec![112]);

    // Probes ignore the filter.
    assert_eq!(provider.has_children(&2), Ok(true));
}

#[test]
fn provider_sorts_then_pages() {
    let provider = TreeDataProvider::new(sample());
    let desc: hierarchy_mapper::InMemorySorting<u32> = Arc::new(|a: &u32, b: &u32| b.cmp(a));
    let mut query = HierarchicalQuery::children_of(None);
    query.in_memory_sorting = Some(&desc);
    query.offset = 1;
    query.limit = Some(1);
    assert_eq!(provider.fetch_children(query), Ok(vec![2]));
    assert_eq!(provider.child_count(HierarchicalQuery::children_of(Some(&1))), Ok(2));
    assert_eq!(provider.child_count(HierarchicalQuery::children_of(Some(&3))), Ok(0));
}

#[test]
fn rows_carry_index_and_metadata() {
    let mut c = grid();
    assert_eq!(c.expand(&1).unwrap(), RowChange::Inserted(RowRange::new(1, 3)));

    let rows = c.rows(RowRange::new(0, 10)).unwrap();
    let got: Vec<(usize, u32, RowData)> = rows
        .into_iter()
        .map(|r| (r.index, r.item, r.data))
        .collect();
    assert_eq!(
        got,
        vec![
            (0, 1, RowData::branch(Some(0), false, true)),
            (1, 11, RowData::branch(Some(1), true, true)),
            (2, 12, RowData::leaf(Some(1))),
            (3, 2, RowData::branch(Some(0), true, true)),
            (4, 3, RowData::leaf(Some(0))),
        ]
    );

    let tail = c.rows(RowRange::new(3, 5)).unwrap();
    assert_eq!(tail.iter().map(|r| r.index).collect::<Vec<_>>(), vec![3, 4]);
}

#[test]
fn toggle_flips_expansion() {
    let mut c = grid();
    assert_eq!(c.toggle(&1).unwrap(), RowChange::Inserted(RowRange::new(1, 3)));
    assert_eq!(c.toggle(&1).unwrap(), RowChange::Removed(RowRange::new(1, 3)));
    assert_eq!(c.toggle(&3).unwrap(), RowChange::None);
    assert_eq!(c.size().unwrap(), 3);
}

#[test]
fn active_range_stays_on_the_same_rows() {
    let mut c = grid();
    c.set_active_range(RowRange::new(2, 3));
    let first = |c: &mut Grid| c.active_rows().unwrap().first().map(|r| r.item);
    assert_eq!(first(&mut c), Some(3));

    c.expand(&1).unwrap();
    assert_eq!(c.active_range(), RowRange::new(4, 5));
    assert_eq!(first(&mut c), Some(3));

    c.collapse(&1).unwrap();
    assert_eq!(c.active_range(), RowRange::new(2, 3));
    assert_eq!(first(&mut c), Some(3));

    c.expand(&2).unwrap();
    assert_eq!(c.active_range(), RowRange::new(3, 4));
    assert_eq!(first(&mut c), Some(3));

    // Changes below the window leave it alone.
    c.expand(&1).unwrap();
    c.set_active_range(RowRange::new(0, 2));
    c.collapse(&1).unwrap();
    assert_eq!(c.active_range(), RowRange::new(0, 2));
}

#[test]
fn filter_change_clamps_the_active_range() {
    let mut c = grid();
    c.expand_recursively([1, 2], 1).unwrap();
    c.set_active_range(RowRange::new(5, 8));

    c.set_filter(Some(Arc::new(|x: &u32| *x == 3))).unwrap();
    assert_eq!(items(&mut c), vec![3]);
    assert_eq!(c.active_range(), RowRange::new(1, 1));

    c.set_filter(None).unwrap();
    assert_eq!(items(&mut c), vec![1, 11, 111, 112, 12, 2, 21, 3]);
}

#[test]
fn expand_recursively_opens_levels_below() {
    let mut c = grid();
    let changes = c.expand_recursively([1, 2], 1).unwrap();
    assert_eq!(
        changes,
        vec![
            RowChange::Inserted(RowRange::new(1, 3)),
            RowChange::Inserted(RowRange::new(4, 5)),
            RowChange::Inserted(RowRange::new(2, 4)),
        ]
    );
    assert_eq!(items(&mut c), vec![1, 11, 111, 112, 12, 2, 21, 3]);

    let mut shallow = grid();
    shallow.expand_recursively([1], 0).unwrap();
    assert_eq!(items(&mut shallow), vec![1, 11, 12, 2, 3]);
}

#[test]
fn collapse_recursively_closes_descendants_first() {
    let mut c = grid();
    c.expand_recursively([1, 2], 1).unwrap();

    let changes = c.collapse_recursively([1], 1).unwrap();
    assert_eq!(
        changes,
        vec![
            RowChange::Removed(RowRange::new(2, 4)),
            RowChange::Removed(RowRange::new(1, 3)),
        ]
    );
    assert!(!c.mapper().is_expanded(Some(&11)));
    assert!(c.mapper().is_expanded(Some(&2)));
    assert_eq!(items(&mut c), vec![1, 2, 21, 3]);

    // Reopening 1 uses the cache and shows 11 collapsed.
    c.expand(&1).unwrap();
    assert_eq!(items(&mut c), vec![1, 11, 12, 2, 21, 3]);
}

#[test]
fn data_changes_show_up_after_refresh() {
    let mut c = grid();
    c.expand_recursively([1], 1).unwrap();
    assert_eq!(c.size().unwrap(), 7);

    let data = c.mapper_mut().data_provider_mut().tree_data_mut();
    data.remove_item(&111);
    data.remove_item(&112);
    data.add_item(None, 4).unwrap();

    c.mapper_mut().refresh_children(&11).unwrap();
    assert_eq!(
        c.mapper().generate_data(Some(&11)).unwrap(),
        RowData::leaf(Some(1))
    );
    assert_eq!(items(&mut c), vec![1, 11, 12, 2, 3]);

    c.refresh_all().unwrap();
    assert_eq!(items(&mut c), vec![1, 11, 12, 2, 3, 4]);
}

#[test]
fn struct_items_are_keyed_by_identity() {
    #[derive(Clone, Debug, PartialEq)]
    struct Folder {
        id: u32,
        name: &'static str,
    }
    let folder = |id, name| Folder { id, name };

    let mut data = TreeData::new(|f: &Folder| f.id);
    data.add_items(None, [folder(1, "docs"), folder(2, "src")]).unwrap();
    data.add_items(Some(&folder(1, "")), [folder(3, "guide"), folder(4, "api")])
        .unwrap();

    let mut c = Controller::new(TreeDataProvider::new(data));
    let filter: ItemFilter<Folder> = Arc::new(|f: &Folder| f.name.starts_with('a'));
    c.set_filter(Some(filter)).unwrap();
    c.expand(&folder(1, "renamed")).unwrap();

    let size = c.size().unwrap();
    let names: Vec<&str> = c
        .rows(RowRange::new(0, size))
        .unwrap()
        .into_iter()
        .map(|r| r.item.name)
        .collect();
    assert_eq!(names, vec!["docs", "api"]);
}

#[test]
fn shared_mapper_serializes_access_across_threads() {
    let shared = SharedMapper::new(grid());
    std::thread::scope(|s| {
        let a = shared.clone();
        let b = shared.clone();
        s.spawn(move || a.with(|c| c.expand(&1)).unwrap());
        s.spawn(move || b.with(|c| c.expand(&2)).unwrap());
    });
    assert_eq!(shared.handle_count(), 1);
    assert_eq!(shared.with(|c| c.size()).unwrap(), 6);

    let other = shared.clone();
    assert!(shared.with(|_| other.try_with(|_| ())).is_none());
    assert_eq!(other.try_with(|c| c.mapper().expanded_count()), Some(2));
}

#[cfg(feature = "serde")]
#[test]
fn rows_serialize_with_row_metadata() {
    let mut c = grid();
    let change = c.expand(&2).unwrap();
    assert_eq!(
        serde_json::to_value(change).unwrap(),
        serde_json::json!({ "Inserted": { "start": 2, "end": 3 } })
    );

    let rows = c.rows(RowRange::new(1, 3)).unwrap();
    assert_eq!(
        serde_json::to_value(&rows).unwrap(),
        serde_json::json!([
            {
                "index": 1,
                "item": 2,
                "data": { "depth": 0, "leaf": false, "collapsed": false, "collapseAllowed": true }
            },
            { "index": 2, "item": 21, "data": { "depth": 1, "leaf": true } }
        ])
    );
}
