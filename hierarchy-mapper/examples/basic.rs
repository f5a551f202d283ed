// Example: a lazily fetched tree exposed as flat rows.
use std::collections::BTreeMap;
use std::convert::Infallible;

use hierarchy_mapper::{
    HierarchicalDataProvider, HierarchicalQuery, HierarchyMapper, RowData, RowRange,
};

/// Children by parent id; `0` is the root.
struct Catalog(BTreeMap<u32, Vec<u32>>);

impl HierarchicalDataProvider<u32, ()> for Catalog {
    type Id = u32;
    type Error = Infallible;

    fn id(&self, item: &u32) -> u32 {
        *item
    }

    fn has_children(&self, item: &u32) -> Result<bool, Infallible> {
        Ok(self.0.get(item).is_some_and(|c| !c.is_empty()))
    }

    fn fetch_children(
        &self,
        query: HierarchicalQuery<'_, u32, ()>,
    ) -> Result<Vec<u32>, Infallible> {
        let parent = query.parent.copied().unwrap_or(0);
        println!("  fetch children of {parent}");
        let children = self.0.get(&parent).cloned().unwrap_or_default();
        Ok(query.page(children).collect())
    }
}

fn main() {
    let catalog = Catalog(BTreeMap::from([
        (0, vec![1, 2, 3]),
        (1, vec![10, 11, 12]),
        (10, vec![100, 101]),
        (3, vec![30]),
    ]));
    let mut mapper = HierarchyMapper::new(catalog);

    println!("size={:?}", mapper.get_tree_size());

    let pos = mapper.get_index_of(Some(&1)).unwrap_or_default();
    println!("expand 1 -> inserted {:?}", mapper.do_expand(Some(&1), pos));
    let pos = mapper.get_index_of(Some(&10)).unwrap_or_default();
    println!("expand 10 -> inserted {:?}", mapper.do_expand(Some(&10), pos));

    let size = mapper.get_tree_size().unwrap_or_default();
    for item in mapper.fetch_items(RowRange::new(0, size)).unwrap_or_default() {
        let data = mapper
            .generate_data(Some(&item))
            .unwrap_or(RowData::leaf(None));
        let indent = "  ".repeat(data.depth.unwrap_or(0));
        println!("{indent}{item} {data:?}");
    }

    let pos = mapper.get_index_of(Some(&1)).unwrap_or_default();
    println!("collapse 1 -> removed {:?}", mapper.do_collapse(Some(&1), pos));
    // Cached: no fetch is printed here.
    let pos = mapper.get_index_of(Some(&1)).unwrap_or_default();
    println!("expand 1 again -> inserted {:?}", mapper.do_expand(Some(&1), pos));
}
