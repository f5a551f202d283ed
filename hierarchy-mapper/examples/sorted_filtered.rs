// Example: filter and sort options, and how expansion survives a rebuild.
use std::convert::Infallible;

use hierarchy_mapper::{
    HierarchicalDataProvider, HierarchicalQuery, HierarchyMapper, MapperOptions, RowRange,
    SortDirection, SortOrder,
};

#[derive(Clone, Debug)]
struct Employee {
    id: u32,
    name: &'static str,
    manager: Option<u32>,
}

struct Directory(Vec<Employee>);

impl HierarchicalDataProvider<Employee, String> for Directory {
    type Id = u32;
    type Error = Infallible;

    fn id(&self, item: &Employee) -> u32 {
        item.id
    }

    fn has_children(&self, item: &Employee) -> Result<bool, Infallible> {
        Ok(self.0.iter().any(|e| e.manager == Some(item.id)))
    }

    fn fetch_children(
        &self,
        query: HierarchicalQuery<'_, Employee, String>,
    ) -> Result<Vec<Employee>, Infallible> {
        let manager = query.parent.map(|p| p.id);
        let mut reports: Vec<Employee> = self
            .0
            .iter()
            .filter(|e| e.manager == manager)
            .filter(|e| {
                query
                    .filter
                    .is_none_or(|prefix| !e.name.starts_with(prefix.as_str()))
            })
            .cloned()
            .collect();
        if let Some(order) = query.sort_orders.first() {
            reports.sort_by_key(|e| e.name);
            if order.direction == SortDirection::Descending {
                reports.reverse();
            }
        }
        Ok(query.page(reports).collect())
    }
}

fn print_rows(mapper: &mut HierarchyMapper<Employee, String, Directory>) {
    let size = mapper.get_tree_size().unwrap_or_default();
    for e in mapper.fetch_items(RowRange::new(0, size)).unwrap_or_default() {
        let depth = mapper.get_depth(Some(&e)).ok().flatten().unwrap_or(0);
        println!("{}{}", "  ".repeat(depth), e.name);
    }
    println!();
}

fn main() {
    let staff = |id, name, manager| Employee { id, name, manager };
    let directory = Directory(vec![
        staff(1, "Ada", None),
        staff(2, "Grace", Some(1)),
        staff(3, "Alan", Some(1)),
        staff(4, "Edsger", Some(3)),
        staff(5, "Barbara", Some(3)),
        staff(6, "Ken", None),
    ]);

    let options = MapperOptions::new().with_back_end_sorting([SortOrder::asc("name")]);
    let mut mapper = HierarchyMapper::with_options(directory, options);
    for id in [1, 3] {
        let e = staff(id, "", None);
        let pos = mapper.get_index_of(Some(&e)).unwrap_or_default();
        let _ = mapper.do_expand(Some(&e), pos);
    }
    print_rows(&mut mapper);

    // Hide everyone whose name starts with "B"; Alan stays expanded across the rebuild.
    mapper.set_filter(Some("B".to_owned()));
    print_rows(&mut mapper);

    mapper.set_back_end_sorting(vec![SortOrder::desc("name")]);
    print_rows(&mut mapper);
}
