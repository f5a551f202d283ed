// Example: driving a grid from an in-memory tree.
//
// An adapter would:
// - keep the controller's active range in sync with the grid's scroll position
// - forward expand/collapse clicks to `toggle` and apply the returned `RowChange`
// - render `active_rows()`
use hierarchy_mapper::RowRange;
use hierarchy_mapper_adapter::{Controller, ItemFilter, TreeData, TreeDataProvider};

fn main() {
    let mut data = TreeData::new(|path: &String| path.clone());
    let dir = |s: &str| s.to_owned();
    let _ = data.add_items(None, [dir("/src"), dir("/docs"), dir("/README.md")]);
    let _ = data.add_items(Some(&dir("/src")), [dir("/src/lib.rs"), dir("/src/bin")]);
    let _ = data.add_items(Some(&dir("/src/bin")), [dir("/src/bin/cli.rs")]);
    let _ = data.add_items(Some(&dir("/docs")), [dir("/docs/guide.md")]);

    let mut grid: Controller<String, ItemFilter<String>, _> =
        Controller::new(TreeDataProvider::new(data));
    grid.set_active_range(RowRange::new(0, 5));

    for path in ["/src", "/src/bin", "/docs"] {
        println!("toggle {path}: {:?}", grid.toggle(&dir(path)));
    }
    render(&mut grid);

    println!("toggle /src: {:?}", grid.toggle(&dir("/src")));
    render(&mut grid);

    let only_markdown: ItemFilter<String> = std::sync::Arc::new(|p: &String| p.ends_with(".md"));
    let _ = grid.set_filter(Some(only_markdown));
    render(&mut grid);
}

fn render(grid: &mut Controller<String, ItemFilter<String>, TreeDataProvider<String, String>>) {
    println!("active={:?}", grid.active_range());
    for row in grid.active_rows().unwrap_or_default() {
        let marker = match (row.data.leaf, row.data.collapsed) {
            (true, _) => " ",
            (false, Some(true)) => "+",
            (false, _) => "-",
        };
        let depth = row.data.depth.unwrap_or(0);
        println!("{:>3} {}{marker} {}", row.index, "  ".repeat(depth), row.item);
    }
    println!();
}
