#![cfg(feature = "serde")]

use ai_nav::{GridSpec, Navigator, SearchOrder, Tile, TileGraph, Vec2};

#[test]
fn tile_graph_roundtrips_via_serde() {
    let spec = GridSpec::new(Vec2::new(-3.0, -3.0), 8, 6, 1.5, 1.0).expect("grid");
    let blocker = spec.tile_bounds(Tile::new(3, 2));
    let graph =
        TileGraph::from_obstacles(spec, &[blocker]).with_search_order(SearchOrder::EstimatedTotal);

    let json = serde_json::to_string(&graph).expect("serialize graph");
    let graph2: TileGraph = serde_json::from_str(&json).expect("deserialize graph");

    assert_eq!(graph.spec(), graph2.spec());
    assert_eq!(graph.search_order(), graph2.search_order());
    assert_eq!(graph.walkable_count(), graph2.walkable_count());

    let start = Vec2::new(-2.5, -2.5);
    let goal = Vec2::new(8.0, 2.5);
    assert_eq!(graph.find_path(start, goal), graph2.find_path(start, goal));
}
