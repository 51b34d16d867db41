use ai_nav::{
    Aabb, GridError, GridSpec, NavPath, Navigator, SearchOrder, Tile, TileGraph, Vec2,
};

fn unit_grid(columns: u32, rows: u32) -> GridSpec {
    GridSpec::new(Vec2::ZERO, columns, rows, 1.0, 1.0).expect("grid")
}

fn blocked_tiles(spec: GridSpec, blocked: &[(i32, i32)]) -> TileGraph {
    let obstacles: Vec<Aabb> = blocked
        .iter()
        .map(|(x, y)| spec.tile_bounds(Tile::new(*x, *y)))
        .collect();
    TileGraph::from_obstacles(spec, &obstacles)
}

fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-4, "expected {b}, got {a}");
}

#[test]
fn tile_graph_finds_path_around_blockers() {
    let wall: Vec<(i32, i32)> = (0..5).filter(|y| *y != 2).map(|y| (2, y)).collect();
    let graph = blocked_tiles(unit_grid(5, 5), &wall);

    let start = Vec2::new(0.5, 0.5);
    let goal = Vec2::new(4.5, 4.5);
    let path = graph.find_path(start, goal).expect("path should exist");

    assert_eq!(path.points.first().copied(), Some(start));
    assert_eq!(path.points.last().copied(), Some(goal));
    assert!(path
        .points
        .iter()
        .any(|p| *p == Vec2::new(2.5, 2.5)), "route must pass through the gap");
}

#[test]
fn tile_graph_is_deterministic_for_same_input() {
    let wall: Vec<(i32, i32)> = (0..10).filter(|y| *y != 5).map(|y| (5, y)).collect();
    let graph = blocked_tiles(unit_grid(10, 10), &wall);

    let start = Vec2::new(1.5, 1.5);
    let goal = Vec2::new(8.5, 8.5);

    let a = graph.find_path(start, goal).expect("path should exist");
    let b = graph.find_path(start, goal).expect("path should exist");
    assert_eq!(a, b);
}

#[test]
fn open_grid_diagonal_has_optimal_cost() {
    let graph = TileGraph::open(unit_grid(6, 6));
    let path = graph
        .find_path(Vec2::new(0.5, 0.5), Vec2::new(5.5, 5.5))
        .expect("path");

    assert_close(path.cost, 5.0 * 2f32.sqrt());
    assert_eq!(path.len(), 6);
}

#[test]
fn edges_use_cell_dimensions_and_skip_self() {
    let graph = TileGraph::open(GridSpec::new(Vec2::ZERO, 3, 3, 2.0, 1.0).expect("grid"));
    let centre = Tile::new(1, 1);
    let edges: Vec<(Tile, f32)> = graph.neighbors(centre).collect();

    assert_eq!(edges.len(), 8);
    assert!(edges.iter().all(|(t, _)| *t != centre));
    for (tile, cost) in edges {
        let expected = match ((tile.x - 1).abs(), (tile.y - 1).abs()) {
            (1, 1) => 5f32.sqrt(),
            (1, 0) => 2.0,
            _ => 1.0,
        };
        assert_close(cost, expected);
    }

    // Corner cells only see three neighbours.
    assert_eq!(graph.neighbors(Tile::new(0, 0)).count(), 3);
}

#[test]
fn obstacles_block_only_the_cells_they_cover() {
    let spec = unit_grid(5, 5);
    let graph = TileGraph::from_obstacles(spec, &[spec.tile_bounds(Tile::new(2, 2))]);

    assert_eq!(graph.walkable_count(), 24);
    assert!(!graph.is_walkable(Tile::new(2, 2)));
    assert!(graph.is_walkable(Tile::new(1, 2)));
    assert_eq!(graph.neighbors(Tile::new(2, 2)).count(), 0);
    assert!(graph.neighbors(Tile::new(1, 1)).all(|(t, _)| t != Tile::new(2, 2)));
}

#[test]
fn enclosed_goal_is_unreachable() {
    let ring = [
        (2, 2),
        (3, 2),
        (4, 2),
        (2, 3),
        (4, 3),
        (2, 4),
        (3, 4),
        (4, 4),
    ];
    let graph = blocked_tiles(unit_grid(7, 7), &ring);

    assert!(graph
        .find_path(Vec2::new(0.5, 0.5), Vec2::new(3.5, 3.5))
        .is_none());
}

#[test]
fn off_grid_or_blocked_endpoints_yield_none() {
    let graph = blocked_tiles(unit_grid(4, 4), &[(3, 3)]);

    assert!(graph
        .find_path(Vec2::new(-1.0, 0.5), Vec2::new(2.5, 2.5))
        .is_none());
    assert!(graph
        .find_path(Vec2::new(0.5, 0.5), Vec2::new(9.0, 0.5))
        .is_none());
    assert!(graph
        .find_path(Vec2::new(0.5, 0.5), Vec2::new(3.5, 3.5))
        .is_none());
}

#[test]
fn exact_goal_is_appended_when_off_centre() {
    let graph = TileGraph::open(unit_grid(3, 1));
    let start = Vec2::new(0.2, 0.2);
    let goal = Vec2::new(2.9, 0.1);

    let path = graph.find_path(start, goal).expect("path");
    assert_eq!(
        path,
        NavPath::new(
            vec![start, Vec2::new(1.5, 0.5), Vec2::new(2.5, 0.5), goal],
            2.0
        )
    );
}

#[test]
fn same_cell_query_keeps_start_and_goal() {
    let graph = TileGraph::open(unit_grid(2, 2));
    let start = Vec2::new(0.1, 0.1);
    let goal = Vec2::new(0.9, 0.9);

    let path = graph.find_path(start, goal).expect("path");
    assert_eq!(path.points, vec![start, goal]);
    assert_close(path.cost, 0.0);
}

#[test]
fn estimated_total_matches_cost_with_fewer_expansions() {
    let spec = unit_grid(16, 16);
    let uninformed = TileGraph::open(spec);
    let informed = TileGraph::open(spec).with_search_order(SearchOrder::EstimatedTotal);
    assert_eq!(uninformed.search_order(), SearchOrder::PathCost);

    let start = Vec2::new(0.5, 0.5);
    let goal = Vec2::new(15.5, 12.5);

    let (a, a_stats) = uninformed.find_path_with_stats(start, goal);
    let (b, b_stats) = informed.find_path_with_stats(start, goal);
    let (a, b) = (a.expect("path"), b.expect("path"));

    assert_close(a.cost, b.cost);
    assert!(
        b_stats.expanded < a_stats.expanded,
        "informed {} vs uninformed {}",
        b_stats.expanded,
        a_stats.expanded
    );
}

#[test]
fn raycast_reports_first_blocked_cell_face() {
    let wall: Vec<(i32, i32)> = (0..4).map(|y| (3, y)).collect();
    let graph = blocked_tiles(unit_grid(6, 4), &wall);

    let hit = graph
        .raycast(Vec2::new(0.5, 0.5), Vec2::new(5.5, 0.5))
        .expect("hit");
    assert_close(hit.point.x, 3.0);
    assert_close(hit.point.y, 0.5);
    assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));

    assert!(graph
        .raycast(Vec2::new(0.5, 0.5), Vec2::new(2.5, 3.5))
        .is_none());
}

#[test]
fn raycast_treats_grid_edge_as_wall() {
    let graph = TileGraph::open(unit_grid(4, 4));
    let hit = graph
        .raycast(Vec2::new(1.5, 1.5), Vec2::new(1.5, 10.0))
        .expect("hit");
    assert_close(hit.point.y, 4.0);
    assert_eq!(hit.normal, Vec2::new(0.0, -1.0));
}

#[test]
fn nearest_point_projects_out_of_blocked_cells() {
    let graph = blocked_tiles(unit_grid(3, 1), &[(0, 0)]);

    let inside = Vec2::new(1.2, 0.4);
    assert_eq!(graph.nearest_point(inside), Some(inside));
    assert_eq!(
        graph.nearest_point(Vec2::new(0.2, 0.5)),
        Some(Vec2::new(1.5, 0.5))
    );
}

#[test]
fn degenerate_grids_are_rejected() {
    assert_eq!(
        GridSpec::new(Vec2::ZERO, 0, 4, 1.0, 1.0),
        Err(GridError::Empty {
            columns: 0,
            rows: 4
        })
    );
    assert_eq!(
        GridSpec::new(Vec2::ZERO, 4, 4, 0.0, 1.0),
        Err(GridError::CellSize {
            column_width: 0.0,
            row_height: 1.0
        })
    );
    assert!(GridSpec::new(Vec2::ZERO, 4, 4, 1.0, f32::NAN).is_err());

    let loaded = GridSpec {
        rows: 0,
        ..GridSpec::default()
    };
    assert!(loaded.validate().is_err());
    assert_eq!(GridSpec::default().validate(), Ok(()));
}
