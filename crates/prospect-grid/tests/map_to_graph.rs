use prospect_grid::{Coordinate, EdgeBehavior, Graph, Terrain, TerrainMap, TerrainSet};

#[test]
fn loaded_map_seeds_graph_with_inverted_rows() {
    let dir = std::env::temp_dir().join(format!("prospect-grid-map-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("island.csv");
    std::fs::write(&path, "2,2,2,2\n2,0,1,2\n2,2,2,2\n").unwrap();

    let map = TerrainMap::load(&path).unwrap();
    let graph = Graph::from_map(&map, 1.0, EdgeBehavior::Clamp).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!((graph.width(), graph.height()), (4, 3));
    assert_eq!(graph.node_at(Coordinate::new(1, 1)).unwrap().terrain(), Terrain::Grass);
    assert_eq!(graph.node_at(Coordinate::new(2, 1)).unwrap().terrain(), Terrain::Road);

    let water = TerrainSet::of(&[Terrain::Water]);
    let land: Vec<_> = graph
        .nodes()
        .iter()
        .filter(|n| n.is_traversable(water))
        .map(|n| n.coordinate())
        .collect();
    assert_eq!(land, vec![Coordinate::new(1, 1), Coordinate::new(2, 1)]);
}

#[test]
fn line_of_sight_crosses_wrapped_seam() {
    let graph = Graph::uniform(8, 8, 1.0, EdgeBehavior::Wrap, Terrain::Road).unwrap();
    let line = graph.bresenham(Coordinate::new(7, 3), Coordinate::new(1, 3));
    assert_eq!(
        line,
        vec![
            Coordinate::new(7, 3),
            Coordinate::new(0, 3),
            Coordinate::new(1, 3)
        ]
    );
}

#[test]
fn map_round_trips_through_graph_terrain() {
    let map = TerrainMap::parse_csv("0,1\n2,0\n").unwrap();
    let graph = Graph::from_map(&map, 1.0, EdgeBehavior::Wrap).unwrap();
    for row in 0..map.height() {
        for x in 0..map.width() {
            let y = (map.height() - 1 - row) as i32;
            let node = graph.node_at(Coordinate::new(x as i32, y)).unwrap();
            assert_eq!(Some(node.terrain()), map.get(x, row));
        }
    }
}
